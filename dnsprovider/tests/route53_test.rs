//! Route 53 Provider 集成测试（基于内存 stub）
//!
//! 运行方式:
//! ```bash
//! cargo test -p dnsprovider --test route53_test -- --nocapture
//! ```

mod common;

use std::time::Duration;

use common::{TEST_ZONE, TestContext, example_rrset, generate_test_zone_name, rrs};
use dnsprovider::{
    ChangesetState, Context, ErrorKind, ProviderConfig, ProviderError, RawApiError, RecordKey,
    Route53ApiStub, RrsType, conformance, names::names_match,
};

// ============ Zone 测试 ============

#[tokio::test]
async fn test_route53_zones_list() {
    let t = TestContext::route53();
    let zones = require_ok!(t.zones().list(&t.ctx).await);
    assert_eq!(zones.len(), 1, "应只有预置 zone");
    assert!(names_match(zones[0].name(), TEST_ZONE));
}

#[tokio::test]
async fn test_route53_zone_id_has_prefix_removed() {
    let t = TestContext::route53();
    let zone = t.first_zone().await;
    assert!(!zone.id().starts_with("/hostedzone/"));
    assert_eq!(zone.id(), zone.name(), "stub zone ID 应等于 zone 名称");
}

#[tokio::test]
async fn test_route53_zone_add_success() {
    let t = TestContext::route53();
    let zones = t.zones();

    let draft = require_ok!(zones.new_zone("ubernetes.testing"));
    let zone = require_ok!(zones.add(&t.ctx, draft).await);
    assert_eq!(zone.name(), "ubernetes.testing.");

    let listed = require_ok!(zones.list(&t.ctx).await);
    assert!(listed.iter().any(|z| z.id() == zone.id()));

    require_ok!(zones.remove(&t.ctx, zone.as_ref()).await);
    let listed = require_ok!(zones.list(&t.ctx).await);
    assert!(!listed.iter().any(|z| z.id() == zone.id()));
}

#[tokio::test]
async fn test_route53_zone_remove_missing() {
    let t = TestContext::route53();
    let zones = t.zones();

    let zone = require_ok!(zones.add(&t.ctx, require_ok!(zones.new_zone("gone.testing"))).await);
    require_ok!(zones.remove(&t.ctx, zone.as_ref()).await);

    let err = zones.remove(&t.ctx, zone.as_ref()).await.unwrap_err();
    assert!(
        matches!(err, ProviderError::ZoneNotFound { ref zone, .. } if zone == "gone.testing."),
        "应为 ZoneNotFound: {err:?}"
    );
}

#[tokio::test]
async fn test_route53_zone_remove_non_empty() {
    let t = TestContext::route53();
    let zone = t.first_zone().await;
    let sets = rrs(zone.as_ref());
    t.add_rrset(sets.as_ref(), example_rrset(sets.as_ref())).await;

    let err = t.zones().remove(&t.ctx, zone.as_ref()).await.unwrap_err();
    assert!(
        matches!(err, ProviderError::Backend { ref raw_code, .. } if raw_code.as_deref() == Some("HostedZoneNotEmpty")),
        "非空 zone 删除应失败: {err:?}"
    );

    t.remove_rrset(sets.as_ref(), example_rrset(sets.as_ref())).await;
    require_ok!(t.zones().remove(&t.ctx, zone.as_ref()).await);
}

#[tokio::test]
async fn test_route53_zone_add_duplicate() {
    let t = TestContext::route53();
    let zones = t.zones();
    let err = zones
        .add(&t.ctx, require_ok!(zones.new_zone(TEST_ZONE)))
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Backend);
}

#[tokio::test]
async fn test_route53_new_zone_rejects_bad_name() {
    let t = TestContext::route53();
    let long_label = "x".repeat(64);
    for name in ["", "-bad.example.com", "a..b", long_label.as_str()] {
        let err = t.zones().new_zone(name).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Validation, "名称 {name:?} 应被拒绝");
    }
}

#[tokio::test]
async fn test_route53_zone_lifecycle_scenario() {
    let t = TestContext::route53();
    let zones = t.zones();
    require_ok!(conformance::zone_lifecycle(&t.ctx, zones.as_ref(), &generate_test_zone_name()).await);
}

// ============ 记录集测试 ============

#[tokio::test]
async fn test_route53_rrsets_list() {
    let t = TestContext::route53();
    let zone = t.first_zone().await;
    let sets = rrs(zone.as_ref());
    assert!(t.list_rrs(sets.as_ref()).await.is_empty());
}

#[tokio::test]
async fn test_route53_rrsets_add_success() {
    let t = TestContext::route53();
    let zone = t.first_zone().await;
    let sets = rrs(zone.as_ref());
    let rrset = example_rrset(sets.as_ref());

    t.add_rrset(sets.as_ref(), rrset.clone()).await;
    t.remove_rrset(sets.as_ref(), rrset).await;
}

#[tokio::test]
async fn test_route53_rrsets_addition_visible() {
    let t = TestContext::route53();
    let zone = t.first_zone().await;
    let sets = rrs(zone.as_ref());
    let rrset = example_rrset(sets.as_ref());
    t.add_rrset(sets.as_ref(), rrset.clone()).await;

    let listed = t.list_rrs(sets.as_ref()).await;
    let found: Vec<_> = listed
        .iter()
        .filter(|r| names_match(r.name(), rrset.name()))
        .collect();
    assert_eq!(found.len(), 1, "应恰好找到一条记录集");
    assert!(found[0].is_equivalent(&rrset));
    assert_eq!(found[0].ttl(), 180);
    assert_eq!(
        found[0].rrdatas().collect::<Vec<_>>(),
        vec!["10.10.10.10", "169.20.20.20"]
    );

    t.remove_rrset(sets.as_ref(), rrset).await;
}

#[tokio::test]
async fn test_route53_rrsets_add_duplicate_failure() {
    let t = TestContext::route53();
    let zone = t.first_zone().await;
    let sets = rrs(zone.as_ref());
    let rrset = example_rrset(sets.as_ref());
    t.add_rrset(sets.as_ref(), rrset.clone()).await;

    let mut changeset = sets.start_changeset();
    require_ok!(changeset.add(rrset.clone()));
    let err = changeset.apply(&t.ctx).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Conflict, "重复添加应冲突: {err:?}");
    assert_eq!(changeset.state(), ChangesetState::Rejected);

    assert_eq!(t.list_rrs(sets.as_ref()).await.len(), 1);
    t.remove_rrset(sets.as_ref(), rrset).await;
}

#[tokio::test]
async fn test_route53_rrsets_double_add_in_one_changeset() {
    let t = TestContext::route53();
    let zone = t.first_zone().await;
    let sets = rrs(zone.as_ref());
    let rrset = example_rrset(sets.as_ref());

    let mut changeset = sets.start_changeset();
    require_ok!(changeset.add(rrset.clone()));
    require_ok!(changeset.add(rrset));
    let err = changeset.apply(&t.ctx).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Conflict);
    assert!(t.stub.submitted_batches().await.is_empty(), "不应提交到后端");
}

#[tokio::test]
async fn test_route53_rrsets_remove() {
    let t = TestContext::route53();
    let zone = t.first_zone().await;
    let sets = rrs(zone.as_ref());
    let rrset = example_rrset(sets.as_ref());
    t.add_rrset(sets.as_ref(), rrset.clone()).await;

    let mut changeset = sets.start_changeset();
    require_ok!(changeset.remove(rrset));
    require_ok!(changeset.apply(&t.ctx).await);
    assert_eq!(changeset.state(), ChangesetState::Committed);
}

#[tokio::test]
async fn test_route53_rrsets_remove_gone() {
    let t = TestContext::route53();
    let zone = t.first_zone().await;
    let sets = rrs(zone.as_ref());
    let rrset = example_rrset(sets.as_ref());
    t.add_rrset(sets.as_ref(), rrset.clone()).await;
    t.remove_rrset(sets.as_ref(), rrset.clone()).await;

    let listed = t.list_rrs(sets.as_ref()).await;
    assert!(
        !listed.iter().any(|r| names_match(r.name(), rrset.name())),
        "已删除的记录集仍然存在"
    );

    let found = require_ok!(sets.find(&t.ctx, &rrset.key()).await);
    assert!(found.is_none());
}

#[tokio::test]
async fn test_route53_rrsets_remove_missing() {
    let t = TestContext::route53();
    let zone = t.first_zone().await;
    let sets = rrs(zone.as_ref());

    let mut changeset = sets.start_changeset();
    require_ok!(changeset.remove(example_rrset(sets.as_ref())));
    let err = changeset.apply(&t.ctx).await.unwrap_err();
    assert!(
        matches!(err, ProviderError::RecordNotFound { ref record_type, .. } if record_type == "A"),
        "应为 RecordNotFound: {err:?}"
    );
}

#[tokio::test]
async fn test_route53_rrsets_replace() {
    let t = TestContext::route53();
    let zone = t.first_zone().await;
    require_ok!(conformance::replace_single_record(&t.ctx, zone.as_ref()).await);
    assert!(t.list_rrs(rrs(zone.as_ref()).as_ref()).await.is_empty(), "场景应自行清理");
}

#[tokio::test]
async fn test_route53_rrsets_replace_all() {
    let t = TestContext::route53();
    let zone = t.first_zone().await;
    require_ok!(conformance::replace_all_records(&t.ctx, zone.as_ref()).await);
}

#[tokio::test]
async fn test_route53_rrsets_different_types() {
    let t = TestContext::route53();
    let zone = t.first_zone().await;
    require_ok!(conformance::distinct_types_same_name(&t.ctx, zone.as_ref()).await);
}

#[tokio::test]
async fn test_route53_contract() {
    let t = TestContext::route53();
    let zone = t.first_zone().await;
    let sets = rrs(zone.as_ref());
    require_ok!(conformance::changeset_contract(&t.ctx, sets.as_ref()).await);
}

#[tokio::test]
async fn test_route53_all_record_set_scenarios() {
    let t = TestContext::route53();
    let zone = t.first_zone().await;
    require_ok!(conformance::run_record_set_scenarios(&t.ctx, zone.as_ref()).await);
}

// ============ 扩展行为 ============

#[tokio::test]
async fn test_route53_upsert_creates_then_replaces() {
    let t = TestContext::route53();
    let zone = t.first_zone().await;
    let sets = rrs(zone.as_ref());
    let name = format!("api.{}", zone.name());

    let first = sets.new_record_set(&name, vec!["\"v1\"".to_string()], 60, RrsType::Txt);
    let second = sets.new_record_set(&name, vec!["\"v2\"".to_string()], 120, RrsType::Txt);
    for rrset in [first, second.clone()] {
        let mut changeset = sets.start_changeset();
        require_ok!(changeset.upsert(rrset));
        require_ok!(changeset.apply(&t.ctx).await);
    }

    let found = require_ok!(sets.find(&t.ctx, &RecordKey::new(&name, RrsType::Txt)).await);
    let found = require_some!(found, "upsert 后应能找到记录集");
    assert!(found.is_equivalent(&second));
}

#[tokio::test]
async fn test_route53_rrsets_relative_names_are_qualified() {
    let t = TestContext::route53();
    let zone = t.first_zone().await;
    let sets = rrs(zone.as_ref());

    let a = sets.new_record_set("www", vec!["1.2.3.4".to_string()], 300, RrsType::A);
    let txt = sets.new_record_set("www", vec!["\"t\"".to_string()], 300, RrsType::Txt);
    assert_eq!(a.name(), "www.example.com.");

    let mut changeset = sets.start_changeset();
    require_ok!(changeset.add(a.clone()));
    require_ok!(changeset.add(txt.clone()));
    require_ok!(changeset.apply(&t.ctx).await);

    let listed = t.list_rrs(sets.as_ref()).await;
    assert_eq!(listed.len(), 2);
    for expected in [&a, &txt] {
        assert!(listed.iter().any(|r| r.is_equivalent(expected)), "{expected} 未出现在列表中");
    }

    let found = require_ok!(sets.find(&t.ctx, &RecordKey::new("www", RrsType::Txt)).await);
    let found = require_some!(found, "相对名称应能找到记录集");
    assert!(found.is_equivalent(&txt));

    let apex = sets.new_record_set("@", vec!["\"v=spf1 -all\"".to_string()], 300, RrsType::Txt);
    assert_eq!(apex.name(), "example.com.");
}

#[tokio::test]
async fn test_route53_upsert_then_remove_deletes_record_set() {
    let t = TestContext::route53();
    let zone = t.first_zone().await;
    let sets = rrs(zone.as_ref());
    let stored = sets.new_record_set("www", vec!["1.1.1.1".to_string()], 300, RrsType::A);
    t.add_rrset(sets.as_ref(), stored.clone()).await;

    let updated = sets.new_record_set("www", vec!["2.2.2.2".to_string()], 300, RrsType::A);
    let mut changeset = sets.start_changeset();
    require_ok!(changeset.upsert(updated));
    require_ok!(changeset.remove(stored));
    require_ok!(changeset.apply(&t.ctx).await);

    assert!(t.list_rrs(sets.as_ref()).await.is_empty(), "upsert 后的 remove 应生效");
}

#[tokio::test]
async fn test_route53_get_by_name_ignores_case_and_dot() {
    let t = TestContext::route53();
    let zone = t.first_zone().await;
    let sets = rrs(zone.as_ref());
    let rrset = example_rrset(sets.as_ref());
    t.add_rrset(sets.as_ref(), rrset.clone()).await;

    let found = require_ok!(sets.get(&t.ctx, "WWW11.example.com").await);
    assert_eq!(found.len(), 1);
    let none = require_ok!(sets.get(&t.ctx, "www12.example.com.").await);
    assert!(none.is_empty());
}

#[tokio::test]
async fn test_route53_backend_failure_is_not_retried() {
    let t = TestContext::route53();
    let zone = t.first_zone().await;
    let sets = rrs(zone.as_ref());

    t.stub
        .fail_next(RawApiError::with_code("Throttling", "Rate exceeded"))
        .await;
    let mut changeset = sets.start_changeset();
    require_ok!(changeset.add(example_rrset(sets.as_ref())));
    let err = changeset.apply(&t.ctx).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Backend);
    assert!(!err.is_expected());

    assert!(t.list_rrs(sets.as_ref()).await.is_empty(), "失败的批量不应部分生效");
}

#[tokio::test(start_paused = true)]
async fn test_route53_cancelled_apply_returns_promptly() {
    let t = TestContext::with_stub(
        Route53ApiStub::new()
            .with_zone(TEST_ZONE)
            .with_latency(Duration::from_secs(30)),
        ProviderConfig::default(),
    );
    let zone = t.first_zone().await;
    let sets = rrs(zone.as_ref());

    let ctx = Context::background().with_timeout(Duration::from_secs(1));
    let mut changeset = sets.start_changeset();
    require_ok!(changeset.add(example_rrset(sets.as_ref())));
    let err = changeset.apply(&ctx).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Cancelled);
    assert_eq!(changeset.state(), ChangesetState::Rejected);
}

#[tokio::test]
async fn test_route53_large_batch_keeps_replace_together() {
    let config = ProviderConfig {
        max_batch_size: 3,
        ..ProviderConfig::default()
    };
    let t = TestContext::with_stub(Route53ApiStub::new().with_zone(TEST_ZONE), config);
    let zone = t.first_zone().await;
    let sets = rrs(zone.as_ref());

    let mut changeset = sets.start_changeset();
    for i in 0..4 {
        require_ok!(changeset.add(sets.new_record_set(
            &format!("h{i}.example.com."),
            vec!["192.0.2.1".to_string()],
            300,
            RrsType::A,
        )));
    }
    require_ok!(changeset.apply(&t.ctx).await);

    let old = sets.new_record_set("h0.example.com.", vec!["192.0.2.1".to_string()], 300, RrsType::A);
    let new = sets.new_record_set("h0.example.com.", vec!["192.0.2.9".to_string()], 300, RrsType::A);
    let mut replace = sets.start_changeset();
    require_ok!(replace.remove(old));
    for i in 1..3 {
        require_ok!(replace.remove(sets.new_record_set(
            &format!("h{i}.example.com."),
            Vec::new(),
            300,
            RrsType::A,
        )));
    }
    require_ok!(replace.add(new.clone()));
    require_ok!(replace.apply(&t.ctx).await);

    assert_eq!(t.stub.submitted_batches().await, vec![3, 1, 3, 1]);
    let listed = t.list_rrs(sets.as_ref()).await;
    assert_eq!(listed.len(), 2);
    assert!(listed.iter().any(|r| r.is_equivalent(&new)));
}
