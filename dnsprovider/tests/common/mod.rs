//! 共享测试工具和辅助函数

#![allow(dead_code)]

use std::sync::Arc;

use dnsprovider::{
    Context, DnsProvider, ProviderClient, ProviderConfig, ResourceRecordSet, ResourceRecordSets,
    Route53ApiStub, RrsType, Zone, Zones, create_provider,
};

/// 断言 `Option` 为 `Some`，并解包返回内部值（失败则直接让测试失败）。
#[macro_export]
macro_rules! require_some {
    ($expr:expr $(,)?) => {{
        let opt = $expr;
        assert!(opt.is_some(), "expected Some(..), got None");
        let Some(val) = opt else {
            return;
        };
        val
    }};
    ($expr:expr, $($msg:tt)+) => {{
        let opt = $expr;
        assert!(opt.is_some(), "{}", format_args!($($msg)+));
        let Some(val) = opt else {
            return;
        };
        val
    }};
}

/// 断言 `Result` 为 `Ok`，并解包返回内部值（失败则直接让测试失败）。
#[macro_export]
macro_rules! require_ok {
    ($expr:expr $(,)?) => {{
        let res = $expr;
        assert!(res.is_ok(), "expected Ok(..), got {res:?}");
        let Ok(val) = res else {
            return;
        };
        val
    }};
    ($expr:expr, $($msg:tt)+) => {{
        let res = $expr;
        assert!(
            res.is_ok(),
            "{}: {res:?}",
            format_args!($($msg)+)
        );
        let Ok(val) = res else {
            return;
        };
        val
    }};
}

/// 预置 zone 名称
pub const TEST_ZONE: &str = "example.com";

/// 测试上下文 - 封装 stub 后端和 Provider
pub struct TestContext {
    pub stub: Arc<Route53ApiStub>,
    pub provider: Arc<dyn DnsProvider>,
    pub ctx: Context,
}

impl TestContext {
    /// 带一个预置 zone（`example.com.`）的 stub
    pub fn route53() -> Self {
        Self::with_stub(Route53ApiStub::new().with_zone(TEST_ZONE), ProviderConfig::default())
    }

    pub fn with_stub(stub: Route53ApiStub, config: ProviderConfig) -> Self {
        let stub = Arc::new(stub);
        let provider = create_provider(ProviderClient::Route53(stub.clone()), config)
            .expect("创建 Provider 失败");
        Self {
            stub,
            provider,
            ctx: Context::background(),
        }
    }

    pub fn zones(&self) -> Arc<dyn Zones> {
        self.provider.zones().expect("Zones 接口不受支持")
    }

    /// 列表中的第一个 zone
    pub async fn first_zone(&self) -> Arc<dyn Zone> {
        let zones = self.zones().list(&self.ctx).await.expect("列出 zone 失败");
        assert!(!zones.is_empty(), "zone 列表为空");
        zones[0].clone()
    }

    pub async fn list_rrs(&self, rrs: &dyn ResourceRecordSets) -> Vec<ResourceRecordSet> {
        rrs.list(&self.ctx).await.expect("列出记录集失败")
    }

    pub async fn add_rrset(&self, rrs: &dyn ResourceRecordSets, rrset: ResourceRecordSet) {
        rrs.start_changeset()
            .add(rrset)
            .expect("暂存 add 失败")
            .apply(&self.ctx)
            .await
            .expect("添加记录集失败");
    }

    pub async fn remove_rrset(&self, rrs: &dyn ResourceRecordSets, rrset: ResourceRecordSet) {
        rrs.start_changeset()
            .remove(rrset)
            .expect("暂存 remove 失败")
            .apply(&self.ctx)
            .await
            .expect("删除记录集失败");
    }
}

/// zone 的记录集接口
pub fn rrs(zone: &dyn Zone) -> Arc<dyn ResourceRecordSets> {
    zone.resource_record_sets()
        .expect("ResourceRecordSets 接口不受支持")
}

/// `www11.<zone>` A 180 {10.10.10.10, 169.20.20.20}
pub fn example_rrset(rrs: &dyn ResourceRecordSets) -> ResourceRecordSet {
    rrs.new_record_set(
        &format!("www11.{}", rrs.zone_name()),
        vec!["10.10.10.10".to_string(), "169.20.20.20".to_string()],
        180,
        RrsType::A,
    )
}

/// 生成唯一的测试 zone 名称
pub fn generate_test_zone_name() -> String {
    let uuid = uuid::Uuid::new_v4();
    format!("t{}.testing", &uuid.simple().to_string()[..8])
}
