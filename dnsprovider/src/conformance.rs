//! Provider-independent behaviour checks.
//!
//! Each scenario drives a live [`Zone`] (or [`Zones`] registry) only through
//! the public traits, so one scenario library runs against every provider.
//! Scenarios remove what they create, also on failure, and report the first
//! broken expectation as a [`ConformanceError`].
//!
//! ```rust
//! use std::sync::Arc;
//! use dnsprovider::{Context, DnsProvider, Route53ApiStub, Route53Provider, conformance};
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let provider = Route53Provider::new(Arc::new(Route53ApiStub::new().with_zone("example.com")));
//! let ctx = Context::background();
//! let zones = provider.zones().ok_or("zones not supported")?;
//! let zone = zones.list(&ctx).await?.remove(0);
//! conformance::run_record_set_scenarios(&ctx, zone.as_ref()).await?;
//! # Ok(())
//! # }
//! ```

use std::sync::Arc;

use thiserror::Error;

use crate::changeset::ChangesetState;
use crate::context::Context;
use crate::error::{ErrorKind, ProviderError};
use crate::rrstype::RrsType;
use crate::traits::{ResourceRecordSets, Zone, Zones};
use crate::types::ResourceRecordSet;
use crate::utils::names::names_match;

/// TTL used by every record set the scenarios create.
pub const EXAMPLE_TTL: u32 = 180;

/// Why a scenario did not pass.
#[derive(Debug, Error)]
pub enum ConformanceError {
    /// The provider does not offer a capability the scenario needs.
    #[error("{0} not supported by provider")]
    Unsupported(&'static str),

    /// A provider call failed where success was expected.
    #[error("{step} failed: {source}")]
    Provider {
        step: &'static str,
        #[source]
        source: ProviderError,
    },

    /// A call succeeded but observable state was wrong.
    #[error("assertion failed: {0}")]
    Assertion(String),
}

pub type ConformanceResult = Result<(), ConformanceError>;

fn at(step: &'static str) -> impl FnOnce(ProviderError) -> ConformanceError {
    move |source| ConformanceError::Provider { step, source }
}

fn ensure(condition: bool, message: impl FnOnce() -> String) -> ConformanceResult {
    if condition {
        Ok(())
    } else {
        Err(ConformanceError::Assertion(message()))
    }
}

/// The record set store of `zone`, or `Unsupported`.
pub fn record_sets(zone: &dyn Zone) -> Result<Arc<dyn ResourceRecordSets>, ConformanceError> {
    zone.resource_record_sets()
        .ok_or(ConformanceError::Unsupported("resource record sets"))
}

/// `www11.<zone>` A record with two addresses.
pub fn example_record_set(rrs: &dyn ResourceRecordSets) -> ResourceRecordSet {
    rrs.new_record_set(
        &format!("www11.{}", rrs.zone_name()),
        vec!["10.10.10.10".to_string(), "169.20.20.20".to_string()],
        EXAMPLE_TTL,
        RrsType::A,
    )
}

async fn add_one(ctx: &Context, rrs: &dyn ResourceRecordSets, rrset: ResourceRecordSet) -> ConformanceResult {
    let mut changeset = rrs.start_changeset();
    changeset.add(rrset).map_err(at("stage add"))?;
    changeset.apply(ctx).await.map_err(at("apply add"))
}

async fn stored(
    ctx: &Context,
    rrs: &dyn ResourceRecordSets,
    rrset: &ResourceRecordSet,
) -> Result<Vec<ResourceRecordSet>, ConformanceError> {
    let listed = rrs.list(ctx).await.map_err(at("list"))?;
    Ok(listed
        .into_iter()
        .filter(|r| r.key() == rrset.key())
        .collect())
}

/// Best effort: remove whatever of `rrsets` is still stored. Failures are logged only.
async fn cleanup(ctx: &Context, rrs: &dyn ResourceRecordSets, rrsets: &[ResourceRecordSet]) {
    for rrset in rrsets {
        match rrs.find(ctx, &rrset.key()).await {
            Ok(Some(current)) => {
                let mut changeset = rrs.start_changeset();
                if let Err(e) = changeset.remove(current) {
                    log::warn!("[conformance] cleanup of {} failed: {e}", rrset.key());
                    continue;
                }
                if let Err(e) = changeset.apply(ctx).await {
                    log::warn!("[conformance] cleanup of {} failed: {e}", rrset.key());
                }
            }
            Ok(None) => {}
            Err(e) => log::warn!("[conformance] cleanup lookup of {} failed: {e}", rrset.key()),
        }
    }
}

/// Replace one record set's values with a remove + add pair in one changeset.
pub async fn replace_single_record(ctx: &Context, zone: &dyn Zone) -> ConformanceResult {
    let rrs = record_sets(zone)?;
    let original = example_record_set(rrs.as_ref());
    let replacement = rrs.new_record_set(
        original.name(),
        vec!["203.0.113.10".to_string()],
        EXAMPLE_TTL,
        RrsType::A,
    );

    let result = async {
        add_one(ctx, rrs.as_ref(), original.clone()).await?;

        let mut changeset = rrs.start_changeset();
        changeset
            .remove(original.clone())
            .and_then(|cs| cs.add(replacement.clone()))
            .map_err(at("stage replace"))?;
        changeset.apply(ctx).await.map_err(at("apply replace"))?;

        let found = stored(ctx, rrs.as_ref(), &replacement).await?;
        ensure(found.len() == 1, || {
            format!("expected exactly one {} after replace, found {}", replacement.key(), found.len())
        })?;
        ensure(found[0].is_equivalent(&replacement), || {
            format!("expected {replacement} after replace, found {}", found[0])
        })
    }
    .await;

    cleanup(ctx, rrs.as_ref(), &[replacement]).await;
    result
}

/// Remove one name and add a different one in the same changeset.
pub async fn replace_all_records(ctx: &Context, zone: &dyn Zone) -> ConformanceResult {
    let rrs = record_sets(zone)?;
    let original = example_record_set(rrs.as_ref());
    let replacement = rrs.new_record_set(
        &format!("www12.{}", rrs.zone_name()),
        vec!["10.10.10.11".to_string(), "169.20.20.21".to_string()],
        EXAMPLE_TTL,
        RrsType::A,
    );

    let result = async {
        add_one(ctx, rrs.as_ref(), original.clone()).await?;

        let mut changeset = rrs.start_changeset();
        changeset
            .remove(original.clone())
            .and_then(|cs| cs.add(replacement.clone()))
            .map_err(at("stage replace all"))?;
        changeset.apply(ctx).await.map_err(at("apply replace all"))?;

        let listed = rrs.list(ctx).await.map_err(at("list"))?;
        ensure(!listed.iter().any(|r| r.key() == original.key()), || {
            format!("{} still present after replace all", original.key())
        })?;
        ensure(listed.iter().any(|r| r.is_equivalent(&replacement)), || {
            format!("{replacement} missing after replace all")
        })
    }
    .await;

    cleanup(ctx, rrs.as_ref(), &[original, replacement]).await;
    result
}

/// An A and a TXT record set at the same zone-relative name coexist.
pub async fn distinct_types_same_name(ctx: &Context, zone: &dyn Zone) -> ConformanceResult {
    let rrs = record_sets(zone)?;
    let a = rrs.new_record_set(
        "www",
        vec!["10.10.10.10".to_string()],
        EXAMPLE_TTL,
        RrsType::A,
    );
    let txt = rrs.new_record_set(
        "www",
        vec!["\"conformance\"".to_string()],
        EXAMPLE_TTL,
        RrsType::Txt,
    );

    let result = async {
        let mut changeset = rrs.start_changeset();
        changeset
            .add(a.clone())
            .and_then(|cs| cs.add(txt.clone()))
            .map_err(at("stage adds"))?;
        changeset.apply(ctx).await.map_err(at("apply adds"))?;

        let at_name = rrs.get(ctx, "www").await.map_err(at("get"))?;
        for expected in [&a, &txt] {
            ensure(at_name.iter().any(|r| r.is_equivalent(expected)), || {
                format!("{expected} missing from records at {}", a.name())
            })?;
        }
        ensure(at_name.iter().all(|r| names_match(r.name(), a.name())), || {
            format!("get({}) returned records at other names", a.name())
        })
    }
    .await;

    cleanup(ctx, rrs.as_ref(), &[a, txt]).await;
    result
}

/// Adding a key that already exists fails with `Conflict` and changes nothing.
pub async fn duplicate_add_fails(ctx: &Context, zone: &dyn Zone) -> ConformanceResult {
    let rrs = record_sets(zone)?;
    let rrset = example_record_set(rrs.as_ref());

    let result = async {
        add_one(ctx, rrs.as_ref(), rrset.clone()).await?;

        match add_one(ctx, rrs.as_ref(), rrset.clone()).await {
            Ok(()) => {
                return Err(ConformanceError::Assertion(format!(
                    "duplicate add of {} succeeded",
                    rrset.key()
                )));
            }
            Err(ConformanceError::Provider { source, .. }) => {
                ensure(source.kind() == ErrorKind::Conflict, || {
                    format!("duplicate add failed with {:?}, expected Conflict", source.kind())
                })?;
            }
            Err(other) => return Err(other),
        }

        let found = stored(ctx, rrs.as_ref(), &rrset).await?;
        ensure(found.len() == 1 && found[0].is_equivalent(&rrset), || {
            format!("store changed by rejected duplicate add: {found:?}")
        })
    }
    .await;

    cleanup(ctx, rrs.as_ref(), &[rrset]).await;
    result
}

/// Single-use changeset contract, add and remove visibility.
pub async fn changeset_contract(ctx: &Context, rrs: &dyn ResourceRecordSets) -> ConformanceResult {
    let rrset = example_record_set(rrs);

    let result = async {
        let mut empty = rrs.start_changeset();
        ensure(empty.is_empty(), || "fresh changeset is not empty".to_string())?;
        empty.apply(ctx).await.map_err(at("apply empty changeset"))?;
        ensure(empty.state() == ChangesetState::Committed, || {
            format!("empty apply left state {}", empty.state())
        })?;

        let mut changeset = rrs.start_changeset();
        changeset.add(rrset.clone()).map_err(at("stage add"))?;
        ensure(changeset.len() == 1, || format!("expected 1 staged change, got {}", changeset.len()))?;
        changeset.apply(ctx).await.map_err(at("apply add"))?;

        let found = stored(ctx, rrs, &rrset).await?;
        ensure(found.len() == 1, || {
            format!("expected one {} after add, found {}", rrset.key(), found.len())
        })?;

        let second_apply = changeset.apply(ctx).await;
        ensure(
            second_apply.as_ref().is_err_and(|e| e.kind() == ErrorKind::InvalidState),
            || format!("second apply returned {second_apply:?}, expected InvalidState"),
        )?;
        let late_remove = changeset.remove(rrset.clone()).map(|_| ());
        ensure(
            late_remove.as_ref().is_err_and(|e| e.kind() == ErrorKind::InvalidState),
            || format!("remove after apply returned {late_remove:?}, expected InvalidState"),
        )?;
        let still = stored(ctx, rrs, &rrset).await?;
        ensure(still.len() == 1, || "terminal changeset altered the store".to_string())?;

        let mut removal = rrs.start_changeset();
        removal.remove(rrset.clone()).map_err(at("stage remove"))?;
        removal.apply(ctx).await.map_err(at("apply remove"))?;
        let gone = stored(ctx, rrs, &rrset).await?;
        ensure(gone.is_empty(), || format!("{} still listed after remove", rrset.key()))
    }
    .await;

    cleanup(ctx, rrs, &[rrset]).await;
    result
}

/// Create a zone, see it listed, delete it, see it gone.
pub async fn zone_lifecycle(ctx: &Context, zones: &dyn Zones, name: &str) -> ConformanceResult {
    let draft = zones.new_zone(name).map_err(at("new zone"))?;
    let zone = zones.add(ctx, draft).await.map_err(at("add zone"))?;

    let result = async {
        let listed = zones.list(ctx).await.map_err(at("list zones"))?;
        ensure(listed.iter().any(|z| z.id() == zone.id()), || {
            format!("zone {} missing after add", zone.name())
        })?;

        zones.remove(ctx, zone.as_ref()).await.map_err(at("remove zone"))?;
        let listed = zones.list(ctx).await.map_err(at("list zones"))?;
        ensure(!listed.iter().any(|z| z.id() == zone.id()), || {
            format!("zone {} still listed after remove", zone.name())
        })?;

        match zones.remove(ctx, zone.as_ref()).await {
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            other => Err(ConformanceError::Assertion(format!(
                "second zone remove returned {other:?}, expected NotFound"
            ))),
        }
    }
    .await;

    if result.is_err()
        && let Err(e) = zones.remove(ctx, zone.as_ref()).await
        && e.kind() != ErrorKind::NotFound
    {
        log::warn!("[conformance] cleanup of zone {} failed: {e}", zone.name());
    }
    result
}

/// Every record set scenario, in sequence, against one zone.
pub async fn run_record_set_scenarios(ctx: &Context, zone: &dyn Zone) -> ConformanceResult {
    let rrs = record_sets(zone)?;
    changeset_contract(ctx, rrs.as_ref()).await?;
    replace_single_record(ctx, zone).await?;
    replace_all_records(ctx, zone).await?;
    distinct_types_same_name(ctx, zone).await?;
    duplicate_add_fails(ctx, zone).await
}
