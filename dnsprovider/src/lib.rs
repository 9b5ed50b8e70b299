//! # dnsprovider
//!
//! A provider-agnostic abstraction for managing DNS zones and their resource
//! record sets, with batched, validated, single-use changesets.
//!
//! ## Supported Providers
//!
//! | Provider | Feature Flag | Client |
//! |----------|-------------|--------|
//! | [Amazon Route 53](https://aws.amazon.com/route53/) | `route53` | any [`Route53Api`] implementation |
//!
//! The crate never authenticates on its own: a provider is built from an
//! already-authenticated client handle. [`Route53ApiStub`] is an in-memory
//! handle with the same batch semantics as the real service.
//!
//! ## Feature Flags
//!
//! - **`route53`** *(default)* — Enable the Route 53 provider and its stub.
//! - **`conformance`** *(default)* — Enable the [`conformance`] scenario library.
//!
//! ## Usage
//!
//! ```rust
//! use std::sync::Arc;
//! use dnsprovider::{
//!     Context, ProviderClient, ProviderConfig, Route53ApiStub, RrsType, create_provider,
//! };
//!
//! #[tokio::main(flavor = "current_thread")]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let ctx = Context::background();
//!
//!     // 1. Create a provider from a client handle
//!     let client = ProviderClient::Route53(Arc::new(Route53ApiStub::new()));
//!     let provider = create_provider(client, ProviderConfig::default())?;
//!
//!     // 2. Create a zone
//!     let zones = provider.zones().ok_or("zones not supported")?;
//!     let zone = zones.add(&ctx, zones.new_zone("example.com")?).await?;
//!
//!     // 3. Stage and apply a changeset
//!     let sets = zone.resource_record_sets().ok_or("record sets not supported")?;
//!     let www = sets.new_record_set(
//!         "www.example.com.",
//!         vec!["192.0.2.1".to_string()],
//!         300,
//!         RrsType::A,
//!     );
//!     sets.start_changeset().add(www)?.apply(&ctx).await?;
//!
//!     // 4. List the zone
//!     for rrset in sets.list(&ctx).await? {
//!         println!("{rrset}");
//!     }
//!     Ok(())
//! }
//! ```
//!
//! ## Replacing Records
//!
//! A remove and an add of the same `(name, type)` in one changeset is a
//! replace: it is validated as a whole and committed in one backend request.
//!
//! ```rust,no_run
//! # use dnsprovider::*;
//! # async fn example(sets: &dyn ResourceRecordSets, ctx: &Context) -> Result<()> {
//! let key = RecordKey::new("www.example.com", RrsType::A);
//! let Some(current) = sets.find(ctx, &key).await? else {
//!     return Ok(());
//! };
//! let next = sets.new_record_set(current.name(), vec!["192.0.2.2".into()], 300, RrsType::A);
//! sets.start_changeset().remove(current)?.add(next)?.apply(ctx).await?;
//! # Ok(())
//! # }
//! ```
//!
//! ## Error Handling
//!
//! All provider operations return [`Result<T, ProviderError>`](ProviderError).
//! [`ProviderError::kind`] groups the variants into the categories generic
//! callers branch on:
//!
//! - [`ErrorKind::Validation`] — input rejected before any backend call
//! - [`ErrorKind::Conflict`] — an add targets an existing record set
//! - [`ErrorKind::NotFound`] — a removed record set or zone does not exist
//! - [`ErrorKind::Backend`] — transport, auth or availability failure
//! - [`ErrorKind::Cancelled`] — the caller's [`Context`] was cancelled or expired
//! - [`ErrorKind::InvalidState`] — a changeset was used after `apply`
//!
//! Nothing is retried internally. After a failed `apply` the zone may be
//! partially updated; list it again before deciding what to resubmit.
//!
//! ## Concurrency
//!
//! Changesets from different callers against the same zone are not
//! coordinated. Serialize externally if batches must apply exactly once.

mod changeset;
mod config;
mod context;
mod error;
mod factory;
mod providers;
mod rrstype;
mod traits;
mod types;
mod utils;

#[cfg(feature = "conformance")]
pub mod conformance;

// Re-export error types
pub use error::{ErrorKind, ProviderError, Result};

// Re-export factory functions
pub use factory::{ProviderClient, available_providers, create_provider};

pub use config::{MAX_CHANGES_PER_BATCH, ProviderConfig};
pub use context::Context;

// Re-export public traits (error mapping stays internal)
pub use traits::{DnsProvider, RawApiError, ResourceRecordSets, Zone, Zones};

// Re-export types
pub use changeset::{
    BatchEntry, BatchViolation, Change, ChangeAction, Changeset, ChangesetApplier,
    ChangesetState, check_batch, plan_batch, split_batch,
};
pub use rrstype::RrsType;
pub use types::{RecordKey, ResourceRecordSet, ZoneDraft};

// Re-export utils module
pub use utils::names;

// Re-export concrete providers (behind feature flags)
#[cfg(feature = "route53")]
pub use providers::route53;

#[cfg(feature = "route53")]
pub use providers::{Route53Api, Route53ApiStub, Route53Provider};
