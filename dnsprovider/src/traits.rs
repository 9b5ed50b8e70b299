use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::changeset::Changeset;
use crate::context::Context;
use crate::error::{ProviderError, Result};
use crate::rrstype::RrsType;
use crate::types::{RecordKey, ResourceRecordSet, ZoneDraft};
use crate::utils::names::{names_match, qualify_name};

/// 原始后端错误（后端客户端返回，由各 Provider 映射到统一错误类型）
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawApiError {
    /// 错误码（各后端格式不同）
    pub code: Option<String>,
    /// 原始错误消息
    pub message: String,
}

impl RawApiError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            code: None,
            message: message.into(),
        }
    }

    pub fn with_code(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: Some(code.into()),
            message: message.into(),
        }
    }
}

impl fmt::Display for RawApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.code {
            Some(code) => write!(f, "{code}: {}", self.message),
            None => f.write_str(&self.message),
        }
    }
}

/// 错误上下文信息（内部使用）
/// 用于在映射错误时提供额外信息
#[derive(Debug, Clone, Default)]
pub(crate) struct ErrorContext {
    /// 记录名称（用于 `Conflict` / `RecordNotFound`）
    pub record_name: Option<String>,
    /// 记录类型
    pub record_type: Option<RrsType>,
    /// 区域名称或 ID（用于 `ZoneNotFound`）
    pub zone: Option<String>,
}

impl ErrorContext {
    pub fn zone(zone: impl Into<String>) -> Self {
        Self {
            zone: Some(zone.into()),
            ..Self::default()
        }
    }
}

/// Provider 错误映射 Trait（内部使用）
/// 各 Provider 实现此 trait 以将原始后端错误映射到统一错误类型
pub(crate) trait ProviderErrorMapper {
    /// 返回 Provider 标识符
    fn provider_name(&self) -> &'static str;

    /// 将原始后端错误映射到统一错误类型
    fn map_error(&self, raw: RawApiError, context: ErrorContext) -> ProviderError;

    /// 快捷方法：未识别的后端错误（fallback）
    fn backend_error(&self, raw: RawApiError) -> ProviderError {
        ProviderError::Backend {
            provider: self.provider_name().to_string(),
            raw_code: raw.code,
            detail: raw.message,
        }
    }
}

/// Entry point of a DNS provider.
///
/// Sub-interfaces are negotiated: a provider that cannot manage zones returns
/// `None` from [`zones`](Self::zones) instead of handing out a broken registry.
pub trait DnsProvider: Send + Sync {
    /// 提供商标识符
    fn id(&self) -> &'static str;

    /// The zone registry, if this provider supports zone management.
    fn zones(&self) -> Option<Arc<dyn Zones>>;
}

/// Zone registry for one account.
#[async_trait]
pub trait Zones: Send + Sync {
    /// All zones owned by the account, freshly queried from the backend.
    async fn list(&self, ctx: &Context) -> Result<Vec<Arc<dyn Zone>>>;

    /// Build an unpersisted zone descriptor. Does not contact the backend.
    fn new_zone(&self, name: &str) -> Result<ZoneDraft>;

    /// Create the zone in the backend.
    ///
    /// Not deduplicated: whether a second zone with the same name is accepted is
    /// up to the backend.
    async fn add(&self, ctx: &Context, draft: ZoneDraft) -> Result<Arc<dyn Zone>>;

    /// Delete the zone. Fails with `ZoneNotFound` if it is already gone.
    async fn remove(&self, ctx: &Context, zone: &dyn Zone) -> Result<()>;
}

/// A persisted zone.
pub trait Zone: Send + Sync + fmt::Debug {
    /// Fully-qualified zone name.
    fn name(&self) -> &str;

    /// Provider-assigned identifier, with any provider prefix removed.
    fn id(&self) -> &str;

    /// The record set store of this zone, if supported.
    fn resource_record_sets(&self) -> Option<Arc<dyn ResourceRecordSets>>;
}

/// Record set store of one zone.
///
/// Listing always goes to the backend; nothing is memoized, so changes made by
/// other clients are visible on the next call.
///
/// Concurrent changesets against the same zone are not coordinated here.
/// Callers that need exactly-once batches across processes must serialize
/// externally.
#[async_trait]
pub trait ResourceRecordSets: Send + Sync {
    /// Name of the zone this store belongs to.
    fn zone_name(&self) -> &str;

    /// Every record set in the zone. No particular order is promised.
    async fn list(&self, ctx: &Context) -> Result<Vec<ResourceRecordSet>>;

    /// All record sets at `name`, of any type.
    async fn get(&self, ctx: &Context, name: &str) -> Result<Vec<ResourceRecordSet>> {
        let name = qualify_name(name, self.zone_name());
        Ok(self
            .list(ctx)
            .await?
            .into_iter()
            .filter(|rrset| names_match(rrset.name(), &name))
            .collect())
    }

    /// The record set with exactly this identity key, if present.
    ///
    /// A relative key name is resolved against the zone first.
    async fn find(&self, ctx: &Context, key: &RecordKey) -> Result<Option<ResourceRecordSet>> {
        let key = RecordKey::new(&qualify_name(key.name(), self.zone_name()), key.rrs_type());
        Ok(self
            .list(ctx)
            .await?
            .into_iter()
            .find(|rrset| rrset.key() == key))
    }

    /// Build a record set for this zone. Pure: no backend call, no duplicate check.
    ///
    /// `name` may be relative (`www`, `@`) or absolute; relative names are
    /// qualified with [`zone_name`](Self::zone_name).
    fn new_record_set(
        &self,
        name: &str,
        rrdatas: Vec<String>,
        ttl: u32,
        rrs_type: RrsType,
    ) -> ResourceRecordSet {
        ResourceRecordSet::new(qualify_name(name, self.zone_name()), rrdatas, ttl, rrs_type)
    }

    /// A fresh, empty, single-use changeset bound to this store.
    fn start_changeset(&self) -> Changeset<'_>;
}
