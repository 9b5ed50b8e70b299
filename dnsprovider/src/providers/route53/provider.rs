//! Route 53 DnsProvider trait 实现

use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;

use crate::changeset::{Change, Changeset, ChangesetApplier, split_batch};
use crate::config::ProviderConfig;
use crate::context::Context;
use crate::error::{ProviderError, Result};
use crate::traits::{
    DnsProvider, ErrorContext, ProviderErrorMapper, ResourceRecordSets, Zone, Zones,
};
use crate::types::{ResourceRecordSet, ZoneDraft};
use crate::utils::log_sanitizer::summarize_values;
use crate::utils::names::{check_zone_name, ensure_dot_suffix, names_match, qualify_name};

use super::api::Route53Api;
use super::types::{
    ChangeBatch, ChangeInfo, ChangeStatus, CreateHostedZoneInput, HostedZone,
    ListResourceRecordSetsInput, ResourceRecord, Route53Change, Route53RecordSet,
};
use super::{Route53Service, strip_zone_prefix, with_zone_prefix};

// ============ 格式转换 ============

/// 将 Route 53 记录集转换为通用记录集
///
/// 别名记录没有 TTL，按 0 处理。
fn from_wire(rrset: Route53RecordSet) -> ResourceRecordSet {
    let ttl = rrset
        .ttl
        .and_then(|ttl| u32::try_from(ttl).ok())
        .unwrap_or(0);
    ResourceRecordSet::new(
        rrset.name,
        rrset.resource_records.into_iter().map(|r| r.value),
        ttl,
        rrset.record_type,
    )
}

/// 将通用记录集转换为 Route 53 格式（名称补齐末尾的点）
fn to_wire(rrset: &ResourceRecordSet) -> Route53RecordSet {
    Route53RecordSet {
        name: ensure_dot_suffix(rrset.name()),
        record_type: rrset.rrs_type(),
        ttl: Some(i64::from(rrset.ttl())),
        resource_records: rrset
            .rrdatas()
            .map(|value| ResourceRecord {
                value: value.to_string(),
            })
            .collect(),
    }
}

impl Route53Service {
    /// 轮询 `get_change` 直到变更传播完成（INSYNC）
    pub(crate) async fn wait_for_change(&self, ctx: &Context, mut info: ChangeInfo) -> Result<()> {
        while info.status == ChangeStatus::Pending {
            ctx.sleep(
                self.provider_name(),
                "wait_for_change",
                self.config.sync_poll_interval(),
            )
            .await?;
            let id = info.id.clone();
            info = self
                .call(
                    ctx,
                    "get_change",
                    ErrorContext::default(),
                    self.api.get_change(&id),
                )
                .await?;
        }
        log::debug!(
            "[{}] change {} in sync (submitted {})",
            self.provider_name(),
            info.id,
            info.submitted_at.to_rfc3339()
        );
        Ok(())
    }
}

// ============ Provider ============

/// Amazon Route 53 DNS Provider
///
/// Zone management and record set management are both supported.
pub struct Route53Provider {
    service: Arc<Route53Service>,
}

impl Route53Provider {
    pub fn new(api: Arc<dyn Route53Api>) -> Self {
        Self::with_config(api, ProviderConfig::default())
    }

    /// Out-of-range config values are clamped, see [`ProviderConfig::validated`].
    pub fn with_config(api: Arc<dyn Route53Api>, config: ProviderConfig) -> Self {
        Self {
            service: Arc::new(Route53Service::new(api, config)),
        }
    }
}

impl fmt::Debug for Route53Provider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Route53Provider")
            .field("config", &self.service.config)
            .finish_non_exhaustive()
    }
}

impl DnsProvider for Route53Provider {
    fn id(&self) -> &'static str {
        "route53"
    }

    fn zones(&self) -> Option<Arc<dyn Zones>> {
        Some(Arc::new(Route53Zones {
            service: self.service.clone(),
        }))
    }
}

// ============ Zones ============

struct Route53Zones {
    service: Arc<Route53Service>,
}

impl Route53Zones {
    fn to_zone(&self, zone: HostedZone) -> Arc<dyn Zone> {
        Arc::new(Route53Zone {
            service: self.service.clone(),
            id: strip_zone_prefix(&zone.id).to_string(),
            name: zone.name,
        })
    }
}

#[async_trait]
impl Zones for Route53Zones {
    async fn list(&self, ctx: &Context) -> Result<Vec<Arc<dyn Zone>>> {
        let mut zones = Vec::new();
        let mut marker: Option<String> = None;

        loop {
            let page = self
                .service
                .call(
                    ctx,
                    "list_hosted_zones",
                    ErrorContext::default(),
                    self.service.api.list_hosted_zones(marker.take()),
                )
                .await?;
            zones.extend(page.hosted_zones.into_iter().map(|z| self.to_zone(z)));

            match page.next_marker {
                Some(next) if page.is_truncated => marker = Some(next),
                _ => break,
            }
        }

        log::debug!("[{}] listed {} zones", self.service.provider_name(), zones.len());
        Ok(zones)
    }

    fn new_zone(&self, name: &str) -> Result<ZoneDraft> {
        check_zone_name(name).map_err(|detail| ProviderError::Validation {
            provider: self.service.provider_name().to_string(),
            param: "name".to_string(),
            detail,
        })?;
        Ok(ZoneDraft::new(ensure_dot_suffix(name)))
    }

    async fn add(&self, ctx: &Context, draft: ZoneDraft) -> Result<Arc<dyn Zone>> {
        let input = CreateHostedZoneInput {
            name: draft.name().to_string(),
            caller_reference: uuid::Uuid::new_v4().to_string(),
        };
        log::info!(
            "[{}] creating zone {} (caller reference {})",
            self.service.provider_name(),
            input.name,
            input.caller_reference
        );

        let output = self
            .service
            .call(
                ctx,
                "create_hosted_zone",
                ErrorContext::zone(draft.name()),
                self.service.api.create_hosted_zone(input),
            )
            .await?;
        if self.service.config.wait_for_sync {
            self.service.wait_for_change(ctx, output.change_info).await?;
        }
        Ok(self.to_zone(output.hosted_zone))
    }

    async fn remove(&self, ctx: &Context, zone: &dyn Zone) -> Result<()> {
        let id = with_zone_prefix(zone.id());
        let info = self
            .service
            .call(
                ctx,
                "delete_hosted_zone",
                ErrorContext::zone(zone.name()),
                self.service.api.delete_hosted_zone(&id),
            )
            .await?;
        log::info!("[{}] deleted zone {}", self.service.provider_name(), zone.name());
        if self.service.config.wait_for_sync {
            self.service.wait_for_change(ctx, info).await?;
        }
        Ok(())
    }
}

// ============ Zone ============

struct Route53Zone {
    service: Arc<Route53Service>,
    /// 已去掉 `/hostedzone/` 前缀
    id: String,
    name: String,
}

impl fmt::Debug for Route53Zone {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Route53Zone")
            .field("id", &self.id)
            .field("name", &self.name)
            .finish()
    }
}

impl Zone for Route53Zone {
    fn name(&self) -> &str {
        &self.name
    }

    fn id(&self) -> &str {
        &self.id
    }

    fn resource_record_sets(&self) -> Option<Arc<dyn ResourceRecordSets>> {
        Some(Arc::new(Route53ResourceRecordSets {
            service: self.service.clone(),
            zone_id: with_zone_prefix(&self.id),
            zone_name: self.name.clone(),
        }))
    }
}

// ============ Resource Record Sets ============

struct Route53ResourceRecordSets {
    service: Arc<Route53Service>,
    /// 完整 ID（带前缀），直接用于 API 调用
    zone_id: String,
    zone_name: String,
}

impl Route53ResourceRecordSets {
    /// 从 `start_name` 开始分页读取；给定 `only_name` 时遇到第一个不同名称即停止
    async fn fetch(
        &self,
        ctx: &Context,
        start_name: Option<String>,
        only_name: Option<&str>,
    ) -> Result<Vec<ResourceRecordSet>> {
        let mut input = ListResourceRecordSetsInput {
            hosted_zone_id: self.zone_id.clone(),
            start_record_name: start_name,
            ..ListResourceRecordSetsInput::default()
        };
        let mut rrsets = Vec::new();

        loop {
            let page = self
                .service
                .call(
                    ctx,
                    "list_resource_record_sets",
                    ErrorContext::zone(&self.zone_name),
                    self.service.api.list_resource_record_sets(input.clone()),
                )
                .await?;

            for rrset in page.resource_record_sets {
                if let Some(name) = only_name
                    && !names_match(&rrset.name, name)
                {
                    return Ok(rrsets);
                }
                rrsets.push(from_wire(rrset));
            }

            if !page.is_truncated || page.next_record_name.is_none() {
                break;
            }
            input.start_record_name = page.next_record_name;
            input.start_record_type = page.next_record_type;
        }

        Ok(rrsets)
    }
}

#[async_trait]
impl ResourceRecordSets for Route53ResourceRecordSets {
    fn zone_name(&self) -> &str {
        &self.zone_name
    }

    async fn list(&self, ctx: &Context) -> Result<Vec<ResourceRecordSet>> {
        self.fetch(ctx, None, None).await
    }

    /// Uses `StartRecordName` so only the pages holding `name` are read.
    async fn get(&self, ctx: &Context, name: &str) -> Result<Vec<ResourceRecordSet>> {
        let name = qualify_name(name, &self.zone_name);
        self.fetch(ctx, Some(name.clone()), Some(&name)).await
    }

    fn start_changeset(&self) -> Changeset<'_> {
        Changeset::new(self)
    }
}

#[async_trait]
impl ChangesetApplier for Route53ResourceRecordSets {
    fn provider_name(&self) -> &'static str {
        self.service.provider_name()
    }

    async fn submit(&self, ctx: &Context, changes: &[Change]) -> Result<()> {
        let wire: Vec<Route53Change> = changes
            .iter()
            .map(|change| Route53Change {
                action: change.action.into(),
                resource_record_set: to_wire(&change.rrset),
            })
            .collect();

        let batches = split_batch(&wire, self.service.config.max_batch_size);
        let total = batches.len();

        for (index, batch) in batches.into_iter().enumerate() {
            log::debug!(
                "[{}] zone {}: submitting batch {}/{total} ({} changes: {})",
                self.provider_name(),
                self.zone_name,
                index + 1,
                batch.len(),
                summarize_values(batch.iter().map(|c| c.resource_record_set.name.as_str()))
            );

            let info = self
                .service
                .call(
                    ctx,
                    "change_resource_record_sets",
                    ErrorContext::zone(&self.zone_name),
                    self.service.api.change_resource_record_sets(
                        &self.zone_id,
                        ChangeBatch {
                            comment: None,
                            changes: batch,
                        },
                    ),
                )
                .await
                .inspect_err(|_| {
                    if index > 0 {
                        log::warn!(
                            "[{}] zone {}: batch {}/{total} failed after {index} committed batches",
                            self.provider_name(),
                            self.zone_name,
                            index + 1
                        );
                    }
                })?;

            if self.service.config.wait_for_sync {
                self.service.wait_for_change(ctx, info).await?;
            }
        }

        Ok(())
    }
}
