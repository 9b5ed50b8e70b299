//! 内存版 Route 53（测试与一致性验证用）
//!
//! 行为尽量贴近真实服务：错误码与消息格式一致，批量变更要么全部生效要么全部不生效。

use std::collections::{BTreeMap, HashMap, HashSet};
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;

use crate::changeset::{BatchEntry, BatchViolation, plan_batch};
use crate::traits::RawApiError;
use crate::types::RecordKey;
use crate::utils::names::{ensure_dot_suffix, normalize_name};

use super::api::{ApiResult, Route53Api};
use super::types::{
    ChangeBatch, ChangeInfo, ChangeStatus, CreateHostedZoneInput, CreateHostedZoneOutput,
    HostedZone, ListHostedZonesOutput, ListResourceRecordSetsInput, ListResourceRecordSetsOutput,
    Route53Action, Route53RecordSet,
};
use super::{HOSTED_ZONE_PREFIX, with_zone_prefix};

/// Route 53 默认分页大小
const DEFAULT_PAGE_SIZE: usize = 100;

struct StubZone {
    zone: HostedZone,
    records: BTreeMap<RecordKey, Route53RecordSet>,
}

#[derive(Default)]
struct StubState {
    /// 以完整 ID（`/hostedzone/<name.>`）为键
    zones: BTreeMap<String, StubZone>,
    next_change: u64,
    /// change id -> 剩余 PENDING 轮询次数
    pending: HashMap<String, u32>,
    fail_next: Option<RawApiError>,
    /// 每次成功提交的批量大小
    submitted: Vec<usize>,
}

impl StubState {
    fn issue_change(&mut self, sync_delay: u32) -> ChangeInfo {
        self.next_change += 1;
        let id = format!("/change/C{}", self.next_change);
        let status = if sync_delay == 0 {
            ChangeStatus::Insync
        } else {
            self.pending.insert(id.clone(), sync_delay);
            ChangeStatus::Pending
        };
        ChangeInfo {
            id,
            status,
            submitted_at: Utc::now(),
            comment: None,
        }
    }

    fn zone_mut(&mut self, id: &str) -> ApiResult<&mut StubZone> {
        self.zones
            .get_mut(&with_zone_prefix(id))
            .ok_or_else(|| no_such_zone(id))
    }
}

fn no_such_zone(id: &str) -> RawApiError {
    RawApiError::with_code(
        "NoSuchHostedZone",
        format!("No hosted zone found with ID: {}", id.trim_start_matches(HOSTED_ZONE_PREFIX)),
    )
}

fn violation_error(violation: &BatchViolation) -> RawApiError {
    let key = violation.key();
    let (verb, outcome) = match violation {
        BatchViolation::Duplicate(_) => ("create", "it already exists"),
        BatchViolation::Missing(_) => ("delete", "it was not found"),
    };
    RawApiError::with_code(
        "InvalidChangeBatch",
        format!(
            "[Tried to {verb} resource record set [name='{}.', type='{}'] but {outcome}]",
            key.name(),
            key.rrs_type()
        ),
    )
}

/// In-memory stand-in for the Route 53 API.
///
/// Record set uniqueness and replace semantics are enforced with the same
/// batch planner the changeset uses, and a rejected batch leaves the zone
/// untouched. Zone ids are `/hostedzone/<name>` with the fully-qualified
/// name, so a stripped id equals the zone name.
pub struct Route53ApiStub {
    state: RwLock<StubState>,
    page_size: usize,
    latency: Option<Duration>,
    sync_delay: u32,
}

impl Default for Route53ApiStub {
    fn default() -> Self {
        Self::new()
    }
}

impl Route53ApiStub {
    pub fn new() -> Self {
        Self {
            state: RwLock::new(StubState::default()),
            page_size: DEFAULT_PAGE_SIZE,
            latency: None,
            sync_delay: 0,
        }
    }

    /// Start with an empty hosted zone named `name`.
    #[must_use]
    pub fn with_zone(mut self, name: &str) -> Self {
        let state = self.state.get_mut();
        let name = ensure_dot_suffix(&normalize_name(name));
        let zone = HostedZone {
            id: format!("{HOSTED_ZONE_PREFIX}{name}"),
            caller_reference: format!("seed-{name}"),
            name,
            resource_record_set_count: Some(0),
        };
        state.zones.insert(
            zone.id.clone(),
            StubZone {
                zone,
                records: BTreeMap::new(),
            },
        );
        self
    }

    /// Items per listing page; exercises pagination with small values.
    #[must_use]
    pub fn with_page_size(mut self, page_size: usize) -> Self {
        self.page_size = page_size.max(1);
        self
    }

    /// Delay every call by `latency`.
    #[must_use]
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = Some(latency);
        self
    }

    /// Report each change as `PENDING` for `polls` status queries before `INSYNC`.
    #[must_use]
    pub fn with_sync_delay(mut self, polls: u32) -> Self {
        self.sync_delay = polls;
        self
    }

    /// Make the next API call fail with `error`.
    pub async fn fail_next(&self, error: RawApiError) {
        self.state.write().await.fail_next = Some(error);
    }

    /// Sizes of the change batches accepted so far, in submission order.
    pub async fn submitted_batches(&self) -> Vec<usize> {
        self.state.read().await.submitted.clone()
    }

    /// Record sets currently stored in zone `id`, or `None` if the zone is unknown.
    pub async fn record_sets(&self, id: &str) -> Option<Vec<Route53RecordSet>> {
        self.state
            .read()
            .await
            .zones
            .get(&with_zone_prefix(id))
            .map(|zone| zone.records.values().cloned().collect())
    }

    /// 模拟网络延迟，并消费注入的故障
    async fn enter(&self, operation: &str) -> ApiResult<()> {
        if let Some(latency) = self.latency {
            tokio::time::sleep(latency).await;
        }
        if let Some(err) = self.state.write().await.fail_next.take() {
            log::debug!("[route53-stub] injected failure on {operation}: {err}");
            return Err(err);
        }
        Ok(())
    }
}

#[async_trait]
impl Route53Api for Route53ApiStub {
    async fn create_hosted_zone(
        &self,
        input: CreateHostedZoneInput,
    ) -> ApiResult<CreateHostedZoneOutput> {
        self.enter("create_hosted_zone").await?;

        let name = normalize_name(&input.name);
        if name.is_empty() {
            return Err(RawApiError::with_code(
                "InvalidDomainName",
                "Hosted zone name must not be empty",
            ));
        }
        let name = ensure_dot_suffix(&name);
        let id = format!("{HOSTED_ZONE_PREFIX}{name}");

        let mut state = self.state.write().await;
        if state.zones.contains_key(&id) {
            return Err(RawApiError::with_code(
                "HostedZoneAlreadyExists",
                format!("A hosted zone has already been created with the specified name {name}."),
            ));
        }
        let zone = HostedZone {
            id: id.clone(),
            name,
            caller_reference: input.caller_reference,
            resource_record_set_count: Some(0),
        };
        state.zones.insert(
            id,
            StubZone {
                zone: zone.clone(),
                records: BTreeMap::new(),
            },
        );
        let change_info = state.issue_change(self.sync_delay);
        Ok(CreateHostedZoneOutput {
            hosted_zone: zone,
            change_info,
        })
    }

    async fn list_hosted_zones(&self, marker: Option<String>) -> ApiResult<ListHostedZonesOutput> {
        self.enter("list_hosted_zones").await?;

        let state = self.state.read().await;
        let mut zones = state
            .zones
            .values()
            .filter(|z| marker.as_ref().is_none_or(|m| &z.zone.id >= m))
            .map(|z| HostedZone {
                resource_record_set_count: Some(z.records.len() as u64),
                ..z.zone.clone()
            });

        let hosted_zones: Vec<HostedZone> = zones.by_ref().take(self.page_size).collect();
        let next_marker = zones.next().map(|z| z.id);
        Ok(ListHostedZonesOutput {
            hosted_zones,
            is_truncated: next_marker.is_some(),
            next_marker,
        })
    }

    async fn delete_hosted_zone(&self, id: &str) -> ApiResult<ChangeInfo> {
        self.enter("delete_hosted_zone").await?;

        let mut state = self.state.write().await;
        let zone = state.zone_mut(id)?;
        if !zone.records.is_empty() {
            return Err(RawApiError::with_code(
                "HostedZoneNotEmpty",
                "The hosted zone contains resource record sets in addition to the default NS and SOA resource record sets.",
            ));
        }
        state.zones.remove(&with_zone_prefix(id));
        Ok(state.issue_change(self.sync_delay))
    }

    async fn list_resource_record_sets(
        &self,
        input: ListResourceRecordSetsInput,
    ) -> ApiResult<ListResourceRecordSetsOutput> {
        self.enter("list_resource_record_sets").await?;

        let page_size = input
            .max_items
            .map_or(self.page_size, |n| (n as usize).clamp(1, self.page_size));
        let start_name = input.start_record_name.as_deref().map(normalize_name);

        let mut state = self.state.write().await;
        let zone = state.zone_mut(&input.hosted_zone_id)?;
        let mut records = zone.records.iter().filter(|(key, _)| match &start_name {
            None => true,
            Some(name) => match input.start_record_type {
                Some(t) => (key.name(), key.rrs_type()) >= (name.as_str(), t),
                None => key.name() >= name.as_str(),
            },
        });

        let resource_record_sets: Vec<Route53RecordSet> = records
            .by_ref()
            .take(page_size)
            .map(|(_, rrset)| rrset.clone())
            .collect();
        let next = records.next().map(|(key, _)| key.clone());
        Ok(ListResourceRecordSetsOutput {
            resource_record_sets,
            is_truncated: next.is_some(),
            next_record_name: next.as_ref().map(|k| ensure_dot_suffix(k.name())),
            next_record_type: next.map(|k| k.rrs_type()),
        })
    }

    async fn change_resource_record_sets(
        &self,
        hosted_zone_id: &str,
        batch: ChangeBatch,
    ) -> ApiResult<ChangeInfo> {
        self.enter("change_resource_record_sets").await?;

        if batch.changes.is_empty() {
            return Err(RawApiError::with_code(
                "InvalidInput",
                "ChangeBatch must contain at least one change",
            ));
        }

        let mut state = self.state.write().await;
        let zone = state.zone_mut(hosted_zone_id)?;

        let apex = normalize_name(&zone.zone.name);
        for change in &batch.changes {
            let name = normalize_name(&change.resource_record_set.name);
            if name != apex && !name.ends_with(&format!(".{apex}")) {
                return Err(RawApiError::with_code(
                    "InvalidChangeBatch",
                    format!(
                        "[RRSet with DNS name {} is not permitted in zone {}]",
                        change.resource_record_set.name, zone.zone.name
                    ),
                ));
            }
        }

        let existing: HashSet<RecordKey> = zone.records.keys().cloned().collect();
        let order = plan_batch(&existing, &batch.changes).map_err(|v| violation_error(&v))?;

        for index in order {
            let change = &batch.changes[index];
            let key = change.key();
            match change.action {
                Route53Action::Create | Route53Action::Upsert => {
                    zone.records.insert(key, change.resource_record_set.clone());
                }
                Route53Action::Delete => {
                    zone.records.remove(&key);
                }
            }
        }

        state.submitted.push(batch.changes.len());
        Ok(state.issue_change(self.sync_delay))
    }

    async fn get_change(&self, id: &str) -> ApiResult<ChangeInfo> {
        self.enter("get_change").await?;

        let mut state = self.state.write().await;
        let known = id
            .strip_prefix("/change/C")
            .and_then(|n| n.parse::<u64>().ok())
            .is_some_and(|n| n >= 1 && n <= state.next_change);
        if !known {
            return Err(RawApiError::with_code(
                "NoSuchChange",
                format!("A change with the specified change ID does not exist: {id}"),
            ));
        }

        let status = match state.pending.get_mut(id) {
            Some(remaining) if *remaining > 1 => {
                *remaining -= 1;
                ChangeStatus::Pending
            }
            Some(_) => {
                state.pending.remove(id);
                ChangeStatus::Insync
            }
            None => ChangeStatus::Insync,
        };
        Ok(ChangeInfo {
            id: id.to_string(),
            status,
            submitted_at: Utc::now(),
            comment: None,
        })
    }
}
