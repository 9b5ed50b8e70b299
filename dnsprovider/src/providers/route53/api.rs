//! Route 53 客户端接口

use async_trait::async_trait;

use crate::traits::RawApiError;

use super::types::{
    ChangeBatch, ChangeInfo, CreateHostedZoneInput, CreateHostedZoneOutput,
    ListHostedZonesOutput, ListResourceRecordSetsInput, ListResourceRecordSetsOutput,
};

pub type ApiResult<T> = std::result::Result<T, RawApiError>;

/// The subset of the Route 53 API this crate drives.
///
/// Implementations own transport, signing and retries. Errors come back as
/// [`RawApiError`] with the service's error code (`NoSuchHostedZone`,
/// `InvalidChangeBatch`, ...) and are mapped by the provider.
///
/// Hosted zone ids passed in and out carry the `/hostedzone/` prefix.
#[async_trait]
pub trait Route53Api: Send + Sync {
    async fn create_hosted_zone(
        &self,
        input: CreateHostedZoneInput,
    ) -> ApiResult<CreateHostedZoneOutput>;

    /// One page of hosted zones, starting at `marker` when given.
    async fn list_hosted_zones(&self, marker: Option<String>) -> ApiResult<ListHostedZonesOutput>;

    async fn delete_hosted_zone(&self, id: &str) -> ApiResult<ChangeInfo>;

    async fn list_resource_record_sets(
        &self,
        input: ListResourceRecordSetsInput,
    ) -> ApiResult<ListResourceRecordSetsOutput>;

    /// Apply every change in `batch` atomically, or none of them.
    async fn change_resource_record_sets(
        &self,
        hosted_zone_id: &str,
        batch: ChangeBatch,
    ) -> ApiResult<ChangeInfo>;

    async fn get_change(&self, id: &str) -> ApiResult<ChangeInfo>;
}
