//! Amazon Route 53 Provider
//!
//! Speaks to Route 53 through an injected [`Route53Api`] handle. Transport,
//! credentials and signing belong to whoever builds that handle; this module
//! only translates between the provider-agnostic model and Route 53's wire
//! shapes.

mod api;
mod error;
mod provider;
mod stubs;
mod types;

use std::future::Future;
use std::sync::Arc;

use crate::config::ProviderConfig;
use crate::context::Context;
use crate::error::Result;
use crate::traits::{ErrorContext, ProviderErrorMapper};
use crate::utils::log_sanitizer::truncate_for_log;

pub use api::{ApiResult, Route53Api};
pub use provider::Route53Provider;
pub use stubs::Route53ApiStub;
pub use types::{
    ChangeBatch, ChangeInfo, ChangeStatus, CreateHostedZoneInput, CreateHostedZoneOutput,
    HostedZone, ListHostedZonesOutput, ListResourceRecordSetsInput, ListResourceRecordSetsOutput,
    ResourceRecord, Route53Action, Route53Change, Route53RecordSet,
};

/// Route 53 前缀：`/hostedzone/Z123` -> `Z123`
pub(crate) const HOSTED_ZONE_PREFIX: &str = "/hostedzone/";

/// 去掉 hosted zone ID 前缀
pub(crate) fn strip_zone_prefix(id: &str) -> &str {
    id.strip_prefix(HOSTED_ZONE_PREFIX).unwrap_or(id)
}

/// 补齐 hosted zone ID 前缀
pub(crate) fn with_zone_prefix(id: &str) -> String {
    if id.starts_with(HOSTED_ZONE_PREFIX) {
        id.to_string()
    } else {
        format!("{HOSTED_ZONE_PREFIX}{id}")
    }
}

/// Shared state behind the provider and every zone/store handle it hands out.
pub(crate) struct Route53Service {
    pub(crate) api: Arc<dyn Route53Api>,
    pub(crate) config: ProviderConfig,
}

impl Route53Service {
    pub(crate) fn new(api: Arc<dyn Route53Api>, config: ProviderConfig) -> Self {
        Self {
            api,
            config: config.validated(),
        }
    }

    /// 执行一次 API 调用：受 `ctx` 约束，并把原始错误映射为 `ProviderError`
    pub(crate) async fn call<T, F>(
        &self,
        ctx: &Context,
        operation: &str,
        error_ctx: ErrorContext,
        fut: F,
    ) -> Result<T>
    where
        F: Future<Output = ApiResult<T>> + Send,
    {
        ctx.run(self.provider_name(), operation, async {
            fut.await.map_err(|raw| {
                log::debug!(
                    "[{}] {operation} failed: {}",
                    self.provider_name(),
                    truncate_for_log(&raw.to_string())
                );
                self.map_error(raw, error_ctx)
            })
        })
        .await
    }
}
