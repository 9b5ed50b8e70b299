//! Provider configuration.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{ProviderError, Result};

/// Route 53 accepts at most 1000 changes per `ChangeResourceRecordSets` call.
pub const MAX_CHANGES_PER_BATCH: usize = 1000;

const DEFAULT_SYNC_POLL_INTERVAL_MS: u64 = 1000;

/// Optional settings applied when a provider is constructed.
///
/// Credentials are not part of this struct: providers receive an already
/// authenticated client handle. `region` and `endpoint` are informational
/// overrides for whoever built that handle.
///
/// # Default
///
/// No overrides, batches of 1000 changes, no waiting for sync.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ProviderConfig {
    /// Region override, if any. Checked by `create_provider`; the injected
    /// client owns signing, so the crate itself never routes by it.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub region: Option<String>,
    /// Endpoint override, if any.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub endpoint: Option<String>,
    /// Upper bound on changes submitted in one backend request.
    pub max_batch_size: usize,
    /// Poll the backend after each batch until the change reports in-sync.
    pub wait_for_sync: bool,
    /// Delay between change status polls, in milliseconds.
    pub sync_poll_interval_ms: u64,
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            region: None,
            endpoint: None,
            max_batch_size: MAX_CHANGES_PER_BATCH,
            wait_for_sync: false,
            sync_poll_interval_ms: DEFAULT_SYNC_POLL_INTERVAL_MS,
        }
    }
}

impl ProviderConfig {
    /// Parse a JSON document; missing fields take their defaults.
    pub fn from_json(json: &str) -> Result<Self> {
        serde_json::from_str::<Self>(json)
            .map(|config| config.validated())
            .map_err(|e| ProviderError::Validation {
                provider: "dnsprovider".to_string(),
                param: "config".to_string(),
                detail: e.to_string(),
            })
    }

    /// Clamp values to ranges the backends accept.
    ///
    /// - `max_batch_size` is clamped to `1..=1000`
    /// - `sync_poll_interval_ms` is raised to at least 1
    #[must_use]
    pub fn validated(&self) -> Self {
        Self {
            max_batch_size: self.max_batch_size.clamp(1, MAX_CHANGES_PER_BATCH),
            sync_poll_interval_ms: self.sync_poll_interval_ms.max(1),
            ..self.clone()
        }
    }

    pub fn sync_poll_interval(&self) -> Duration {
        Duration::from_millis(self.sync_poll_interval_ms)
    }
}
