use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Coarse classification of a [`ProviderError`].
///
/// Generic callers (an orchestrator, the conformance harness) branch on the
/// kind rather than on concrete variants.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ErrorKind {
    /// Malformed input rejected before any backend call.
    Validation,
    /// An add targets an identity key that is already present.
    Conflict,
    /// A record set or zone does not exist.
    NotFound,
    /// Transport, auth, availability or quota failure of the backing service.
    Backend,
    /// The caller's context was cancelled or its deadline passed.
    Cancelled,
    /// A terminal changeset was mutated or applied again.
    InvalidState,
}

/// Unified error type for all DNS provider operations.
///
/// Each variant includes a `provider` field identifying which provider produced the error,
/// plus variant-specific context. All variants are serializable for structured error reporting.
///
/// # Retries
///
/// The core never retries. A failed changeset may have been partially applied by the
/// backend, so callers must re-list the record sets before deciding what to resubmit.
#[derive(Debug, Clone, Error, Serialize, Deserialize)]
#[serde(tag = "code")]
pub enum ProviderError {
    /// Input was rejected locally (unsupported record type, malformed zone name, ...).
    #[error("[{provider}] Invalid parameter '{param}': {detail}")]
    Validation {
        /// Provider that produced the error.
        provider: String,
        /// Name of the invalid parameter.
        param: String,
        /// Description of what's wrong.
        detail: String,
    },

    /// A record set with the same name/type already exists, or is staged twice.
    #[error("[{provider}] Record set '{name}' ({record_type}) already exists")]
    Conflict {
        /// Provider that produced the error.
        provider: String,
        /// Name of the conflicting record set.
        name: String,
        /// Type of the conflicting record set.
        record_type: String,
        /// Original error message from the backend, if available.
        raw_message: Option<String>,
    },

    /// The record set targeted by a removal does not exist.
    #[error("[{provider}] Record set '{name}' ({record_type}) not found")]
    RecordNotFound {
        /// Provider that produced the error.
        provider: String,
        /// Name of the missing record set.
        name: String,
        /// Type of the missing record set.
        record_type: String,
        /// Original error message from the backend, if available.
        raw_message: Option<String>,
    },

    /// The specified zone does not exist (or was already removed).
    #[error("[{provider}] Zone '{zone}' not found")]
    ZoneNotFound {
        /// Provider that produced the error.
        provider: String,
        /// Zone name or ID that was not found.
        zone: String,
        /// Original error message from the backend, if available.
        raw_message: Option<String>,
    },

    /// The backing service failed (network, auth, throttling, quota, unknown codes).
    #[error("[{provider}] Backend error: {detail}")]
    Backend {
        /// Provider that produced the error.
        provider: String,
        /// Raw error code from the backend, if available.
        raw_code: Option<String>,
        /// Error details.
        detail: String,
    },

    /// The caller's context was cancelled or timed out while the call was in flight.
    #[error("[{provider}] {operation} cancelled: {detail}")]
    Cancelled {
        /// Provider that produced the error.
        provider: String,
        /// Operation that was interrupted.
        operation: String,
        /// Cancellation reason.
        detail: String,
    },

    /// A changeset that already went through `apply` was used again.
    #[error("[{provider}] Invalid changeset state: {detail}")]
    InvalidState {
        /// Provider that produced the error.
        provider: String,
        /// What was attempted.
        detail: String,
    },
}

impl ProviderError {
    /// 错误分类（对应契约中的六类错误）
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Validation { .. } => ErrorKind::Validation,
            Self::Conflict { .. } => ErrorKind::Conflict,
            Self::RecordNotFound { .. } | Self::ZoneNotFound { .. } => ErrorKind::NotFound,
            Self::Backend { .. } => ErrorKind::Backend,
            Self::Cancelled { .. } => ErrorKind::Cancelled,
            Self::InvalidState { .. } => ErrorKind::InvalidState,
        }
    }

    /// 是否为预期行为（用户输入、资源不存在等），用于日志分级。
    ///
    /// 返回 `true` 时应使用 `warn` 级别，`false` 时使用 `error` 级别。
    /// **新增变体时请同步更新此方法。**
    #[must_use]
    pub fn is_expected(&self) -> bool {
        !matches!(self, Self::Backend { .. })
    }

    /// Name of the provider that produced the error.
    pub fn provider(&self) -> &str {
        match self {
            Self::Validation { provider, .. }
            | Self::Conflict { provider, .. }
            | Self::RecordNotFound { provider, .. }
            | Self::ZoneNotFound { provider, .. }
            | Self::Backend { provider, .. }
            | Self::Cancelled { provider, .. }
            | Self::InvalidState { provider, .. } => provider,
        }
    }
}

/// Convenience type alias for `Result<T, ProviderError>`.
pub type Result<T> = std::result::Result<T, ProviderError>;
