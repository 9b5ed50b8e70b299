//! Provider factory functions.

use std::fmt;
use std::sync::Arc;

use crate::config::ProviderConfig;
use crate::error::{ProviderError, Result};
use crate::traits::DnsProvider;

#[cfg(feature = "route53")]
use crate::providers::{Route53Api, Route53Provider};

/// An authenticated backend client handle, tagged by provider.
///
/// The crate never builds clients itself: credentials, transport and signing
/// stay with the caller.
#[derive(Clone)]
pub enum ProviderClient {
    /// Amazon Route 53.
    #[cfg(feature = "route53")]
    Route53(Arc<dyn Route53Api>),
}

impl ProviderClient {
    /// Identifier of the provider this handle belongs to.
    pub fn provider_id(&self) -> &'static str {
        match self {
            #[cfg(feature = "route53")]
            Self::Route53(_) => "route53",
        }
    }
}

impl fmt::Debug for ProviderClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("ProviderClient")
            .field(&self.provider_id())
            .finish()
    }
}

/// Creates a [`DnsProvider`] from a client handle and configuration.
///
/// The concrete provider type is determined by the [`ProviderClient`] variant.
/// The returned provider is wrapped in `Arc<dyn DnsProvider>` for easy sharing
/// across async tasks.
///
/// # Errors
///
/// [`ProviderError::Validation`] if `config.region` is set but malformed, or if
/// `config.endpoint` is set but is not an `http://` or `https://` URL.
///
/// # Examples
///
/// ```rust
/// use std::sync::Arc;
/// use dnsprovider::{create_provider, ProviderClient, ProviderConfig, Route53ApiStub};
///
/// let client = ProviderClient::Route53(Arc::new(Route53ApiStub::new()));
/// let provider = create_provider(client, ProviderConfig::default()).unwrap();
/// assert_eq!(provider.id(), "route53");
/// ```
pub fn create_provider(
    client: ProviderClient,
    config: ProviderConfig,
) -> Result<Arc<dyn DnsProvider>> {
    if let Some(endpoint) = config.endpoint.as_deref()
        && !(endpoint.starts_with("http://") || endpoint.starts_with("https://"))
    {
        return Err(ProviderError::Validation {
            provider: client.provider_id().to_string(),
            param: "endpoint".to_string(),
            detail: format!("endpoint must be an http(s) URL, got '{endpoint}'"),
        });
    }

    if let Some(region) = config.region.as_deref()
        && (region.is_empty()
            || !region
                .chars()
                .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-'))
    {
        return Err(ProviderError::Validation {
            provider: client.provider_id().to_string(),
            param: "region".to_string(),
            detail: format!("region must be lowercase letters, digits and '-', got '{region}'"),
        });
    }

    let config = config.validated();
    log::debug!(
        "[{}] creating provider (region={}, max_batch_size={}, wait_for_sync={})",
        client.provider_id(),
        config.region.as_deref().unwrap_or("default"),
        config.max_batch_size,
        config.wait_for_sync
    );

    match client {
        #[cfg(feature = "route53")]
        ProviderClient::Route53(api) => Ok(Arc::new(Route53Provider::with_config(api, config))),
    }
}

/// Identifiers of all providers enabled via feature flags.
pub fn available_providers() -> Vec<&'static str> {
    vec![
        #[cfg(feature = "route53")]
        "route53",
    ]
}

#[cfg(all(test, feature = "route53"))]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use crate::providers::Route53ApiStub;

    fn client() -> ProviderClient {
        ProviderClient::Route53(Arc::new(Route53ApiStub::new()))
    }

    #[test]
    fn creates_route53_provider() {
        let provider = create_provider(client(), ProviderConfig::default()).unwrap();
        assert_eq!(provider.id(), "route53");
        assert!(provider.zones().is_some());
    }

    #[test]
    fn rejects_malformed_endpoint() {
        let config = ProviderConfig {
            endpoint: Some(String::new()),
            ..ProviderConfig::default()
        };
        let err = create_provider(client(), config).err().unwrap();
        assert_eq!(err.kind(), ErrorKind::Validation);
        assert_eq!(err.provider(), "route53");
    }

    #[test]
    fn rejects_malformed_region() {
        for region in ["", "US East 1"] {
            let config = ProviderConfig {
                region: Some(region.to_string()),
                ..ProviderConfig::default()
            };
            let err = create_provider(client(), config).err().unwrap();
            assert!(matches!(err, ProviderError::Validation { ref param, .. } if param == "region"));
        }
    }

    #[test]
    fn accepts_region_override() {
        let config = ProviderConfig {
            region: Some("us-east-1".to_string()),
            ..ProviderConfig::default()
        };
        assert!(create_provider(client(), config).is_ok());
    }

    #[test]
    fn accepts_local_endpoint() {
        let config = ProviderConfig {
            endpoint: Some("http://localhost:4566".to_string()),
            ..ProviderConfig::default()
        };
        assert!(create_provider(client(), config).is_ok());
    }

    #[test]
    fn lists_enabled_providers() {
        assert_eq!(available_providers(), vec!["route53"]);
    }
}
