//! Route 53 error mapping

use crate::error::ProviderError;
use crate::traits::{ErrorContext, ProviderErrorMapper, RawApiError};

use super::Route53Service;

/// 从 Route 53 错误消息中提取 `field='value'`
///
/// `InvalidChangeBatch` 消息形如
/// `Tried to create resource record set [name='www.example.com.', type='A'] but it already exists`
fn quoted_field<'a>(message: &'a str, field: &str) -> Option<&'a str> {
    let marker = format!("{field}='");
    let start = message.find(&marker)? + marker.len();
    let len = message[start..].find('\'')?;
    Some(&message[start..start + len])
}

/// Route 53 error code mapping
/// Reference: <https://docs.aws.amazon.com/Route53/latest/APIReference/CommonErrors.html>
impl ProviderErrorMapper for Route53Service {
    fn provider_name(&self) -> &'static str {
        "route53"
    }

    fn map_error(&self, raw: RawApiError, context: ErrorContext) -> ProviderError {
        match raw.code.as_deref() {
            Some("NoSuchHostedZone") => ProviderError::ZoneNotFound {
                provider: self.provider_name().to_string(),
                zone: context.zone.unwrap_or_else(|| "<unknown>".to_string()),
                raw_message: Some(raw.message),
            },

            // 同一错误码覆盖重复创建、删除不存在的记录以及格式错误
            Some("InvalidChangeBatch") => {
                let name = quoted_field(&raw.message, "name")
                    .map(str::to_string)
                    .or(context.record_name)
                    .unwrap_or_else(|| "<unknown>".to_string());
                let record_type = quoted_field(&raw.message, "type")
                    .map(str::to_string)
                    .or_else(|| context.record_type.map(|t| t.to_string()))
                    .unwrap_or_else(|| "<unknown>".to_string());

                if raw.message.contains("already exists") {
                    ProviderError::Conflict {
                        provider: self.provider_name().to_string(),
                        name,
                        record_type,
                        raw_message: Some(raw.message),
                    }
                } else if raw.message.contains("not found") {
                    ProviderError::RecordNotFound {
                        provider: self.provider_name().to_string(),
                        name,
                        record_type,
                        raw_message: Some(raw.message),
                    }
                } else {
                    ProviderError::Validation {
                        provider: self.provider_name().to_string(),
                        param: "change_batch".to_string(),
                        detail: raw.message,
                    }
                }
            }

            Some(code @ ("InvalidInput" | "InvalidDomainName")) => ProviderError::Validation {
                provider: self.provider_name().to_string(),
                param: if code == "InvalidDomainName" {
                    "name".to_string()
                } else {
                    "input".to_string()
                },
                detail: raw.message,
            },

            // HostedZoneNotEmpty, HostedZoneAlreadyExists, Throttling,
            // PriorRequestNotComplete, AccessDenied ...
            _ => self.backend_error(raw),
        }
    }
}
