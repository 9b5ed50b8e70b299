//! Route 53 API 类型定义

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::changeset::{BatchEntry, ChangeAction};
use crate::rrstype::RrsType;
use crate::types::RecordKey;

/// Hosted zone as returned by the API. `id` carries the `/hostedzone/` prefix.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct HostedZone {
    pub id: String,
    pub name: String,
    pub caller_reference: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub resource_record_set_count: Option<u64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct CreateHostedZoneInput {
    pub name: String,
    /// Unique per request; lets the service detect retried creations.
    pub caller_reference: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct CreateHostedZoneOutput {
    pub hosted_zone: HostedZone,
    pub change_info: ChangeInfo,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct ListHostedZonesOutput {
    pub hosted_zones: Vec<HostedZone>,
    pub is_truncated: bool,
    /// Where the next page starts, when truncated.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub next_marker: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct ResourceRecord {
    pub value: String,
}

/// Route 53 record set (wire form).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Route53RecordSet {
    pub name: String,
    #[serde(rename = "Type")]
    pub record_type: RrsType,
    /// Absent for alias records.
    #[serde(rename = "TTL", skip_serializing_if = "Option::is_none")]
    pub ttl: Option<i64>,
    #[serde(default)]
    pub resource_records: Vec<ResourceRecord>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct ListResourceRecordSetsInput {
    pub hosted_zone_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub start_record_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub start_record_type: Option<RrsType>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_items: Option<u32>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct ListResourceRecordSetsOutput {
    pub resource_record_sets: Vec<Route53RecordSet>,
    pub is_truncated: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub next_record_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub next_record_type: Option<RrsType>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Route53Action {
    Create,
    Delete,
    Upsert,
}

impl From<ChangeAction> for Route53Action {
    fn from(action: ChangeAction) -> Self {
        match action {
            ChangeAction::Add => Self::Create,
            ChangeAction::Remove => Self::Delete,
            ChangeAction::Upsert => Self::Upsert,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Route53Change {
    pub action: Route53Action,
    pub resource_record_set: Route53RecordSet,
}

impl BatchEntry for Route53Change {
    fn action(&self) -> ChangeAction {
        match self.action {
            Route53Action::Create => ChangeAction::Add,
            Route53Action::Delete => ChangeAction::Remove,
            Route53Action::Upsert => ChangeAction::Upsert,
        }
    }

    fn key(&self) -> RecordKey {
        RecordKey::new(
            &self.resource_record_set.name,
            self.resource_record_set.record_type,
        )
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct ChangeBatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub comment: Option<String>,
    pub changes: Vec<Route53Change>,
}

/// 变更传播状态：PENDING -> INSYNC
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ChangeStatus {
    Pending,
    Insync,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct ChangeInfo {
    pub id: String,
    pub status: ChangeStatus,
    pub submitted_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub comment: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn record_set_uses_route53_field_names() {
        let rrset = Route53RecordSet {
            name: "www.example.com.".to_string(),
            record_type: RrsType::A,
            ttl: Some(300),
            resource_records: vec![ResourceRecord {
                value: "192.0.2.1".to_string(),
            }],
        };
        let json = serde_json::to_value(&rrset).unwrap();
        assert_eq!(json["Type"], "A");
        assert_eq!(json["TTL"], 300);
        assert_eq!(json["ResourceRecords"][0]["Value"], "192.0.2.1");
    }

    #[test]
    fn change_status_wire_names() {
        let info: ChangeInfo = serde_json::from_str(
            r#"{"Id":"/change/C1","Status":"INSYNC","SubmittedAt":"2024-01-01T00:00:00Z"}"#,
        )
        .unwrap();
        assert_eq!(info.status, ChangeStatus::Insync);
        assert_eq!(
            serde_json::to_string(&Route53Action::Upsert).unwrap(),
            "\"UPSERT\""
        );
    }

    #[test]
    fn wire_change_exposes_batch_key() {
        let change = Route53Change {
            action: Route53Action::Delete,
            resource_record_set: Route53RecordSet {
                name: "WWW.example.com.".to_string(),
                record_type: RrsType::Txt,
                ttl: None,
                resource_records: Vec::new(),
            },
        };
        assert_eq!(BatchEntry::action(&change), ChangeAction::Remove);
        assert_eq!(change.key(), RecordKey::new("www.example.com", RrsType::Txt));
    }
}
