use std::collections::BTreeSet;
use std::fmt;

use serde::Serialize;

use crate::rrstype::RrsType;
use crate::utils::names::{names_match, normalize_name};

// ============ Identity Key ============

/// Identity of a record set inside one zone: `(name, type)`.
///
/// The name is stored normalized (lower-case, no trailing dot), so keys built
/// from `www.example.com.` and `WWW.example.com` compare equal.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct RecordKey {
    name: String,
    rrs_type: RrsType,
}

impl RecordKey {
    pub fn new(name: &str, rrs_type: RrsType) -> Self {
        Self {
            name: normalize_name(name),
            rrs_type,
        }
    }

    /// Normalized record name.
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn rrs_type(&self) -> RrsType {
        self.rrs_type
    }
}

impl fmt::Display for RecordKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.name, self.rrs_type)
    }
}

// ============ Resource Record Set ============

/// One resource record set: every value of one type at one name, sharing a TTL.
///
/// Values form a set; their order is never significant. Instances are produced by
/// [`ResourceRecordSets::new_record_set`](crate::ResourceRecordSets::new_record_set)
/// or returned from a listing, never built directly by callers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResourceRecordSet {
    name: String,
    rrdatas: BTreeSet<String>,
    ttl: u32,
    rrs_type: RrsType,
}

impl ResourceRecordSet {
    pub(crate) fn new<I, S>(name: impl Into<String>, rrdatas: I, ttl: u32, rrs_type: RrsType) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            name: name.into(),
            rrdatas: rrdatas.into_iter().map(Into::into).collect(),
            ttl,
            rrs_type,
        }
    }

    /// Record name as supplied by the caller or returned by the backend.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Record values in sorted order.
    pub fn rrdatas(&self) -> impl Iterator<Item = &str> {
        self.rrdatas.iter().map(String::as_str)
    }

    pub fn rrdata_count(&self) -> usize {
        self.rrdatas.len()
    }

    /// TTL in seconds.
    pub fn ttl(&self) -> u32 {
        self.ttl
    }

    pub fn rrs_type(&self) -> RrsType {
        self.rrs_type
    }

    /// The `(name, type)` identity key of this record set.
    pub fn key(&self) -> RecordKey {
        RecordKey::new(&self.name, self.rrs_type)
    }

    /// Same key, TTL and value set.
    ///
    /// Unlike `==`, names are compared the way identity keys are (case and
    /// trailing dot are ignored).
    pub fn is_equivalent(&self, other: &Self) -> bool {
        names_match(&self.name, &other.name)
            && self.rrs_type == other.rrs_type
            && self.ttl == other.ttl
            && self.rrdatas == other.rrdatas
    }
}

impl fmt::Display for ResourceRecordSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {} {} [{}]",
            self.name,
            self.ttl,
            self.rrs_type,
            self.rrdatas().collect::<Vec<_>>().join(", ")
        )
    }
}

// ============ Zone Draft ============

/// An unpersisted zone descriptor produced by [`Zones::new_zone`](crate::Zones::new_zone).
///
/// Holding a draft does not mean the zone exists; pass it to
/// [`Zones::add`](crate::Zones::add) to create it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ZoneDraft {
    name: String,
}

impl ZoneDraft {
    pub(crate) fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }

    pub fn name(&self) -> &str {
        &self.name
    }
}
