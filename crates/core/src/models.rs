use serde::{Deserialize, Serialize};

/// A single resolution as exported by dnsx. `id` is whatever the
/// source assigned and is not stable across runs; correlation keys on
/// `host` alone.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DnsRecord {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<u64>,
    #[serde(default)]
    pub host: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub resolver: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub a: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub aaaa: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub cname: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub mx: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub ns: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub txt: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status_code: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_tool: Option<String>,

    // Correlation decoration, absent until an engine has seen the record.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub correlation_status: Option<CorrelationStatus>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub linked_subdomain_id: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub linked_collection: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resolved_ips: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resolved_ipv6: Option<Vec<String>>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CorrelationStatus {
    Matched,
    Unmatched,
}

/// A previously ingested subdomain point found in another collection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubdomainMatch {
    pub point_id: u64,
    pub collection: String,
}

/// How a DNS record should be written into the DNS collection.
/// `Update` always carries the id of the existing point for that host.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpsertDecision {
    Insert,
    Update { point_id: u64 },
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct CorrelationStats {
    pub matched: u64,
    pub unmatched: u64,
    pub errors: u64,
}

impl CorrelationStats {
    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct IngestStats {
    pub total: u64,
    pub inserted: u64,
    pub updated: u64,
    pub errors: u64,
    pub correlated: u64,
}
