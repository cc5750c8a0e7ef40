//! Matches freshly ingested DNS records against subdomain records that
//! earlier pipelines (subfinder, sublist3r, ...) left in other
//! collections, and writes resolution data back onto the matched
//! subdomain point.

use crate::models::{
    CorrelationStats, CorrelationStatus, DnsRecord, SubdomainMatch, UpsertDecision,
};
use crate::vectorstore::{FieldMatch, VectorStore};
use std::borrow::Cow;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, warn};

/// Hostname comparison policy for correlation lookups.
///
/// The default is byte-exact equality, matching how the subdomain
/// ingestors store hostnames. `Normalized` lowercases the probe and
/// strips a trailing dot before filtering; it only helps if the
/// subdomain collections were normalized the same way.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum HostMatching {
    #[default]
    Exact,
    Normalized,
}

impl From<&str> for HostMatching {
    fn from(s: &str) -> Self {
        match s.to_lowercase().as_str() {
            "normalized" => HostMatching::Normalized,
            _ => HostMatching::Exact,
        }
    }
}

pub struct CorrelationEngine {
    store: Arc<dyn VectorStore>,
    collections: Vec<String>,
    matching: HostMatching,
    stats: CorrelationStats,
}

impl CorrelationEngine {
    pub fn new(store: Arc<dyn VectorStore>, collections: Vec<String>) -> Self {
        Self {
            store,
            collections,
            matching: HostMatching::default(),
            stats: CorrelationStats::default(),
        }
    }

    pub fn with_matching(mut self, matching: HostMatching) -> Self {
        self.matching = matching;
        self
    }

    /// First subdomain point whose payload `hostname` equals the given
    /// host, searching the configured collections in order. Collections
    /// missing from the store are skipped; read failures are logged and
    /// treated as no match. Never mutates the store.
    pub async fn find_matching_subdomain(&self, hostname: &str) -> Option<SubdomainMatch> {
        let probe = self.probe_host(hostname);
        for collection in &self.collections {
            match self.store.collection_exists(collection).await {
                Ok(true) => {}
                Ok(false) => {
                    debug!(collection = %collection, "skipping missing subdomain collection");
                    continue;
                }
                Err(err) => {
                    warn!(collection = %collection, error = %err, "collection existence check failed");
                    continue;
                }
            }
            let filter = FieldMatch::new("hostname", probe.as_ref());
            match self.store.scroll(collection, Some(&filter), 1).await {
                Ok(points) => {
                    if let Some(point) = points.into_iter().next() {
                        return Some(SubdomainMatch {
                            point_id: point.id,
                            collection: collection.clone(),
                        });
                    }
                }
                Err(err) => {
                    warn!(collection = %collection, error = %err, "subdomain lookup failed");
                }
            }
        }
        None
    }

    /// Decorates the record in place with its correlation outcome.
    /// A host-less record counts as an error and is left untouched.
    pub async fn correlate_dns_record(&mut self, record: &mut DnsRecord) {
        if record.host.is_empty() {
            warn!("dns record has no host, cannot correlate");
            self.stats.errors += 1;
            return;
        }
        match self.find_matching_subdomain(&record.host).await {
            Some(found) => {
                record.correlation_status = Some(CorrelationStatus::Matched);
                record.linked_subdomain_id = Some(found.point_id);
                record.linked_collection = Some(found.collection);
                record.resolved_ips = Some(record.a.clone());
                if !record.aaaa.is_empty() {
                    record.resolved_ipv6 = Some(record.aaaa.clone());
                }
                self.stats.matched += 1;
            }
            None => {
                record.correlation_status = Some(CorrelationStatus::Unmatched);
                self.stats.unmatched += 1;
            }
        }
    }

    /// Latest-only policy for the DNS records collection: at most one
    /// point per hostname, so an existing point for this host means an
    /// update reusing its id.
    pub async fn prepare_upsert_operation(
        &self,
        record: &DnsRecord,
        dns_collection: &str,
    ) -> UpsertDecision {
        let probe = self.probe_host(&record.host);
        let filter = FieldMatch::new("host", probe.as_ref());
        match self.store.scroll(dns_collection, Some(&filter), 1).await {
            Ok(points) => match points.into_iter().next() {
                Some(existing) => UpsertDecision::Update {
                    point_id: existing.id,
                },
                None => UpsertDecision::Insert,
            },
            Err(err) => {
                warn!(collection = dns_collection, error = %err, "existing-point lookup failed, treating as insert");
                UpsertDecision::Insert
            }
        }
    }

    /// Best-effort write-back of resolution data onto the linked
    /// subdomain point. Returns false, without touching the store, for
    /// unmatched records or missing link fields; a failed store write
    /// is logged and also reported as false so ingestion never aborts
    /// over enrichment.
    pub async fn update_subdomain_with_dns_info(&self, record: &DnsRecord) -> bool {
        if record.correlation_status != Some(CorrelationStatus::Matched) {
            return false;
        }
        let (point_id, collection) = match (&record.linked_subdomain_id, &record.linked_collection)
        {
            (Some(id), Some(col)) => (*id, col.clone()),
            _ => return false,
        };

        let mut payload: HashMap<String, serde_json::Value> = HashMap::new();
        payload.insert("resolved_ips".to_string(), serde_json::json!(record.a));
        if !record.aaaa.is_empty() {
            payload.insert("resolved_ipv6".to_string(), serde_json::json!(record.aaaa));
        }
        let last_seen = record
            .timestamp
            .clone()
            .unwrap_or_else(|| chrono::Utc::now().to_rfc3339());
        payload.insert("last_dns_seen".to_string(), serde_json::json!(last_seen));

        match self
            .store
            .set_payload(&collection, payload, &[point_id])
            .await
        {
            Ok(()) => {
                debug!(host = %record.host, collection = %collection, point_id, "subdomain enriched with dns info");
                true
            }
            Err(err) => {
                warn!(host = %record.host, collection = %collection, error = %err, "subdomain enrichment failed");
                false
            }
        }
    }

    pub fn stats(&self) -> CorrelationStats {
        self.stats
    }

    pub fn reset_stats(&mut self) {
        self.stats.reset();
    }

    fn probe_host<'a>(&self, host: &'a str) -> Cow<'a, str> {
        match self.matching {
            HostMatching::Exact => Cow::Borrowed(host),
            HostMatching::Normalized => {
                Cow::Owned(host.trim_end_matches('.').to_ascii_lowercase())
            }
        }
    }
}
