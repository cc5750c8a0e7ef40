//! Batched ingestion of DNS records into the vector store, optionally
//! routed through a [`CorrelationEngine`].

use crate::correlation::CorrelationEngine;
use crate::embeddings;
use crate::models::{DnsRecord, IngestStats, UpsertDecision};
use crate::vectorstore::{Point, VectorStore};
use anyhow::Context;
use providers::EmbeddingProvider;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{info, warn};

pub struct Ingestor {
    store: Arc<dyn VectorStore>,
    embedder: Arc<dyn EmbeddingProvider>,
    collection: String,
    vector_size: usize,
}

impl Ingestor {
    pub fn new(
        store: Arc<dyn VectorStore>,
        embedder: Arc<dyn EmbeddingProvider>,
        collection: impl Into<String>,
        vector_size: usize,
    ) -> Self {
        Self {
            store,
            embedder,
            collection: collection.into(),
            vector_size,
        }
    }

    pub fn collection(&self) -> &str {
        &self.collection
    }

    /// Creates the DNS collection if absent; an existing collection is
    /// left untouched. Destructive recreation is [`Self::recreate_collection`].
    pub async fn ensure_collection(&self) -> anyhow::Result<()> {
        if self
            .store
            .collection_exists(&self.collection)
            .await
            .context("collection existence check")?
        {
            info!(collection = %self.collection, "collection already exists");
            return Ok(());
        }
        info!(collection = %self.collection, vector_size = self.vector_size, "creating collection");
        self.store
            .create_collection(&self.collection, self.vector_size)
            .await
            .context("create collection")
    }

    /// Drops and recreates the DNS collection. Explicitly destructive;
    /// never invoked implicitly by ingestion.
    pub async fn recreate_collection(&self) -> anyhow::Result<()> {
        if self
            .store
            .collection_exists(&self.collection)
            .await
            .context("collection existence check")?
        {
            warn!(collection = %self.collection, "deleting existing collection");
            self.store
                .delete_collection(&self.collection)
                .await
                .context("delete collection")?;
        }
        self.store
            .create_collection(&self.collection, self.vector_size)
            .await
            .context("create collection")
    }

    /// Processes records in fixed-size batches, one upsert call per
    /// non-empty batch. Per-record embedding failures are counted and
    /// skipped; a failed batch upsert aborts the run.
    pub async fn ingest_records(
        &self,
        records: Vec<DnsRecord>,
        mut engine: Option<&mut CorrelationEngine>,
        batch_size: usize,
    ) -> anyhow::Result<IngestStats> {
        let mut stats = IngestStats::default();
        let batch_size = batch_size.max(1);

        // Fresh inserts extend the existing id sequence.
        let mut next_id = self
            .store
            .count(&self.collection)
            .await
            .context("seed point id counter")?;

        for batch in records.chunks(batch_size) {
            let mut points: Vec<Point> = Vec::with_capacity(batch.len());

            for record in batch {
                stats.total += 1;
                let mut record = record.clone();

                if let Some(engine) = engine.as_deref_mut() {
                    stats.correlated += 1;
                    engine.correlate_dns_record(&mut record).await;
                    let decision = engine
                        .prepare_upsert_operation(&record, &self.collection)
                        .await;

                    let vector = match embeddings::embed_record(self.embedder.as_ref(), &record)
                        .await
                    {
                        Ok(v) => v,
                        Err(err) => {
                            warn!(host = %record.host, error = %err, "embedding failed, skipping record");
                            stats.errors += 1;
                            continue;
                        }
                    };

                    let point_id = match decision {
                        UpsertDecision::Update { point_id } => {
                            stats.updated += 1;
                            point_id
                        }
                        UpsertDecision::Insert => {
                            stats.inserted += 1;
                            let id = next_id;
                            next_id += 1;
                            id
                        }
                    };
                    points.push(Point {
                        id: point_id,
                        vector,
                        payload: record_payload(&record)?,
                    });

                    // Best-effort: enrichment failures never abort the batch.
                    engine.update_subdomain_with_dns_info(&record).await;
                } else {
                    // Longstanding quirk kept for parity: inserted is
                    // counted before the embedding attempt, so a record
                    // that fails to embed still shows up as inserted.
                    stats.inserted += 1;
                    let vector = match embeddings::embed_record(self.embedder.as_ref(), &record)
                        .await
                    {
                        Ok(v) => v,
                        Err(err) => {
                            warn!(host = %record.host, error = %err, "embedding failed, skipping record");
                            stats.errors += 1;
                            continue;
                        }
                    };
                    let id = next_id;
                    next_id += 1;
                    points.push(Point {
                        id,
                        vector,
                        payload: record_payload(&record)?,
                    });
                }
            }

            if points.is_empty() {
                continue;
            }
            let count = points.len();
            self.store
                .upsert(&self.collection, points, true)
                .await
                .context("batch upsert")?;
            info!(collection = %self.collection, count, "uploaded batch");
        }

        Ok(stats)
    }

    /// Post-run sanity check: point count plus a small sample, logged.
    pub async fn verify(&self) -> anyhow::Result<()> {
        let count = self
            .store
            .count(&self.collection)
            .await
            .context("count points")?;
        let sample = self.store.scroll(&self.collection, None, 2).await?;
        let sample_ids: Vec<u64> = sample.iter().map(|p| p.id).collect();
        info!(collection = %self.collection, count, ?sample_ids, "collection verified");
        Ok(())
    }
}

fn record_payload(record: &DnsRecord) -> anyhow::Result<HashMap<String, serde_json::Value>> {
    match serde_json::to_value(record).context("serialize record payload")? {
        serde_json::Value::Object(map) => Ok(map.into_iter().collect()),
        _ => anyhow::bail!("dns record did not serialize to an object"),
    }
}
