use crate::config::AppConfig;
use crate::correlation::{CorrelationEngine, HostMatching};
use crate::ingest::Ingestor;
use crate::models::{DnsRecord, IngestStats};
use crate::vectorstore::{NoopVectorStore, QdrantStore, VectorStore};
use anyhow::Context;
use providers::hash::HashEmbedder;
use providers::qdrant::{QdrantClient, QdrantConfig};
use providers::EmbeddingRegistry;
use std::sync::Arc;
use tracing::{info, warn};

pub fn build_registry(config: &AppConfig) -> EmbeddingRegistry {
    EmbeddingRegistry::new()
        .with_embedding(
            "hash",
            Arc::new(HashEmbedder::new(config.embeddings.vector_size)),
        )
        .set_preferred(&config.embeddings.provider)
}

pub fn build_store(config: &AppConfig) -> Arc<dyn VectorStore> {
    match config.vectors.provider.as_str() {
        "qdrant" => {
            if let Some(url) = &config.vectors.url {
                let client = QdrantClient::new(QdrantConfig {
                    url: url.clone(),
                    api_key: std::env::var(&config.vectors.api_key_env).ok(),
                });
                return Arc::new(QdrantStore::new(client));
            }
            warn!("vectors.provider is qdrant but no url configured, using noop store");
            Arc::new(NoopVectorStore)
        }
        _ => Arc::new(NoopVectorStore),
    }
}

/// Runs a full ingestion: collection lifecycle, optional correlation,
/// batched upserts, stats, and a post-run verification.
pub async fn run(config: &AppConfig, records: Vec<DnsRecord>) -> anyhow::Result<IngestStats> {
    let registry = build_registry(config);
    let embedder = registry.embedding(None).context("embedding provider")?;
    let store = build_store(config);

    let ingestor = Ingestor::new(
        store.clone(),
        embedder,
        config.ingest.collection.clone(),
        config.embeddings.vector_size,
    );
    if config.ingest.recreate {
        ingestor.recreate_collection().await?;
    } else {
        ingestor.ensure_collection().await?;
    }

    let mut engine = if config.correlation.enabled {
        let matching = config
            .correlation
            .matching
            .as_deref()
            .map(HostMatching::from)
            .unwrap_or_default();
        Some(
            CorrelationEngine::new(store, config.correlation.collections.clone())
                .with_matching(matching),
        )
    } else {
        None
    };

    info!(
        records = records.len(),
        collection = %config.ingest.collection,
        correlation = engine.is_some(),
        "starting ingestion"
    );
    let stats = ingestor
        .ingest_records(records, engine.as_mut(), config.ingest.batch_size)
        .await?;

    if let Some(engine) = &engine {
        let cstats = engine.stats();
        info!(
            matched = cstats.matched,
            unmatched = cstats.unmatched,
            errors = cstats.errors,
            "correlation summary"
        );
    }
    info!(
        total = stats.total,
        inserted = stats.inserted,
        updated = stats.updated,
        errors = stats.errors,
        correlated = stats.correlated,
        "ingestion summary"
    );

    if let Err(err) = ingestor.verify().await {
        warn!(error = %err, "verification skipped");
    }

    Ok(stats)
}
