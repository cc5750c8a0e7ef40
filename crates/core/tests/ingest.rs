mod common;

use common::{point, FlakyEmbedder, MemoryStore};
use correlator_core::correlation::CorrelationEngine;
use correlator_core::ingest::Ingestor;
use correlator_core::models::DnsRecord;
use correlator_core::vectorstore::VectorStore;
use providers::hash::HashEmbedder;
use std::sync::atomic::Ordering;
use std::sync::Arc;

const COLLECTION: &str = "dnsx_records";
const VECTOR_SIZE: usize = 384;

fn record(host: &str, ip: &str) -> DnsRecord {
    DnsRecord {
        host: host.to_string(),
        a: vec![ip.to_string()],
        status_code: Some("NOERROR".to_string()),
        timestamp: Some("2025-01-15T10:30:00Z".to_string()),
        source_tool: Some("dnsx".to_string()),
        ..Default::default()
    }
}

fn ingestor(store: Arc<MemoryStore>) -> Ingestor {
    Ingestor::new(
        store,
        Arc::new(HashEmbedder::new(VECTOR_SIZE)),
        COLLECTION,
        VECTOR_SIZE,
    )
}

#[tokio::test]
async fn ensure_collection_creates_once() {
    let store = Arc::new(MemoryStore::new());
    let ingestor = ingestor(store.clone());

    ingestor.ensure_collection().await.unwrap();
    assert!(store.has_collection(COLLECTION));

    // Second call leaves the existing collection alone.
    store
        .upsert(COLLECTION, vec![point(0, "host", "www.example.com")], true)
        .await
        .unwrap();
    ingestor.ensure_collection().await.unwrap();
    assert_eq!(store.points(COLLECTION).len(), 1);
}

#[tokio::test]
async fn recreate_collection_drops_existing_points() {
    let store = Arc::new(
        MemoryStore::new().with_collection(COLLECTION, vec![point(0, "host", "www.example.com")]),
    );
    let ingestor = ingestor(store.clone());

    ingestor.recreate_collection().await.unwrap();
    assert!(store.has_collection(COLLECTION));
    assert!(store.points(COLLECTION).is_empty());
}

#[tokio::test]
async fn plain_ingest_assigns_sequential_ids_in_one_batch() {
    let store = Arc::new(MemoryStore::new().with_collection(COLLECTION, vec![]));
    let ingestor = ingestor(store.clone());

    let records = vec![
        record("www.example.com", "93.184.216.34"),
        record("mail.example.com", "93.184.216.35"),
    ];
    let stats = ingestor.ingest_records(records, None, 100).await.unwrap();

    assert_eq!(stats.total, 2);
    assert_eq!(stats.inserted, 2);
    assert_eq!(stats.errors, 0);
    assert_eq!(stats.correlated, 0);
    assert_eq!(store.upsert_calls.load(Ordering::SeqCst), 1);

    let mut ids: Vec<u64> = store.points(COLLECTION).iter().map(|p| p.id).collect();
    ids.sort_unstable();
    assert_eq!(ids, vec![0, 1]);
}

#[tokio::test]
async fn batch_size_one_issues_one_upsert_per_record() {
    let store = Arc::new(MemoryStore::new().with_collection(COLLECTION, vec![]));
    let ingestor = ingestor(store.clone());

    let records = vec![
        record("www.example.com", "93.184.216.34"),
        record("mail.example.com", "93.184.216.35"),
    ];
    let stats = ingestor.ingest_records(records, None, 1).await.unwrap();

    assert_eq!(stats.inserted, 2);
    assert_eq!(store.upsert_calls.load(Ordering::SeqCst), 2);
}

// Parity with the original behavior: in the plain path `inserted` is
// bumped before the embedding attempt, so a record whose embedding
// fails is still reported as inserted even though it never reaches
// the store.
#[tokio::test]
async fn ingest_counts_insert_before_embedding_in_plain_path() {
    let store = Arc::new(MemoryStore::new().with_collection(COLLECTION, vec![]));
    let ingestor = Ingestor::new(
        store.clone(),
        Arc::new(FlakyEmbedder::new(VECTOR_SIZE, 1)),
        COLLECTION,
        VECTOR_SIZE,
    );

    let records = vec![
        record("www.example.com", "93.184.216.34"),
        record("mail.example.com", "93.184.216.35"),
    ];
    let stats = ingestor.ingest_records(records, None, 100).await.unwrap();

    assert_eq!(stats.errors, 1);
    assert_eq!(stats.inserted, 2);
    assert_eq!(store.points(COLLECTION).len(), 1);
}

#[tokio::test]
async fn correlated_path_counts_nothing_for_failed_embeddings() {
    let store = Arc::new(
        MemoryStore::new()
            .with_collection(COLLECTION, vec![])
            .with_collection("subfinder", vec![point(42, "hostname", "www.example.com")]),
    );
    let ingestor = Ingestor::new(
        store.clone(),
        Arc::new(FlakyEmbedder::new(VECTOR_SIZE, 1)),
        COLLECTION,
        VECTOR_SIZE,
    );
    let mut engine = CorrelationEngine::new(store.clone(), vec!["subfinder".to_string()]);

    let records = vec![record("www.example.com", "93.184.216.34")];
    let stats = ingestor
        .ingest_records(records, Some(&mut engine), 100)
        .await
        .unwrap();

    assert_eq!(stats.correlated, 1);
    assert_eq!(stats.errors, 1);
    assert_eq!(stats.inserted, 0);
    assert_eq!(stats.updated, 0);
    assert!(store.points(COLLECTION).is_empty());
}

#[tokio::test]
async fn update_path_reuses_existing_point_id() {
    let store = Arc::new(
        MemoryStore::new()
            .with_collection(COLLECTION, vec![point(99, "host", "www.example.com")]),
    );
    let ingestor = ingestor(store.clone());
    let mut engine = CorrelationEngine::new(store.clone(), vec![]);

    let records = vec![record("www.example.com", "93.184.216.34")];
    let stats = ingestor
        .ingest_records(records, Some(&mut engine), 100)
        .await
        .unwrap();

    assert_eq!(stats.updated, 1);
    assert_eq!(stats.inserted, 0);

    // Latest-only: still a single point for the host, same id.
    let points = store.points(COLLECTION);
    assert_eq!(points.len(), 1);
    assert_eq!(points[0].id, 99);
    assert_eq!(
        points[0].payload.get("status_code"),
        Some(&serde_json::json!("NOERROR"))
    );
}

#[tokio::test]
async fn end_to_end_correlated_ingest() {
    let store = Arc::new(
        MemoryStore::new()
            .with_collection(COLLECTION, vec![])
            .with_collection("subfinder", vec![point(42, "hostname", "www.example.com")]),
    );
    let ingestor = ingestor(store.clone());
    let mut engine = CorrelationEngine::new(store.clone(), vec!["subfinder".to_string()]);

    let records = vec![
        record("www.example.com", "93.184.216.34"),
        record("unknown.example.com", "198.51.100.7"),
    ];
    let stats = ingestor
        .ingest_records(records, Some(&mut engine), 100)
        .await
        .unwrap();

    assert_eq!(stats.correlated, 2);
    assert_eq!(stats.inserted + stats.updated, 2);
    // Exactly one enrichment write-back: only the matched record links.
    assert_eq!(store.set_payload_calls.load(Ordering::SeqCst), 1);
    assert_eq!(engine.stats().matched, 1);
    assert_eq!(engine.stats().unmatched, 1);

    let subfinder = store.points("subfinder");
    assert_eq!(
        subfinder[0].payload.get("resolved_ips"),
        Some(&serde_json::json!(["93.184.216.34"]))
    );

    // Stored DNS payloads carry the correlation decoration.
    let dns = store.points(COLLECTION);
    let matched = dns
        .iter()
        .find(|p| p.payload.get("host") == Some(&serde_json::json!("www.example.com")))
        .unwrap();
    assert_eq!(
        matched.payload.get("correlation_status"),
        Some(&serde_json::json!("matched"))
    );
    assert_eq!(
        matched.payload.get("linked_subdomain_id"),
        Some(&serde_json::json!(42))
    );
}

#[tokio::test]
async fn id_counter_extends_existing_sequence() {
    let store = Arc::new(
        MemoryStore::new()
            .with_collection(COLLECTION, vec![point(0, "host", "old.example.com")]),
    );
    let ingestor = ingestor(store.clone());

    let records = vec![record("www.example.com", "93.184.216.34")];
    ingestor.ingest_records(records, None, 100).await.unwrap();

    let mut ids: Vec<u64> = store.points(COLLECTION).iter().map(|p| p.id).collect();
    ids.sort_unstable();
    assert_eq!(ids, vec![0, 1]);
}
