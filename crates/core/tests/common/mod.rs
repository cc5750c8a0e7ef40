//! Shared test doubles: an in-memory `VectorStore` with call counters
//! and an embedding provider that can be told to fail.

#![allow(dead_code)]

use correlator_core::vectorstore::{FieldMatch, Point, VectorStore};
use providers::hash::HashEmbedder;
use providers::{EmbedResponse, EmbeddingProvider, ProviderError};
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Mutex;

#[derive(Default)]
pub struct MemoryStore {
    collections: Mutex<HashMap<String, Vec<Point>>>,
    pub upsert_calls: AtomicUsize,
    pub scroll_calls: AtomicUsize,
    pub set_payload_calls: AtomicUsize,
    pub fail_scroll: AtomicBool,
    pub fail_set_payload: AtomicBool,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_collection(self, name: &str, points: Vec<Point>) -> Self {
        self.collections
            .lock()
            .unwrap()
            .insert(name.to_string(), points);
        self
    }

    pub fn points(&self, collection: &str) -> Vec<Point> {
        self.collections
            .lock()
            .unwrap()
            .get(collection)
            .cloned()
            .unwrap_or_default()
    }

    pub fn has_collection(&self, collection: &str) -> bool {
        self.collections.lock().unwrap().contains_key(collection)
    }
}

#[async_trait::async_trait]
impl VectorStore for MemoryStore {
    async fn collection_exists(&self, collection: &str) -> anyhow::Result<bool> {
        Ok(self.collections.lock().unwrap().contains_key(collection))
    }

    async fn create_collection(&self, collection: &str, _vector_size: usize) -> anyhow::Result<()> {
        self.collections
            .lock()
            .unwrap()
            .entry(collection.to_string())
            .or_default();
        Ok(())
    }

    async fn delete_collection(&self, collection: &str) -> anyhow::Result<()> {
        self.collections.lock().unwrap().remove(collection);
        Ok(())
    }

    async fn count(&self, collection: &str) -> anyhow::Result<u64> {
        Ok(self
            .collections
            .lock()
            .unwrap()
            .get(collection)
            .map(|points| points.len() as u64)
            .unwrap_or(0))
    }

    async fn upsert(&self, collection: &str, points: Vec<Point>, _wait: bool) -> anyhow::Result<()> {
        self.upsert_calls.fetch_add(1, Ordering::SeqCst);
        let mut collections = self.collections.lock().unwrap();
        let stored = collections
            .get_mut(collection)
            .ok_or_else(|| anyhow::anyhow!("collection not found: {collection}"))?;
        for point in points {
            match stored.iter_mut().find(|p| p.id == point.id) {
                Some(existing) => *existing = point,
                None => stored.push(point),
            }
        }
        Ok(())
    }

    async fn scroll(
        &self,
        collection: &str,
        filter: Option<&FieldMatch>,
        limit: u64,
    ) -> anyhow::Result<Vec<Point>> {
        self.scroll_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_scroll.load(Ordering::SeqCst) {
            anyhow::bail!("connection lost");
        }
        let collections = self.collections.lock().unwrap();
        let stored = collections
            .get(collection)
            .ok_or_else(|| anyhow::anyhow!("collection not found: {collection}"))?;
        Ok(stored
            .iter()
            .filter(|p| match filter {
                Some(f) => p.payload.get(&f.key).and_then(|v| v.as_str()) == Some(f.value.as_str()),
                None => true,
            })
            .take(limit as usize)
            .cloned()
            .collect())
    }

    async fn set_payload(
        &self,
        collection: &str,
        payload: HashMap<String, serde_json::Value>,
        point_ids: &[u64],
    ) -> anyhow::Result<()> {
        if self.fail_set_payload.load(Ordering::SeqCst) {
            anyhow::bail!("connection lost");
        }
        self.set_payload_calls.fetch_add(1, Ordering::SeqCst);
        let mut collections = self.collections.lock().unwrap();
        let stored = collections
            .get_mut(collection)
            .ok_or_else(|| anyhow::anyhow!("collection not found: {collection}"))?;
        for point in stored.iter_mut().filter(|p| point_ids.contains(&p.id)) {
            for (k, v) in &payload {
                point.payload.insert(k.clone(), v.clone());
            }
        }
        Ok(())
    }
}

/// Delegates to a [`HashEmbedder`] after failing a set number of calls.
pub struct FlakyEmbedder {
    inner: HashEmbedder,
    remaining_failures: AtomicUsize,
}

impl FlakyEmbedder {
    pub fn new(vector_size: usize, failures: usize) -> Self {
        Self {
            inner: HashEmbedder::new(vector_size),
            remaining_failures: AtomicUsize::new(failures),
        }
    }
}

#[async_trait::async_trait]
impl EmbeddingProvider for FlakyEmbedder {
    async fn embed(&self, texts: &[String]) -> Result<EmbedResponse, ProviderError> {
        let remaining = self.remaining_failures.load(Ordering::SeqCst);
        if remaining > 0 {
            self.remaining_failures.store(remaining - 1, Ordering::SeqCst);
            return Err(ProviderError::EmbeddingFailed("induced failure".into()));
        }
        self.inner.embed(texts).await
    }
}

pub fn point(id: u64, key: &str, value: &str) -> Point {
    let mut payload = HashMap::new();
    payload.insert(key.to_string(), serde_json::json!(value));
    Point {
        id,
        vector: Vec::new(),
        payload,
    }
}
