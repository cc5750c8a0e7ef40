use providers::qdrant::{QdrantClient, QdrantPoint};
use std::collections::HashMap;

/// A stored vector-database record: identifier, vector, payload.
#[derive(Debug, Clone)]
pub struct Point {
    pub id: u64,
    pub vector: Vec<f32>,
    pub payload: HashMap<String, serde_json::Value>,
}

/// Exact equality on a single payload field.
#[derive(Debug, Clone)]
pub struct FieldMatch {
    pub key: String,
    pub value: String,
}

impl FieldMatch {
    pub fn new(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            value: value.into(),
        }
    }
}

/// Capability contract for the vector database. Everything the
/// correlation engine and ingestor need, and nothing more, so other
/// backends can be substituted behind the trait.
#[async_trait::async_trait]
pub trait VectorStore: Send + Sync {
    async fn collection_exists(&self, collection: &str) -> anyhow::Result<bool>;
    async fn create_collection(&self, collection: &str, vector_size: usize) -> anyhow::Result<()>;
    async fn delete_collection(&self, collection: &str) -> anyhow::Result<()>;
    async fn count(&self, collection: &str) -> anyhow::Result<u64>;
    async fn upsert(&self, collection: &str, points: Vec<Point>, wait: bool) -> anyhow::Result<()>;
    /// First page only; callers take the first match and never paginate.
    async fn scroll(
        &self,
        collection: &str,
        filter: Option<&FieldMatch>,
        limit: u64,
    ) -> anyhow::Result<Vec<Point>>;
    async fn set_payload(
        &self,
        collection: &str,
        payload: HashMap<String, serde_json::Value>,
        point_ids: &[u64],
    ) -> anyhow::Result<()>;
}

/// Inert store for dry runs: reads come back empty, writes succeed.
pub struct NoopVectorStore;

#[async_trait::async_trait]
impl VectorStore for NoopVectorStore {
    async fn collection_exists(&self, _collection: &str) -> anyhow::Result<bool> {
        Ok(false)
    }

    async fn create_collection(
        &self,
        _collection: &str,
        _vector_size: usize,
    ) -> anyhow::Result<()> {
        Ok(())
    }

    async fn delete_collection(&self, _collection: &str) -> anyhow::Result<()> {
        Ok(())
    }

    async fn count(&self, _collection: &str) -> anyhow::Result<u64> {
        Ok(0)
    }

    async fn upsert(
        &self,
        _collection: &str,
        _points: Vec<Point>,
        _wait: bool,
    ) -> anyhow::Result<()> {
        Ok(())
    }

    async fn scroll(
        &self,
        _collection: &str,
        _filter: Option<&FieldMatch>,
        _limit: u64,
    ) -> anyhow::Result<Vec<Point>> {
        Ok(Vec::new())
    }

    async fn set_payload(
        &self,
        _collection: &str,
        _payload: HashMap<String, serde_json::Value>,
        _point_ids: &[u64],
    ) -> anyhow::Result<()> {
        Ok(())
    }
}

pub struct QdrantStore {
    client: QdrantClient,
}

impl QdrantStore {
    pub fn new(client: QdrantClient) -> Self {
        Self { client }
    }
}

#[async_trait::async_trait]
impl VectorStore for QdrantStore {
    async fn collection_exists(&self, collection: &str) -> anyhow::Result<bool> {
        Ok(self.client.collection_exists(collection).await?)
    }

    async fn create_collection(&self, collection: &str, vector_size: usize) -> anyhow::Result<()> {
        self.client.create_collection(collection, vector_size).await?;
        Ok(())
    }

    async fn delete_collection(&self, collection: &str) -> anyhow::Result<()> {
        self.client.delete_collection(collection).await?;
        Ok(())
    }

    async fn count(&self, collection: &str) -> anyhow::Result<u64> {
        Ok(self.client.count(collection).await?)
    }

    async fn upsert(&self, collection: &str, points: Vec<Point>, wait: bool) -> anyhow::Result<()> {
        let points: Vec<QdrantPoint> = points
            .into_iter()
            .map(|p| QdrantPoint {
                id: p.id,
                vector: p.vector,
                payload: p.payload,
            })
            .collect();
        self.client.upsert(collection, points, wait).await?;
        Ok(())
    }

    async fn scroll(
        &self,
        collection: &str,
        filter: Option<&FieldMatch>,
        limit: u64,
    ) -> anyhow::Result<Vec<Point>> {
        let filter = filter.map(|f| QdrantClient::field_filter(&f.key, &f.value));
        let points = self.client.scroll(collection, filter, limit).await?;
        Ok(points
            .into_iter()
            .map(|p| Point {
                id: p.id,
                vector: Vec::new(),
                payload: p.payload,
            })
            .collect())
    }

    async fn set_payload(
        &self,
        collection: &str,
        payload: HashMap<String, serde_json::Value>,
        point_ids: &[u64],
    ) -> anyhow::Result<()> {
        self.client.set_payload(collection, payload, point_ids).await?;
        Ok(())
    }
}
