use crate::ProviderError;
use bytes::Bytes;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

#[derive(Clone)]
pub struct QdrantConfig {
    pub url: String,
    pub api_key: Option<String>,
}

/// Thin REST client over the Qdrant collections and points APIs.
///
/// Collection names are passed per call: the correlation engine reads
/// from several subdomain collections while the ingestor writes to the
/// DNS records collection through the same client.
#[derive(Clone)]
pub struct QdrantClient {
    client: Client,
    cfg: QdrantConfig,
}

impl QdrantClient {
    pub fn new(cfg: QdrantConfig) -> Self {
        Self {
            client: Client::new(),
            cfg,
        }
    }

    pub async fn collection_exists(&self, collection: &str) -> Result<bool, ProviderError> {
        #[derive(Deserialize)]
        struct ExistsResult {
            exists: bool,
        }
        let url = format!("{}/collections/{}/exists", self.cfg.url, collection);
        let builder = self.with_key(self.client.get(url));
        let resp = builder
            .send()
            .await
            .map_err(|e| ProviderError::RequestFailed(e.to_string()))?;
        let resp = Self::check_status(resp).await?;
        let parsed: QdrantEnvelope<ExistsResult> = resp
            .json()
            .await
            .map_err(|e| ProviderError::RequestFailed(e.to_string()))?;
        Ok(parsed.result.exists)
    }

    pub async fn create_collection(
        &self,
        collection: &str,
        vector_size: usize,
    ) -> Result<(), ProviderError> {
        #[derive(Serialize)]
        struct VectorParams {
            size: usize,
            distance: &'static str,
        }
        #[derive(Serialize)]
        struct CreateCollection {
            vectors: VectorParams,
        }
        let url = format!("{}/collections/{}", self.cfg.url, collection);
        let body = CreateCollection {
            vectors: VectorParams {
                size: vector_size,
                distance: "Cosine",
            },
        };
        let builder = self.with_key(self.client.put(url).json(&body));
        let resp = builder
            .send()
            .await
            .map_err(|e| ProviderError::RequestFailed(e.to_string()))?;
        Self::check_status(resp).await?;
        Ok(())
    }

    pub async fn delete_collection(&self, collection: &str) -> Result<(), ProviderError> {
        let url = format!("{}/collections/{}", self.cfg.url, collection);
        let builder = self.with_key(self.client.delete(url));
        let resp = builder
            .send()
            .await
            .map_err(|e| ProviderError::RequestFailed(e.to_string()))?;
        Self::check_status(resp).await?;
        Ok(())
    }

    pub async fn count(&self, collection: &str) -> Result<u64, ProviderError> {
        #[derive(Serialize)]
        struct CountRequest {
            exact: bool,
        }
        #[derive(Deserialize)]
        struct CountResult {
            count: u64,
        }
        let url = format!("{}/collections/{}/points/count", self.cfg.url, collection);
        let builder = self.with_key(self.client.post(url).json(&CountRequest { exact: true }));
        let resp = builder
            .send()
            .await
            .map_err(|e| ProviderError::RequestFailed(e.to_string()))?;
        let resp = Self::check_status(resp).await?;
        let parsed: QdrantEnvelope<CountResult> = resp
            .json()
            .await
            .map_err(|e| ProviderError::RequestFailed(e.to_string()))?;
        Ok(parsed.result.count)
    }

    pub async fn upsert(
        &self,
        collection: &str,
        points: Vec<QdrantPoint>,
        wait: bool,
    ) -> Result<(), ProviderError> {
        let url = format!(
            "{}/collections/{}/points?wait={}",
            self.cfg.url, collection, wait
        );
        tracing::debug!(collection, count = points.len(), "upserting points");
        let req = QdrantUpsert { points };
        let builder = self.with_key(self.client.put(url).json(&req));
        let resp = builder
            .send()
            .await
            .map_err(|e| ProviderError::RequestFailed(e.to_string()))?;
        Self::check_status(resp).await?;
        Ok(())
    }

    /// First page of a payload-filtered scroll; pagination is not
    /// needed by callers that only want the first match.
    pub async fn scroll(
        &self,
        collection: &str,
        filter: Option<serde_json::Value>,
        limit: u64,
    ) -> Result<Vec<ScrolledPoint>, ProviderError> {
        #[derive(Serialize)]
        struct ScrollRequest {
            #[serde(skip_serializing_if = "Option::is_none")]
            filter: Option<serde_json::Value>,
            limit: u64,
            with_payload: bool,
        }
        #[derive(Deserialize)]
        struct ScrollResult {
            points: Vec<ScrolledPoint>,
        }
        let url = format!("{}/collections/{}/points/scroll", self.cfg.url, collection);
        let body = ScrollRequest {
            filter,
            limit,
            with_payload: true,
        };
        let builder = self.with_key(self.client.post(url).json(&body));
        let resp = builder
            .send()
            .await
            .map_err(|e| ProviderError::RequestFailed(e.to_string()))?;
        let resp = Self::check_status(resp).await?;
        let parsed: QdrantEnvelope<ScrollResult> = resp
            .json()
            .await
            .map_err(|e| ProviderError::RequestFailed(e.to_string()))?;
        Ok(parsed.result.points)
    }

    pub async fn set_payload(
        &self,
        collection: &str,
        payload: HashMap<String, serde_json::Value>,
        point_ids: &[u64],
    ) -> Result<(), ProviderError> {
        #[derive(Serialize)]
        struct SetPayload<'a> {
            payload: &'a HashMap<String, serde_json::Value>,
            points: &'a [u64],
        }
        let url = format!(
            "{}/collections/{}/points/payload?wait=true",
            self.cfg.url, collection
        );
        let body = SetPayload {
            payload: &payload,
            points: point_ids,
        };
        let builder = self.with_key(self.client.post(url).json(&body));
        let resp = builder
            .send()
            .await
            .map_err(|e| ProviderError::RequestFailed(e.to_string()))?;
        Self::check_status(resp).await?;
        Ok(())
    }

    /// Exact-match filter on a single payload field.
    pub fn field_filter(key: &str, value: &str) -> serde_json::Value {
        serde_json::json!({
            "must": [{ "key": key, "match": { "value": value } }]
        })
    }

    fn with_key(&self, builder: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        if let Some(key) = &self.cfg.api_key {
            builder.header("api-key", key)
        } else {
            builder
        }
    }

    async fn check_status(resp: reqwest::Response) -> Result<reqwest::Response, ProviderError> {
        if resp.status().is_success() {
            return Ok(resp);
        }
        let status = resp.status();
        let body = resp.bytes().await.unwrap_or(Bytes::from_static(b""));
        Err(ProviderError::RequestFailed(format!(
            "status {} body {:?}",
            status, body
        )))
    }
}

#[derive(Debug, Serialize)]
pub struct QdrantUpsert {
    pub points: Vec<QdrantPoint>,
}

#[derive(Debug, Clone, Serialize)]
pub struct QdrantPoint {
    pub id: u64,
    pub vector: Vec<f32>,
    pub payload: HashMap<String, serde_json::Value>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ScrolledPoint {
    pub id: u64,
    #[serde(default)]
    pub payload: HashMap<String, serde_json::Value>,
}

#[derive(Deserialize)]
struct QdrantEnvelope<T> {
    result: T,
}
