use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub vectors: VectorConfig,
    pub embeddings: EmbeddingConfig,
    pub ingest: IngestConfig,
    pub correlation: CorrelationConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VectorConfig {
    /// "qdrant" or "noop" (dry run).
    pub provider: String,
    pub url: Option<String>,
    /// Environment variable holding the store API key.
    #[serde(default = "default_api_key_env")]
    pub api_key_env: String,
}

fn default_api_key_env() -> String {
    "QDRANT_API_KEY".to_string()
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmbeddingConfig {
    pub provider: String,
    pub vector_size: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IngestConfig {
    pub collection: String,
    pub batch_size: usize,
    #[serde(default)]
    pub recreate: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CorrelationConfig {
    pub enabled: bool,
    /// Subdomain collections searched in order; first match wins.
    #[serde(default)]
    pub collections: Vec<String>,
    /// "exact" (default) or "normalized".
    #[serde(default)]
    pub matching: Option<String>,
}

pub fn load(path: Option<&str>) -> anyhow::Result<AppConfig> {
    let mut settings = config::Config::builder();
    if let Some(p) = path {
        settings = settings.add_source(config::File::with_name(p));
    } else {
        settings = settings.add_source(config::File::with_name("config/default").required(false));
    }
    let cfg = settings.build()?;
    Ok(cfg.try_deserialize()?)
}
