//! Deterministic placeholder embeddings.
//!
//! Not a semantic model: each text is blake3-hashed, the first eight
//! bytes seed a splitmix64 stream, and the stream is expanded into
//! `vector_size` components in `[-1, 1]`. Identical input always
//! yields the identical vector, so re-ingesting unchanged records is
//! stable across runs. Swap in a real [`EmbeddingProvider`] when
//! semantic search matters.

use crate::{EmbedResponse, EmbeddingProvider, ProviderError};

#[derive(Debug, Clone)]
pub struct HashEmbedder {
    vector_size: usize,
}

impl HashEmbedder {
    pub fn new(vector_size: usize) -> Self {
        Self { vector_size }
    }

    pub fn vector_size(&self) -> usize {
        self.vector_size
    }

    fn embed_text(&self, text: &str) -> Vec<f32> {
        let digest = blake3::hash(text.as_bytes());
        let mut seed = u64::from_le_bytes(
            digest.as_bytes()[..8]
                .try_into()
                .unwrap_or([0u8; 8]),
        );
        (0..self.vector_size)
            .map(|_| {
                let z = splitmix64(&mut seed);
                // Top 53 bits give a uniform draw in [0, 1); shift to [-1, 1).
                ((z >> 11) as f64 * (2.0 / (1u64 << 53) as f64) - 1.0) as f32
            })
            .collect()
    }
}

#[async_trait::async_trait]
impl EmbeddingProvider for HashEmbedder {
    async fn embed(&self, texts: &[String]) -> Result<EmbedResponse, ProviderError> {
        Ok(EmbedResponse {
            vectors: texts.iter().map(|t| self.embed_text(t)).collect(),
        })
    }
}

fn splitmix64(state: &mut u64) -> u64 {
    *state = state.wrapping_add(0x9E37_79B9_7F4A_7C15);
    let mut z = *state;
    z = (z ^ (z >> 30)).wrapping_mul(0xBF58_476D_1CE4_E5B9);
    z = (z ^ (z >> 27)).wrapping_mul(0x94D0_49BB_1331_11EB);
    z ^ (z >> 31)
}
