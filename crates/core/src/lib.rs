//! Core library: DNS record model, vector store access, correlation, and ingestion.

pub mod config;
pub mod correlation;
pub mod embeddings;
pub mod ingest;
pub mod models;
pub mod pipeline;
pub mod vectorstore;
