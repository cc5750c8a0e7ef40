use anyhow::Result;
use clap::{Parser, Subcommand};
use cli::input;
use correlator_core::config;
use correlator_core::ingest::Ingestor;
use correlator_core::pipeline;
use providers::hash::HashEmbedder;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;

#[derive(Parser)]
#[command(name = "dnsx-ingest", about = "Ingest dnsx output into a vector store with subdomain correlation")]
struct Cli {
    /// Path to a config file (defaults to config/default.*)
    #[arg(long, global = true)]
    config: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Load a dnsx JSON/JSONL export and ingest it
    Ingest {
        file: PathBuf,
        /// Override the configured DNS records collection
        #[arg(long)]
        collection: Option<String>,
        #[arg(long)]
        batch_size: Option<usize>,
        /// Skip correlation against subdomain collections
        #[arg(long)]
        no_correlation: bool,
        /// Print the stats summary as JSON
        #[arg(long)]
        json: bool,
    },
    /// Create the DNS records collection if it does not exist
    Init,
    /// Delete the DNS records collection (destructive)
    Drop,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();
    let mut cfg = config::load(cli.config.as_deref())?;

    match cli.command {
        Commands::Ingest {
            file,
            collection,
            batch_size,
            no_correlation,
            json,
        } => {
            if let Some(collection) = collection {
                cfg.ingest.collection = collection;
            }
            if let Some(batch_size) = batch_size {
                cfg.ingest.batch_size = batch_size;
            }
            if no_correlation {
                cfg.correlation.enabled = false;
            }

            let records = input::load_records(&file)?;
            let stats = pipeline::run(&cfg, records).await?;
            if json {
                println!("{}", serde_json::to_string_pretty(&stats)?);
            }
            Ok(())
        }
        Commands::Init => {
            let store = pipeline::build_store(&cfg);
            let ingestor = Ingestor::new(
                store,
                Arc::new(HashEmbedder::new(cfg.embeddings.vector_size)),
                cfg.ingest.collection.clone(),
                cfg.embeddings.vector_size,
            );
            ingestor.ensure_collection().await
        }
        Commands::Drop => {
            let store = pipeline::build_store(&cfg);
            store.delete_collection(&cfg.ingest.collection).await?;
            info!(collection = %cfg.ingest.collection, "collection deleted");
            Ok(())
        }
    }
}
