use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand};
use doc_ingest::config::Config;
use doc_ingest::embedding::{AzureOpenAiEmbedder, EmbeddingProvider, ensure_dimension};
use doc_ingest::pipeline::Ingestor;
use doc_ingest::search_index::{AzureSearchIndex, IndexDefinition, SearchIndex};
use std::path::PathBuf;
use std::sync::Arc;

/// Ingest course documents into an Azure AI Search vector index
#[derive(Parser)]
#[command(name = "doc-ingest", version, about)]
struct Cli {
    /// TOML configuration file; environment variables override its values
    #[arg(long, env = "DOC_INGEST_CONFIG")]
    config: Option<PathBuf>,

    /// Print the run summary as JSON
    #[arg(long)]
    json: bool,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Clone, Copy)]
enum Command {
    /// Ingest every new document under the document root (default)
    Ingest,
    /// Create or update the index schema
    CreateIndex,
    /// Verify embedding and search credentials without uploading anything
    Check,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();
    let config = Config::load(cli.config.as_deref()).context("Failed to load configuration")?;

    match cli.command.unwrap_or(Command::Ingest) {
        Command::Ingest => ingest(config, cli.json).await,
        Command::CreateIndex => create_index(&config).await,
        Command::Check => check(&config).await,
    }
}

async fn ingest(mut config: Config, json: bool) -> Result<()> {
    config.require_search()?;
    config.require_embedding()?;
    config.resolve_paths()?;

    let embedder = AzureOpenAiEmbedder::new(&config.embedding, config.search.dimension)?;
    let index = AzureSearchIndex::new(&config.search)?;
    let ingestor = Ingestor::new(&config, Arc::new(embedder), Arc::new(index))?;

    let summary = ingestor.run().await.context("Ingestion aborted")?;

    if json {
        println!("{}", serde_json::to_string_pretty(&summary)?);
    } else {
        tracing::info!("Uploaded total chunks: {}", summary.chunks_uploaded);
        tracing::info!("Completed files: {}", summary.completed_total);
        if summary.files_too_large > 0 {
            tracing::info!("Skipped as too large: {}", summary.files_too_large);
        }
        for error in &summary.errors {
            tracing::warn!("Failed: {}", error);
        }
    }
    Ok(())
}

async fn create_index(config: &Config) -> Result<()> {
    config.require_search()?;

    let index = AzureSearchIndex::new(&config.search)?;
    let definition = IndexDefinition::for_chunks(&config.search.index_name, config.search.dimension);

    tracing::info!("Creating/updating index: {}", definition.name);
    index.create_or_update(&definition).await?;
    Ok(())
}

async fn check(config: &Config) -> Result<()> {
    config.require_search()?;
    config.require_embedding()?;

    let embedder = AzureOpenAiEmbedder::new(&config.embedding, config.search.dimension)?;
    let vectors = embedder
        .embed_batch(vec!["hello world".to_string()])
        .await
        .context("Embedding request failed")?;
    ensure_dimension(&vectors, config.search.dimension)?;
    tracing::info!(
        "Embedding deployment '{}' returned {}-dimensional vectors",
        embedder.model_name(),
        config.search.dimension
    );

    let index = AzureSearchIndex::new(&config.search)?;
    if !index.exists().await? {
        bail!(
            "Index '{}' does not exist; run `doc-ingest create-index` first",
            index.index_name()
        );
    }
    tracing::info!("Index '{}' is reachable", index.index_name());
    Ok(())
}
