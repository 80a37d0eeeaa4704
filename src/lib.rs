//! # doc-ingest - Document Ingestion for Retrieval-Augmented Generation
//!
//! Populates a vector search index from a tree of office documents so a
//! downstream assistant can retrieve course material by meaning.
//!
//! ## Overview
//!
//! Every PDF, DOCX and PPTX file under a document root is turned into plain
//! text, stripped of recurring header and footer lines, split into overlapping
//! character windows and deduplicated. Each surviving chunk is embedded with an
//! Azure OpenAI deployment and uploaded to an Azure AI Search index together
//! with course and module metadata taken from the file's location.
//!
//! ## Key Features
//!
//! - **Resumable Runs**: A JSON checkpoint lists fully ingested files; reruns skip them
//! - **Bounded Work**: Size, page and character caps keep pathological files in check
//! - **Batched I/O**: Embedding and upload requests are batched, with optional pacing
//! - **Failure Isolation**: A broken file is logged and retried next run; bad
//!   credentials or a missing index stop the run immediately
//! - **Index Provisioning**: Creates the HNSW vector index the records expect
//!
//! ## Architecture
//!
//! ```text
//!  docs root ──> FileWalker ──> TextExtractor ──> TextCleaner ──> TextChunker
//!                                                                     │
//!  Checkpoint <── Ingestor <── SearchIndex <── EmbeddingProvider <────┘
//! ```
//!
//! ## Modules
//!
//! - [`pipeline`]: Per-file ingestion and the resumable run loop
//! - [`indexer`]: File discovery, text extraction, cleaning and chunking
//! - [`embedding`]: Embedding provider trait and the Azure OpenAI client
//! - [`search_index`]: Search index trait, Azure AI Search client and schema
//! - [`checkpoint`]: Persistent set of completed files
//! - [`config`]: Configuration management with environment variable support
//! - [`http`]: Retry policy shared by the REST clients
//! - [`types`]: Chunk records and run summaries
//! - [`error`]: Error types and result aliases
//!
//! ## Usage Example
//!
//! ```no_run
//! use doc_ingest::config::Config;
//! use doc_ingest::embedding::AzureOpenAiEmbedder;
//! use doc_ingest::pipeline::Ingestor;
//! use doc_ingest::search_index::AzureSearchIndex;
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let mut config = Config::load(None)?;
//!     config.require_search()?;
//!     config.require_embedding()?;
//!     config.resolve_paths()?;
//!
//!     let embedder = AzureOpenAiEmbedder::new(&config.embedding, config.search.dimension)?;
//!     let index = AzureSearchIndex::new(&config.search)?;
//!     let ingestor = Ingestor::new(&config, Arc::new(embedder), Arc::new(index))?;
//!
//!     let summary = ingestor.run().await?;
//!     println!("uploaded {} chunks", summary.chunks_uploaded);
//!     Ok(())
//! }
//! ```

/// Persistent set of fully ingested files
pub mod checkpoint;

/// Configuration management with environment variable overrides
pub mod config;

/// Embedding generation through Azure OpenAI
pub mod embedding;

/// Error types and utilities
pub mod error;

/// Retry and backoff for REST calls
pub mod http;

/// File walking, text extraction and chunking
pub mod indexer;

/// Ingestion orchestration
pub mod pipeline;

/// Search index abstraction and the Azure AI Search client
pub mod search_index;

/// Chunk records, file outcomes and run summaries
pub mod types;
