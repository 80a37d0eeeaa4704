//! Per-file ingestion and the resumable run loop

use crate::checkpoint::Checkpoint;
use crate::config::Config;
use crate::embedding::{EmbeddingProvider, ensure_dimension};
use crate::error::{ConfigError, EmbeddingError, ExtractionError, Result};
use crate::indexer::{
    ChunkDeduplicator, CourseModuleLayout, DocumentExtractor, FileWalker, MetadataLayout,
    SourceFile, TextChunker, TextCleaner, TextExtractor, TextUnit, truncate_chars,
};
use crate::search_index::SearchIndex;
use crate::types::{ChunkRecord, DocumentMetadata, FileOutcome, RunSummary};
use std::sync::Arc;
use std::time::Instant;
use uuid::Uuid;

/// A chunk accepted for upload but not yet embedded
#[derive(Debug)]
struct PendingChunk {
    text: String,
    content_hash: String,
    page_num: i32,
    chunk_num: u32,
}

/// Fields shared by every record of one file
struct FileContext<'a> {
    file: &'a SourceFile,
    path: String,
    metadata: DocumentMetadata,
}

/// Drives documents through extraction, chunking, embedding and upload
pub struct Ingestor {
    config: Config,
    embedder: Arc<dyn EmbeddingProvider>,
    index: Arc<dyn SearchIndex>,
    layout: Arc<dyn MetadataLayout>,
    extractor: Arc<dyn TextExtractor>,
    cleaner: TextCleaner,
    chunker: TextChunker,
}

impl Ingestor {
    pub fn new(
        config: &Config,
        embedder: Arc<dyn EmbeddingProvider>,
        index: Arc<dyn SearchIndex>,
    ) -> Result<Self> {
        config.validate()?;

        let cleaner = TextCleaner::new(&config.ingest.boilerplate_patterns).map_err(|e| {
            ConfigError::InvalidValue {
                key: "boilerplate_patterns".to_string(),
                reason: e.to_string(),
            }
        })?;

        let chunker = TextChunker::new(config.ingest.chunk_max_chars, config.ingest.chunk_overlap);
        tracing::debug!(
            "Chunking at {} chars with {} chars of overlap",
            chunker.max_chars(),
            chunker.overlap()
        );

        Ok(Self {
            config: config.clone(),
            embedder,
            index,
            layout: Arc::new(CourseModuleLayout::default()),
            extractor: Arc::new(DocumentExtractor::new(config.ingest.max_pdf_pages)),
            cleaner,
            chunker,
        })
    }

    pub fn with_layout(mut self, layout: Arc<dyn MetadataLayout>) -> Self {
        self.layout = layout;
        self
    }

    pub fn with_extractor(mut self, extractor: Arc<dyn TextExtractor>) -> Self {
        self.extractor = extractor;
        self
    }

    /// Ingest every eligible file under the document root that the checkpoint
    /// doesn't already list.
    ///
    /// A file is added to the checkpoint only after all its chunks were
    /// uploaded. Per-file failures are logged and collected; fatal errors
    /// (credentials, missing index, unwritable checkpoint) end the run.
    pub async fn run(&self) -> Result<RunSummary> {
        let start = Instant::now();
        let ingest = &self.config.ingest;

        let mut checkpoint = Checkpoint::load(&ingest.checkpoint_path);
        // Fail fast on an unwritable checkpoint location, before any upload
        checkpoint.save()?;
        if checkpoint.is_empty() {
            tracing::info!("Starting fresh with checkpoint {}", checkpoint.path().display());
        } else {
            tracing::info!("Resuming from checkpoint {}", checkpoint.path().display());
        }

        let walker = FileWalker::new(&ingest.docs_root)
            .with_exclusions(ingest.skip_path_substrings.clone());
        let files = tokio::task::spawn_blocking(move || walker.walk())
            .await
            .map_err(|e| ExtractionError::TaskFailed(e.to_string()))??;

        tracing::info!(
            "Found {} files under {} for index '{}'",
            files.len(),
            ingest.docs_root.display(),
            self.index.index_name()
        );

        let mut summary = RunSummary {
            files_discovered: files.len(),
            ..RunSummary::default()
        };

        for file in &files {
            let key = file.key();
            if checkpoint.contains(&key) {
                summary.files_already_completed += 1;
                continue;
            }

            tracing::info!("Processing: {} ({} KB)", key, file.size / 1024);
            match self.ingest_file(file).await {
                Ok(FileOutcome::Uploaded(uploaded)) => {
                    checkpoint.mark_completed(key);
                    checkpoint.save()?;
                    summary.files_ingested += 1;
                    summary.chunks_uploaded += uploaded;
                    tracing::info!(
                        "Uploaded {} chunks (running total {})",
                        uploaded,
                        summary.chunks_uploaded
                    );
                }
                Ok(FileOutcome::SkippedTooLarge { .. }) => {
                    summary.files_too_large += 1;
                }
                Err(e) if e.is_fatal() => {
                    tracing::error!("Aborting run while ingesting {}: {}", key, e);
                    return Err(e);
                }
                Err(e) => {
                    tracing::warn!("Error ingesting {}: {}. Not marking completed", key, e);
                    summary.files_failed += 1;
                    summary.errors.push(format!("{}: {}", key, e));
                }
            }
        }

        summary.completed_total = checkpoint.len();
        summary.duration_ms = start.elapsed().as_millis() as u64;
        tracing::info!(
            "Run finished: {} files ingested, {} failed, {} chunks uploaded, {} files completed in total",
            summary.files_ingested,
            summary.files_failed,
            summary.chunks_uploaded,
            summary.completed_total
        );
        Ok(summary)
    }

    /// Ingest a single file and return how many records were uploaded
    pub async fn ingest_file(&self, file: &SourceFile) -> Result<FileOutcome> {
        let max = self.config.ingest.max_file_bytes();
        if file.size > max {
            tracing::warn!(
                "Skipping {} (too large: {:.1} MB > {} MB)",
                file.path.display(),
                file.size as f64 / (1024.0 * 1024.0),
                self.config.ingest.max_file_mb
            );
            return Ok(FileOutcome::SkippedTooLarge {
                size: file.size,
                max,
            });
        }

        let ctx = FileContext {
            file,
            path: file.key(),
            metadata: self.layout.infer(&self.config.ingest.docs_root, &file.path),
        };

        let units = self.extract(file).await?;

        let batch_size = self.config.embedding.batch_size;
        let mut dedup = ChunkDeduplicator::new();
        let mut pending: Vec<PendingChunk> = Vec::with_capacity(batch_size);
        let mut next_chunk_num = 0u32;
        let mut chunks_seen = 0usize;
        let mut uploaded = 0usize;

        for unit in units {
            let Some(text) = self.prepare_text(&ctx, &unit) else {
                continue;
            };

            for window in self.chunker.chunks(&text) {
                let chunk = window.text.trim();
                if chunk.is_empty() {
                    continue;
                }
                chunks_seen += 1;
                let Some(content_hash) = dedup.admit(chunk) else {
                    tracing::debug!(
                        "Dropping duplicate chunk at chars {}..{}",
                        window.start,
                        window.end
                    );
                    continue;
                };

                pending.push(PendingChunk {
                    text: chunk.to_string(),
                    content_hash,
                    page_num: unit.page_num,
                    chunk_num: next_chunk_num,
                });
                next_chunk_num += 1;

                if pending.len() >= batch_size {
                    uploaded += self.flush(&ctx, std::mem::take(&mut pending)).await?;
                }
            }
        }

        uploaded += self.flush(&ctx, pending).await?;

        if uploaded == 0 {
            tracing::info!("No usable text in {}", ctx.path);
        } else {
            tracing::debug!(
                "{} unique chunks out of {} for {}",
                dedup.len(),
                chunks_seen,
                ctx.path
            );
        }
        Ok(FileOutcome::Uploaded(uploaded))
    }

    async fn extract(&self, file: &SourceFile) -> Result<Vec<TextUnit>> {
        let extractor = self.extractor.clone();
        let file = file.clone();
        let units = tokio::task::spawn_blocking(move || extractor.extract(&file))
            .await
            .map_err(|e| ExtractionError::TaskFailed(e.to_string()))??;
        Ok(units)
    }

    /// Clean, normalise and cap one unit of text. `None` when nothing is left.
    fn prepare_text(&self, ctx: &FileContext<'_>, unit: &TextUnit) -> Option<String> {
        let mut text = self.cleaner.clean_and_normalize(&unit.text);
        if text.is_empty() {
            return None;
        }

        let max_chars = self.config.ingest.max_doc_chars;
        if truncate_chars(&mut text, max_chars) {
            tracing::warn!(
                "Truncating text of {} (page {}) to {} chars",
                ctx.file.path.display(),
                unit.page_num,
                max_chars
            );
        }
        Some(text)
    }

    /// Embed the pending chunks and upload them as records
    async fn flush(&self, ctx: &FileContext<'_>, pending: Vec<PendingChunk>) -> Result<usize> {
        if pending.is_empty() {
            return Ok(0);
        }

        let texts: Vec<String> = pending.iter().map(|c| c.text.clone()).collect();
        let vectors = self.embedder.embed_batch(texts).await?;
        if vectors.len() != pending.len() {
            return Err(EmbeddingError::CountMismatch {
                expected: pending.len(),
                actual: vectors.len(),
            }
            .into());
        }
        ensure_dimension(&vectors, self.config.search.dimension)?;

        let records: Vec<ChunkRecord> = pending
            .into_iter()
            .zip(vectors)
            .map(|(chunk, vector)| self.record(ctx, chunk, vector))
            .collect();

        tracing::debug!(
            "Uploading {} records for {} (upload batch size {})",
            records.len(),
            ctx.path,
            self.config.search.upload_batch_size
        );

        let delay = self.config.ingest.sleep_between_batches();
        let mut uploaded = 0;
        for batch in records.chunks(self.config.search.upload_batch_size) {
            uploaded += self.index.upload(batch).await?;
            if !delay.is_zero() {
                tokio::time::sleep(delay).await;
            }
        }
        Ok(uploaded)
    }

    fn record(&self, ctx: &FileContext<'_>, chunk: PendingChunk, vector: Vec<f32>) -> ChunkRecord {
        ChunkRecord {
            id: Uuid::new_v4().to_string(),
            content: chunk.text,
            content_vector: vector,
            doc_id: ctx.metadata.doc_id.clone(),
            course_id: ctx.metadata.course_id.clone(),
            module_id: ctx.metadata.module_id.clone(),
            path: ctx.path.clone(),
            source_type: ctx.file.kind.as_str().to_string(),
            page_num: chunk.page_num,
            chunk_num: chunk.chunk_num,
            content_hash: chunk.content_hash,
        }
    }
}
