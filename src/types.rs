use serde::{Deserialize, Serialize};

/// Page number recorded for formats without pages (DOCX, PPTX)
pub const NO_PAGE: i32 = -1;

/// Identifiers derived from where a file sits in the document tree
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocumentMetadata {
    /// File base name without extension
    pub doc_id: String,
    pub course_id: String,
    pub module_id: String,
}

/// A single record in the search index
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChunkRecord {
    /// Random UUID, the index key
    pub id: String,
    /// Chunk text
    pub content: String,
    /// Embedding of `content`
    pub content_vector: Vec<f32>,
    pub doc_id: String,
    pub course_id: String,
    pub module_id: String,
    /// Absolute path of the source file
    pub path: String,
    /// Lower-case extension without the dot: pdf, docx or pptx
    pub source_type: String,
    /// Zero-based PDF page index, or [`NO_PAGE`]
    pub page_num: i32,
    /// Per-file sequence number of the chunk
    pub chunk_num: u32,
    /// SHA-256 hex digest of `content`
    pub content_hash: String,
}

/// How a single file ended up after processing
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FileOutcome {
    /// All chunks were uploaded; the count may be zero for empty documents
    Uploaded(usize),
    /// File exceeded the size limit and was not read
    SkippedTooLarge { size: u64, max: u64 },
}

/// Totals for one ingestion run
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RunSummary {
    /// Eligible files found under the document root
    pub files_discovered: usize,
    /// Files skipped because the checkpoint already lists them
    pub files_already_completed: usize,
    /// Files skipped for exceeding the size limit
    pub files_too_large: usize,
    /// Files whose chunks were all uploaded during this run
    pub files_ingested: usize,
    /// Files that failed and were left out of the checkpoint
    pub files_failed: usize,
    /// Chunk records uploaded during this run
    pub chunks_uploaded: usize,
    /// Size of the checkpoint after the run
    pub completed_total: usize,
    /// Time taken in milliseconds
    pub duration_ms: u64,
    /// Per-file failures as "path: error"
    #[serde(default)]
    pub errors: Vec<String>,
}
