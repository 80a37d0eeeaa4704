//! Document discovery, text extraction, cleaning and chunking
//!
//! Walks a document tree for PDF, DOCX and PPTX files, pulls plain text out of
//! each format, strips boilerplate lines and splits the result into overlapping
//! character windows ready for embedding.

mod chunker;
mod cleaner;
mod dedup;
mod docx_extractor;
mod extract;
mod file_walker;
mod layout;
mod ooxml;
mod pdf_extractor;
mod pptx_extractor;

pub use chunker::{Chunks, TextChunker, TextWindow, content_hash};
pub use cleaner::{TextCleaner, normalize_whitespace, truncate_chars};
pub use dedup::ChunkDeduplicator;
pub use docx_extractor::extract_docx_text;
pub use extract::{DocumentExtractor, TextExtractor, TextUnit};
pub use file_walker::FileWalker;
pub use layout::{CourseModuleLayout, MetadataLayout};
pub use pdf_extractor::extract_pdf_pages;
pub use pptx_extractor::extract_pptx_text;

use std::path::{Path, PathBuf};

/// Document formats the pipeline can read
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SourceKind {
    Pdf,
    Docx,
    Pptx,
}

impl SourceKind {
    /// Detect the format from a file extension, ignoring case
    pub fn from_path(path: &Path) -> Option<Self> {
        let ext = path.extension()?.to_str()?.to_ascii_lowercase();
        match ext.as_str() {
            "pdf" => Some(SourceKind::Pdf),
            "docx" => Some(SourceKind::Docx),
            "pptx" => Some(SourceKind::Pptx),
            _ => None,
        }
    }

    /// Value stored in the `source_type` field
    pub fn as_str(&self) -> &'static str {
        match self {
            SourceKind::Pdf => "pdf",
            SourceKind::Docx => "docx",
            SourceKind::Pptx => "pptx",
        }
    }
}

/// A file discovered under the document root
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceFile {
    pub path: PathBuf,
    /// Size in bytes at discovery time
    pub size: u64,
    pub kind: SourceKind,
}

impl SourceFile {
    /// Checkpoint key for this file
    pub fn key(&self) -> String {
        self.path.to_string_lossy().to_string()
    }
}
