use super::{SourceFile, SourceKind, extract_docx_text, extract_pdf_pages, extract_pptx_text};
use crate::error::ExtractionError;
use crate::types::NO_PAGE;

/// A unit of raw text pulled out of a document.
///
/// PDFs yield one unit per page; Word and PowerPoint files yield a single unit
/// for the whole file with `page_num` set to [`NO_PAGE`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextUnit {
    pub page_num: i32,
    pub text: String,
}

impl TextUnit {
    pub fn new(page_num: i32, text: impl Into<String>) -> Self {
        Self {
            page_num,
            text: text.into(),
        }
    }
}

/// Turns a source file into raw text units.
///
/// Implementations are blocking and are driven from `spawn_blocking`.
pub trait TextExtractor: Send + Sync {
    fn extract(&self, file: &SourceFile) -> Result<Vec<TextUnit>, ExtractionError>;
}

/// Dispatches to the PDF, DOCX or PPTX reader based on the file's kind
#[derive(Debug, Clone)]
pub struct DocumentExtractor {
    max_pdf_pages: usize,
}

impl DocumentExtractor {
    pub fn new(max_pdf_pages: usize) -> Self {
        Self { max_pdf_pages }
    }
}

impl TextExtractor for DocumentExtractor {
    fn extract(&self, file: &SourceFile) -> Result<Vec<TextUnit>, ExtractionError> {
        match file.kind {
            SourceKind::Pdf => Ok(extract_pdf_pages(&file.path, self.max_pdf_pages)?
                .into_iter()
                .map(|(index, text)| TextUnit::new(index as i32, text))
                .collect()),
            SourceKind::Docx => Ok(vec![TextUnit::new(
                NO_PAGE,
                extract_docx_text(&file.path)?,
            )]),
            SourceKind::Pptx => Ok(vec![TextUnit::new(
                NO_PAGE,
                extract_pptx_text(&file.path)?,
            )]),
        }
    }
}
