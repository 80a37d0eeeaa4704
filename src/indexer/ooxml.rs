//! Shared access to the zip container used by DOCX and PPTX files

use crate::error::ExtractionError;
use std::fs::File;
use std::io::Read;
use std::path::Path;
use zip::ZipArchive;
use zip::result::ZipError;

pub(super) const WORDPROCESSING_NS: &[u8] =
    b"http://schemas.openxmlformats.org/wordprocessingml/2006/main";
pub(super) const DRAWING_NS: &[u8] = b"http://schemas.openxmlformats.org/drawingml/2006/main";
pub(super) const PRESENTATION_NS: &[u8] =
    b"http://schemas.openxmlformats.org/presentationml/2006/main";

pub(super) fn open_archive(path: &Path) -> Result<ZipArchive<File>, ExtractionError> {
    let open_failed = |reason: String| ExtractionError::OpenFailed {
        file: path.display().to_string(),
        reason,
    };
    let file = File::open(path).map_err(|e| open_failed(e.to_string()))?;
    ZipArchive::new(file).map_err(|e| open_failed(e.to_string()))
}

pub(super) fn read_entry(
    archive: &mut ZipArchive<File>,
    path: &Path,
    entry: &str,
) -> Result<String, ExtractionError> {
    let mut zipped = archive.by_name(entry).map_err(|e| match e {
        ZipError::FileNotFound => ExtractionError::MissingEntry {
            file: path.display().to_string(),
            entry: entry.to_string(),
        },
        other => ExtractionError::OpenFailed {
            file: path.display().to_string(),
            reason: other.to_string(),
        },
    })?;

    let mut xml = String::new();
    zipped
        .read_to_string(&mut xml)
        .map_err(|e| ExtractionError::OpenFailed {
            file: format!("{}:{}", path.display(), entry),
            reason: e.to_string(),
        })?;
    Ok(xml)
}

pub(super) fn malformed(path: &Path, entry: &str, e: impl std::fmt::Display) -> ExtractionError {
    ExtractionError::MalformedXml {
        file: format!("{}:{}", path.display(), entry),
        reason: e.to_string(),
    }
}
