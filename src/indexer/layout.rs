//! Mapping from a file's position in the document tree to index metadata

use crate::types::DocumentMetadata;
use std::path::{Component, Path};

/// Derives document, course and module identifiers for a file
pub trait MetadataLayout: Send + Sync {
    fn infer(&self, root: &Path, file: &Path) -> DocumentMetadata;
}

/// `<root>/<course>/<module>/.../<file>` layout.
///
/// The first directory below the root names the course and the second names
/// the module. Files sitting too close to the root get the defaults instead.
#[derive(Debug, Clone)]
pub struct CourseModuleLayout {
    pub default_course: String,
    pub default_module: String,
}

impl Default for CourseModuleLayout {
    fn default() -> Self {
        Self {
            default_course: "general".to_string(),
            default_module: "misc".to_string(),
        }
    }
}

impl MetadataLayout for CourseModuleLayout {
    fn infer(&self, root: &Path, file: &Path) -> DocumentMetadata {
        let relative = match file.strip_prefix(root) {
            Ok(rel) => rel,
            Err(_) => file.file_name().map(Path::new).unwrap_or(file),
        };

        let parts: Vec<String> = relative
            .components()
            .filter_map(|c| match c {
                Component::Normal(part) => Some(part.to_string_lossy().to_string()),
                _ => None,
            })
            .collect();

        let course_id = if parts.len() >= 2 {
            parts[0].clone()
        } else {
            self.default_course.clone()
        };
        let module_id = if parts.len() >= 3 {
            parts[1].clone()
        } else {
            self.default_module.clone()
        };
        let doc_id = file
            .file_stem()
            .map(|s| s.to_string_lossy().to_string())
            .unwrap_or_default();

        DocumentMetadata {
            doc_id,
            course_id,
            module_id,
        }
    }
}
