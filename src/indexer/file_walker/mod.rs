//! File discovery for the document tree

use super::{SourceFile, SourceKind};
use crate::error::{ConfigError, Result};
use ignore::WalkBuilder;
use std::path::{Path, PathBuf};

pub struct FileWalker {
    pub(crate) root: PathBuf,
    pub(crate) exclude_patterns: Vec<String>,
}

impl FileWalker {
    pub fn new(root: impl AsRef<Path>) -> Self {
        Self {
            root: root.as_ref().to_path_buf(),
            exclude_patterns: vec![],
        }
    }

    /// Skip any file whose full path contains one of these substrings
    pub fn with_exclusions(mut self, exclude_patterns: Vec<String>) -> Self {
        self.exclude_patterns = exclude_patterns;
        self
    }

    /// Collect every supported file under the root, smallest first
    pub fn walk(&self) -> Result<Vec<SourceFile>> {
        if !self.root.is_dir() {
            return Err(ConfigError::DocsRootNotFound(self.root.display().to_string()).into());
        }

        let mut files = Vec::new();

        // Document trees are not source trees: no ignore files, hidden files included
        let walker = WalkBuilder::new(&self.root)
            .standard_filters(false)
            .follow_links(false)
            .build();

        for entry in walker {
            let entry = match entry {
                Ok(entry) => entry,
                Err(e) => {
                    tracing::warn!("Failed to read directory entry: {}", e);
                    continue;
                }
            };

            if !entry.file_type().is_some_and(|t| t.is_file()) {
                continue;
            }

            let path = entry.path();
            let Some(kind) = SourceKind::from_path(path) else {
                continue;
            };

            if self.is_excluded(path) {
                tracing::debug!("Skipping excluded path: {:?}", path);
                continue;
            }

            let size = match entry.metadata() {
                Ok(metadata) => metadata.len(),
                Err(e) => {
                    tracing::warn!("Failed to stat {:?}: {}", path, e);
                    continue;
                }
            };

            files.push(SourceFile {
                path: path.to_path_buf(),
                size,
                kind,
            });
        }

        files.sort_by(|a, b| a.size.cmp(&b.size).then_with(|| a.path.cmp(&b.path)));

        tracing::info!("Found {} files to ingest", files.len());
        Ok(files)
    }

    pub(crate) fn is_excluded(&self, path: &Path) -> bool {
        let path_str = path.to_string_lossy();
        self.exclude_patterns
            .iter()
            .any(|pattern| path_str.contains(pattern.as_str()))
    }
}
