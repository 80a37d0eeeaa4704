use crate::error::CheckpointError;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fs;
use std::path::{Path, PathBuf};

/// On-disk shape of the checkpoint file
#[derive(Debug, Default, Serialize, Deserialize)]
struct CheckpointFile {
    #[serde(default)]
    completed_files: Vec<String>,
}

/// Set of files whose chunks have all been uploaded, persisted between runs
#[derive(Debug, Clone)]
pub struct Checkpoint {
    path: PathBuf,
    completed: BTreeSet<String>,
}

impl Checkpoint {
    /// Load the checkpoint from disk.
    ///
    /// A missing, unreadable or malformed file yields an empty set.
    pub fn load(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let completed = match fs::read_to_string(&path) {
            Ok(content) => match serde_json::from_str::<CheckpointFile>(&content) {
                Ok(file) => file.completed_files.into_iter().collect(),
                Err(e) => {
                    tracing::warn!(
                        "Ignoring malformed checkpoint {}: {}",
                        path.display(),
                        e
                    );
                    BTreeSet::new()
                }
            },
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::debug!("Checkpoint not found, starting with empty set");
                BTreeSet::new()
            }
            Err(e) => {
                tracing::warn!("Ignoring unreadable checkpoint {}: {}", path.display(), e);
                BTreeSet::new()
            }
        };

        tracing::info!("Loaded checkpoint with {} completed files", completed.len());
        Self { path, completed }
    }

    /// Write the full set to disk, replacing the previous file atomically
    pub fn save(&self) -> Result<(), CheckpointError> {
        if let Some(parent) = self.path.parent()
            && !parent.as_os_str().is_empty()
        {
            fs::create_dir_all(parent).map_err(|e| {
                CheckpointError::DirectoryCreationFailed(format!("{}: {}", parent.display(), e))
            })?;
        }

        let file = CheckpointFile {
            completed_files: self.completed.iter().cloned().collect(),
        };
        let content = serde_json::to_string_pretty(&file).map_err(|e| self.save_error(e))?;

        let tmp = self.tmp_path();
        fs::write(&tmp, content).map_err(|e| self.save_error(e))?;
        fs::rename(&tmp, &self.path).map_err(|e| self.save_error(e))?;

        tracing::debug!("Saved checkpoint to {:?}", self.path);
        Ok(())
    }

    /// `<path>.tmp`
    fn tmp_path(&self) -> PathBuf {
        let mut tmp = self.path.clone().into_os_string();
        tmp.push(".tmp");
        PathBuf::from(tmp)
    }

    fn save_error(&self, e: impl std::fmt::Display) -> CheckpointError {
        CheckpointError::SaveFailed {
            path: self.path.display().to_string(),
            reason: e.to_string(),
        }
    }

    pub fn contains(&self, key: &str) -> bool {
        self.completed.contains(key)
    }

    /// Record a file as fully ingested. Call `save` to persist.
    pub fn mark_completed(&mut self, key: impl Into<String>) {
        self.completed.insert(key.into());
    }

    pub fn len(&self) -> usize {
        self.completed.len()
    }

    pub fn is_empty(&self) -> bool {
        self.completed.is_empty()
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_checkpoint_save_load() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("checkpoint.json");

        let mut checkpoint = Checkpoint::load(&path);
        checkpoint.mark_completed("/docs/a.pdf");
        checkpoint.mark_completed("/docs/b.docx");
        checkpoint.save().unwrap();

        let loaded = Checkpoint::load(&path);
        assert_eq!(loaded.len(), 2);
        assert!(loaded.contains("/docs/a.pdf"));
        assert!(loaded.contains("/docs/b.docx"));
        assert!(!loaded.contains("/docs/c.pptx"));
    }

    #[test]
    fn test_saved_file_shape() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("checkpoint.json");

        let mut checkpoint = Checkpoint::load(&path);
        checkpoint.mark_completed("/docs/z.pdf");
        checkpoint.mark_completed("/docs/a.pdf");
        checkpoint.save().unwrap();

        let value: serde_json::Value =
            serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(
            value,
            serde_json::json!({ "completed_files": ["/docs/a.pdf", "/docs/z.pdf"] })
        );
        assert!(!path.with_extension("tmp").exists());
    }

    #[test]
    fn test_load_nonexistent_checkpoint() {
        let checkpoint = Checkpoint::load("/nonexistent/path/checkpoint.json");
        assert!(checkpoint.is_empty());
    }

    #[test]
    fn test_load_malformed_checkpoint() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("checkpoint.json");
        fs::write(&path, "{ not json").unwrap();

        let checkpoint = Checkpoint::load(&path);
        assert!(checkpoint.is_empty());
    }

    #[test]
    fn test_load_without_completed_files_key() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("checkpoint.json");
        fs::write(&path, "{}").unwrap();

        assert!(Checkpoint::load(&path).is_empty());
    }

    #[test]
    fn test_save_creates_parent_directory() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("state").join("nested").join("checkpoint.json");

        let checkpoint = Checkpoint::load(&path);
        checkpoint.save().unwrap();
        assert!(path.exists());
    }

    #[test]
    fn test_save_writes_through_sibling_tmp_file() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("ingest_checkpoint.json");

        let mut checkpoint = Checkpoint::load(&path);
        assert_eq!(
            checkpoint.tmp_path(),
            temp_dir.path().join("ingest_checkpoint.json.tmp")
        );

        // A stale tmp file from an interrupted save is replaced, not read
        fs::write(checkpoint.tmp_path(), "{ half written").unwrap();
        checkpoint.mark_completed("/docs/a.pdf".to_string());
        checkpoint.save().unwrap();

        assert!(!checkpoint.tmp_path().exists());
        assert!(!temp_dir.path().join("ingest_checkpoint.tmp").exists());
        assert!(Checkpoint::load(&path).contains("/docs/a.pdf"));
    }

    #[test]
    fn test_save_into_file_as_directory_fails() {
        let temp_dir = TempDir::new().unwrap();
        let blocker = temp_dir.path().join("blocker");
        fs::write(&blocker, "file, not a directory").unwrap();

        let checkpoint = Checkpoint::load(blocker.join("checkpoint.json"));
        assert!(checkpoint.save().is_err());
    }
}
