/// Centralized error types for doc-ingest using thiserror
///
/// Errors are split by the collaborator that raised them so the run loop can
/// tell a failure that only affects the current file from one that will recur
/// on every file and must stop the run.
use thiserror::Error;

/// Main error type for the ingestion pipeline
#[derive(Error, Debug)]
pub enum IngestError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Checkpoint error: {0}")]
    Checkpoint(#[from] CheckpointError),

    #[error("Extraction error: {0}")]
    Extraction(#[from] ExtractionError),

    #[error("Embedding error: {0}")]
    Embedding(#[from] EmbeddingError),

    #[error("Search index error: {0}")]
    Index(#[from] IndexError),
}

/// Errors related to configuration
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to load configuration file: {0}")]
    LoadFailed(String),

    #[error("Failed to parse configuration: {0}")]
    ParseFailed(String),

    #[error("Invalid configuration value for '{key}': {reason}")]
    InvalidValue { key: String, reason: String },

    #[error("Missing required configuration: {0}")]
    MissingRequired(String),

    #[error("Configuration file not found: {0}")]
    FileNotFound(String),

    #[error("Document root does not exist or is not a directory: {0}")]
    DocsRootNotFound(String),
}

/// Errors related to the completion checkpoint
#[derive(Error, Debug)]
pub enum CheckpointError {
    #[error("Failed to save checkpoint to '{path}': {reason}")]
    SaveFailed { path: String, reason: String },

    #[error("Failed to create checkpoint directory: {0}")]
    DirectoryCreationFailed(String),
}

/// Errors raised while turning a document into plain text
#[derive(Error, Debug)]
pub enum ExtractionError {
    #[error("Failed to open '{file}': {reason}")]
    OpenFailed { file: String, reason: String },

    #[error("Missing archive entry '{entry}' in {file}")]
    MissingEntry { file: String, entry: String },

    #[error("Malformed XML in {file}: {reason}")]
    MalformedXml { file: String, reason: String },

    #[error("Failed to extract PDF text from {file}: {reason}")]
    Pdf { file: String, reason: String },

    #[error("Extraction task failed: {0}")]
    TaskFailed(String),
}

/// Errors related to embedding generation
#[derive(Error, Debug)]
pub enum EmbeddingError {
    #[error("Embedding service rejected credentials ({status}): {body}")]
    Unauthorized { status: u16, body: String },

    #[error("Embedding request failed ({status}): {body}")]
    RequestFailed { status: u16, body: String },

    #[error("Embedding transport error: {0}")]
    Transport(String),

    #[error("Failed to parse embedding response: {0}")]
    InvalidResponse(String),

    #[error("Embedding service returned {actual} vectors for {expected} inputs")]
    CountMismatch { expected: usize, actual: usize },

    #[error("Invalid embedding dimension: expected {expected}, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },
}

/// Errors related to the search index service
#[derive(Error, Debug)]
pub enum IndexError {
    #[error("Search service rejected credentials ({status}): {body}")]
    Unauthorized { status: u16, body: String },

    #[error("Index '{0}' not found")]
    IndexNotFound(String),

    #[error("Search request failed ({status}): {body}")]
    RequestFailed { status: u16, body: String },

    #[error("Search transport error: {0}")]
    Transport(String),

    #[error("Failed to parse search response: {0}")]
    InvalidResponse(String),

    #[error("{failed} of {total} documents were rejected: {keys}")]
    PartialFailure {
        failed: usize,
        total: usize,
        keys: String,
    },
}

impl IngestError {
    /// Whether this error must abort the whole run rather than just the current file.
    ///
    /// Credential and missing-index failures recur identically on every file,
    /// and a checkpoint that cannot be written means progress can't be recorded.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            IngestError::Config(_)
                | IngestError::Checkpoint(_)
                | IngestError::Embedding(EmbeddingError::Unauthorized { .. })
                | IngestError::Index(IndexError::Unauthorized { .. })
                | IngestError::Index(IndexError::IndexNotFound(_))
        )
    }
}

/// Result alias used across the pipeline
pub type Result<T, E = IngestError> = std::result::Result<T, E>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = IngestError::Config(ConfigError::MissingRequired(
            "AZURE_SEARCH_SERVICE".to_string(),
        ));
        assert_eq!(
            err.to_string(),
            "Configuration error: Missing required configuration: AZURE_SEARCH_SERVICE"
        );
    }

    #[test]
    fn test_auth_failures_are_fatal() {
        let embed: IngestError = EmbeddingError::Unauthorized {
            status: 401,
            body: "bad key".to_string(),
        }
        .into();
        assert!(embed.is_fatal());

        let index: IngestError = IndexError::Unauthorized {
            status: 403,
            body: "forbidden".to_string(),
        }
        .into();
        assert!(index.is_fatal());

        let missing: IngestError = IndexError::IndexNotFound("training-index".to_string()).into();
        assert!(missing.is_fatal());
    }

    #[test]
    fn test_per_file_failures_are_not_fatal() {
        let extraction: IngestError = ExtractionError::MissingEntry {
            file: "a.docx".to_string(),
            entry: "word/document.xml".to_string(),
        }
        .into();
        assert!(!extraction.is_fatal());

        let throttled: IngestError = EmbeddingError::RequestFailed {
            status: 429,
            body: "slow down".to_string(),
        }
        .into();
        assert!(!throttled.is_fatal());

        let partial: IngestError = IndexError::PartialFailure {
            failed: 1,
            total: 3,
            keys: "abc".to_string(),
        }
        .into();
        assert!(!partial.is_fatal());
    }

    #[test]
    fn test_embedding_error_dimension_mismatch() {
        let err = EmbeddingError::DimensionMismatch {
            expected: 1536,
            actual: 768,
        };
        assert_eq!(
            err.to_string(),
            "Invalid embedding dimension: expected 1536, got 768"
        );
    }

    #[test]
    fn test_partial_failure_display() {
        let err = IndexError::PartialFailure {
            failed: 2,
            total: 200,
            keys: "k1, k2".to_string(),
        };
        assert_eq!(err.to_string(), "2 of 200 documents were rejected: k1, k2");
    }

    #[test]
    fn test_config_error_invalid_value() {
        let err = ConfigError::InvalidValue {
            key: "CHUNK_OVERLAP".to_string(),
            reason: "must be smaller than CHUNK_MAX_CHARS".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "Invalid configuration value for 'CHUNK_OVERLAP': must be smaller than CHUNK_MAX_CHARS"
        );
    }
}
