/// Configuration system for doc-ingest
///
/// Supports loading from multiple sources with priority:
/// Environment variables > Config file > Defaults
use crate::error::{ConfigError, IngestError};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;

/// Main configuration structure
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    /// Search service and index configuration
    #[serde(default)]
    pub search: SearchConfig,

    /// Embedding service configuration
    #[serde(default)]
    pub embedding: EmbeddingConfig,

    /// Document discovery, cleaning and chunking configuration
    #[serde(default)]
    pub ingest: IngestConfig,
}

/// Search service configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchConfig {
    /// Service endpoint, e.g. https://my-service.search.windows.net
    #[serde(default)]
    pub endpoint: String,

    /// Admin key used for schema changes and uploads
    #[serde(default)]
    pub api_key: String,

    /// Target index name
    #[serde(default = "default_index_name")]
    pub index_name: String,

    /// REST API version
    #[serde(default = "default_search_api_version")]
    pub api_version: String,

    /// Dimension of the content_vector field
    #[serde(default = "default_dimension")]
    pub dimension: usize,

    /// Maximum number of records per upload request
    #[serde(default = "default_upload_batch_size")]
    pub upload_batch_size: usize,

    /// Timeout in seconds for a single search service request
    #[serde(default = "default_search_timeout")]
    pub timeout_secs: u64,

    /// Retries for throttled or transient search requests
    #[serde(default = "default_max_retries")]
    pub max_retries: usize,
}

/// Embedding service configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmbeddingConfig {
    /// Azure OpenAI resource endpoint
    #[serde(default)]
    pub endpoint: String,

    #[serde(default)]
    pub api_key: String,

    /// Embedding deployment name
    #[serde(default)]
    pub deployment: String,

    #[serde(default = "default_openai_api_version")]
    pub api_version: String,

    /// Number of chunks sent per embedding request
    #[serde(default = "default_embed_batch_size")]
    pub batch_size: usize,

    #[serde(default = "default_connect_timeout")]
    pub connect_timeout_secs: u64,

    /// Timeout in seconds for a whole embedding request
    #[serde(default = "default_embedding_timeout")]
    pub timeout_secs: u64,

    #[serde(default = "default_max_retries")]
    pub max_retries: usize,
}

/// Ingestion configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IngestConfig {
    /// Root of the document tree: <root>/<course>/<module>/...
    #[serde(default = "default_docs_root")]
    pub docs_root: PathBuf,

    /// JSON file recording fully ingested files
    #[serde(default = "default_checkpoint_path")]
    pub checkpoint_path: PathBuf,

    /// Files larger than this are skipped
    #[serde(default = "default_max_file_mb")]
    pub max_file_mb: u64,

    /// Pages past this index are ignored
    #[serde(default = "default_max_pdf_pages")]
    pub max_pdf_pages: usize,

    /// Maximum chunk length in characters
    #[serde(default = "default_chunk_max_chars")]
    pub chunk_max_chars: usize,

    /// Characters shared by consecutive chunks
    #[serde(default = "default_chunk_overlap")]
    pub chunk_overlap: usize,

    /// Pause after each upload request
    #[serde(default)]
    pub sleep_between_batches_secs: f64,

    /// Cap on characters per PDF page or per DOCX/PPTX document
    #[serde(default = "default_max_doc_chars")]
    pub max_doc_chars: usize,

    /// Any file whose path contains one of these is excluded
    #[serde(default = "default_skip_path_substrings")]
    pub skip_path_substrings: Vec<String>,

    /// Case-insensitive regular expressions for header/footer lines to drop
    #[serde(default = "default_boilerplate_patterns")]
    pub boilerplate_patterns: Vec<String>,
}

// Default value functions
fn default_index_name() -> String {
    "training-index".to_string()
}

fn default_search_api_version() -> String {
    "2023-11-01".to_string()
}

fn default_dimension() -> usize {
    1536
}

fn default_upload_batch_size() -> usize {
    200
}

fn default_search_timeout() -> u64 {
    60
}

fn default_max_retries() -> usize {
    5
}

fn default_openai_api_version() -> String {
    "2024-02-15-preview".to_string()
}

fn default_embed_batch_size() -> usize {
    32
}

fn default_connect_timeout() -> u64 {
    10
}

fn default_embedding_timeout() -> u64 {
    60
}

fn default_docs_root() -> PathBuf {
    PathBuf::from("./docs")
}

fn default_checkpoint_path() -> PathBuf {
    PathBuf::from("./ingest_checkpoint.json")
}

fn default_max_file_mb() -> u64 {
    200
}

fn default_max_pdf_pages() -> usize {
    300
}

fn default_chunk_max_chars() -> usize {
    2000
}

fn default_chunk_overlap() -> usize {
    150
}

fn default_max_doc_chars() -> usize {
    300_000
}

fn default_skip_path_substrings() -> Vec<String> {
    vec![
        "Training Certificates".to_string(),
        "Certificate Templates".to_string(),
        "/Forms/".to_string(),
    ]
}

fn default_boilerplate_patterns() -> Vec<String> {
    vec![
        r"WWW\.GSGLI\.COM".to_string(),
        r"\bTF(F|B)\s*#\s*\d+".to_string(),
        "state of the art materials".to_string(),
    ]
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            endpoint: String::new(),
            api_key: String::new(),
            index_name: default_index_name(),
            api_version: default_search_api_version(),
            dimension: default_dimension(),
            upload_batch_size: default_upload_batch_size(),
            timeout_secs: default_search_timeout(),
            max_retries: default_max_retries(),
        }
    }
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            endpoint: String::new(),
            api_key: String::new(),
            deployment: String::new(),
            api_version: default_openai_api_version(),
            batch_size: default_embed_batch_size(),
            connect_timeout_secs: default_connect_timeout(),
            timeout_secs: default_embedding_timeout(),
            max_retries: default_max_retries(),
        }
    }
}

impl Default for IngestConfig {
    fn default() -> Self {
        Self {
            docs_root: default_docs_root(),
            checkpoint_path: default_checkpoint_path(),
            max_file_mb: default_max_file_mb(),
            max_pdf_pages: default_max_pdf_pages(),
            chunk_max_chars: default_chunk_max_chars(),
            chunk_overlap: default_chunk_overlap(),
            sleep_between_batches_secs: 0.0,
            max_doc_chars: default_max_doc_chars(),
            skip_path_substrings: default_skip_path_substrings(),
            boilerplate_patterns: default_boilerplate_patterns(),
        }
    }
}

impl IngestConfig {
    /// Size limit in bytes
    pub fn max_file_bytes(&self) -> u64 {
        self.max_file_mb.saturating_mul(1024 * 1024)
    }

    pub fn sleep_between_batches(&self) -> Duration {
        Duration::from_secs_f64(self.sleep_between_batches_secs.max(0.0))
    }
}

impl Config {
    /// Load configuration from file
    pub fn from_file(path: &Path) -> Result<Self, IngestError> {
        if !path.exists() {
            return Err(ConfigError::FileNotFound(path.display().to_string()).into());
        }

        let content = std::fs::read_to_string(path)
            .map_err(|e| ConfigError::LoadFailed(format!("Failed to read config file: {}", e)))?;

        let config: Config = toml::from_str(&content)
            .map_err(|e| ConfigError::ParseFailed(format!("Invalid TOML: {}", e)))?;

        Ok(config)
    }

    /// Build the runtime configuration: optional file, then environment, then validation
    pub fn load(path: Option<&Path>) -> Result<Self, IngestError> {
        let mut config = match path {
            Some(path) => {
                tracing::info!("Loading config from: {}", path.display());
                Self::from_file(path)?
            }
            None => Self::default(),
        };
        config.apply_env_overrides()?;
        config.validate()?;
        Ok(config)
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<(), IngestError> {
        let ingest = &self.ingest;

        if ingest.chunk_max_chars == 0 {
            return Err(invalid("CHUNK_MAX_CHARS", "must be greater than 0"));
        }

        if ingest.chunk_overlap >= ingest.chunk_max_chars {
            return Err(invalid(
                "CHUNK_OVERLAP",
                format!(
                    "must be smaller than CHUNK_MAX_CHARS ({}), got {}",
                    ingest.chunk_max_chars, ingest.chunk_overlap
                ),
            ));
        }

        if self.embedding.batch_size == 0 {
            return Err(invalid("EMBED_BATCH_SIZE", "must be greater than 0"));
        }

        if self.search.upload_batch_size == 0 {
            return Err(invalid("UPLOAD_BATCH_SIZE", "must be greater than 0"));
        }

        if self.search.dimension == 0 {
            return Err(invalid("EMBEDDING_DIM", "must be greater than 0"));
        }

        if ingest.max_pdf_pages == 0 {
            return Err(invalid("MAX_PDF_PAGES", "must be greater than 0"));
        }

        if ingest.max_doc_chars == 0 {
            return Err(invalid("MAX_DOC_CHARS", "must be greater than 0"));
        }

        if !ingest.sleep_between_batches_secs.is_finite() || ingest.sleep_between_batches_secs < 0.0
        {
            return Err(invalid(
                "SLEEP_BETWEEN_BATCHES_SEC",
                format!(
                    "must be a non-negative number, got {}",
                    ingest.sleep_between_batches_secs
                ),
            ));
        }

        for pattern in &ingest.boilerplate_patterns {
            if let Err(e) = regex::Regex::new(pattern) {
                return Err(invalid("boilerplate_patterns", format!("'{}': {}", pattern, e)));
            }
        }

        Ok(())
    }

    /// Credentials needed by anything that talks to the search service
    pub fn require_search(&self) -> Result<(), IngestError> {
        require("AZURE_SEARCH_SERVICE", &self.search.endpoint)?;
        require("AZURE_SEARCH_ADMIN_KEY", &self.search.api_key)?;
        Ok(())
    }

    /// Credentials needed by anything that calls the embedding service
    pub fn require_embedding(&self) -> Result<(), IngestError> {
        require("AZURE_OPENAI_ENDPOINT", &self.embedding.endpoint)?;
        require("AZURE_OPENAI_API_KEY", &self.embedding.api_key)?;
        require(
            "AZURE_OPENAI_EMBEDDING_DEPLOYMENT",
            &self.embedding.deployment,
        )?;
        Ok(())
    }

    /// Make the document root and checkpoint path absolute.
    ///
    /// The root must exist; checkpoint keys are absolute paths beneath it.
    pub fn resolve_paths(&mut self) -> Result<(), IngestError> {
        let root = &self.ingest.docs_root;
        if !root.is_dir() {
            return Err(ConfigError::DocsRootNotFound(root.display().to_string()).into());
        }
        self.ingest.docs_root = root
            .canonicalize()
            .map_err(|_| ConfigError::DocsRootNotFound(root.display().to_string()))?;

        self.ingest.checkpoint_path =
            std::path::absolute(&self.ingest.checkpoint_path).map_err(|e| {
                ConfigError::InvalidValue {
                    key: "CHECKPOINT_PATH".to_string(),
                    reason: e.to_string(),
                }
            })?;
        Ok(())
    }

    /// Apply environment variable overrides
    pub fn apply_env_overrides(&mut self) -> Result<(), IngestError> {
        self.apply_overrides_from(|key| std::env::var(key).ok())
    }

    /// Apply overrides from an arbitrary variable lookup.
    ///
    /// Empty values are treated as unset. A value that fails to parse is an error.
    pub fn apply_overrides_from<F>(&mut self, lookup: F) -> Result<(), IngestError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        // Search service
        if let Some(v) = get("AZURE_SEARCH_SERVICE") {
            self.search.endpoint = v;
        }
        if let Some(v) = get("AZURE_SEARCH_ADMIN_KEY") {
            self.search.api_key = v;
        }
        if let Some(v) = get("AZURE_SEARCH_INDEX") {
            self.search.index_name = v;
        }
        if let Some(v) = get("AZURE_SEARCH_API_VERSION") {
            self.search.api_version = v;
        }
        if let Some(v) = get("EMBEDDING_DIM") {
            self.search.dimension = parse_var("EMBEDDING_DIM", &v)?;
        }
        if let Some(v) = get("UPLOAD_BATCH_SIZE") {
            self.search.upload_batch_size = parse_var("UPLOAD_BATCH_SIZE", &v)?;
        }

        // Embedding service
        if let Some(v) = get("AZURE_OPENAI_ENDPOINT") {
            self.embedding.endpoint = v;
        }
        if let Some(v) = get("AZURE_OPENAI_API_KEY") {
            self.embedding.api_key = v;
        }
        if let Some(v) = get("AZURE_OPENAI_EMBEDDING_DEPLOYMENT") {
            self.embedding.deployment = v;
        }
        if let Some(v) = get("AZURE_OPENAI_API_VERSION") {
            self.embedding.api_version = v;
        }
        if let Some(v) = get("EMBED_BATCH_SIZE") {
            self.embedding.batch_size = parse_var("EMBED_BATCH_SIZE", &v)?;
        }

        // Ingestion
        if let Some(v) = get("DOCS_ROOT") {
            self.ingest.docs_root = PathBuf::from(v);
        }
        if let Some(v) = get("CHECKPOINT_PATH") {
            self.ingest.checkpoint_path = PathBuf::from(v);
        }
        if let Some(v) = get("MAX_FILE_MB") {
            self.ingest.max_file_mb = parse_var("MAX_FILE_MB", &v)?;
        }
        if let Some(v) = get("MAX_PDF_PAGES") {
            self.ingest.max_pdf_pages = parse_var("MAX_PDF_PAGES", &v)?;
        }
        if let Some(v) = get("CHUNK_MAX_CHARS") {
            self.ingest.chunk_max_chars = parse_var("CHUNK_MAX_CHARS", &v)?;
        }
        if let Some(v) = get("CHUNK_OVERLAP") {
            self.ingest.chunk_overlap = parse_var("CHUNK_OVERLAP", &v)?;
        }
        if let Some(v) = get("SLEEP_BETWEEN_BATCHES_SEC") {
            self.ingest.sleep_between_batches_secs = parse_var("SLEEP_BETWEEN_BATCHES_SEC", &v)?;
        }
        if let Some(v) = get("MAX_DOC_CHARS") {
            self.ingest.max_doc_chars = parse_var("MAX_DOC_CHARS", &v)?;
        }

        Ok(())
    }
}

fn invalid(key: &str, reason: impl Into<String>) -> IngestError {
    ConfigError::InvalidValue {
        key: key.to_string(),
        reason: reason.into(),
    }
    .into()
}

fn require(key: &str, value: &str) -> Result<(), IngestError> {
    if value.trim().is_empty() {
        return Err(ConfigError::MissingRequired(key.to_string()).into());
    }
    Ok(())
}

fn parse_var<T>(key: &str, value: &str) -> Result<T, IngestError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    value
        .trim()
        .parse()
        .map_err(|e: T::Err| invalid(key, format!("'{}': {}", value, e)))
}
