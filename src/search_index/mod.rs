// Azure AI Search is the only backend; the trait lets the pipeline run against fakes
pub mod azure_search;
pub use azure_search::AzureSearchIndex;

mod schema;
pub use schema::{
    HnswParameters, IndexDefinition, IndexField, VectorAlgorithm, VectorProfile, VectorSearch,
};

use crate::error::IndexError;
use crate::types::ChunkRecord;

/// Trait for the search index that receives chunk records
#[async_trait::async_trait]
pub trait SearchIndex: Send + Sync {
    /// Create the index, or update it in place when it already exists
    async fn create_or_update(&self, definition: &IndexDefinition) -> Result<(), IndexError>;

    /// Upload records, returning how many the service accepted.
    ///
    /// Any rejected record fails the whole call.
    async fn upload(&self, records: &[ChunkRecord]) -> Result<usize, IndexError>;

    /// Whether the configured index exists
    async fn exists(&self) -> Result<bool, IndexError>;

    /// Name of the target index
    fn index_name(&self) -> &str;
}
