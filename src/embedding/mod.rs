mod azure_openai;

pub use azure_openai::AzureOpenAiEmbedder;

use crate::error::EmbeddingError;
use async_trait::async_trait;

/// Trait for embedding generation
#[async_trait]
pub trait EmbeddingProvider: Send + Sync {
    /// Generate one embedding per input text, in input order
    async fn embed_batch(&self, texts: Vec<String>) -> Result<Vec<Vec<f32>>, EmbeddingError>;

    /// Get the dimension of the embeddings
    fn dimension(&self) -> usize;

    /// Get the model name
    fn model_name(&self) -> &str;
}

/// Check that every vector has the expected dimension
pub fn ensure_dimension(vectors: &[Vec<f32>], expected: usize) -> Result<(), EmbeddingError> {
    match vectors.iter().find(|v| v.len() != expected) {
        Some(bad) => Err(EmbeddingError::DimensionMismatch {
            expected,
            actual: bad.len(),
        }),
        None => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ensure_dimension() {
        assert!(ensure_dimension(&[vec![0.0; 4], vec![1.0; 4]], 4).is_ok());
        assert!(ensure_dimension(&[], 4).is_ok());

        let err = ensure_dimension(&[vec![0.0; 4], vec![0.0; 3]], 4).unwrap_err();
        assert!(matches!(
            err,
            EmbeddingError::DimensionMismatch {
                expected: 4,
                actual: 3
            }
        ));
    }
}
