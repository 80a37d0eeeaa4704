use super::EmbeddingProvider;
use crate::config::EmbeddingConfig;
use crate::error::EmbeddingError;
use crate::http::{RetryPolicy, error_body, send_with_retry};
use async_trait::async_trait;
use reqwest::header::{CONTENT_TYPE, HeaderMap, HeaderValue};
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Embeddings client for an Azure OpenAI deployment
pub struct AzureOpenAiEmbedder {
    client: Client,
    url: String,
    deployment: String,
    dimension: usize,
    retry: RetryPolicy,
}

impl AzureOpenAiEmbedder {
    /// Build a client from the embedding settings.
    ///
    /// `dimension` is the vector size the index expects; responses are checked
    /// against it by the caller.
    pub fn new(config: &EmbeddingConfig, dimension: usize) -> Result<Self, EmbeddingError> {
        let mut headers = HeaderMap::new();
        headers.insert(
            "api-key",
            HeaderValue::from_str(config.api_key.trim())
                .map_err(|e| EmbeddingError::Transport(format!("invalid API key header: {}", e)))?,
        );
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

        let client = Client::builder()
            .connect_timeout(Duration::from_secs(config.connect_timeout_secs))
            .timeout(Duration::from_secs(config.timeout_secs))
            .default_headers(headers)
            .build()
            .map_err(|e| EmbeddingError::Transport(format!("failed to build HTTP client: {}", e)))?;

        Ok(Self {
            client,
            url: embeddings_url(&config.endpoint, &config.deployment, &config.api_version),
            deployment: config.deployment.clone(),
            dimension,
            retry: RetryPolicy::new(config.max_retries),
        })
    }
}

#[async_trait]
impl EmbeddingProvider for AzureOpenAiEmbedder {
    async fn embed_batch(&self, texts: Vec<String>) -> Result<Vec<Vec<f32>>, EmbeddingError> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }

        let request = EmbeddingRequest { input: &texts };
        let resp = send_with_retry(&self.retry, || self.client.post(&self.url).json(&request))
            .await
            .map_err(|e| EmbeddingError::Transport(e.to_string()))?;

        let status = resp.status();
        if !status.is_success() {
            return Err(classify_status(status, error_body(resp).await));
        }

        let body = resp
            .text()
            .await
            .map_err(|e| EmbeddingError::Transport(e.to_string()))?;
        parse_embedding_response(&body, texts.len())
    }

    fn dimension(&self) -> usize {
        self.dimension
    }

    fn model_name(&self) -> &str {
        &self.deployment
    }
}

fn embeddings_url(endpoint: &str, deployment: &str, api_version: &str) -> String {
    format!(
        "{}/openai/deployments/{}/embeddings?api-version={}",
        endpoint.trim_end_matches('/'),
        deployment,
        api_version
    )
}

fn classify_status(status: StatusCode, body: String) -> EmbeddingError {
    match status {
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => EmbeddingError::Unauthorized {
            status: status.as_u16(),
            body,
        },
        _ => EmbeddingError::RequestFailed {
            status: status.as_u16(),
            body,
        },
    }
}

/// Decode a response body into vectors ordered by their `index`
fn parse_embedding_response(body: &str, expected: usize) -> Result<Vec<Vec<f32>>, EmbeddingError> {
    let mut parsed: EmbeddingResponse =
        serde_json::from_str(body).map_err(|e| EmbeddingError::InvalidResponse(e.to_string()))?;
    parsed.data.sort_by_key(|entry| entry.index);

    if parsed.data.len() != expected {
        return Err(EmbeddingError::CountMismatch {
            expected,
            actual: parsed.data.len(),
        });
    }

    Ok(parsed.data.into_iter().map(|entry| entry.embedding).collect())
}

#[derive(Serialize)]
struct EmbeddingRequest<'a> {
    input: &'a [String],
}

#[derive(Debug, Deserialize)]
struct EmbeddingResponse {
    data: Vec<EmbeddingData>,
}

#[derive(Debug, Deserialize)]
struct EmbeddingData {
    embedding: Vec<f32>,
    index: usize,
}
