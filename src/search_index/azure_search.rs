use super::{IndexDefinition, SearchIndex};
use crate::config::SearchConfig;
use crate::error::IndexError;
use crate::http::{RetryPolicy, error_body, send_with_retry};
use crate::types::ChunkRecord;
use reqwest::header::{CONTENT_TYPE, HeaderMap, HeaderValue};
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// REST client for one Azure AI Search index
pub struct AzureSearchIndex {
    client: Client,
    endpoint: String,
    index_name: String,
    api_version: String,
    retry: RetryPolicy,
}

impl AzureSearchIndex {
    pub fn new(config: &SearchConfig) -> Result<Self, IndexError> {
        let mut headers = HeaderMap::new();
        headers.insert(
            "api-key",
            HeaderValue::from_str(config.api_key.trim())
                .map_err(|e| IndexError::Transport(format!("invalid API key header: {}", e)))?,
        );
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .default_headers(headers)
            .build()
            .map_err(|e| IndexError::Transport(format!("failed to build HTTP client: {}", e)))?;

        Ok(Self {
            client,
            endpoint: config.endpoint.trim_end_matches('/').to_string(),
            index_name: config.index_name.clone(),
            api_version: config.api_version.clone(),
            retry: RetryPolicy::new(config.max_retries),
        })
    }

    fn index_url(&self) -> String {
        format!(
            "{}/indexes/{}?api-version={}",
            self.endpoint, self.index_name, self.api_version
        )
    }

    fn docs_url(&self) -> String {
        format!(
            "{}/indexes/{}/docs/index?api-version={}",
            self.endpoint, self.index_name, self.api_version
        )
    }

    fn classify_status(&self, status: StatusCode, body: String) -> IndexError {
        match status {
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => IndexError::Unauthorized {
                status: status.as_u16(),
                body,
            },
            StatusCode::NOT_FOUND => IndexError::IndexNotFound(self.index_name.clone()),
            _ => IndexError::RequestFailed {
                status: status.as_u16(),
                body,
            },
        }
    }
}

#[async_trait::async_trait]
impl SearchIndex for AzureSearchIndex {
    async fn create_or_update(&self, definition: &IndexDefinition) -> Result<(), IndexError> {
        let url = format!(
            "{}/indexes/{}?api-version={}",
            self.endpoint, definition.name, self.api_version
        );
        let resp = send_with_retry(&self.retry, || self.client.put(&url).json(definition))
            .await
            .map_err(|e| IndexError::Transport(e.to_string()))?;

        let status = resp.status();
        if !status.is_success() {
            let body = error_body(resp).await;
            return Err(match status {
                StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => IndexError::Unauthorized {
                    status: status.as_u16(),
                    body,
                },
                _ => IndexError::RequestFailed {
                    status: status.as_u16(),
                    body,
                },
            });
        }

        tracing::info!("Index '{}' created or updated ({})", definition.name, status);
        Ok(())
    }

    async fn upload(&self, records: &[ChunkRecord]) -> Result<usize, IndexError> {
        if records.is_empty() {
            return Ok(0);
        }

        let batch = UploadBatch {
            value: records.iter().map(UploadAction::upload).collect(),
        };
        let url = self.docs_url();
        let resp = send_with_retry(&self.retry, || self.client.post(&url).json(&batch))
            .await
            .map_err(|e| IndexError::Transport(e.to_string()))?;

        let status = resp.status();
        if !status.is_success() {
            return Err(self.classify_status(status, error_body(resp).await));
        }

        let body = resp
            .text()
            .await
            .map_err(|e| IndexError::Transport(e.to_string()))?;
        parse_upload_response(&body, records.len())
    }

    async fn exists(&self) -> Result<bool, IndexError> {
        let url = self.index_url();
        let resp = send_with_retry(&self.retry, || self.client.get(&url))
            .await
            .map_err(|e| IndexError::Transport(e.to_string()))?;

        let status = resp.status();
        if status.is_success() {
            return Ok(true);
        }
        match self.classify_status(status, error_body(resp).await) {
            IndexError::IndexNotFound(_) => Ok(false),
            other => Err(other),
        }
    }

    fn index_name(&self) -> &str {
        &self.index_name
    }
}

#[derive(Serialize)]
struct UploadBatch<'a> {
    value: Vec<UploadAction<'a>>,
}

#[derive(Serialize)]
struct UploadAction<'a> {
    #[serde(rename = "@search.action")]
    action: &'static str,
    #[serde(flatten)]
    record: &'a ChunkRecord,
}

impl<'a> UploadAction<'a> {
    fn upload(record: &'a ChunkRecord) -> Self {
        Self {
            action: "upload",
            record,
        }
    }
}

#[derive(Debug, Deserialize)]
struct UploadResponse {
    value: Vec<UploadResult>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct UploadResult {
    key: String,
    status: bool,
    #[serde(default)]
    error_message: Option<String>,
}

/// Count accepted documents; any rejection becomes [`IndexError::PartialFailure`]
fn parse_upload_response(body: &str, total: usize) -> Result<usize, IndexError> {
    let parsed: UploadResponse =
        serde_json::from_str(body).map_err(|e| IndexError::InvalidResponse(e.to_string()))?;

    let rejected: Vec<&UploadResult> = parsed.value.iter().filter(|r| !r.status).collect();
    if !rejected.is_empty() {
        for result in &rejected {
            tracing::debug!(
                "Document {} rejected: {}",
                result.key,
                result.error_message.as_deref().unwrap_or("no message")
            );
        }
        return Err(IndexError::PartialFailure {
            failed: rejected.len(),
            total,
            keys: rejected
                .iter()
                .map(|r| r.key.as_str())
                .collect::<Vec<_>>()
                .join(", "),
        });
    }

    Ok(parsed.value.len())
}
