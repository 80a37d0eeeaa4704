//! Retry handling shared by the embedding and search REST clients

use reqwest::{RequestBuilder, Response, StatusCode};
use std::time::Duration;

/// Exponential backoff for throttled, failing or unreachable services
#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    /// Retries after the first attempt
    pub max_retries: usize,
    pub base_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 5,
            base_delay: Duration::from_millis(500),
        }
    }
}

impl RetryPolicy {
    pub fn new(max_retries: usize) -> Self {
        Self {
            max_retries,
            ..Self::default()
        }
    }

    pub fn with_base_delay(mut self, base_delay: Duration) -> Self {
        self.base_delay = base_delay;
        self
    }

    /// Delay before retry number `attempt` (1-based), doubling up to 32x the base
    pub fn backoff(&self, attempt: usize) -> Duration {
        let capped = attempt.min(5) as u32;
        self.base_delay * (1u32 << capped)
    }

    pub fn should_retry_status(status: StatusCode) -> bool {
        status == StatusCode::TOO_MANY_REQUESTS || status.is_server_error()
    }

    pub fn is_retryable_error(err: &reqwest::Error) -> bool {
        err.is_timeout() || err.is_connect() || err.is_body() || err.is_request()
    }
}

/// Send the request built by `build`, retrying on 429, 5xx and transport errors.
///
/// Returns the last response even when its status is not a success so the
/// caller can classify it. A transport error is returned once retries run out.
pub async fn send_with_retry<F>(policy: &RetryPolicy, mut build: F) -> reqwest::Result<Response>
where
    F: FnMut() -> RequestBuilder,
{
    let mut attempt = 0usize;
    loop {
        match build().send().await {
            Ok(resp) => {
                let status = resp.status();
                if RetryPolicy::should_retry_status(status) && attempt < policy.max_retries {
                    attempt += 1;
                    let delay = policy.backoff(attempt);
                    tracing::debug!(
                        "Request returned {}, retry {}/{} in {:?}",
                        status,
                        attempt,
                        policy.max_retries,
                        delay
                    );
                    tokio::time::sleep(delay).await;
                    continue;
                }
                return Ok(resp);
            }
            Err(err) => {
                if RetryPolicy::is_retryable_error(&err) && attempt < policy.max_retries {
                    attempt += 1;
                    let delay = policy.backoff(attempt);
                    tracing::debug!(
                        "Request failed ({}), retry {}/{} in {:?}",
                        err,
                        attempt,
                        policy.max_retries,
                        delay
                    );
                    tokio::time::sleep(delay).await;
                    continue;
                }
                return Err(err);
            }
        }
    }
}

/// Body text of a failed response, for error messages
pub async fn error_body(resp: Response) -> String {
    resp.text()
        .await
        .unwrap_or_else(|_| "<body unavailable>".to_string())
}
