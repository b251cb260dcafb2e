//! Remote content fetching for inline document payloads.
//!
//! Fetching is a sub-call of payload construction with its own retry
//! schedule: bounded attempts, escalating per-attempt timeouts, retry on
//! timeout only.

use async_trait::async_trait;
use std::time::Duration;
use tracing::{debug, warn};

use crate::error::FetchError;
use crate::invoke::RetryPolicy;

/// Fetches raw bytes from remote locators.
#[async_trait]
pub trait ContentFetcher: Send + Sync {
    /// Fetch the body of a URL with a per-attempt timeout budget.
    async fn fetch_bytes(&self, url: &str, timeout: Duration) -> Result<Vec<u8>, FetchError>;

    /// Fetcher name, for logging.
    fn name(&self) -> &str {
        "unknown"
    }
}

/// HTTP fetcher backed by `reqwest`.
pub struct HttpFetcher {
    client: reqwest::Client,
    user_agent: String,
}

impl Default for HttpFetcher {
    fn default() -> Self {
        Self::new()
    }
}

impl HttpFetcher {
    /// Create a new HTTP fetcher with default settings.
    pub fn new() -> Self {
        Self {
            client: reqwest::Client::new(),
            user_agent: "AnalysisBot/1.0".to_string(),
        }
    }

    /// Set a custom user agent.
    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = user_agent.into();
        self
    }
}

#[async_trait]
impl ContentFetcher for HttpFetcher {
    async fn fetch_bytes(&self, url: &str, timeout: Duration) -> Result<Vec<u8>, FetchError> {
        let response = self
            .client
            .get(url)
            .header("User-Agent", &self.user_agent)
            .timeout(timeout)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    FetchError::Timeout {
                        url: url.to_string(),
                    }
                } else {
                    FetchError::Transport {
                        url: url.to_string(),
                        reason: e.to_string(),
                    }
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        let bytes = response.bytes().await.map_err(|e| {
            if e.is_timeout() {
                FetchError::Timeout {
                    url: url.to_string(),
                }
            } else {
                FetchError::Transport {
                    url: url.to_string(),
                    reason: e.to_string(),
                }
            }
        })?;

        Ok(bytes.to_vec())
    }

    fn name(&self) -> &str {
        "http"
    }
}

/// Fetch a URL under a retry policy.
///
/// Retries only on timeout; HTTP status and transport failures are terminal
/// on first occurrence. Sleeps `2^attempt` seconds between attempts.
pub async fn fetch_with_retry(
    fetcher: &dyn ContentFetcher,
    url: &str,
    policy: &RetryPolicy,
) -> Result<Vec<u8>, FetchError> {
    for attempt in policy.attempts() {
        debug!(
            url,
            attempt = attempt.index,
            timeout = ?attempt.timeout,
            fetcher = fetcher.name(),
            "fetching remote content"
        );

        match fetcher.fetch_bytes(url, attempt.timeout).await {
            Ok(bytes) => {
                debug!(url, len = bytes.len(), "fetched remote content");
                return Ok(bytes);
            }
            Err(FetchError::Timeout { .. }) if attempt.index + 1 < policy.max_attempts => {
                let backoff = policy.backoff_after(attempt.index);
                warn!(url, attempt = attempt.index, ?backoff, "fetch timed out, backing off");
                tokio::time::sleep(backoff).await;
            }
            Err(e) => return Err(e),
        }
    }

    Err(FetchError::Timeout {
        url: url.to_string(),
    })
}
