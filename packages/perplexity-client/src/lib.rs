//! Pure Perplexity REST API client
//!
//! A minimal client for the Perplexity chat-completions API. The client never
//! retries: every call is a single request with an explicit timeout budget,
//! so callers own all retry and backoff policy.
//!
//! # Example
//!
//! ```rust,ignore
//! use perplexity_client::{PerplexityClient, ChatRequest, Message};
//! use std::time::Duration;
//!
//! let client = PerplexityClient::from_env()?;
//!
//! let request = ChatRequest::new(client.model(), vec![
//!     Message::system("You are a content analysis assistant."),
//!     Message::user("Summarize this article: ..."),
//! ]);
//! let text = client.chat(&request, Duration::from_secs(120)).await?;
//! ```

pub mod error;
pub mod types;

pub use error::{PerplexityError, Result};
pub use types::*;

use reqwest::Client;
use std::time::Duration;
use tracing::{debug, warn};

/// Default model identifier.
pub const DEFAULT_MODEL: &str = "llama-3.1-sonar-small-128k-online";

const BASE_URL: &str = "https://api.perplexity.ai";

/// Pure Perplexity API client.
#[derive(Clone)]
pub struct PerplexityClient {
    http_client: Client,
    api_key: String,
    base_url: String,
    model: String,
}

impl PerplexityClient {
    /// Create a new Perplexity client with the given API key.
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            http_client: Client::new(),
            api_key: api_key.into(),
            base_url: BASE_URL.to_string(),
            model: DEFAULT_MODEL.to_string(),
        }
    }

    /// Create from environment variable `PERPLEXITY_API_KEY`.
    pub fn from_env() -> Result<Self> {
        let api_key = std::env::var("PERPLEXITY_API_KEY")
            .map_err(|_| PerplexityError::Config("PERPLEXITY_API_KEY not set".into()))?;
        Ok(Self::new(api_key))
    }

    /// Set a custom base URL.
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }

    /// Set the model to use.
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    /// Get the model identifier.
    pub fn model(&self) -> &str {
        &self.model
    }

    /// Chat completion with a per-call timeout budget.
    ///
    /// Makes exactly one HTTP request and returns the first choice's content.
    pub async fn chat(&self, request: &ChatRequest, timeout: Duration) -> Result<String> {
        let url = format!("{}/chat/completions", self.base_url);

        let response = self
            .http_client
            .post(&url)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .header("Content-Type", "application/json")
            .json(request)
            .timeout(timeout)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    PerplexityError::Timeout(timeout)
                } else {
                    warn!(error = %e, "Perplexity request failed");
                    PerplexityError::Network(e.to_string())
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            warn!(status = %status, "Perplexity API error");
            return Err(PerplexityError::Api {
                status: status.as_u16(),
                body,
            });
        }

        let parsed: ChatResponse = response.json().await.map_err(|e| {
            if e.is_timeout() {
                PerplexityError::Timeout(timeout)
            } else {
                PerplexityError::Parse(e.to_string())
            }
        })?;

        debug!(model = %request.model, "Perplexity chat completion");

        parsed
            .primary_text()
            .map(str::to_string)
            .ok_or(PerplexityError::NoContent)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_client_builder() {
        let client = PerplexityClient::new("pplx-test").with_model("sonar-pro");

        assert_eq!(client.api_key, "pplx-test");
        assert_eq!(client.model(), "sonar-pro");
    }
}
