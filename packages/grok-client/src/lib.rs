//! Pure xAI Grok REST API client
//!
//! A minimal client for the Grok chat-completions API with optional live
//! search over X posts. The client never retries: every call is a single
//! request with an explicit timeout budget, so callers own all retry and
//! backoff policy.
//!
//! # Example
//!
//! ```rust,ignore
//! use grok_client::{GrokClient, ChatRequest, Message, SearchParameters};
//! use std::time::Duration;
//!
//! let client = GrokClient::from_env()?;
//!
//! let request = ChatRequest::new(client.model(), vec![
//!     Message::system("You are Grok, an AI assistant."),
//!     Message::user("What is this post about?"),
//! ])
//! .with_search(SearchParameters::x_posts());
//!
//! let text = client.chat(&request, Duration::from_secs(180)).await?;
//! ```

pub mod error;
pub mod types;

pub use error::{GrokError, Result};
pub use types::*;

use reqwest::Client;
use std::time::Duration;
use tracing::{debug, warn};

/// Default model identifier.
pub const DEFAULT_MODEL: &str = "grok-4";

const BASE_URL: &str = "https://api.x.ai/v1";

/// Pure Grok API client.
#[derive(Clone)]
pub struct GrokClient {
    http_client: Client,
    api_key: String,
    base_url: String,
    model: String,
}

impl GrokClient {
    /// Create a new Grok client with the given API key.
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            http_client: Client::new(),
            api_key: api_key.into(),
            base_url: BASE_URL.to_string(),
            model: DEFAULT_MODEL.to_string(),
        }
    }

    /// Create from environment variable `GROK_API_KEY`.
    pub fn from_env() -> Result<Self> {
        let api_key = std::env::var("GROK_API_KEY")
            .map_err(|_| GrokError::Config("GROK_API_KEY not set".into()))?;
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
    /// Makes exactly one HTTP request and returns the first choice's content,
    /// with a data-sources footnote when live search consulted external
    /// sources.
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
                    GrokError::Timeout(timeout)
                } else {
                    warn!(error = %e, "Grok request failed");
                    GrokError::Network(e.to_string())
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            warn!(status = %status, "Grok API error");
            return Err(GrokError::Api {
                status: status.as_u16(),
                body,
            });
        }

        let parsed: ChatResponse = response.json().await.map_err(|e| {
            if e.is_timeout() {
                GrokError::Timeout(timeout)
            } else {
                GrokError::Parse(e.to_string())
            }
        })?;

        debug!(
            model = %request.model,
            live_search = request.search_parameters.is_some(),
            "Grok chat completion"
        );

        parsed.primary_text().ok_or(GrokError::NoContent)
    }
}
