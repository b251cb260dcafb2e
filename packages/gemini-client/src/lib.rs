//! Pure Gemini REST API client
//!
//! A clean, minimal client for the Gemini `generateContent` API with no
//! domain-specific logic. Supports text, inline base64 documents, and
//! file-URI video references.
//!
//! The client never retries: every call is a single request with an explicit
//! timeout budget, so callers own all retry and backoff policy.
//!
//! # Example
//!
//! ```rust,ignore
//! use gemini_client::{GeminiClient, GenerateRequest, Part};
//! use std::time::Duration;
//!
//! let client = GeminiClient::from_env()?;
//!
//! let request = GenerateRequest::from_parts(vec![
//!     Part::inline_document(&pdf_bytes),
//!     Part::text("Summarize this document"),
//! ]);
//! let response = client.generate(&request, Duration::from_secs(30)).await?;
//! println!("{}", response.text().unwrap_or("(no text)"));
//! ```

pub mod error;
pub mod types;

pub use error::{GeminiError, Result};
pub use types::*;

use reqwest::Client;
use std::time::Duration;
use tracing::{debug, warn};

/// Default model identifier.
pub const DEFAULT_MODEL: &str = "gemini-2.5-flash";

const BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta/models";

/// Pure Gemini API client.
#[derive(Clone)]
pub struct GeminiClient {
    http_client: Client,
    api_key: String,
    base_url: String,
    model: String,
}

impl GeminiClient {
    /// Create a new Gemini client with the given API key.
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            http_client: Client::new(),
            api_key: api_key.into(),
            base_url: BASE_URL.to_string(),
            model: DEFAULT_MODEL.to_string(),
        }
    }

    /// Create from environment variable `GEMINI_API_KEY`.
    pub fn from_env() -> Result<Self> {
        let api_key = std::env::var("GEMINI_API_KEY")
            .map_err(|_| GeminiError::Config("GEMINI_API_KEY not set".into()))?;
        Ok(Self::new(api_key))
    }

    /// Set a custom base URL (for proxies or regional endpoints).
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

    /// Call `generateContent` with a per-call timeout budget.
    ///
    /// Makes exactly one HTTP request. A timeout maps to
    /// [`GeminiError::Timeout`] so callers can distinguish it from other
    /// transport failures.
    pub async fn generate(
        &self,
        request: &GenerateRequest,
        timeout: Duration,
    ) -> Result<GenerateResponse> {
        let url = format!("{}/{}:generateContent", self.base_url, self.model);

        let response = self
            .http_client
            .post(&url)
            .query(&[("key", self.api_key.as_str())])
            .header("Content-Type", "application/json")
            .json(request)
            .timeout(timeout)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    GeminiError::Timeout(timeout)
                } else {
                    warn!(error = %e, "Gemini request failed");
                    GeminiError::Network(e.to_string())
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            warn!(status = %status, "Gemini API error");
            return Err(GeminiError::Api {
                status: status.as_u16(),
                body,
            });
        }

        let parsed: GenerateResponse = response.json().await.map_err(|e| {
            if e.is_timeout() {
                GeminiError::Timeout(timeout)
            } else {
                GeminiError::Parse(e.to_string())
            }
        })?;

        debug!(
            model = %self.model,
            candidates = parsed.candidates.len(),
            "Gemini generateContent completed"
        );

        Ok(parsed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_client_builder() {
        let client = GeminiClient::new("test-key")
            .with_base_url("https://custom.api.com/models")
            .with_model("gemini-2.5-pro");

        assert_eq!(client.api_key, "test-key");
        assert_eq!(client.base_url, "https://custom.api.com/models");
        assert_eq!(client.model(), "gemini-2.5-pro");
    }
}
