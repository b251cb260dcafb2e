//! Provider adapters: one capability interface over three upstream services.
//!
//! The set of providers is closed. Classification picks a [`ProviderId`] tag;
//! a lookup on the orchestrator maps the tag to an adapter instance, keeping
//! the three implementations substitutable for testing.

use async_trait::async_trait;
use serde::Serialize;
use std::fmt;
use std::time::Duration;

use crate::error::ProviderCallError;
use crate::payload::ProviderPayload;

/// Closed set of upstream AI providers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderId {
    /// Multi-modal provider: native document binary and video-URI input
    Gemini,
    /// Social provider with live-search augmentation over X posts
    Grok,
    /// Plain-text provider for web and discussion content
    Perplexity,
}

impl ProviderId {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Gemini => "gemini",
            Self::Grok => "grok",
            Self::Perplexity => "perplexity",
        }
    }
}

impl fmt::Display for ProviderId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Uniform contract for invoking one upstream AI service.
///
/// Adapters are stateless beyond configuration held from construction
/// (endpoint, credential, model identifier) and never retry internally:
/// all retry, backoff, and fallback policy lives in [`crate::invoke`] so it
/// stays provider-agnostic and testable against stubs.
#[async_trait]
pub trait ProviderAdapter: Send + Sync {
    /// Which provider this adapter targets.
    fn id(&self) -> ProviderId;

    /// Model identifier, stamped on results for provenance.
    fn model(&self) -> &str;

    /// Make exactly one provider call with the given timeout budget.
    async fn call(
        &self,
        payload: &ProviderPayload,
        timeout: Duration,
    ) -> Result<String, ProviderCallError>;
}

/// Adapter for the Gemini document/video provider.
pub struct GeminiAdapter {
    client: gemini_client::GeminiClient,
}

impl GeminiAdapter {
    pub fn new(client: gemini_client::GeminiClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl ProviderAdapter for GeminiAdapter {
    fn id(&self) -> ProviderId {
        ProviderId::Gemini
    }

    fn model(&self) -> &str {
        self.client.model()
    }

    async fn call(
        &self,
        payload: &ProviderPayload,
        timeout: Duration,
    ) -> Result<String, ProviderCallError> {
        let ProviderPayload::Gemini(gemini) = payload else {
            return Err(ProviderCallError::WrongProvider);
        };

        let response = self
            .client
            .generate(&gemini.request, timeout)
            .await
            .map_err(|e| match e {
                gemini_client::GeminiError::Timeout(d) => ProviderCallError::Timeout(d),
                gemini_client::GeminiError::Api { status, body } => {
                    ProviderCallError::Rejected { status, body }
                }
                gemini_client::GeminiError::Parse(msg) => ProviderCallError::Decode(msg),
                gemini_client::GeminiError::Network(msg) => ProviderCallError::Transport(msg),
                gemini_client::GeminiError::Config(msg) => ProviderCallError::Transport(msg),
            })?;

        // A well-formed response with no usable text is a distinct condition:
        // the invoker degrades it to a text-only fallback call.
        response
            .text()
            .map(str::to_string)
            .ok_or(ProviderCallError::NoUsableContent)
    }
}

/// Adapter for the Grok social/live-search provider.
pub struct GrokAdapter {
    client: grok_client::GrokClient,
}

impl GrokAdapter {
    pub fn new(client: grok_client::GrokClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl ProviderAdapter for GrokAdapter {
    fn id(&self) -> ProviderId {
        ProviderId::Grok
    }

    fn model(&self) -> &str {
        self.client.model()
    }

    async fn call(
        &self,
        payload: &ProviderPayload,
        timeout: Duration,
    ) -> Result<String, ProviderCallError> {
        let ProviderPayload::Grok(grok) = payload else {
            return Err(ProviderCallError::WrongProvider);
        };

        let mut request =
            grok_client::ChatRequest::new(self.client.model(), grok.messages.clone());
        if let Some(search) = &grok.search {
            request = request.with_search(search.clone());
        }

        self.client
            .chat(&request, timeout)
            .await
            .map_err(|e| match e {
                grok_client::GrokError::Timeout(d) => ProviderCallError::Timeout(d),
                grok_client::GrokError::Api { status, body } => {
                    ProviderCallError::Rejected { status, body }
                }
                grok_client::GrokError::Parse(msg) => ProviderCallError::Decode(msg),
                grok_client::GrokError::Network(msg) => ProviderCallError::Transport(msg),
                grok_client::GrokError::Config(msg) => ProviderCallError::Transport(msg),
                grok_client::GrokError::NoContent => ProviderCallError::NoContent,
            })
    }
}

/// Adapter for the Perplexity plain-text provider.
pub struct PerplexityAdapter {
    client: perplexity_client::PerplexityClient,
}

impl PerplexityAdapter {
    pub fn new(client: perplexity_client::PerplexityClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl ProviderAdapter for PerplexityAdapter {
    fn id(&self) -> ProviderId {
        ProviderId::Perplexity
    }

    fn model(&self) -> &str {
        self.client.model()
    }

    async fn call(
        &self,
        payload: &ProviderPayload,
        timeout: Duration,
    ) -> Result<String, ProviderCallError> {
        let ProviderPayload::Perplexity(perplexity) = payload else {
            return Err(ProviderCallError::WrongProvider);
        };

        let request =
            perplexity_client::ChatRequest::new(self.client.model(), perplexity.messages.clone());

        self.client
            .chat(&request, timeout)
            .await
            .map_err(|e| match e {
                perplexity_client::PerplexityError::Timeout(d) => ProviderCallError::Timeout(d),
                perplexity_client::PerplexityError::Api { status, body } => {
                    ProviderCallError::Rejected { status, body }
                }
                perplexity_client::PerplexityError::Parse(msg) => ProviderCallError::Decode(msg),
                perplexity_client::PerplexityError::Network(msg) => {
                    ProviderCallError::Transport(msg)
                }
                perplexity_client::PerplexityError::Config(msg) => {
                    ProviderCallError::Transport(msg)
                }
                perplexity_client::PerplexityError::NoContent => ProviderCallError::NoContent,
            })
    }
}
