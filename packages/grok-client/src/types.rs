//! Grok API request and response types.
//!
//! Chat-completion style JSON, plus the xAI-specific `search_parameters`
//! block for live search over X posts.

use serde::{Deserialize, Serialize};

// =============================================================================
// Chat Completion
// =============================================================================

/// Chat completion request.
#[derive(Debug, Clone, Serialize)]
pub struct ChatRequest {
    /// Model to use (e.g. "grok-4")
    pub model: String,

    /// Conversation messages
    pub messages: Vec<Message>,

    /// Sampling temperature
    pub temperature: f32,

    /// Maximum tokens in completion
    pub max_tokens: u32,

    /// Streaming is never used by this client
    pub stream: bool,

    /// Live search directive, attached only for social content
    #[serde(skip_serializing_if = "Option::is_none")]
    pub search_parameters: Option<SearchParameters>,
}

impl ChatRequest {
    /// Create a new chat request with the given model and messages.
    pub fn new(model: impl Into<String>, messages: Vec<Message>) -> Self {
        Self {
            model: model.into(),
            messages,
            temperature: 0.7,
            max_tokens: 2048,
            stream: false,
            search_parameters: None,
        }
    }

    /// Attach a live search directive.
    pub fn with_search(mut self, search: SearchParameters) -> Self {
        self.search_parameters = Some(search);
        self
    }
}

/// Chat message.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Message {
    /// Role: "system", "user", "assistant"
    pub role: String,

    /// Message content
    pub content: String,
}

impl Message {
    /// Create a system message.
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: "system".to_string(),
            content: content.into(),
        }
    }

    /// Create a user message.
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: "user".to_string(),
            content: content.into(),
        }
    }
}

// =============================================================================
// Live Search
// =============================================================================

/// Live search directive for social content.
#[derive(Debug, Clone, Serialize)]
pub struct SearchParameters {
    /// Search mode ("auto" lets the model decide when to search)
    pub mode: String,

    /// Data sources to search
    pub sources: Vec<SearchSource>,

    /// Return citations alongside the answer
    pub return_citations: bool,

    /// Bound on the number of external sources consulted
    pub max_search_results: u32,
}

impl SearchParameters {
    /// Live search over X posts: auto mode, citations on, bounded sources.
    pub fn x_posts() -> Self {
        Self {
            mode: "auto".to_string(),
            sources: vec![SearchSource {
                kind: "x".to_string(),
            }],
            return_citations: true,
            max_search_results: 3,
        }
    }
}

/// One live search data source.
#[derive(Debug, Clone, Serialize)]
pub struct SearchSource {
    #[serde(rename = "type")]
    pub kind: String,
}

// =============================================================================
// Response
// =============================================================================

/// Chat completion response.
#[derive(Debug, Clone, Deserialize)]
pub struct ChatResponse {
    #[serde(default)]
    pub choices: Vec<Choice>,

    pub usage: Option<Usage>,
}

/// One completion choice.
#[derive(Debug, Clone, Deserialize)]
pub struct Choice {
    pub message: ResponseMessage,
}

/// Message within a completion choice.
#[derive(Debug, Clone, Deserialize)]
pub struct ResponseMessage {
    pub content: String,
}

/// Token and search usage accounting.
#[derive(Debug, Clone, Deserialize)]
pub struct Usage {
    pub num_sources_used: Option<u32>,
}

impl ChatResponse {
    /// Content of the first choice, with a data-sources footnote appended
    /// when live search consulted external sources.
    pub fn primary_text(&self) -> Option<String> {
        let content = self.choices.first()?.message.content.clone();
        let sources = self.usage.as_ref().and_then(|u| u.num_sources_used);
        match sources {
            Some(n) => Some(format!("{content}\n\n[Analysis used {n} data sources]")),
            None => Some(content),
        }
    }
}
