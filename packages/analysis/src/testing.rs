//! Test doubles for the provider, fetcher, and resolver seams.
//!
//! These are hand-rolled recording mocks: each one records the calls it
//! receives and replays a scripted sequence of outcomes. Available to
//! downstream crates for their own tests.

use async_trait::async_trait;
use std::collections::{HashMap, VecDeque};
use std::sync::{Mutex, RwLock};
use std::time::Duration;

use crate::content::ContentReference;
use crate::error::{FetchError, ProviderCallError};
use crate::fetch::ContentFetcher;
use crate::payload::ProviderPayload;
use crate::provider::{ProviderAdapter, ProviderId};
use crate::resolve::{ContentResolver, ResolveError};

// =============================================================================
// Provider adapter
// =============================================================================

/// One scripted outcome for a [`MockAdapter`] call.
#[derive(Debug, Clone)]
pub enum MockOutcome {
    /// Succeed with this text
    Text(String),
    /// Fail with a timeout carrying the attempt's budget
    Timeout,
    /// Structurally valid response with no usable text
    NoUsableContent,
    /// Non-2xx provider response
    Rejected { status: u16, body: String },
    /// Response with no candidates or choices at all
    NoContent,
}

/// The wire shape of a recorded payload, without its content.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PayloadShape {
    /// Gemini request carrying inline binary data
    GeminiInline,
    /// Gemini request referencing media by URI
    GeminiFileUri,
    /// Gemini request of text parts only
    GeminiText,
    /// Grok chat request
    GrokChat { live_search: bool },
    /// Perplexity chat request
    PerplexityChat,
}

/// One recorded [`MockAdapter`] call.
#[derive(Debug, Clone)]
pub struct MockCall {
    /// Timeout budget the invoker granted this attempt
    pub timeout: Duration,
    /// Shape of the payload passed in
    pub shape: PayloadShape,
}

/// A scripted, recording stand-in for one provider adapter.
///
/// Outcomes are consumed front-to-front; once the script is exhausted, calls
/// succeed with the default text.
pub struct MockAdapter {
    id: ProviderId,
    model: String,
    script: Mutex<VecDeque<MockOutcome>>,
    default_text: String,
    calls: RwLock<Vec<MockCall>>,
}

impl MockAdapter {
    pub fn new(id: ProviderId, model: impl Into<String>) -> Self {
        Self {
            id,
            model: model.into(),
            script: Mutex::new(VecDeque::new()),
            default_text: "mock analysis".to_string(),
            calls: RwLock::new(Vec::new()),
        }
    }

    /// Queue a sequence of outcomes, consumed one per call.
    pub fn with_script(self, outcomes: Vec<MockOutcome>) -> Self {
        if let Ok(mut script) = self.script.lock() {
            script.extend(outcomes);
        }
        self
    }

    /// Text returned once the script is exhausted.
    pub fn with_default_text(mut self, text: impl Into<String>) -> Self {
        self.default_text = text.into();
        self
    }

    /// All calls recorded so far.
    pub fn calls(&self) -> Vec<MockCall> {
        self.calls.read().map(|c| c.clone()).unwrap_or_default()
    }
}

fn shape_of(payload: &ProviderPayload) -> PayloadShape {
    match payload {
        ProviderPayload::Gemini(gemini) => {
            if gemini.request.parts().any(|p| p.is_file_uri()) {
                PayloadShape::GeminiFileUri
            } else if gemini
                .request
                .parts()
                .any(|p| matches!(p, gemini_client::Part::InlineData { .. }))
            {
                PayloadShape::GeminiInline
            } else {
                PayloadShape::GeminiText
            }
        }
        ProviderPayload::Grok(grok) => PayloadShape::GrokChat {
            live_search: grok.has_live_search(),
        },
        ProviderPayload::Perplexity(_) => PayloadShape::PerplexityChat,
    }
}

#[async_trait]
impl ProviderAdapter for MockAdapter {
    fn id(&self) -> ProviderId {
        self.id
    }

    fn model(&self) -> &str {
        &self.model
    }

    async fn call(
        &self,
        payload: &ProviderPayload,
        timeout: Duration,
    ) -> Result<String, ProviderCallError> {
        if let Ok(mut calls) = self.calls.write() {
            calls.push(MockCall {
                timeout,
                shape: shape_of(payload),
            });
        }

        let outcome = self
            .script
            .lock()
            .ok()
            .and_then(|mut script| script.pop_front());

        match outcome {
            Some(MockOutcome::Text(text)) => Ok(text),
            Some(MockOutcome::Timeout) => Err(ProviderCallError::Timeout(timeout)),
            Some(MockOutcome::NoUsableContent) => Err(ProviderCallError::NoUsableContent),
            Some(MockOutcome::Rejected { status, body }) => {
                Err(ProviderCallError::Rejected { status, body })
            }
            Some(MockOutcome::NoContent) => Err(ProviderCallError::NoContent),
            None => Ok(self.default_text.clone()),
        }
    }
}

// =============================================================================
// Content fetcher
// =============================================================================

/// One scripted outcome for a [`MockFetcher`] call.
#[derive(Debug, Clone)]
pub enum FetchOutcome {
    /// Succeed with these bytes
    Bytes(Vec<u8>),
    /// Fail with a timeout
    Timeout,
    /// Fail with an HTTP status
    Status(u16),
}

/// One recorded [`MockFetcher`] call.
#[derive(Debug, Clone)]
pub struct FetchCall {
    pub url: String,
    /// Timeout budget granted this attempt
    pub timeout: Duration,
}

/// A scripted, recording stand-in for the HTTP fetcher.
///
/// Each URL has its own outcome queue; once a queue is exhausted (or for
/// unscripted URLs), calls fall through to that URL's default bytes or fail
/// with a transport error.
pub struct MockFetcher {
    scripts: Mutex<HashMap<String, VecDeque<FetchOutcome>>>,
    defaults: Mutex<HashMap<String, Vec<u8>>>,
    calls: RwLock<Vec<FetchCall>>,
}

impl Default for MockFetcher {
    fn default() -> Self {
        Self::new()
    }
}

impl MockFetcher {
    pub fn new() -> Self {
        Self {
            scripts: Mutex::new(HashMap::new()),
            defaults: Mutex::new(HashMap::new()),
            calls: RwLock::new(Vec::new()),
        }
    }

    /// Queue a sequence of outcomes for one URL, consumed one per call.
    pub fn with_script(self, url: impl Into<String>, outcomes: Vec<FetchOutcome>) -> Self {
        if let Ok(mut scripts) = self.scripts.lock() {
            scripts.entry(url.into()).or_default().extend(outcomes);
        }
        self
    }

    /// Always answer this URL with these bytes once its script is exhausted.
    pub fn with_bytes(self, url: impl Into<String>, bytes: Vec<u8>) -> Self {
        if let Ok(mut defaults) = self.defaults.lock() {
            defaults.insert(url.into(), bytes);
        }
        self
    }

    /// All calls recorded so far.
    pub fn calls(&self) -> Vec<FetchCall> {
        self.calls.read().map(|c| c.clone()).unwrap_or_default()
    }
}

#[async_trait]
impl ContentFetcher for MockFetcher {
    async fn fetch_bytes(&self, url: &str, timeout: Duration) -> Result<Vec<u8>, FetchError> {
        if let Ok(mut calls) = self.calls.write() {
            calls.push(FetchCall {
                url: url.to_string(),
                timeout,
            });
        }

        let outcome = self
            .scripts
            .lock()
            .ok()
            .and_then(|mut scripts| scripts.get_mut(url).and_then(|queue| queue.pop_front()));

        match outcome {
            Some(FetchOutcome::Bytes(bytes)) => Ok(bytes),
            Some(FetchOutcome::Timeout) => Err(FetchError::Timeout {
                url: url.to_string(),
            }),
            Some(FetchOutcome::Status(status)) => Err(FetchError::Status {
                url: url.to_string(),
                status,
            }),
            None => {
                let default = self
                    .defaults
                    .lock()
                    .ok()
                    .and_then(|defaults| defaults.get(url).cloned());
                default.ok_or_else(|| FetchError::Transport {
                    url: url.to_string(),
                    reason: "unscripted fetch".to_string(),
                })
            }
        }
    }

    fn name(&self) -> &str {
        "mock"
    }
}

// =============================================================================
// Content resolver
// =============================================================================

/// An in-memory resolver keyed by `(content_id, owner_id)`.
pub struct MockResolver {
    entries: HashMap<(String, String), ContentReference>,
}

impl Default for MockResolver {
    fn default() -> Self {
        Self::new()
    }
}

impl MockResolver {
    pub fn new() -> Self {
        Self {
            entries: HashMap::new(),
        }
    }

    /// Register content under an id and owner.
    pub fn with_content(
        mut self,
        content_id: impl Into<String>,
        owner_id: impl Into<String>,
        content: ContentReference,
    ) -> Self {
        self.entries
            .insert((content_id.into(), owner_id.into()), content);
        self
    }
}

#[async_trait]
impl ContentResolver for MockResolver {
    async fn resolve(
        &self,
        content_id: &str,
        owner_id: &str,
    ) -> Result<ContentReference, ResolveError> {
        self.entries
            .get(&(content_id.to_string(), owner_id.to_string()))
            .cloned()
            .ok_or(ResolveError::NotFound)
    }
}
