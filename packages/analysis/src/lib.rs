//! Content-routing analysis engine
//!
//! Routes heterogeneous content (documents, videos, social posts, articles)
//! to the upstream AI provider best suited to it, builds provider-specific
//! multi-modal payloads, invokes the provider under bounded retry with
//! escalating timeouts, and normalizes every outcome into one uniform
//! [`ProcessingResult`] envelope.
//!
//! # Architecture
//!
//! - [`content`] - Content kinds, locators, and references
//! - [`classify`] - Kind-to-provider routing and prompt enhancement
//! - [`payload`] - Provider-specific payload construction
//! - [`fetch`] - Remote byte fetching with its own retry schedule
//! - [`provider`] - One adapter per provider behind a uniform trait
//! - [`invoke`] - Retry, timeout escalation, backoff, and text fallback
//! - [`orchestrate`] - The top-level [`Analyzer`] engine
//! - [`resolve`] - Owner-scoped stored-content lookup
//! - [`result`] - The normalized result envelope
//! - [`config`] - Provider credentials with secure handling
//! - [`testing`] - Recording mocks for the trait seams
//!
//! # Example
//!
//! ```rust,ignore
//! use analysis::{Analyzer, ContentKind, ContentReference};
//!
//! let analyzer = Analyzer::from_env()?;
//! let content = ContentReference::remote_url(
//!     ContentKind::Document,
//!     "https://example.com/report.pdf",
//! )
//! .with_display_name("Q3 report");
//!
//! let result = analyzer.process(&content, "List the key dates").await;
//! if result.success {
//!     println!("{}", result.output_text.unwrap_or_default());
//! }
//! ```

pub mod classify;
pub mod config;
pub mod content;
pub mod error;
pub mod fetch;
pub mod invoke;
pub mod orchestrate;
pub mod payload;
pub mod provider;
pub mod resolve;
pub mod result;
pub mod testing;

pub use classify::{build_enhanced_prompt, classify, EnhancedPrompt};
pub use config::{AnalysisConfig, ProviderCredentials, SecretString};
pub use content::{ContentKind, ContentLocator, ContentReference};
pub use error::{AnalysisError, FetchError, InvokeError, ProviderCallError, Result};
pub use fetch::{fetch_with_retry, ContentFetcher, HttpFetcher};
pub use invoke::{invoke, CallAttempt, RetryPolicy, FALLBACK_NOTICE};
pub use orchestrate::Analyzer;
pub use payload::{
    GeminiPayload, GeminiSource, GrokPayload, PerplexityPayload, ProviderPayload,
};
pub use provider::{
    GeminiAdapter, GrokAdapter, PerplexityAdapter, ProviderAdapter, ProviderId,
};
pub use resolve::{ContentResolver, ResolveError};
pub use result::{ErrorKind, ProcessingResult};
