//! Typed errors for the analysis library.
//!
//! Uses `thiserror` for library errors (not `anyhow`). Each layer raises its
//! own typed failure; the orchestrator is the single point where all of them
//! are caught and folded into a [`crate::ProcessingResult`].

use std::time::Duration;
use thiserror::Error;

/// Errors from a single provider call at the adapter boundary.
#[derive(Debug, Error)]
pub enum ProviderCallError {
    /// The call exceeded its per-attempt timeout budget
    #[error("provider call timed out after {0:?}")]
    Timeout(Duration),

    /// Provider returned a non-2xx status (quota, malformed request, safety filter)
    #[error("provider rejected the request: {status} - {body}")]
    Rejected { status: u16, body: String },

    /// Response carried no candidates or choices at all
    #[error("provider returned no content")]
    NoContent,

    /// Structurally valid response with no usable text; triggers the
    /// text-only fallback on the document/video path
    #[error("provider response carried no usable text")]
    NoUsableContent,

    /// Malformed JSON or missing expected fields
    #[error("provider response could not be decoded: {0}")]
    Decode(String),

    /// Transport-level failure (connect, DNS, TLS)
    #[error("provider request failed: {0}")]
    Transport(String),

    /// Payload was built for a different provider
    #[error("payload does not target this adapter")]
    WrongProvider,
}

/// Errors fetching remote content bytes.
#[derive(Debug, Error)]
pub enum FetchError {
    /// Every fetch attempt timed out
    #[error("timeout fetching {url}")]
    Timeout { url: String },

    /// Remote host answered with a non-2xx status
    #[error("failed to fetch {url}: status {status}")]
    Status { url: String, status: u16 },

    /// Transport-level failure
    #[error("failed to fetch {url}: {reason}")]
    Transport { url: String, reason: String },
}

/// Terminal outcome of the resilient invoker.
#[derive(Debug, Error)]
pub enum InvokeError {
    /// Every retry attempt timed out
    #[error("provider timed out after {attempts} attempts")]
    Timeout { attempts: u32 },

    /// A non-retryable provider failure, raised on first occurrence
    #[error(transparent)]
    Call(ProviderCallError),
}

/// Errors raised below the orchestrator.
#[derive(Debug, Error)]
pub enum AnalysisError {
    /// The referenced content does not resolve for the given owner
    #[error("content not found")]
    NotFound,

    /// Remote content could not be fetched for payload construction
    #[error("fetch failed: {0}")]
    Fetch(#[from] FetchError),

    /// The provider call failed terminally
    #[error("invoke failed: {0}")]
    Invoke(#[from] InvokeError),

    /// Missing or invalid provider credential
    #[error("configuration error: {0}")]
    Config(String),
}

/// Result type alias for analysis operations.
pub type Result<T> = std::result::Result<T, AnalysisError>;
