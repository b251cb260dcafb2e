//! Error types for the Grok client.

use std::time::Duration;
use thiserror::Error;

/// Result type for Grok client operations.
pub type Result<T> = std::result::Result<T, GrokError>;

/// Grok client errors.
#[derive(Debug, Error)]
pub enum GrokError {
    /// Configuration error (missing API key, invalid settings)
    #[error("Configuration error: {0}")]
    Config(String),

    /// The request exceeded its timeout budget
    #[error("Grok request timed out after {0:?}")]
    Timeout(Duration),

    /// Network error (connection failed, DNS, TLS)
    #[error("Network error: {0}")]
    Network(String),

    /// API error (non-2xx response)
    #[error("Grok API error: {status} - {body}")]
    Api { status: u16, body: String },

    /// Parse error (invalid JSON, unexpected response format)
    #[error("Parse error: {0}")]
    Parse(String),

    /// Response carried no choices
    #[error("No response generated from Grok API")]
    NoContent,
}
