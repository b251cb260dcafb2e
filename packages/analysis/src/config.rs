//! Provider configuration with secure credential handling.
//!
//! Uses the `secrecy` crate to prevent accidental logging of API keys.

use secrecy::{ExposeSecret, SecretBox};
use std::fmt;

use crate::error::{AnalysisError, Result};

/// A secret string that won't be logged or displayed.
pub struct SecretString(SecretBox<str>);

impl SecretString {
    /// Create a new secret string.
    pub fn new(value: impl Into<String>) -> Self {
        Self(SecretBox::new(Box::from(value.into().as_str())))
    }

    /// Expose the secret value for use.
    ///
    /// Only call this when actually using the secret (e.g., in an API request).
    pub fn expose(&self) -> &str {
        self.0.expose_secret()
    }
}

impl Clone for SecretString {
    fn clone(&self) -> Self {
        Self::new(self.expose().to_string())
    }
}

impl fmt::Debug for SecretString {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("[REDACTED]")
    }
}

impl fmt::Display for SecretString {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("[REDACTED]")
    }
}

impl From<String> for SecretString {
    fn from(s: String) -> Self {
        Self::new(s)
    }
}

impl From<&str> for SecretString {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

/// Configuration for one upstream provider.
#[derive(Clone)]
pub struct ProviderCredentials {
    /// API key (secret)
    pub api_key: SecretString,

    /// Model identifier override
    pub model: Option<String>,

    /// API base URL override
    pub base_url: Option<String>,
}

impl ProviderCredentials {
    /// Create credentials with the provider's default model and endpoint.
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: SecretString::new(api_key),
            model: None,
            base_url: None,
        }
    }

    /// Override the model identifier.
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = Some(model.into());
        self
    }

    /// Override the base URL.
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = Some(url.into());
        self
    }
}

impl fmt::Debug for ProviderCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProviderCredentials")
            .field("api_key", &"[REDACTED]")
            .field("model", &self.model)
            .field("base_url", &self.base_url)
            .finish()
    }
}

/// Full configuration for the engine: one credential set per provider.
#[derive(Debug, Clone)]
pub struct AnalysisConfig {
    pub gemini: ProviderCredentials,
    pub grok: ProviderCredentials,
    pub perplexity: ProviderCredentials,
}

impl AnalysisConfig {
    /// Load configuration from the environment.
    ///
    /// Requires `GEMINI_API_KEY`, `GROK_API_KEY`, and `PERPLEXITY_API_KEY`.
    /// Optional `*_MODEL` variables override the per-provider default model.
    pub fn from_env() -> Result<Self> {
        Ok(Self {
            gemini: credentials_from_env("GEMINI_API_KEY", "GEMINI_MODEL")?,
            grok: credentials_from_env("GROK_API_KEY", "GROK_MODEL")?,
            perplexity: credentials_from_env("PERPLEXITY_API_KEY", "PERPLEXITY_MODEL")?,
        })
    }
}

fn credentials_from_env(key_var: &str, model_var: &str) -> Result<ProviderCredentials> {
    let api_key = std::env::var(key_var)
        .map_err(|_| AnalysisError::Config(format!("{key_var} not set")))?;
    let mut credentials = ProviderCredentials::new(api_key);
    if let Ok(model) = std::env::var(model_var) {
        credentials = credentials.with_model(model);
    }
    Ok(credentials)
}
