//! Gemini API request and response types.
//!
//! The `generateContent` protocol is a versioned external contract: a request
//! carries a list of `contents`, each holding `parts` that may be plain text,
//! inline base64-encoded binary data, or a file URI reference to externally
//! hosted media.

use base64::Engine;
use serde::{Deserialize, Serialize};

// =============================================================================
// Request
// =============================================================================

/// Request body for `models/{model}:generateContent`.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateRequest {
    /// Content blocks (typically exactly one)
    pub contents: Vec<Content>,

    /// Sampling configuration
    pub generation_config: GenerationConfig,
}

impl GenerateRequest {
    /// Build a request from a single set of parts with default generation settings.
    pub fn from_parts(parts: Vec<Part>) -> Self {
        Self {
            contents: vec![Content { parts }],
            generation_config: GenerationConfig::default(),
        }
    }

    /// Build a text-only request.
    pub fn from_text(text: impl Into<String>) -> Self {
        Self::from_parts(vec![Part::text(text)])
    }

    /// Iterate over all parts across content blocks.
    pub fn parts(&self) -> impl Iterator<Item = &Part> {
        self.contents.iter().flat_map(|c| c.parts.iter())
    }
}

/// One content block: an ordered sequence of parts.
#[derive(Debug, Clone, Serialize)]
pub struct Content {
    pub parts: Vec<Part>,
}

/// A single part of a content block.
#[derive(Debug, Clone, Serialize)]
#[serde(untagged)]
pub enum Part {
    /// Plain text
    Text { text: String },

    /// Inline binary data, base64-encoded
    InlineData {
        #[serde(rename = "inlineData")]
        inline_data: Blob,
    },

    /// Reference to externally hosted media (e.g. a YouTube video)
    FileData {
        #[serde(rename = "fileData")]
        file_data: FileData,
    },
}

impl Part {
    /// Create a text part.
    pub fn text(text: impl Into<String>) -> Self {
        Self::Text { text: text.into() }
    }

    /// Create an inline-data part from raw bytes, base64-encoding them.
    pub fn inline_data(mime_type: impl Into<String>, bytes: &[u8]) -> Self {
        Self::InlineData {
            inline_data: Blob {
                mime_type: mime_type.into(),
                data: base64::engine::general_purpose::STANDARD.encode(bytes),
            },
        }
    }

    /// Create an inline document part tagged as a PDF.
    pub fn inline_document(bytes: &[u8]) -> Self {
        Self::inline_data("application/pdf", bytes)
    }

    /// Create a file-URI reference part.
    pub fn file_uri(uri: impl Into<String>) -> Self {
        Self::FileData {
            file_data: FileData {
                file_uri: uri.into(),
            },
        }
    }

    /// Whether this part references media by URI rather than carrying bytes.
    pub fn is_file_uri(&self) -> bool {
        matches!(self, Self::FileData { .. })
    }
}

/// Inline base64-encoded binary data.
#[derive(Debug, Clone, Serialize)]
pub struct Blob {
    #[serde(rename = "mimeType")]
    pub mime_type: String,
    pub data: String,
}

/// Externally hosted media referenced by URI.
#[derive(Debug, Clone, Serialize)]
pub struct FileData {
    #[serde(rename = "fileUri")]
    pub file_uri: String,
}

/// Sampling configuration for generation.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerationConfig {
    pub temperature: f32,
    pub top_k: u32,
    pub top_p: f32,
    pub max_output_tokens: u32,
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            temperature: 0.7,
            top_k: 40,
            top_p: 0.95,
            max_output_tokens: 2048,
        }
    }
}

// =============================================================================
// Response
// =============================================================================

/// Response body from `generateContent`.
#[derive(Debug, Clone, Deserialize)]
pub struct GenerateResponse {
    #[serde(default)]
    pub candidates: Vec<Candidate>,
}

/// One generated candidate.
#[derive(Debug, Clone, Deserialize)]
pub struct Candidate {
    pub content: Option<CandidateContent>,
}

/// Content of a candidate.
#[derive(Debug, Clone, Deserialize)]
pub struct CandidateContent {
    #[serde(default)]
    pub parts: Vec<ResponsePart>,
}

/// One part of a candidate's content.
#[derive(Debug, Clone, Deserialize)]
pub struct ResponsePart {
    pub text: Option<String>,
}

impl GenerateResponse {
    /// First non-blank text part of the first candidate, if any.
    ///
    /// Returns `None` when the response is structurally valid but carries no
    /// usable text: empty candidate list, missing content or parts, or text
    /// that is blank after trimming.
    pub fn text(&self) -> Option<&str> {
        self.candidates
            .first()?
            .content
            .as_ref()?
            .parts
            .first()?
            .text
            .as_deref()
            .filter(|t| !t.trim().is_empty())
    }
}
