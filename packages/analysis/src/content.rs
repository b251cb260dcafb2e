//! Domain types for content routed through the engine.

use serde::{Deserialize, Serialize};
use std::fmt;

/// The shape of a piece of content, used to select a provider and a prompt
/// framing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ContentKind {
    Document,
    WordDocument,
    GenericDocument,
    Video,
    StreamedVideo,
    SocialPost,
    ShortFormSocial,
    ForumPost,
    LongFormArticle,
    /// No recognized kind label; routed to the most capable provider
    Unclassified,
    /// Marker for composite batch results; never produced by classification
    Mixed,
}

impl ContentKind {
    /// All kinds producible by classification (excludes the batch marker).
    pub const ALL: [ContentKind; 10] = [
        Self::Document,
        Self::WordDocument,
        Self::GenericDocument,
        Self::Video,
        Self::StreamedVideo,
        Self::SocialPost,
        Self::ShortFormSocial,
        Self::ForumPost,
        Self::LongFormArticle,
        Self::Unclassified,
    ];

    /// Parse a kind label. Case-insensitive; unknown labels map to
    /// `Unclassified` rather than failing.
    pub fn parse(label: &str) -> Self {
        match label.to_ascii_lowercase().as_str() {
            "document" => Self::Document,
            "word-document" => Self::WordDocument,
            "generic-document" => Self::GenericDocument,
            "video" => Self::Video,
            "streamed-video" => Self::StreamedVideo,
            "social-post" => Self::SocialPost,
            "short-form-social" => Self::ShortFormSocial,
            "forum-post" => Self::ForumPost,
            "long-form-article" => Self::LongFormArticle,
            _ => Self::Unclassified,
        }
    }

    /// Canonical kind label.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Document => "document",
            Self::WordDocument => "word-document",
            Self::GenericDocument => "generic-document",
            Self::Video => "video",
            Self::StreamedVideo => "streamed-video",
            Self::SocialPost => "social-post",
            Self::ShortFormSocial => "short-form-social",
            Self::ForumPost => "forum-post",
            Self::LongFormArticle => "long-form-article",
            Self::Unclassified => "unclassified",
            Self::Mixed => "mixed",
        }
    }
}

impl fmt::Display for ContentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for ContentKind {
    type Err = std::convert::Infallible;

    // Infallible: unknown labels map to `Unclassified`.
    fn from_str(label: &str) -> Result<Self, Self::Err> {
        Ok(Self::parse(label))
    }
}

/// The transport form content takes for a provider call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ContentLocator {
    /// Remote resource fetched or referenced by URL
    RemoteUrl(String),

    /// Raw bytes already in memory
    InlineBytes(Vec<u8>),

    /// Plain text
    PlainText(String),
}

/// A resolved piece of content ready for processing. Immutable once built;
/// consumed once per orchestrator invocation.
#[derive(Debug, Clone)]
pub struct ContentReference {
    /// Content kind label
    pub kind: ContentKind,

    /// Where the content lives
    pub locator: ContentLocator,

    /// Human-readable name, inserted into the enhanced prompt when present
    pub display_name: Option<String>,
}

impl ContentReference {
    /// Create a new content reference.
    pub fn new(kind: ContentKind, locator: ContentLocator) -> Self {
        Self {
            kind,
            locator,
            display_name: None,
        }
    }

    /// Create a reference to a remote URL.
    pub fn remote_url(kind: ContentKind, url: impl Into<String>) -> Self {
        Self::new(kind, ContentLocator::RemoteUrl(url.into()))
    }

    /// Create a reference to in-memory bytes.
    pub fn inline_bytes(kind: ContentKind, bytes: Vec<u8>) -> Self {
        Self::new(kind, ContentLocator::InlineBytes(bytes))
    }

    /// Create a reference to plain text.
    pub fn plain_text(kind: ContentKind, text: impl Into<String>) -> Self {
        Self::new(kind, ContentLocator::PlainText(text.into()))
    }

    /// Set the display name.
    pub fn with_display_name(mut self, name: impl Into<String>) -> Self {
        self.display_name = Some(name.into());
        self
    }
}
