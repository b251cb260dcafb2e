//! Content classification and prompt enhancement.
//!
//! Classification is a pure, total function: every content kind maps to
//! exactly one provider and one framing paragraph. Unrecognized kinds fall
//! back to the multi-modal provider as a deliberate "most capable default",
//! not a silent failure.

use crate::content::ContentKind;
use crate::provider::ProviderId;

const DOCUMENT_CONTEXT: &str = "You are analyzing a document. Focus on extracting key information, main points, and insights from the document structure and content.";
const WORD_DOCUMENT_CONTEXT: &str = "You are analyzing a word-processor document. Extract key information, main points, and insights from the document content.";
const GENERIC_DOCUMENT_CONTEXT: &str = "You are analyzing a document. Extract key information, main points, and insights from the content.";
const VIDEO_CONTEXT: &str = "You are analyzing a video. Focus on the visual and audio content, key topics, and main insights.";
const STREAMED_VIDEO_CONTEXT: &str = "You are analyzing a streamed video. Focus on the video content, key topics discussed, and main insights from the visual and audio content.";
const SOCIAL_CONTEXT: &str = "You are analyzing social media content using live search. Focus on the key messages, context, engagement, related discussions, and broader implications from the post.";
const FORUM_CONTEXT: &str = "You are analyzing a forum discussion. Focus on the discussion, key points, and community insights from the thread.";
const ARTICLE_CONTEXT: &str = "You are analyzing an article. Focus on the main arguments, key insights, and important information from the written content.";
const GENERIC_CONTEXT: &str = "You are analyzing content. Provide clear, concise insights based on the provided information.";

/// Map a content kind to the provider that serves it and the framing
/// paragraph prepended to the user's instruction.
///
/// Pure and side-effect free: calling it twice with the same kind always
/// returns identical output.
pub fn classify(kind: ContentKind) -> (ProviderId, &'static str) {
    match kind {
        ContentKind::Document => (ProviderId::Gemini, DOCUMENT_CONTEXT),
        ContentKind::WordDocument => (ProviderId::Gemini, WORD_DOCUMENT_CONTEXT),
        ContentKind::GenericDocument => (ProviderId::Gemini, GENERIC_DOCUMENT_CONTEXT),
        ContentKind::Video => (ProviderId::Gemini, VIDEO_CONTEXT),
        ContentKind::StreamedVideo => (ProviderId::Gemini, STREAMED_VIDEO_CONTEXT),
        ContentKind::SocialPost | ContentKind::ShortFormSocial => {
            (ProviderId::Grok, SOCIAL_CONTEXT)
        }
        ContentKind::ForumPost => (ProviderId::Perplexity, FORUM_CONTEXT),
        ContentKind::LongFormArticle => (ProviderId::Perplexity, ARTICLE_CONTEXT),
        ContentKind::Unclassified | ContentKind::Mixed => (ProviderId::Gemini, GENERIC_CONTEXT),
    }
}

/// The user's instruction wrapped with kind-specific framing.
///
/// Derived deterministically; never persisted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnhancedPrompt {
    /// Fixed framing paragraph for the content kind
    pub context_prefix: &'static str,

    /// The raw user instruction
    pub user_instruction: String,

    /// Display name of the content, when known
    pub content_label: Option<String>,
}

impl EnhancedPrompt {
    /// Render the final prompt string sent to a provider.
    pub fn render(&self) -> String {
        match &self.content_label {
            Some(name) => format!(
                "{}\n\nContent: {}\n\nUser Request: {}",
                self.context_prefix, name, self.user_instruction
            ),
            None => format!(
                "{}\n\nUser Request: {}",
                self.context_prefix, self.user_instruction
            ),
        }
    }
}

/// Build the enhanced prompt for a content kind. Never fails.
pub fn build_enhanced_prompt(
    kind: ContentKind,
    instruction: &str,
    display_name: Option<&str>,
) -> EnhancedPrompt {
    let (_, context_prefix) = classify(kind);
    EnhancedPrompt {
        context_prefix,
        user_instruction: instruction.to_string(),
        content_label: display_name.map(str::to_string),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_totality() {
        // Every producible kind maps to exactly one provider and a
        // non-empty framing paragraph.
        for kind in ContentKind::ALL {
            let (provider, context) = classify(kind);
            assert!(!context.is_empty(), "empty context for {kind}");
            assert!(matches!(
                provider,
                ProviderId::Gemini | ProviderId::Grok | ProviderId::Perplexity
            ));
        }
    }

    #[test]
    fn test_mapping() {
        assert_eq!(classify(ContentKind::Document).0, ProviderId::Gemini);
        assert_eq!(classify(ContentKind::WordDocument).0, ProviderId::Gemini);
        assert_eq!(classify(ContentKind::Video).0, ProviderId::Gemini);
        assert_eq!(classify(ContentKind::StreamedVideo).0, ProviderId::Gemini);
        assert_eq!(classify(ContentKind::SocialPost).0, ProviderId::Grok);
        assert_eq!(classify(ContentKind::ShortFormSocial).0, ProviderId::Grok);
        assert_eq!(classify(ContentKind::ForumPost).0, ProviderId::Perplexity);
        assert_eq!(
            classify(ContentKind::LongFormArticle).0,
            ProviderId::Perplexity
        );
    }

    #[test]
    fn test_unrecognized_defaults_to_gemini() {
        let kind = ContentKind::parse("holographic-recording");
        assert_eq!(kind, ContentKind::Unclassified);
        assert_eq!(classify(kind).0, ProviderId::Gemini);
    }

    #[test]
    fn test_idempotent() {
        for kind in ContentKind::ALL {
            assert_eq!(classify(kind), classify(kind));
        }
    }

    #[test]
    fn test_enhanced_prompt_with_label() {
        let prompt =
            build_enhanced_prompt(ContentKind::Document, "List the key dates", Some("Q3 report"));
        let rendered = prompt.render();
        assert!(rendered.starts_with("You are analyzing a document."));
        assert!(rendered.contains("\n\nContent: Q3 report\n\n"));
        assert!(rendered.ends_with("User Request: List the key dates"));
    }

    #[test]
    fn test_enhanced_prompt_without_label() {
        let prompt = build_enhanced_prompt(ContentKind::ForumPost, "Summarize", None);
        let rendered = prompt.render();
        assert!(!rendered.contains("Content:"));
        assert!(rendered.ends_with("User Request: Summarize"));
    }
}
