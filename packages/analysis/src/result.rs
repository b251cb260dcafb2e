//! The normalized result envelope.
//!
//! Every invocation of the orchestrator, success or failure, produces exactly
//! one [`ProcessingResult`]. The envelope carries enough provenance
//! (provider, model, content kind, original instruction) to audit an outcome
//! without re-deriving it from logs.

use serde::Serialize;

use crate::content::ContentKind;
use crate::provider::ProviderId;

/// Machine-checkable failure categories surfaced on a [`ProcessingResult`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    /// The referenced content id does not resolve for the given owner
    NotFound,

    /// All retry attempts for the chosen provider exhausted on timeouts;
    /// retrying with a smaller input may help
    Timeout,

    /// Missing or invalid provider credential; an operator concern
    ConfigurationError,

    /// The content's remote locator could not be fetched
    /// (non-timeout network or HTTP failure while retrieving bytes)
    UnreachableContent,

    /// Provider returned a non-2xx status (quota, malformed request,
    /// safety filter)
    ProviderRejected,

    /// Catch-all; the message text is preserved in logs for diagnostics
    Unknown,
}

/// The single uniform success/failure envelope returned by the engine
/// regardless of which provider served the request. Immutable once returned.
#[derive(Debug, Clone, Serialize)]
pub struct ProcessingResult {
    /// Whether processing produced output
    pub success: bool,

    /// Analysis text; present exactly when `success` is true
    #[serde(skip_serializing_if = "Option::is_none")]
    pub output_text: Option<String>,

    /// Failure category; present exactly when `success` is false
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_kind: Option<ErrorKind>,

    /// Provider that served (or would have served) the request
    pub provider: ProviderId,

    /// Model identifier used, for provenance
    pub model: String,

    /// Content kind the request was classified under
    pub content_kind: ContentKind,

    /// The user's instruction before prompt enhancement
    pub original_instruction: String,
}

impl ProcessingResult {
    /// Build a success envelope.
    pub fn success(
        output_text: impl Into<String>,
        provider: ProviderId,
        model: impl Into<String>,
        content_kind: ContentKind,
        original_instruction: impl Into<String>,
    ) -> Self {
        Self {
            success: true,
            output_text: Some(output_text.into()),
            error_kind: None,
            provider,
            model: model.into(),
            content_kind,
            original_instruction: original_instruction.into(),
        }
    }

    /// Build a failure envelope.
    pub fn failure(
        error_kind: ErrorKind,
        provider: ProviderId,
        model: impl Into<String>,
        content_kind: ContentKind,
        original_instruction: impl Into<String>,
    ) -> Self {
        Self {
            success: false,
            output_text: None,
            error_kind: Some(error_kind),
            provider,
            model: model.into(),
            content_kind,
            original_instruction: original_instruction.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_shape_invariant() {
        let ok = ProcessingResult::success(
            "text",
            ProviderId::Gemini,
            "gemini-2.5-flash",
            ContentKind::Document,
            "summarize",
        );
        assert!(ok.success);
        assert!(ok.output_text.is_some());
        assert!(ok.error_kind.is_none());

        let err = ProcessingResult::failure(
            ErrorKind::Timeout,
            ProviderId::Grok,
            "grok-4",
            ContentKind::SocialPost,
            "summarize",
        );
        assert!(!err.success);
        assert!(err.output_text.is_none());
        assert_eq!(err.error_kind, Some(ErrorKind::Timeout));
    }

    #[test]
    fn test_wire_encoding_omits_absent_fields() {
        let err = ProcessingResult::failure(
            ErrorKind::NotFound,
            ProviderId::Gemini,
            "gemini-2.5-flash",
            ContentKind::Unclassified,
            "summarize",
        );
        let value = serde_json::to_value(&err).unwrap();
        assert_eq!(value["success"], false);
        assert_eq!(value["error_kind"], "not_found");
        assert_eq!(value["provider"], "gemini");
        assert_eq!(value["content_kind"], "unclassified");
        assert!(value.get("output_text").is_none());
    }
}
