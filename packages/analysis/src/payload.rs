//! Provider-specific payload construction.
//!
//! Converts an abstract [`ContentReference`] into the wire shape each
//! provider expects: inline base64 binary or file-URI reference for Gemini,
//! chat messages with an optional live-search directive for Grok, and a
//! flattened plain-text chat message for Perplexity.

use std::time::Duration;
use tracing::debug;
use url::Url;

use crate::content::{ContentLocator, ContentReference};
use crate::error::Result;
use crate::fetch::{fetch_with_retry, ContentFetcher};
use crate::invoke::RetryPolicy;
use crate::provider::ProviderId;

const GROK_SYSTEM_PROMPT: &str =
    "You are Grok, an AI assistant. Provide clear, insightful analysis based on the provided content.";
const PERPLEXITY_SYSTEM_PROMPT: &str = "You are a content analysis assistant. Provide clear, well-structured insights based on the provided content. Focus on key information and practical takeaways.";

/// Where a Gemini payload's content came from, kept for fallback reframing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GeminiSource {
    Url(String),
    Bytes,
    Text,
}

/// Payload for the Gemini document/video provider.
#[derive(Debug, Clone)]
pub struct GeminiPayload {
    /// The contents/parts wire request
    pub request: gemini_client::GenerateRequest,

    /// The enhanced prompt, kept for fallback reframing
    pub prompt: String,

    /// Original content source
    pub source: GeminiSource,

    /// Whether this payload references video rather than a document
    pub video: bool,
}

/// Payload for the Grok social provider.
#[derive(Debug, Clone)]
pub struct GrokPayload {
    /// Conversation messages
    pub messages: Vec<grok_client::Message>,

    /// Live-search directive, attached only for social-platform URLs
    pub search: Option<grok_client::SearchParameters>,
}

impl GrokPayload {
    /// Whether a live-search directive is attached.
    pub fn has_live_search(&self) -> bool {
        self.search.is_some()
    }
}

/// Payload for the Perplexity plain-text provider.
#[derive(Debug, Clone)]
pub struct PerplexityPayload {
    /// Conversation messages
    pub messages: Vec<perplexity_client::Message>,
}

/// A provider-specific wire payload, tagged by target provider.
#[derive(Debug, Clone)]
pub enum ProviderPayload {
    Gemini(GeminiPayload),
    Grok(GrokPayload),
    Perplexity(PerplexityPayload),
}

impl ProviderPayload {
    /// The provider this payload targets.
    pub fn provider(&self) -> ProviderId {
        match self {
            Self::Gemini(_) => ProviderId::Gemini,
            Self::Grok(_) => ProviderId::Grok,
            Self::Perplexity(_) => ProviderId::Perplexity,
        }
    }

    /// The retry/timeout schedule for this payload.
    pub fn retry_policy(&self) -> RetryPolicy {
        match self {
            Self::Gemini(p) if p.video => RetryPolicy::VIDEO,
            Self::Gemini(_) => RetryPolicy::DOCUMENT,
            Self::Grok(p) if p.has_live_search() => RetryPolicy::SOCIAL_LIVE_SEARCH,
            Self::Grok(_) => RetryPolicy::SOCIAL,
            Self::Perplexity(_) => RetryPolicy::WEB_TEXT,
        }
    }

    /// Reframe a document/video payload as a plain-text description for the
    /// degraded fallback call. Only the Gemini path supports this.
    pub fn text_fallback(&self) -> Option<ProviderPayload> {
        let Self::Gemini(gemini) = self else {
            return None;
        };

        let noun = if gemini.video { "Video" } else { "Document" };
        let description = match &gemini.source {
            GeminiSource::Url(url) => {
                format!("{noun} Content (URL: {url})\n\n[content extracted as text]")
            }
            GeminiSource::Bytes | GeminiSource::Text => {
                format!("{noun} Content\n\n[content extracted as text]")
            }
        };

        let text = format!(
            "{}\n\nDocument Information:\n{}\n\nPlease provide a summary based on the document information provided.",
            gemini.prompt, description
        );

        Some(Self::Gemini(GeminiPayload {
            request: gemini_client::GenerateRequest::from_text(text),
            prompt: gemini.prompt.clone(),
            source: gemini.source.clone(),
            video: gemini.video,
        }))
    }
}

/// Build the wire payload for one content reference.
///
/// Remote documents on the Gemini path are fetched here (with the URL-fetch
/// retry schedule) and inlined; video-host URLs are passed by reference
/// without fetching any bytes.
pub async fn build(
    provider: ProviderId,
    content: &ContentReference,
    prompt: &str,
    fetcher: &dyn ContentFetcher,
) -> Result<ProviderPayload> {
    match provider {
        ProviderId::Gemini => build_gemini(content, prompt, fetcher).await,
        ProviderId::Grok => Ok(build_grok(content, prompt)),
        ProviderId::Perplexity => Ok(build_perplexity(content, prompt)),
    }
}

async fn build_gemini(
    content: &ContentReference,
    prompt: &str,
    fetcher: &dyn ContentFetcher,
) -> Result<ProviderPayload> {
    use gemini_client::{GenerateRequest, Part};

    let payload = match &content.locator {
        ContentLocator::RemoteUrl(url) => {
            if let Some(video_id) = extract_video_id(url) {
                // Video hosts are referenced by URI; no bytes are fetched.
                debug!(url, video_id, "building video file-URI payload");
                let uri = format!("https://www.youtube.com/watch?v={video_id}");
                GeminiPayload {
                    request: GenerateRequest::from_parts(vec![
                        Part::file_uri(uri),
                        Part::text(prompt),
                    ]),
                    prompt: prompt.to_string(),
                    source: GeminiSource::Url(url.clone()),
                    video: true,
                }
            } else {
                let bytes = fetch_with_retry(fetcher, url, &RetryPolicy::URL_FETCH).await?;
                debug!(url, len = bytes.len(), "building inline document payload");
                GeminiPayload {
                    request: GenerateRequest::from_parts(vec![
                        Part::inline_document(&bytes),
                        Part::text(prompt),
                    ]),
                    prompt: prompt.to_string(),
                    source: GeminiSource::Url(url.clone()),
                    video: false,
                }
            }
        }
        ContentLocator::InlineBytes(bytes) => GeminiPayload {
            request: GenerateRequest::from_parts(vec![
                Part::inline_document(bytes),
                Part::text(prompt),
            ]),
            prompt: prompt.to_string(),
            source: GeminiSource::Bytes,
            video: false,
        },
        ContentLocator::PlainText(text) => GeminiPayload {
            request: GenerateRequest::from_parts(vec![
                Part::text(text.clone()),
                Part::text(prompt),
            ]),
            prompt: prompt.to_string(),
            source: GeminiSource::Text,
            video: false,
        },
    };

    Ok(ProviderPayload::Gemini(payload))
}

fn build_grok(content: &ContentReference, prompt: &str) -> ProviderPayload {
    use grok_client::{Message, SearchParameters};

    let (user_content, search) = match &content.locator {
        ContentLocator::RemoteUrl(url) => {
            let search = is_social_url(url).then(SearchParameters::x_posts);
            (format!("Content URL: {url}\n\n{prompt}"), search)
        }
        ContentLocator::PlainText(text) => (format!("Content:\n{text}\n\n{prompt}"), None),
        ContentLocator::InlineBytes(bytes) => {
            // Bytes are decoded permissively; invalid sequences are replaced.
            let decoded = String::from_utf8_lossy(bytes);
            (format!("Content:\n{decoded}\n\n{prompt}"), None)
        }
    };

    ProviderPayload::Grok(GrokPayload {
        messages: vec![
            Message::system(GROK_SYSTEM_PROMPT),
            Message::user(user_content),
        ],
        search,
    })
}

fn build_perplexity(content: &ContentReference, prompt: &str) -> ProviderPayload {
    use perplexity_client::Message;

    let flattened = flatten_locator(&content.locator);
    let user_content = format!("Content to process:\n{flattened}\n\nPrompt: {prompt}");

    ProviderPayload::Perplexity(PerplexityPayload {
        messages: vec![
            Message::system(PERPLEXITY_SYSTEM_PROMPT),
            Message::user(user_content),
        ],
    })
}

// Never fails: bytes are decoded permissively, replacing invalid sequences.
fn flatten_locator(locator: &ContentLocator) -> String {
    match locator {
        ContentLocator::RemoteUrl(url) => url.clone(),
        ContentLocator::InlineBytes(bytes) => String::from_utf8_lossy(bytes).into_owned(),
        ContentLocator::PlainText(text) => text.clone(),
    }
}

/// Extract a video id from a video-host URL.
///
/// Supports the `watch?v=`, `youtu.be/` and `/embed/` URL shapes. Returns
/// `None` for any URL that is not a recognized video host.
pub fn extract_video_id(raw: &str) -> Option<String> {
    let parsed = Url::parse(raw).ok()?;
    let host = parsed.host_str()?.trim_start_matches("www.");

    match host {
        "youtu.be" => parsed
            .path_segments()
            .and_then(|mut segments| segments.next())
            .filter(|id| !id.is_empty())
            .map(str::to_string),
        "youtube.com" | "m.youtube.com" => {
            if parsed.path() == "/watch" {
                parsed
                    .query_pairs()
                    .find(|(key, _)| key == "v")
                    .map(|(_, value)| value.into_owned())
                    .filter(|id| !id.is_empty())
            } else if let Some(id) = parsed.path().strip_prefix("/embed/") {
                let id = id.trim_end_matches('/');
                (!id.is_empty()).then(|| id.to_string())
            } else {
                None
            }
        }
        _ => None,
    }
}

/// Whether a URL points at a social platform that supports live search.
pub fn is_social_url(raw: &str) -> bool {
    let Ok(parsed) = Url::parse(raw) else {
        return false;
    };
    let Some(host) = parsed.host_str() else {
        return false;
    };
    let host = host.trim_start_matches("www.").trim_start_matches("mobile.");
    matches!(host, "twitter.com" | "x.com")
}

/// Timeout budget used for the single, non-retried fallback call.
pub const FALLBACK_TIMEOUT: Duration = Duration::from_secs(60);

#[cfg(test)]
mod tests {
    use super::*;
    use crate::content::ContentKind;
    use crate::testing::MockFetcher;

    #[test]
    fn test_video_id_watch_url() {
        assert_eq!(
            extract_video_id("https://www.youtube.com/watch?v=dQw4w9WgXcQ"),
            Some("dQw4w9WgXcQ".to_string())
        );
    }

    #[test]
    fn test_video_id_short_url() {
        assert_eq!(
            extract_video_id("https://youtu.be/dQw4w9WgXcQ"),
            Some("dQw4w9WgXcQ".to_string())
        );
    }

    #[test]
    fn test_video_id_embed_url() {
        assert_eq!(
            extract_video_id("https://www.youtube.com/embed/dQw4w9WgXcQ"),
            Some("dQw4w9WgXcQ".to_string())
        );
    }

    #[test]
    fn test_video_id_rejects_other_hosts() {
        assert_eq!(extract_video_id("https://vimeo.com/12345"), None);
        assert_eq!(extract_video_id("https://a.example/doc.pdf"), None);
        assert_eq!(extract_video_id("not a url"), None);
    }

    #[test]
    fn test_social_url_detection() {
        assert!(is_social_url("https://x.com/user/status/123"));
        assert!(is_social_url("https://www.twitter.com/user/status/123"));
        assert!(!is_social_url("https://reddit.com/r/rust"));
        assert!(!is_social_url("plain text"));
    }

    #[tokio::test]
    async fn test_video_url_builds_file_uri_without_fetch() {
        let fetcher = MockFetcher::new();
        let content =
            ContentReference::remote_url(ContentKind::Video, "https://youtu.be/dQw4w9WgXcQ");

        let payload = build(ProviderId::Gemini, &content, "describe", &fetcher)
            .await
            .unwrap();

        let ProviderPayload::Gemini(gemini) = &payload else {
            panic!("expected Gemini payload");
        };
        assert!(gemini.video);
        assert!(gemini.request.parts().any(|p| p.is_file_uri()));
        // No byte fetch occurs for video hosts.
        assert!(fetcher.calls().is_empty());
    }

    #[tokio::test]
    async fn test_document_url_fetches_and_inlines() {
        let fetcher =
            MockFetcher::new().with_bytes("https://a.example/report.pdf", b"%PDF-1.4".to_vec());
        let content =
            ContentReference::remote_url(ContentKind::Document, "https://a.example/report.pdf");

        let payload = build(ProviderId::Gemini, &content, "summarize", &fetcher)
            .await
            .unwrap();

        let ProviderPayload::Gemini(gemini) = &payload else {
            panic!("expected Gemini payload");
        };
        assert!(!gemini.video);
        assert!(!gemini.request.parts().any(|p| p.is_file_uri()));
        assert_eq!(fetcher.calls().len(), 1);
    }

    #[tokio::test]
    async fn test_social_url_attaches_live_search() {
        let fetcher = MockFetcher::new();
        let content = ContentReference::remote_url(
            ContentKind::SocialPost,
            "https://x.com/user/status/123",
        );

        let payload = build(ProviderId::Grok, &content, "analyze", &fetcher)
            .await
            .unwrap();

        let ProviderPayload::Grok(grok) = &payload else {
            panic!("expected Grok payload");
        };
        assert!(grok.has_live_search());
        assert_eq!(payload.retry_policy().base_timeout, Duration::from_secs(180));
    }

    #[tokio::test]
    async fn test_non_social_url_no_live_search() {
        let fetcher = MockFetcher::new();
        let content = ContentReference::remote_url(
            ContentKind::SocialPost,
            "https://blog.example/post",
        );

        let payload = build(ProviderId::Grok, &content, "analyze", &fetcher)
            .await
            .unwrap();

        let ProviderPayload::Grok(grok) = &payload else {
            panic!("expected Grok payload");
        };
        assert!(!grok.has_live_search());
    }

    #[tokio::test]
    async fn test_forum_post_on_social_host_gets_no_live_search() {
        // The same URL that triggers live search on the social path carries
        // none here: the plain-text payload has no search slot at all.
        let fetcher = MockFetcher::new();
        let content = ContentReference::remote_url(
            ContentKind::ForumPost,
            "https://x.com/user/status/123",
        );

        let payload = build(ProviderId::Perplexity, &content, "summarize", &fetcher)
            .await
            .unwrap();

        let ProviderPayload::Perplexity(perplexity) = &payload else {
            panic!("expected Perplexity payload");
        };
        assert!(perplexity.messages[1].content.contains("https://x.com/user/status/123"));
        assert_eq!(payload.retry_policy(), RetryPolicy::WEB_TEXT);
    }

    #[tokio::test]
    async fn test_perplexity_decodes_bytes_permissively() {
        let fetcher = MockFetcher::new();
        let content = ContentReference::inline_bytes(
            ContentKind::ForumPost,
            vec![b'h', b'i', 0xFF, b'!'],
        );

        let payload = build(ProviderId::Perplexity, &content, "summarize", &fetcher)
            .await
            .unwrap();

        let ProviderPayload::Perplexity(perplexity) = &payload else {
            panic!("expected Perplexity payload");
        };
        let user = &perplexity.messages[1].content;
        assert!(user.contains("hi\u{FFFD}!"));
        assert!(user.contains("Prompt: summarize"));
    }

    #[test]
    fn test_fallback_reframes_as_text() {
        let payload = ProviderPayload::Gemini(GeminiPayload {
            request: gemini_client::GenerateRequest::from_parts(vec![
                gemini_client::Part::inline_document(b"%PDF"),
                gemini_client::Part::text("summarize"),
            ]),
            prompt: "summarize".to_string(),
            source: GeminiSource::Url("https://a.example/doc.pdf".to_string()),
            video: false,
        });

        let fallback = payload.text_fallback().unwrap();
        let ProviderPayload::Gemini(gemini) = &fallback else {
            panic!("expected Gemini payload");
        };
        let rendered = serde_json::to_string(&gemini.request).unwrap();
        assert!(rendered.contains("Document Content (URL: https://a.example/doc.pdf)"));
        assert!(!rendered.contains("inlineData"));
    }

    #[test]
    fn test_fallback_only_on_gemini() {
        let payload = ProviderPayload::Perplexity(PerplexityPayload { messages: vec![] });
        assert!(payload.text_fallback().is_none());
    }
}
