//! Resilient provider invocation.
//!
//! All retry, escalation, backoff, and fallback policy lives here, outside
//! the adapters. Adapters make exactly one call; this module decides how many
//! times to call, with what timeout budget, and what to do when a
//! structurally valid response carries no usable text.

use std::time::Duration;
use tracing::{info, warn};

use crate::error::{InvokeError, ProviderCallError};
use crate::payload::{ProviderPayload, FALLBACK_TIMEOUT};
use crate::provider::ProviderAdapter;

/// Notice returned when the text-only fallback itself produces nothing.
///
/// The fallback path degrades, it never propagates: a fallback failure is
/// reported as this successful-but-degraded message rather than an error.
pub const FALLBACK_NOTICE: &str =
    "Unable to process the document. The file may be corrupted or in an unsupported format.";

/// A bounded retry schedule with per-attempt timeout budgets.
///
/// Only timeouts are retried. Any other failure is raised on first
/// occurrence: a quota rejection or a malformed response will not change on
/// replay, and hammering a failing provider helps nobody.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Maximum number of attempts (at least 1)
    pub max_attempts: u32,

    /// Timeout budget for the first attempt
    pub base_timeout: Duration,

    /// Whether the budget doubles on each subsequent attempt
    pub escalate: bool,
}

impl RetryPolicy {
    /// Document analysis: 3 attempts at 30s, 60s, 120s.
    pub const DOCUMENT: Self = Self {
        max_attempts: 3,
        base_timeout: Duration::from_secs(30),
        escalate: true,
    };

    /// Video analysis: 3 attempts at 60s, 120s, 240s.
    pub const VIDEO: Self = Self {
        max_attempts: 3,
        base_timeout: Duration::from_secs(60),
        escalate: true,
    };

    /// Remote byte fetch during payload construction: 3 attempts at
    /// 30s, 60s, 120s.
    pub const URL_FETCH: Self = Self {
        max_attempts: 3,
        base_timeout: Duration::from_secs(30),
        escalate: true,
    };

    /// Social analysis without live search: 2 attempts at a fixed 120s.
    pub const SOCIAL: Self = Self {
        max_attempts: 2,
        base_timeout: Duration::from_secs(120),
        escalate: false,
    };

    /// Social analysis with live search: 2 attempts at a fixed 180s.
    /// Live search does its own upstream retrieval, so the budget is wider.
    pub const SOCIAL_LIVE_SEARCH: Self = Self {
        max_attempts: 2,
        base_timeout: Duration::from_secs(180),
        escalate: false,
    };

    /// Web-text analysis: a single attempt at 120s.
    pub const WEB_TEXT: Self = Self {
        max_attempts: 1,
        base_timeout: Duration::from_secs(120),
        escalate: false,
    };

    /// Timeout budget for a zero-based attempt index.
    pub fn timeout_for(&self, attempt: u32) -> Duration {
        if self.escalate {
            self.base_timeout * 2u32.pow(attempt)
        } else {
            self.base_timeout
        }
    }

    /// Backoff sleep after a zero-based attempt index: 1s, 2s, 4s, ...
    pub fn backoff_after(&self, attempt: u32) -> Duration {
        Duration::from_secs(2u64.pow(attempt))
    }

    /// The full attempt schedule this policy allows.
    pub fn attempts(&self) -> impl Iterator<Item = CallAttempt> + '_ {
        (0..self.max_attempts).map(|index| CallAttempt {
            index,
            timeout: self.timeout_for(index),
        })
    }
}

/// One attempt of a retry schedule: its zero-based index and timeout budget.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CallAttempt {
    pub index: u32,
    pub timeout: Duration,
}

/// Invoke a provider under a retry policy.
///
/// Retries only on timeout, sleeping between attempts. When a structurally
/// valid response carries no usable text and the payload supports a
/// text-only reframing, a single degraded fallback call is made instead of
/// failing; the fallback itself never raises.
pub async fn invoke(
    adapter: &dyn ProviderAdapter,
    payload: &ProviderPayload,
    policy: &RetryPolicy,
) -> Result<String, InvokeError> {
    for attempt in policy.attempts() {
        info!(
            provider = %adapter.id(),
            model = adapter.model(),
            attempt = attempt.index,
            timeout = ?attempt.timeout,
            "invoking provider"
        );

        match adapter.call(payload, attempt.timeout).await {
            Ok(text) => return Ok(text),
            Err(ProviderCallError::Timeout(_)) if attempt.index + 1 < policy.max_attempts => {
                let backoff = policy.backoff_after(attempt.index);
                warn!(
                    provider = %adapter.id(),
                    attempt = attempt.index,
                    ?backoff,
                    "provider call timed out, backing off"
                );
                tokio::time::sleep(backoff).await;
            }
            Err(ProviderCallError::Timeout(_)) => {
                return Err(InvokeError::Timeout {
                    attempts: policy.max_attempts,
                });
            }
            Err(ProviderCallError::NoUsableContent) => {
                if let Some(fallback) = payload.text_fallback() {
                    warn!(
                        provider = %adapter.id(),
                        "response carried no usable text, degrading to text-only fallback"
                    );
                    return Ok(fallback_call(adapter, &fallback).await);
                }
                return Err(InvokeError::Call(ProviderCallError::NoUsableContent));
            }
            Err(e) => return Err(InvokeError::Call(e)),
        }
    }

    Err(InvokeError::Timeout {
        attempts: policy.max_attempts,
    })
}

/// Make the single text-only fallback call. Never raises: any failure or
/// textless response degrades to [`FALLBACK_NOTICE`].
async fn fallback_call(adapter: &dyn ProviderAdapter, fallback: &ProviderPayload) -> String {
    match adapter.call(fallback, FALLBACK_TIMEOUT).await {
        Ok(text) => text,
        Err(e) => {
            warn!(provider = %adapter.id(), error = %e, "fallback call failed, returning notice");
            FALLBACK_NOTICE.to_string()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::payload::{GeminiPayload, GeminiSource};
    use crate::provider::ProviderId;
    use crate::testing::{MockAdapter, MockOutcome};

    fn document_payload() -> ProviderPayload {
        ProviderPayload::Gemini(GeminiPayload {
            request: gemini_client::GenerateRequest::from_parts(vec![
                gemini_client::Part::inline_document(b"%PDF"),
                gemini_client::Part::text("summarize"),
            ]),
            prompt: "summarize".to_string(),
            source: GeminiSource::Url("https://a.example/doc.pdf".to_string()),
            video: false,
        })
    }

    #[test]
    fn test_escalating_schedule() {
        let policy = RetryPolicy::DOCUMENT;
        assert_eq!(policy.timeout_for(0), Duration::from_secs(30));
        assert_eq!(policy.timeout_for(1), Duration::from_secs(60));
        assert_eq!(policy.timeout_for(2), Duration::from_secs(120));
    }

    #[test]
    fn test_fixed_schedule() {
        let policy = RetryPolicy::SOCIAL_LIVE_SEARCH;
        assert_eq!(policy.timeout_for(0), Duration::from_secs(180));
        assert_eq!(policy.timeout_for(1), Duration::from_secs(180));
    }

    #[test]
    fn test_attempt_schedule() {
        let attempts: Vec<_> = RetryPolicy::VIDEO.attempts().collect();
        assert_eq!(
            attempts,
            vec![
                CallAttempt {
                    index: 0,
                    timeout: Duration::from_secs(60)
                },
                CallAttempt {
                    index: 1,
                    timeout: Duration::from_secs(120)
                },
                CallAttempt {
                    index: 2,
                    timeout: Duration::from_secs(240)
                },
            ]
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_retry_bound_and_exhaustion() {
        let adapter = MockAdapter::new(ProviderId::Gemini, "gemini-2.5-flash").with_script(vec![
            MockOutcome::Timeout,
            MockOutcome::Timeout,
            MockOutcome::Timeout,
        ]);

        let result = invoke(&adapter, &document_payload(), &RetryPolicy::DOCUMENT).await;

        assert!(matches!(result, Err(InvokeError::Timeout { attempts: 3 })));
        assert_eq!(adapter.calls().len(), 3);

        // Per-attempt budgets double: 30s, 60s, 120s.
        let timeouts: Vec<_> = adapter.calls().iter().map(|c| c.timeout).collect();
        assert_eq!(
            timeouts,
            vec![
                Duration::from_secs(30),
                Duration::from_secs(60),
                Duration::from_secs(120)
            ]
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_success_after_retries_with_backoff() {
        let adapter = MockAdapter::new(ProviderId::Gemini, "gemini-2.5-flash").with_script(vec![
            MockOutcome::Timeout,
            MockOutcome::Timeout,
            MockOutcome::Text("third time lucky".to_string()),
        ]);

        let start = tokio::time::Instant::now();
        let text = invoke(&adapter, &document_payload(), &RetryPolicy::DOCUMENT)
            .await
            .unwrap();

        assert_eq!(text, "third time lucky");
        // Backoff sleeps of 1s then 2s between the three attempts.
        assert_eq!(start.elapsed(), Duration::from_secs(3));
        assert_eq!(adapter.calls().len(), 3);
    }

    #[tokio::test]
    async fn test_rejection_not_retried() {
        let adapter = MockAdapter::new(ProviderId::Grok, "grok-4").with_script(vec![
            MockOutcome::Rejected {
                status: 429,
                body: "quota exceeded".to_string(),
            },
        ]);

        let payload = ProviderPayload::Grok(crate::payload::GrokPayload {
            messages: vec![grok_client::Message::user("analyze")],
            search: None,
        });
        let result = invoke(&adapter, &payload, &RetryPolicy::SOCIAL).await;

        assert!(matches!(
            result,
            Err(InvokeError::Call(ProviderCallError::Rejected { status: 429, .. }))
        ));
        assert_eq!(adapter.calls().len(), 1);
    }

    #[tokio::test]
    async fn test_textless_response_triggers_fallback() {
        let adapter = MockAdapter::new(ProviderId::Gemini, "gemini-2.5-flash").with_script(vec![
            MockOutcome::NoUsableContent,
            MockOutcome::Text("degraded summary".to_string()),
        ]);

        let text = invoke(&adapter, &document_payload(), &RetryPolicy::DOCUMENT)
            .await
            .unwrap();

        assert_eq!(text, "degraded summary");
        let calls = adapter.calls();
        assert_eq!(calls.len(), 2);
        // The fallback call has its own fixed budget.
        assert_eq!(calls[1].timeout, FALLBACK_TIMEOUT);
    }

    #[tokio::test]
    async fn test_fallback_failure_yields_notice() {
        let adapter = MockAdapter::new(ProviderId::Gemini, "gemini-2.5-flash").with_script(vec![
            MockOutcome::NoUsableContent,
            MockOutcome::NoUsableContent,
        ]);

        let text = invoke(&adapter, &document_payload(), &RetryPolicy::DOCUMENT)
            .await
            .unwrap();

        assert_eq!(text, FALLBACK_NOTICE);
    }

    #[tokio::test]
    async fn test_no_fallback_without_text_reframing() {
        // Chat payloads have no text-only reframing, so a textless response
        // is a terminal error.
        let adapter = MockAdapter::new(ProviderId::Perplexity, "llama-3.1-sonar-small-128k-online")
            .with_script(vec![MockOutcome::NoUsableContent]);

        let payload = ProviderPayload::Perplexity(crate::payload::PerplexityPayload {
            messages: vec![perplexity_client::Message::user("analyze")],
        });
        let result = invoke(&adapter, &payload, &RetryPolicy::WEB_TEXT).await;

        assert!(matches!(
            result,
            Err(InvokeError::Call(ProviderCallError::NoUsableContent))
        ));
        assert_eq!(adapter.calls().len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_single_attempt_policy() {
        let adapter = MockAdapter::new(ProviderId::Perplexity, "llama-3.1-sonar-small-128k-online")
            .with_script(vec![MockOutcome::Timeout]);

        let payload = ProviderPayload::Perplexity(crate::payload::PerplexityPayload {
            messages: vec![perplexity_client::Message::user("analyze")],
        });
        let result = invoke(&adapter, &payload, &RetryPolicy::WEB_TEXT).await;

        assert!(matches!(result, Err(InvokeError::Timeout { attempts: 1 })));
        assert_eq!(adapter.calls().len(), 1);
    }
}
