//! The orchestrator: classify, build, invoke, normalize.
//!
//! [`Analyzer::process`] is the one entry point callers use. It never returns
//! an error: every outcome, including internal failures, is folded into a
//! [`ProcessingResult`] so callers branch on one envelope shape instead of
//! provider-specific errors.

use std::sync::Arc;
use tracing::{info, warn};

use crate::classify::{build_enhanced_prompt, classify};
use crate::config::{AnalysisConfig, ProviderCredentials};
use crate::content::{ContentKind, ContentReference};
use crate::error::{AnalysisError, FetchError, InvokeError, ProviderCallError, Result};
use crate::fetch::{ContentFetcher, HttpFetcher};
use crate::invoke::invoke;
use crate::payload;
use crate::provider::{
    GeminiAdapter, GrokAdapter, PerplexityAdapter, ProviderAdapter, ProviderId,
};
use crate::resolve::{ContentResolver, ResolveError};
use crate::result::{ErrorKind, ProcessingResult};

/// Content-routing analysis engine.
///
/// Holds one adapter per provider plus the fetcher used for inlining remote
/// documents. All provider-selection and resilience policy lives behind
/// [`Analyzer::process`].
pub struct Analyzer {
    gemini: Arc<dyn ProviderAdapter>,
    grok: Arc<dyn ProviderAdapter>,
    perplexity: Arc<dyn ProviderAdapter>,
    fetcher: Arc<dyn ContentFetcher>,
}

impl Analyzer {
    /// Assemble an engine from explicit adapters and fetcher.
    pub fn new(
        gemini: Arc<dyn ProviderAdapter>,
        grok: Arc<dyn ProviderAdapter>,
        perplexity: Arc<dyn ProviderAdapter>,
        fetcher: Arc<dyn ContentFetcher>,
    ) -> Self {
        Self {
            gemini,
            grok,
            perplexity,
            fetcher,
        }
    }

    /// Assemble an engine from configuration.
    pub fn from_config(config: &AnalysisConfig) -> Self {
        Self::new(
            Arc::new(GeminiAdapter::new(gemini_from(&config.gemini))),
            Arc::new(GrokAdapter::new(grok_from(&config.grok))),
            Arc::new(PerplexityAdapter::new(perplexity_from(&config.perplexity))),
            Arc::new(HttpFetcher::new()),
        )
    }

    /// Assemble an engine from environment variables.
    pub fn from_env() -> Result<Self> {
        Ok(Self::from_config(&AnalysisConfig::from_env()?))
    }

    fn adapter_for(&self, provider: ProviderId) -> &dyn ProviderAdapter {
        match provider {
            ProviderId::Gemini => self.gemini.as_ref(),
            ProviderId::Grok => self.grok.as_ref(),
            ProviderId::Perplexity => self.perplexity.as_ref(),
        }
    }

    /// Process one piece of content under a user instruction.
    ///
    /// Never returns an error: all failures are folded into the result
    /// envelope with a machine-checkable [`ErrorKind`].
    pub async fn process(&self, content: &ContentReference, instruction: &str) -> ProcessingResult {
        let (provider, _) = classify(content.kind);
        let adapter = self.adapter_for(provider);
        let model = adapter.model().to_string();

        info!(
            kind = %content.kind,
            provider = %provider,
            model = %model,
            "processing content"
        );

        let prompt =
            build_enhanced_prompt(content.kind, instruction, content.display_name.as_deref())
                .render();

        match self.run(adapter, content, provider, &prompt).await {
            Ok(text) => {
                ProcessingResult::success(text, provider, model, content.kind, instruction)
            }
            Err(e) => {
                warn!(kind = %content.kind, provider = %provider, error = %e, "processing failed");
                ProcessingResult::failure(
                    error_kind_of(&e),
                    provider,
                    model,
                    content.kind,
                    instruction,
                )
            }
        }
    }

    /// Resolve stored content by id, then process it.
    ///
    /// A failed lookup is terminal: no provider is invoked and the result is
    /// stamped with the classification default.
    pub async fn process_stored(
        &self,
        content_id: &str,
        owner_id: &str,
        instruction: &str,
        resolver: &dyn ContentResolver,
    ) -> ProcessingResult {
        match resolver.resolve(content_id, owner_id).await {
            Ok(content) => self.process(&content, instruction).await,
            Err(ResolveError::NotFound) => {
                warn!(content_id, "stored content not found");
                ProcessingResult::failure(
                    ErrorKind::NotFound,
                    ProviderId::Gemini,
                    self.gemini.model(),
                    ContentKind::Unclassified,
                    instruction,
                )
            }
        }
    }

    /// Process several pieces of content under one instruction.
    ///
    /// Items are processed independently; one item's failure never aborts the
    /// rest. A single-item batch returns that item's result unchanged; larger
    /// batches fold into one composite envelope under the `Mixed` kind,
    /// stamped with the first item's provider and model.
    pub async fn process_batch(
        &self,
        items: &[ContentReference],
        instruction: &str,
    ) -> ProcessingResult {
        let mut results = Vec::with_capacity(items.len());
        for item in items {
            results.push(self.process(item, instruction).await);
        }

        if results.len() == 1 {
            if let Some(result) = results.pop() {
                return result;
            }
        }

        let (provider, model) = match results.first() {
            Some(first) => (first.provider, first.model.clone()),
            None => (ProviderId::Gemini, self.gemini.model().to_string()),
        };

        let all_ok = !results.is_empty() && results.iter().all(|r| r.success);
        if all_ok {
            let joined = results
                .iter()
                .filter_map(|r| r.output_text.as_deref())
                .collect::<Vec<_>>()
                .join("\n\n---\n\n");
            ProcessingResult::success(joined, provider, model, ContentKind::Mixed, instruction)
        } else {
            let kind = results
                .iter()
                .find_map(|r| r.error_kind)
                .unwrap_or(ErrorKind::Unknown);
            ProcessingResult::failure(kind, provider, model, ContentKind::Mixed, instruction)
        }
    }

    async fn run(
        &self,
        adapter: &dyn ProviderAdapter,
        content: &ContentReference,
        provider: ProviderId,
        prompt: &str,
    ) -> Result<String> {
        let payload = payload::build(provider, content, prompt, self.fetcher.as_ref()).await?;
        let policy = payload.retry_policy();
        let text = invoke(adapter, &payload, &policy).await?;
        Ok(text)
    }
}

fn error_kind_of(error: &AnalysisError) -> ErrorKind {
    match error {
        AnalysisError::NotFound => ErrorKind::NotFound,
        AnalysisError::Config(_) => ErrorKind::ConfigurationError,
        AnalysisError::Fetch(FetchError::Timeout { .. }) => ErrorKind::Timeout,
        AnalysisError::Fetch(_) => ErrorKind::UnreachableContent,
        AnalysisError::Invoke(InvokeError::Timeout { .. }) => ErrorKind::Timeout,
        AnalysisError::Invoke(InvokeError::Call(call)) => match call {
            ProviderCallError::Timeout(_) => ErrorKind::Timeout,
            ProviderCallError::Rejected { .. } => ErrorKind::ProviderRejected,
            _ => ErrorKind::Unknown,
        },
    }
}

fn gemini_from(creds: &ProviderCredentials) -> gemini_client::GeminiClient {
    let mut client = gemini_client::GeminiClient::new(creds.api_key.expose());
    if let Some(model) = &creds.model {
        client = client.with_model(model);
    }
    if let Some(url) = &creds.base_url {
        client = client.with_base_url(url);
    }
    client
}

fn grok_from(creds: &ProviderCredentials) -> grok_client::GrokClient {
    let mut client = grok_client::GrokClient::new(creds.api_key.expose());
    if let Some(model) = &creds.model {
        client = client.with_model(model);
    }
    if let Some(url) = &creds.base_url {
        client = client.with_base_url(url);
    }
    client
}

fn perplexity_from(creds: &ProviderCredentials) -> perplexity_client::PerplexityClient {
    let mut client = perplexity_client::PerplexityClient::new(creds.api_key.expose());
    if let Some(model) = &creds.model {
        client = client.with_model(model);
    }
    if let Some(url) = &creds.base_url {
        client = client.with_base_url(url);
    }
    client
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::invoke::FALLBACK_NOTICE;
    use crate::testing::{
        FetchOutcome, MockAdapter, MockFetcher, MockOutcome, MockResolver, PayloadShape,
    };

    struct Harness {
        gemini: Arc<MockAdapter>,
        grok: Arc<MockAdapter>,
        perplexity: Arc<MockAdapter>,
        analyzer: Analyzer,
    }

    fn harness(gemini: MockAdapter, grok: MockAdapter, perplexity: MockAdapter, fetcher: MockFetcher) -> Harness {
        let gemini = Arc::new(gemini);
        let grok = Arc::new(grok);
        let perplexity = Arc::new(perplexity);
        let analyzer = Analyzer::new(
            gemini.clone(),
            grok.clone(),
            perplexity.clone(),
            Arc::new(fetcher),
        );
        Harness {
            gemini,
            grok,
            perplexity,
            analyzer,
        }
    }

    fn default_harness() -> Harness {
        harness(
            MockAdapter::new(ProviderId::Gemini, "gemini-2.5-flash"),
            MockAdapter::new(ProviderId::Grok, "grok-4"),
            MockAdapter::new(ProviderId::Perplexity, "llama-3.1-sonar-small-128k-online"),
            MockFetcher::new().with_bytes("https://a.example/report.pdf", b"%PDF-1.4".to_vec()),
        )
    }

    #[tokio::test]
    async fn test_document_routes_to_gemini_only() {
        let h = default_harness();
        let content =
            ContentReference::remote_url(ContentKind::Document, "https://a.example/report.pdf")
                .with_display_name("Q3 report");

        let result = h.analyzer.process(&content, "List the key dates").await;

        assert!(result.success);
        assert_eq!(result.output_text.as_deref(), Some("mock analysis"));
        assert_eq!(result.provider, ProviderId::Gemini);
        assert_eq!(result.model, "gemini-2.5-flash");
        assert_eq!(result.content_kind, ContentKind::Document);
        assert_eq!(result.original_instruction, "List the key dates");

        let calls = h.gemini.calls();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].shape, PayloadShape::GeminiInline);
        assert!(h.grok.calls().is_empty());
        assert!(h.perplexity.calls().is_empty());
    }

    #[tokio::test]
    async fn test_video_routes_by_uri_without_fetch() {
        let h = default_harness();
        let content =
            ContentReference::remote_url(ContentKind::Video, "https://youtu.be/dQw4w9WgXcQ");

        let result = h.analyzer.process(&content, "What is discussed?").await;

        assert!(result.success);
        let calls = h.gemini.calls();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].shape, PayloadShape::GeminiFileUri);
        // Video gets the wider base budget.
        assert_eq!(calls[0].timeout, std::time::Duration::from_secs(60));
    }

    #[tokio::test]
    async fn test_social_post_routes_to_grok_with_live_search() {
        let h = default_harness();
        let content = ContentReference::remote_url(
            ContentKind::SocialPost,
            "https://x.com/user/status/123",
        );

        let result = h.analyzer.process(&content, "Summarize the thread").await;

        assert!(result.success);
        assert_eq!(result.provider, ProviderId::Grok);
        let calls = h.grok.calls();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].shape, PayloadShape::GrokChat { live_search: true });
        assert_eq!(calls[0].timeout, std::time::Duration::from_secs(180));
        assert!(h.gemini.calls().is_empty());
    }

    #[tokio::test]
    async fn test_article_routes_to_perplexity() {
        let h = default_harness();
        let content = ContentReference::plain_text(
            ContentKind::LongFormArticle,
            "A long article body...",
        );

        let result = h.analyzer.process(&content, "Key takeaways?").await;

        assert!(result.success);
        assert_eq!(result.provider, ProviderId::Perplexity);
        assert_eq!(
            h.perplexity.calls()[0].shape,
            PayloadShape::PerplexityChat
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_exhausted_timeouts_fold_into_envelope() {
        let h = harness(
            MockAdapter::new(ProviderId::Gemini, "gemini-2.5-flash").with_script(vec![
                MockOutcome::Timeout,
                MockOutcome::Timeout,
                MockOutcome::Timeout,
            ]),
            MockAdapter::new(ProviderId::Grok, "grok-4"),
            MockAdapter::new(ProviderId::Perplexity, "llama-3.1-sonar-small-128k-online"),
            MockFetcher::new().with_bytes("https://a.example/report.pdf", b"%PDF-1.4".to_vec()),
        );
        let content =
            ContentReference::remote_url(ContentKind::Document, "https://a.example/report.pdf");

        let result = h.analyzer.process(&content, "summarize").await;

        assert!(!result.success);
        assert_eq!(result.error_kind, Some(ErrorKind::Timeout));
        assert!(result.output_text.is_none());
        assert_eq!(result.content_kind, ContentKind::Document);
    }

    #[tokio::test]
    async fn test_unreachable_content_folds_into_envelope() {
        let h = harness(
            MockAdapter::new(ProviderId::Gemini, "gemini-2.5-flash"),
            MockAdapter::new(ProviderId::Grok, "grok-4"),
            MockAdapter::new(ProviderId::Perplexity, "llama-3.1-sonar-small-128k-online"),
            MockFetcher::new()
                .with_script("https://a.example/gone.pdf", vec![FetchOutcome::Status(404)]),
        );
        let content =
            ContentReference::remote_url(ContentKind::Document, "https://a.example/gone.pdf");

        let result = h.analyzer.process(&content, "summarize").await;

        assert!(!result.success);
        assert_eq!(result.error_kind, Some(ErrorKind::UnreachableContent));
        // The provider is never invoked when the bytes cannot be fetched.
        assert!(h.gemini.calls().is_empty());
    }

    #[tokio::test]
    async fn test_rejection_folds_into_envelope() {
        let h = harness(
            MockAdapter::new(ProviderId::Gemini, "gemini-2.5-flash"),
            MockAdapter::new(ProviderId::Grok, "grok-4").with_script(vec![MockOutcome::Rejected {
                status: 429,
                body: "quota".to_string(),
            }]),
            MockAdapter::new(ProviderId::Perplexity, "llama-3.1-sonar-small-128k-online"),
            MockFetcher::new(),
        );
        let content = ContentReference::remote_url(
            ContentKind::ShortFormSocial,
            "https://x.com/user/status/9",
        );

        let result = h.analyzer.process(&content, "summarize").await;

        assert!(!result.success);
        assert_eq!(result.error_kind, Some(ErrorKind::ProviderRejected));
    }

    #[tokio::test]
    async fn test_fallback_degrades_to_success() {
        let h = harness(
            MockAdapter::new(ProviderId::Gemini, "gemini-2.5-flash").with_script(vec![
                MockOutcome::NoUsableContent,
                MockOutcome::NoUsableContent,
            ]),
            MockAdapter::new(ProviderId::Grok, "grok-4"),
            MockAdapter::new(ProviderId::Perplexity, "llama-3.1-sonar-small-128k-online"),
            MockFetcher::new().with_bytes("https://a.example/report.pdf", b"%PDF-1.4".to_vec()),
        );
        let content =
            ContentReference::remote_url(ContentKind::Document, "https://a.example/report.pdf");

        let result = h.analyzer.process(&content, "summarize").await;

        // Textless responses degrade through the fallback path; the envelope
        // reports success with the degraded notice, never an error.
        assert!(result.success);
        assert_eq!(result.output_text.as_deref(), Some(FALLBACK_NOTICE));

        let calls = h.gemini.calls();
        assert_eq!(calls.len(), 2);
        assert_eq!(calls[1].shape, PayloadShape::GeminiText);
    }

    #[tokio::test]
    async fn test_stored_content_not_found_is_terminal() {
        let h = default_harness();
        let resolver = MockResolver::new();

        let result = h
            .analyzer
            .process_stored("c-1", "owner-1", "summarize", &resolver)
            .await;

        assert!(!result.success);
        assert_eq!(result.error_kind, Some(ErrorKind::NotFound));
        assert_eq!(result.content_kind, ContentKind::Unclassified);
        assert_eq!(result.provider, ProviderId::Gemini);
        assert_eq!(result.model, "gemini-2.5-flash");
        assert!(h.gemini.calls().is_empty());
    }

    #[tokio::test]
    async fn test_stored_content_is_owner_scoped() {
        let h = default_harness();
        let resolver = MockResolver::new().with_content(
            "c-1",
            "owner-1",
            ContentReference::plain_text(ContentKind::LongFormArticle, "body"),
        );

        let found = h
            .analyzer
            .process_stored("c-1", "owner-1", "summarize", &resolver)
            .await;
        assert!(found.success);

        let other_owner = h
            .analyzer
            .process_stored("c-1", "owner-2", "summarize", &resolver)
            .await;
        assert_eq!(other_owner.error_kind, Some(ErrorKind::NotFound));
    }

    #[tokio::test]
    async fn test_single_item_batch_unwraps() {
        let h = default_harness();
        let items = vec![ContentReference::plain_text(
            ContentKind::ForumPost,
            "thread body",
        )];

        let result = h.analyzer.process_batch(&items, "summarize").await;

        assert!(result.success);
        assert_eq!(result.content_kind, ContentKind::ForumPost);
        assert_eq!(result.provider, ProviderId::Perplexity);
    }

    #[tokio::test]
    async fn test_multi_item_batch_folds_into_composite() {
        let h = default_harness();
        let items = vec![
            ContentReference::plain_text(ContentKind::Document, "doc one"),
            ContentReference::plain_text(ContentKind::Document, "doc two"),
        ];

        let result = h.analyzer.process_batch(&items, "summarize").await;

        assert!(result.success);
        assert_eq!(result.content_kind, ContentKind::Mixed);
        assert_eq!(
            result.output_text.as_deref(),
            Some("mock analysis\n\n---\n\nmock analysis")
        );
        assert_eq!(h.gemini.calls().len(), 2);
    }

    #[tokio::test]
    async fn test_composite_batch_stamps_serving_provider() {
        let h = default_harness();
        let items = vec![
            ContentReference::plain_text(ContentKind::ForumPost, "thread one"),
            ContentReference::plain_text(ContentKind::ForumPost, "thread two"),
        ];

        let result = h.analyzer.process_batch(&items, "summarize").await;

        assert!(result.success);
        assert_eq!(result.content_kind, ContentKind::Mixed);
        assert_eq!(result.provider, ProviderId::Perplexity);
        assert_eq!(result.model, "llama-3.1-sonar-small-128k-online");
        assert!(h.gemini.calls().is_empty());
    }

    #[tokio::test]
    async fn test_batch_item_failure_folds_into_composite_failure() {
        let h = harness(
            MockAdapter::new(ProviderId::Gemini, "gemini-2.5-flash").with_script(vec![
                MockOutcome::Text("fine".to_string()),
                MockOutcome::Rejected {
                    status: 500,
                    body: "boom".to_string(),
                },
            ]),
            MockAdapter::new(ProviderId::Grok, "grok-4"),
            MockAdapter::new(ProviderId::Perplexity, "llama-3.1-sonar-small-128k-online"),
            MockFetcher::new(),
        );
        let items = vec![
            ContentReference::plain_text(ContentKind::Document, "doc one"),
            ContentReference::plain_text(ContentKind::Document, "doc two"),
        ];

        let result = h.analyzer.process_batch(&items, "summarize").await;

        assert!(!result.success);
        assert_eq!(result.error_kind, Some(ErrorKind::ProviderRejected));
        assert_eq!(result.content_kind, ContentKind::Mixed);
        // Both items were still attempted.
        assert_eq!(h.gemini.calls().len(), 2);
    }
}
