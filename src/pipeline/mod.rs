//! The evidence aggregation pipeline.
//!
//! `Pipeline` wires the stages together: expand the query, fan the
//! sub-queries out to search, fetch the top links, chunk and rank the
//! page text, then synthesize a structured response. Every external
//! collaborator is injected through a trait so the whole flow runs
//! against mocks in tests.
//!
//! # Example
//!
//! ```rust,ignore
//! use scholarseek::pipeline::Pipeline;
//! use scholarseek::ai::OpenAiModel;
//! use scholarseek::traits::fetcher::HttpFetcher;
//! use scholarseek::traits::searcher::SerpApiSearcher;
//!
//! let pipeline = Pipeline::new(
//!     SerpApiSearcher::from_env()?,
//!     HttpFetcher::new(),
//!     OpenAiModel::from_env()?,
//! );
//! let response = pipeline.structured_search("indonesia", None, Depth::Standard).await?;
//! ```

pub mod aggregate;
pub mod chunk;
pub mod expand;
pub mod fetch;
pub mod flat;
pub mod prompts;
pub mod synthesize;

use std::time::Duration;

use tokio_util::sync::CancellationToken;

use crate::error::{PipelineError, Result};
use crate::traits::ai::LanguageModel;
use crate::traits::fetcher::UrlFetcher;
use crate::traits::searcher::{offline_sample_results, SearchProvider};
use crate::types::config::PipelineConfig;
use crate::types::page::CachedPage;
use crate::types::scholarship::{SearchOutcome, SearchRequest};
use crate::types::search::Depth;
use crate::types::structured::{Citation, StructuredResponse};
use crate::util::{BoundedQueue, CircuitBreaker, TtlCache};

pub use synthesize::Evidence;

/// Queries matching any of these markers are rejected outright.
const INJECTION_MARKERS: [&str; 4] = ["<script>", "javascript:", "data:", "vbscript:"];

/// The evidence aggregation pipeline.
///
/// Owns its cache, breakers, and queue; collaborators arrive through
/// the constructor.
pub struct Pipeline<S, F, L> {
    searcher: S,
    fetcher: F,
    model: L,
    config: PipelineConfig,
    page_cache: TtlCache<String, CachedPage>,
    search_breaker: CircuitBreaker,
    fetch_breaker: CircuitBreaker,
    search_queue: BoundedQueue,
}

impl<S, F, L> Pipeline<S, F, L>
where
    S: SearchProvider,
    F: UrlFetcher,
    L: LanguageModel,
{
    /// Build a pipeline with default configuration.
    pub fn new(searcher: S, fetcher: F, model: L) -> Self {
        Self::with_config(searcher, fetcher, model, PipelineConfig::default())
    }

    /// Build a pipeline with explicit configuration.
    pub fn with_config(searcher: S, fetcher: F, model: L, config: PipelineConfig) -> Self {
        let page_cache = TtlCache::new(
            Duration::from_millis(config.fetch.cache_ttl_ms),
            config.fetch.cache_capacity,
        );
        let search_breaker =
            CircuitBreaker::new(config.search.breaker_threshold, config.search.breaker_reset_ms);
        let fetch_breaker =
            CircuitBreaker::new(config.fetch.breaker_threshold, config.fetch.breaker_reset_ms);
        let search_queue =
            BoundedQueue::new(config.search.concurrency, config.search.starts_per_second);

        Self {
            searcher,
            fetcher,
            model,
            config,
            page_cache,
            search_breaker,
            fetch_breaker,
            search_queue,
        }
    }

    /// Current configuration.
    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// The injected search provider.
    pub fn searcher(&self) -> &S {
        &self.searcher
    }

    /// The injected page fetcher.
    pub fn fetcher(&self) -> &F {
        &self.fetcher
    }

    /// The injected language model.
    pub fn model(&self) -> &L {
        &self.model
    }

    /// Check a query before any external call is made.
    ///
    /// Rejects queries shorter than 2 trimmed characters, longer than
    /// 500 characters, or containing script-injection markers.
    pub fn validate_query(&self, query: &str) -> Result<()> {
        if query.trim().chars().count() < 2 {
            return Err(PipelineError::InvalidQuery {
                reason: "query must be at least 2 characters".to_string(),
            });
        }
        if query.chars().count() > 500 {
            return Err(PipelineError::InvalidQuery {
                reason: "query must be at most 500 characters".to_string(),
            });
        }
        let lower = query.to_lowercase();
        if INJECTION_MARKERS.iter().any(|m| lower.contains(m)) {
            return Err(PipelineError::InvalidQuery {
                reason: "query contains disallowed content".to_string(),
            });
        }
        Ok(())
    }

    /// Run the full evidence pipeline for one query.
    ///
    /// Always returns a structurally valid response once the query
    /// passes validation; downstream failures degrade to offline
    /// samples or to `validation_errors`.
    pub async fn structured_search(
        &self,
        query: &str,
        locale: Option<&str>,
        depth: Depth,
    ) -> Result<StructuredResponse> {
        self.validate_query(query)?;
        let started = std::time::Instant::now();

        let prompts = expand::expand_query(&self.model, query, locale, depth).await;

        let mut results = aggregate::search_multiple_prompts(
            &self.searcher,
            &self.search_queue,
            &self.search_breaker,
            &self.config.search,
            &prompts,
        )
        .await;

        if results.is_empty() {
            tracing::warn!(query, "aggregated search empty, using offline samples");
            results = offline_sample_results(query, self.config.search.per_prompt_results);
        }

        let top_links: Vec<_> = results
            .into_iter()
            .take(self.config.search.top_links)
            .collect();

        let urls: Vec<String> = top_links.iter().map(|r| r.link.clone()).collect();
        let pages = fetch::fetch_pages(
            &self.fetcher,
            &self.page_cache,
            &self.fetch_breaker,
            &self.config.fetch,
            &urls,
        )
        .await;

        let chunks = chunk::chunk_and_rank(&pages, query, &prompts, &self.config.chunk);

        let sources: Vec<Citation> = top_links
            .iter()
            .map(|r| Citation::new(r.link.as_str(), r.title.as_str(), r.snippet.as_str()))
            .collect();

        let evidence = Evidence {
            prompts,
            sources,
            chunks,
        };

        let response = synthesize::synthesize(&self.model, query, locale, depth, &evidence).await;

        tracing::info!(
            query,
            items = response.items.len(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "structured search completed"
        );
        Ok(response)
    }

    /// Structured search that aborts when the token is cancelled.
    ///
    /// The caller owns the time budget; a cancelled run returns
    /// [`PipelineError::Cancelled`].
    pub async fn structured_search_with_cancel(
        &self,
        query: &str,
        locale: Option<&str>,
        depth: Depth,
        cancel: CancellationToken,
    ) -> Result<StructuredResponse> {
        tokio::select! {
            result = self.structured_search(query, locale, depth) => result,
            _ = cancel.cancelled() => Err(PipelineError::Cancelled),
        }
    }

    /// Run the legacy flat extraction path.
    pub async fn search_scholarships(&self, request: &SearchRequest) -> Result<SearchOutcome> {
        flat::flat_search(&self.searcher, &self.model, request)
            .await
            .map_err(|reason| PipelineError::InvalidQuery { reason })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{MockFetcher, MockLanguageModel, MockSearchProvider};

    fn pipeline_with(
        searcher: MockSearchProvider,
        fetcher: MockFetcher,
        model: MockLanguageModel,
    ) -> Pipeline<MockSearchProvider, MockFetcher, MockLanguageModel> {
        Pipeline::new(searcher, fetcher, model)
    }

    #[test]
    fn test_query_validation() {
        let pipeline = pipeline_with(
            MockSearchProvider::new(),
            MockFetcher::new(),
            MockLanguageModel::new(),
        );
        assert!(pipeline.validate_query("ok query").is_ok());
        assert!(pipeline.validate_query(" a ").is_err());
        assert!(pipeline.validate_query(&"x".repeat(501)).is_err());
        assert!(pipeline.validate_query("hello <SCRIPT>alert(1)</script>").is_err());
        assert!(pipeline.validate_query("javascript:void(0)").is_err());
    }

    #[tokio::test]
    async fn test_invalid_query_makes_no_external_calls() {
        let searcher = MockSearchProvider::new();
        let model = MockLanguageModel::new();
        let pipeline = pipeline_with(searcher, MockFetcher::new(), model);

        let result = pipeline.structured_search("x", None, Depth::Fast).await;
        assert!(matches!(result, Err(PipelineError::InvalidQuery { .. })));
        assert_eq!(pipeline.searcher.call_count(), 0);
        assert_eq!(pipeline.model.call_count(), 0);
    }

    #[tokio::test]
    async fn test_cancelled_search_returns_cancelled() {
        let pipeline = pipeline_with(
            MockSearchProvider::new().with_hang(),
            MockFetcher::new(),
            MockLanguageModel::new().with_failure("expansion offline"),
        );
        let cancel = CancellationToken::new();
        cancel.cancel();

        let result = pipeline
            .structured_search_with_cancel("physics scholarships", None, Depth::Fast, cancel)
            .await;
        assert!(matches!(result, Err(PipelineError::Cancelled)));
    }
}
