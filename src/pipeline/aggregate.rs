//! Multi-query search with aggregation.
//!
//! Fans expanded queries out to the search provider under a bounded
//! queue and a circuit breaker, then merges the result lists:
//! first-seen wins per link, and domains are interleaved so one site
//! cannot dominate the top of the list.

use indexmap::IndexMap;

use crate::error::SearchError;
use crate::traits::searcher::SearchProvider;
use crate::types::config::SearchConfig;
use crate::types::search::{source_domain, SearchResult};
use crate::util::{BoundedQueue, CircuitBreaker};

/// Run every query against the provider and merge the results.
///
/// Individual query failures are logged and skipped; the call only
/// returns an empty list when every query failed or matched nothing.
pub async fn search_multiple_prompts<S: SearchProvider>(
    provider: &S,
    queue: &BoundedQueue,
    breaker: &CircuitBreaker,
    config: &SearchConfig,
    prompts: &[String],
) -> Vec<SearchResult> {
    if prompts.is_empty() {
        return vec![];
    }

    let tasks: Vec<_> = prompts
        .iter()
        .map(|prompt| {
            let query = format!("{prompt}{}", config.query_suffix);
            let limit = config.per_prompt_results;
            async move {
                if !breaker.can_request() {
                    return Err(SearchError::CircuitOpen);
                }
                match provider.search(&query, limit).await {
                    Ok(results) => {
                        breaker.success();
                        Ok(results)
                    }
                    Err(e) => {
                        breaker.failure();
                        Err(e)
                    }
                }
            }
        })
        .collect();

    let settled = queue.run_all(tasks).await;

    let mut flat: Vec<SearchResult> = Vec::new();
    for (index, outcome) in settled.into_iter().enumerate() {
        match outcome {
            Ok(results) => flat.extend(results),
            Err(e) => {
                tracing::warn!(index, prompt = %prompts[index], error = %e, "search query failed");
            }
        }
    }

    diversify(dedupe_by_link(flat))
}

/// Drop repeated links, keeping the first occurrence of each.
pub fn dedupe_by_link(results: Vec<SearchResult>) -> Vec<SearchResult> {
    let mut by_link: IndexMap<String, SearchResult> = IndexMap::new();
    for result in results {
        by_link.entry(result.link.clone()).or_insert(result);
    }
    by_link.into_values().collect()
}

/// Interleave results round-robin across source domains.
///
/// Domains keep their first-seen order, so ties are broken in favor of
/// domains that surfaced earlier.
pub fn diversify(results: Vec<SearchResult>) -> Vec<SearchResult> {
    let mut by_domain: IndexMap<String, std::collections::VecDeque<SearchResult>> =
        IndexMap::new();
    for result in results {
        by_domain
            .entry(source_domain(&result.link))
            .or_default()
            .push_back(result);
    }

    let mut diversified = Vec::new();
    let mut added = true;
    while added {
        added = false;
        for bucket in by_domain.values_mut() {
            if let Some(next) = bucket.pop_front() {
                diversified.push(next);
                added = true;
            }
        }
    }
    diversified
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::MockSearchProvider;

    fn result(link: &str) -> SearchResult {
        SearchResult::new("t", link, "s")
    }

    #[test]
    fn test_dedupe_keeps_first_occurrence() {
        let deduped = dedupe_by_link(vec![
            SearchResult::new("first", "https://a.org/x", "s1"),
            SearchResult::new("second", "https://a.org/x", "s2"),
            result("https://b.org/y"),
        ]);
        assert_eq!(deduped.len(), 2);
        assert_eq!(deduped[0].title, "first");
    }

    #[test]
    fn test_diversify_interleaves_domains() {
        let diversified = diversify(vec![
            result("https://a.org/1"),
            result("https://a.org/2"),
            result("https://a.org/3"),
            result("https://b.org/1"),
            result("https://b.org/2"),
        ]);
        let links: Vec<&str> = diversified.iter().map(|r| r.link.as_str()).collect();
        assert_eq!(
            links,
            vec![
                "https://a.org/1",
                "https://b.org/1",
                "https://a.org/2",
                "https://b.org/2",
                "https://a.org/3",
            ]
        );
    }

    #[tokio::test]
    async fn test_search_appends_suffix_and_merges() {
        let provider = MockSearchProvider::new()
            .with_results("alpha", vec![result("https://a.org/1")])
            .with_results("beta", vec![result("https://b.org/1")]);
        let config = SearchConfig::default();
        let queue = BoundedQueue::new(config.concurrency, config.starts_per_second);
        let breaker = CircuitBreaker::new(config.breaker_threshold, config.breaker_reset_ms);

        let merged = search_multiple_prompts(
            &provider,
            &queue,
            &breaker,
            &config,
            &["alpha".to_string(), "beta".to_string()],
        )
        .await;

        assert_eq!(merged.len(), 2);
        let queries = provider.queries();
        assert!(queries
            .iter()
            .all(|q| q.ends_with(" scholarship application deadline requirements benefits")));
    }

    #[tokio::test]
    async fn test_partial_failures_keep_other_results() {
        let provider = MockSearchProvider::new()
            .with_results("good", vec![result("https://a.org/1")])
            .with_error("bad", SearchError::Timeout);
        let config = SearchConfig::default();
        let queue = BoundedQueue::new(config.concurrency, config.starts_per_second);
        let breaker = CircuitBreaker::new(config.breaker_threshold, config.breaker_reset_ms);

        let merged = search_multiple_prompts(
            &provider,
            &queue,
            &breaker,
            &config,
            &["bad".to_string(), "good".to_string()],
        )
        .await;

        assert_eq!(merged.len(), 1);
        assert_eq!(merged[0].link, "https://a.org/1");
    }

    #[tokio::test]
    async fn test_open_breaker_skips_provider_calls() {
        let provider = MockSearchProvider::new().with_results("q", vec![result("https://a.org/1")]);
        let config = SearchConfig::default();
        let queue = BoundedQueue::new(config.concurrency, config.starts_per_second);
        let breaker = CircuitBreaker::new(1, 60_000);
        breaker.failure();

        let merged =
            search_multiple_prompts(&provider, &queue, &breaker, &config, &["q".to_string()])
                .await;

        assert!(merged.is_empty());
        assert_eq!(provider.call_count(), 0);
    }

    #[tokio::test]
    async fn test_empty_prompts_short_circuit() {
        let provider = MockSearchProvider::new();
        let config = SearchConfig::default();
        let queue = BoundedQueue::new(config.concurrency, config.starts_per_second);
        let breaker = CircuitBreaker::new(config.breaker_threshold, config.breaker_reset_ms);

        let merged = search_multiple_prompts(&provider, &queue, &breaker, &config, &[]).await;
        assert!(merged.is_empty());
        assert_eq!(provider.call_count(), 0);
    }
}
