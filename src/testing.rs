//! Mock collaborators for tests.
//!
//! Hand-written mocks with scripted responses and call recording so
//! pipeline behavior can be tested without a network or an API key.

use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;

use crate::error::{FetchError, PipelineError, Result, SearchError};
use crate::traits::ai::{CompletionParams, LanguageModel};
use crate::traits::fetcher::{RawBody, UrlFetcher};
use crate::traits::searcher::SearchProvider;
use crate::types::search::SearchResult;

/// Language model replaying scripted responses in order.
pub struct MockLanguageModel {
    script: Mutex<VecDeque<std::result::Result<String, String>>>,
    calls: Mutex<Vec<(String, String)>>,
}

impl MockLanguageModel {
    pub fn new() -> Self {
        Self {
            script: Mutex::new(VecDeque::new()),
            calls: Mutex::new(Vec::new()),
        }
    }

    /// Queue a successful completion.
    pub fn with_response(self, response: impl Into<String>) -> Self {
        self.script
            .lock()
            .expect("script lock")
            .push_back(Ok(response.into()));
        self
    }

    /// Queue a failed completion.
    pub fn with_failure(self, message: impl Into<String>) -> Self {
        self.script
            .lock()
            .expect("script lock")
            .push_back(Err(message.into()));
        self
    }

    /// Number of completions requested so far.
    pub fn call_count(&self) -> usize {
        self.calls.lock().expect("calls lock").len()
    }

    /// The `(system, user)` prompt pairs seen so far.
    pub fn calls(&self) -> Vec<(String, String)> {
        self.calls.lock().expect("calls lock").clone()
    }
}

impl Default for MockLanguageModel {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl LanguageModel for MockLanguageModel {
    async fn complete(
        &self,
        system: &str,
        user: &str,
        _params: CompletionParams,
    ) -> Result<String> {
        self.calls
            .lock()
            .expect("calls lock")
            .push((system.to_string(), user.to_string()));
        match self.script.lock().expect("script lock").pop_front() {
            Some(Ok(response)) => Ok(response),
            Some(Err(message)) => Err(PipelineError::LanguageModel(message.into())),
            None => Err(PipelineError::LanguageModel(
                "no scripted response remaining".into(),
            )),
        }
    }
}

enum SearchRule {
    Results(Vec<SearchResult>),
    Error(SearchError),
}

fn clone_search_error(e: &SearchError) -> SearchError {
    match e {
        SearchError::Timeout => SearchError::Timeout,
        SearchError::RateLimited => SearchError::RateLimited,
        SearchError::Unauthorized => SearchError::Unauthorized,
        SearchError::CircuitOpen => SearchError::CircuitOpen,
        SearchError::MissingCredential(s) => SearchError::MissingCredential(s.clone()),
        SearchError::InvalidResponse(s) => SearchError::InvalidResponse(s.clone()),
        SearchError::Provider(b) => SearchError::InvalidResponse(b.to_string()),
    }
}

/// Search provider matching queries by substring.
///
/// The first rule whose matcher appears in the query wins; unmatched
/// queries return an empty result list.
pub struct MockSearchProvider {
    rules: Vec<(String, SearchRule)>,
    hang: bool,
    queries: Mutex<Vec<String>>,
}

impl MockSearchProvider {
    pub fn new() -> Self {
        Self {
            rules: Vec::new(),
            hang: false,
            queries: Mutex::new(Vec::new()),
        }
    }

    /// Return these results for queries containing `matcher`.
    pub fn with_results(mut self, matcher: impl Into<String>, results: Vec<SearchResult>) -> Self {
        self.rules.push((matcher.into(), SearchRule::Results(results)));
        self
    }

    /// Fail queries containing `matcher` with this error.
    /// An empty matcher fails every query.
    pub fn with_error(mut self, matcher: impl Into<String>, error: SearchError) -> Self {
        self.rules.push((matcher.into(), SearchRule::Error(error)));
        self
    }

    /// Never resolve any search. For cancellation tests.
    pub fn with_hang(mut self) -> Self {
        self.hang = true;
        self
    }

    /// Number of searches performed.
    pub fn call_count(&self) -> usize {
        self.queries.lock().expect("queries lock").len()
    }

    /// Queries seen so far.
    pub fn queries(&self) -> Vec<String> {
        self.queries.lock().expect("queries lock").clone()
    }
}

impl Default for MockSearchProvider {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl SearchProvider for MockSearchProvider {
    async fn search(
        &self,
        query: &str,
        limit: usize,
    ) -> std::result::Result<Vec<SearchResult>, SearchError> {
        if self.hang {
            std::future::pending::<()>().await;
        }
        self.queries
            .lock()
            .expect("queries lock")
            .push(query.to_string());
        for (matcher, rule) in &self.rules {
            if query.contains(matcher.as_str()) {
                return match rule {
                    SearchRule::Results(results) => {
                        Ok(results.iter().take(limit).cloned().collect())
                    }
                    SearchRule::Error(e) => Err(clone_search_error(e)),
                };
            }
        }
        Ok(vec![])
    }
}

/// Fetcher serving canned pages by exact URL.
///
/// Unknown URLs fail with a transport error.
pub struct MockFetcher {
    pages: HashMap<String, (u16, String)>,
    calls: AtomicUsize,
    user_agents: Mutex<Vec<String>>,
}

impl MockFetcher {
    pub fn new() -> Self {
        Self {
            pages: HashMap::new(),
            calls: AtomicUsize::new(0),
            user_agents: Mutex::new(Vec::new()),
        }
    }

    /// Serve `html` with `status` for this URL.
    pub fn with_page(mut self, url: impl Into<String>, status: u16, html: impl Into<String>) -> Self {
        self.pages.insert(url.into(), (status, html.into()));
        self
    }

    /// Number of fetches performed.
    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// User-Agent values seen so far, one per fetch.
    pub fn user_agents(&self) -> Vec<String> {
        self.user_agents.lock().expect("user agents lock").clone()
    }
}

impl Default for MockFetcher {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl UrlFetcher for MockFetcher {
    async fn fetch_url(
        &self,
        url: &str,
        user_agent: &str,
        _timeout_ms: u64,
        max_bytes: usize,
    ) -> std::result::Result<RawBody, FetchError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.user_agents
            .lock()
            .expect("user agents lock")
            .push(user_agent.to_string());
        match self.pages.get(url) {
            Some((status, html)) => {
                let mut bytes = html.clone().into_bytes();
                bytes.truncate(max_bytes);
                Ok(RawBody {
                    bytes,
                    status: *status,
                })
            }
            None => Err(FetchError::Http(Box::new(std::io::Error::new(
                std::io::ErrorKind::NotFound,
                format!("no canned page for {url}"),
            )))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_mock_model_replays_in_order() {
        let model = MockLanguageModel::new()
            .with_response("first")
            .with_failure("down");
        assert_eq!(
            model
                .complete("s", "u", CompletionParams::synthesis())
                .await
                .expect("first"),
            "first"
        );
        assert!(model
            .complete("s", "u", CompletionParams::synthesis())
            .await
            .is_err());
        assert_eq!(model.call_count(), 2);
    }

    #[tokio::test]
    async fn test_mock_provider_matches_substring() {
        let provider = MockSearchProvider::new()
            .with_results("alpha", vec![SearchResult::new("t", "https://a.org", "s")]);
        let hits = provider.search("alpha beta", 5).await.expect("search");
        assert_eq!(hits.len(), 1);
        let misses = provider.search("gamma", 5).await.expect("search");
        assert!(misses.is_empty());
    }

    #[tokio::test]
    async fn test_mock_fetcher_truncates_to_cap() {
        let fetcher = MockFetcher::new().with_page("https://a.org", 200, "0123456789");
        let body = fetcher
            .fetch_url("https://a.org", "TestBot/1.0", 1_000, 4)
            .await
            .expect("fetch");
        assert_eq!(body.bytes, b"0123");
        assert!(fetcher
            .fetch_url("https://b.org", "TestBot/1.0", 1_000, 4)
            .await
            .is_err());
        assert_eq!(fetcher.user_agents(), vec!["TestBot/1.0", "TestBot/1.0"]);
    }
}
