//! Search provider trait and the SerpAPI implementation.

use async_trait::async_trait;
use serde::Deserialize;

use crate::error::SearchError;
use crate::security::SecretString;
use crate::types::search::SearchResult;

/// Search provider trait.
///
/// Implementations return SERP entries for a single query; fan-out,
/// rate limiting, and aggregation live in the pipeline.
#[async_trait]
pub trait SearchProvider: Send + Sync {
    /// Search the web, returning up to `limit` results.
    async fn search(&self, query: &str, limit: usize)
        -> Result<Vec<SearchResult>, SearchError>;
}

/// SerpAPI search response, organic results only.
#[derive(Debug, Deserialize)]
struct SerpResponse {
    #[serde(default)]
    organic_results: Vec<SerpResult>,
}

#[derive(Debug, Deserialize)]
struct SerpResult {
    #[serde(default)]
    title: Option<String>,
    #[serde(default)]
    link: Option<String>,
    #[serde(default)]
    snippet: Option<String>,
}

/// Google search via SerpAPI.
pub struct SerpApiSearcher {
    client: reqwest::Client,
    api_key: SecretString,
    base_url: String,
    timeout_ms: u64,
}

impl SerpApiSearcher {
    /// Create a searcher with the given API key.
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            api_key: SecretString::new(api_key),
            base_url: "https://serpapi.com/search".to_string(),
            timeout_ms: 10_000,
        }
    }

    /// Create a searcher from the `SERPAPI_API_KEY` environment variable.
    pub fn from_env() -> Result<Self, SearchError> {
        let key = std::env::var("SERPAPI_API_KEY")
            .map_err(|_| SearchError::MissingCredential("SERPAPI_API_KEY".to_string()))?;
        Ok(Self::new(key))
    }

    /// Override the endpoint, for tests against a local server.
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// Set the per-request timeout.
    pub fn with_timeout_ms(mut self, ms: u64) -> Self {
        self.timeout_ms = ms;
        self
    }
}

#[async_trait]
impl SearchProvider for SerpApiSearcher {
    async fn search(
        &self,
        query: &str,
        limit: usize,
    ) -> Result<Vec<SearchResult>, SearchError> {
        let num = limit.to_string();
        let response = self
            .client
            .get(&self.base_url)
            .query(&[
                ("q", query),
                ("api_key", self.api_key.expose()),
                ("engine", "google"),
                ("num", num.as_str()),
                ("gl", "us"),
                ("hl", "en"),
                ("safe", "active"),
            ])
            .timeout(std::time::Duration::from_millis(self.timeout_ms))
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    SearchError::Timeout
                } else {
                    SearchError::Provider(Box::new(e))
                }
            })?;

        match response.status().as_u16() {
            429 => return Err(SearchError::RateLimited),
            401 => return Err(SearchError::Unauthorized),
            s if s >= 400 => {
                return Err(SearchError::InvalidResponse(format!(
                    "search API returned status {s}"
                )))
            }
            _ => {}
        }

        let serp: SerpResponse = response
            .json()
            .await
            .map_err(|e| SearchError::InvalidResponse(e.to_string()))?;

        if serp.organic_results.is_empty() {
            tracing::debug!(query, "search returned no organic results");
        }

        Ok(serp
            .organic_results
            .into_iter()
            .take(limit)
            .map(|r| {
                SearchResult::new(
                    r.title.unwrap_or_else(|| "No title".to_string()),
                    r.link.unwrap_or_default(),
                    r.snippet
                        .unwrap_or_else(|| "No description available".to_string()),
                )
            })
            .collect())
    }
}

/// Canned results used when live search is unavailable.
///
/// The titles and snippets embed the query so downstream stages still
/// produce query-relevant output in offline runs.
pub fn offline_sample_results(query: &str, limit: usize) -> Vec<SearchResult> {
    let samples = [
        (
            format!("{query} Scholarship Program 2025"),
            "https://example-scholarship.org/apply",
            format!(
                "Apply for the {query} scholarship program. This fully funded opportunity \
                 covers tuition, living expenses, and travel costs for international students."
            ),
        ),
        (
            format!("{query} University Scholarship Application"),
            "https://university.edu/scholarships",
            format!(
                "Complete guide to applying for {query} scholarships at our university. \
                 Learn about requirements, deadlines, and application procedures."
            ),
        ),
        (
            format!("{query} Scholarship Requirements and Benefits"),
            "https://scholarship-guide.com/requirements",
            format!(
                "Detailed information about {query} scholarship eligibility criteria, \
                 benefits, and application timeline."
            ),
        ),
        (
            format!("{query} International Student Scholarship"),
            "https://international-scholarships.org/apply",
            format!(
                "International students can apply for {query} scholarships. Includes \
                 application process, eligibility requirements, and funding details."
            ),
        ),
        (
            format!("{query} Scholarship Application Guide"),
            "https://scholarship-help.com/guide",
            format!(
                "Step-by-step guide to applying for {query} scholarships. Tips for \
                 successful applications and common mistakes to avoid."
            ),
        ),
    ];

    samples
        .into_iter()
        .take(limit)
        .map(|(title, link, snippet)| SearchResult::new(title, link, snippet))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_offline_samples_respect_limit() {
        let results = offline_sample_results("chevening", 3);
        assert_eq!(results.len(), 3);
        assert!(results[0].title.contains("chevening"));
        assert_eq!(results[0].source, "example-scholarship.org");
    }

    #[test]
    fn test_offline_samples_have_distinct_domains() {
        let results = offline_sample_results("daad", 5);
        let domains: std::collections::HashSet<_> =
            results.iter().map(|r| r.source.as_str()).collect();
        assert_eq!(domains.len(), 5);
    }

    #[test]
    fn test_from_env_missing_key() {
        std::env::remove_var("SERPAPI_API_KEY");
        assert!(matches!(
            SerpApiSearcher::from_env(),
            Err(SearchError::MissingCredential(_))
        ));
    }
}
