//! Configuration for the discovery pipeline.

use serde::{Deserialize, Serialize};

/// Top-level pipeline configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PipelineConfig {
    /// Search fan-out and aggregation settings.
    pub search: SearchConfig,

    /// Page fetch and extraction settings.
    pub fetch: FetchConfig,

    /// Evidence chunking and ranking settings.
    pub chunk: ChunkConfig,
}

impl PipelineConfig {
    /// Create a config with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the search settings.
    pub fn with_search(mut self, search: SearchConfig) -> Self {
        self.search = search;
        self
    }

    /// Replace the fetch settings.
    pub fn with_fetch(mut self, fetch: FetchConfig) -> Self {
        self.fetch = fetch;
        self
    }

    /// Replace the chunking settings.
    pub fn with_chunk(mut self, chunk: ChunkConfig) -> Self {
        self.chunk = chunk;
        self
    }
}

/// Settings for the multi-prompt search stage.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchConfig {
    /// Results requested per expanded query.
    pub per_prompt_results: usize,

    /// Top aggregated links whose pages are fetched.
    pub top_links: usize,

    /// Maximum concurrently in-flight provider calls.
    pub concurrency: usize,

    /// Maximum provider call starts per one-second window.
    pub starts_per_second: u32,

    /// Suffix appended to every provider query to bias results toward
    /// the funding domain.
    pub query_suffix: String,

    /// Consecutive failures before the search breaker opens.
    pub breaker_threshold: u32,

    /// Milliseconds the search breaker stays open.
    pub breaker_reset_ms: u64,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            per_prompt_results: 5,
            top_links: 12,
            concurrency: 3,
            starts_per_second: 6,
            query_suffix: " scholarship application deadline requirements benefits".to_string(),
            breaker_threshold: 5,
            breaker_reset_ms: 15_000,
        }
    }
}

impl SearchConfig {
    /// Set results per expanded query.
    pub fn with_per_prompt_results(mut self, n: usize) -> Self {
        self.per_prompt_results = n;
        self
    }

    /// Set how many top links are fetched.
    pub fn with_top_links(mut self, n: usize) -> Self {
        self.top_links = n;
        self
    }

    /// Set the in-flight concurrency cap.
    pub fn with_concurrency(mut self, n: usize) -> Self {
        self.concurrency = n;
        self
    }
}

/// Settings for page fetching and text extraction.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FetchConfig {
    /// Per-request timeout in milliseconds.
    pub timeout_ms: u64,

    /// Response bodies are truncated beyond this many bytes.
    pub max_bytes: usize,

    /// Extracted page text is capped at this many characters.
    pub max_chars: usize,

    /// Page cache time-to-live in milliseconds.
    pub cache_ttl_ms: u64,

    /// Maximum page cache entries.
    pub cache_capacity: usize,

    /// User-Agent header sent with fetches.
    pub user_agent: String,

    /// Consecutive failures before the fetch breaker opens.
    pub breaker_threshold: u32,

    /// Milliseconds the fetch breaker stays open.
    pub breaker_reset_ms: u64,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            timeout_ms: 8_000,
            max_bytes: 1_048_576,
            max_chars: 20_000,
            cache_ttl_ms: 1_800_000,
            cache_capacity: 500,
            user_agent: "ScholarSeekBot/1.0".to_string(),
            breaker_threshold: 5,
            breaker_reset_ms: 15_000,
        }
    }
}

impl FetchConfig {
    /// Set the per-request timeout.
    pub fn with_timeout_ms(mut self, ms: u64) -> Self {
        self.timeout_ms = ms;
        self
    }

    /// Set the page text cap.
    pub fn with_max_chars(mut self, chars: usize) -> Self {
        self.max_chars = chars;
        self
    }

    /// Set a custom user agent.
    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = user_agent.into();
        self
    }
}

/// Settings for evidence chunking and ranking.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChunkConfig {
    /// Sliding window size in characters.
    pub window_chars: usize,

    /// Overlap between consecutive windows in characters.
    pub overlap_chars: usize,

    /// Windows with a trimmed length below this are discarded.
    pub min_chars: usize,

    /// Maximum windows kept per page.
    pub max_per_page: usize,

    /// Maximum chunks kept overall after ranking.
    pub max_total: usize,

    /// Maximum scoring terms drawn from the query set.
    pub max_terms: usize,
}

impl Default for ChunkConfig {
    fn default() -> Self {
        Self {
            window_chars: 3_000,
            overlap_chars: 500,
            min_chars: 100,
            max_per_page: 15,
            max_total: 30,
            max_terms: 40,
        }
    }
}

impl ChunkConfig {
    /// Set the window size.
    pub fn with_window_chars(mut self, chars: usize) -> Self {
        self.window_chars = chars;
        self
    }

    /// Set the window overlap.
    pub fn with_overlap_chars(mut self, chars: usize) -> Self {
        self.overlap_chars = chars;
        self
    }

    /// Set the overall chunk cap.
    pub fn with_max_total(mut self, n: usize) -> Self {
        self.max_total = n;
        self
    }
}
