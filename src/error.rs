//! Typed errors for the discovery pipeline.
//!
//! Uses `thiserror` for library errors (not `anyhow`) to provide
//! strongly-typed, composable error handling.

use thiserror::Error;

/// Errors that can occur during a pipeline run.
#[derive(Debug, Error)]
pub enum PipelineError {
    /// Invalid query provided (contract violation, rejected before any work)
    #[error("invalid query: {reason}")]
    InvalidQuery { reason: String },

    /// Language model unavailable or failed
    #[error("language model error: {0}")]
    LanguageModel(#[source] Box<dyn std::error::Error + Send + Sync>),

    /// Search provider call failed
    #[error("search failed: {0}")]
    Search(#[from] SearchError),

    /// Page fetch failed
    #[error("fetch failed: {0}")]
    Fetch(#[from] FetchError),

    /// JSON parsing error
    #[error("JSON parse error: {0}")]
    JsonParse(#[from] serde_json::Error),

    /// Configuration error
    #[error("config error: {0}")]
    Config(String),

    /// Operation was cancelled
    #[error("operation cancelled")]
    Cancelled,
}

/// Errors from the web-search provider, classified for observability.
///
/// The pipeline treats every variant as "this call failed" and proceeds
/// with partial results; the classification exists so call sites can log
/// distinguishable failure reasons.
#[derive(Debug, Error)]
pub enum SearchError {
    /// Provider did not answer within its timeout
    #[error("search request timed out")]
    Timeout,

    /// Provider returned HTTP 429
    #[error("search API rate limit exceeded")]
    RateLimited,

    /// Provider returned HTTP 401
    #[error("invalid search API key")]
    Unauthorized,

    /// Circuit breaker denied the call before it was issued
    #[error("search circuit open")]
    CircuitOpen,

    /// No credential configured for the provider
    #[error("search API key not configured: {0}")]
    MissingCredential(String),

    /// Provider answered with an unexpected payload
    #[error("invalid response from search API: {0}")]
    InvalidResponse(String),

    /// Any other provider failure
    #[error("search API error: {0}")]
    Provider(#[source] Box<dyn std::error::Error + Send + Sync>),
}

/// Errors that can occur while fetching a page.
#[derive(Debug, Error)]
pub enum FetchError {
    /// Circuit breaker denied the fetch before it was issued
    #[error("fetch circuit open")]
    CircuitOpen,

    /// Request exceeded the per-fetch timeout
    #[error("timeout fetching: {url}")]
    Timeout { url: String },

    /// Non-success HTTP status
    #[error("HTTP {status} fetching: {url}")]
    Status { status: u16, url: String },

    /// Transport-level failure
    #[error("HTTP error: {0}")]
    Http(#[source] Box<dyn std::error::Error + Send + Sync>),
}

/// Result type alias for pipeline operations.
pub type Result<T> = std::result::Result<T, PipelineError>;
