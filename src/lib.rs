//! Scholarship Evidence Aggregation Pipeline
//!
//! A query-driven pipeline that turns one scholarship question into a
//! structured, cited answer: expand the query into scholarship-focused
//! sub-queries, fan them out to a search provider, fetch and strip the
//! top pages, rank overlapping evidence chunks, and synthesize a
//! schema-valid response with citations.
//!
//! # Design Philosophy
//!
//! - Every external service behind a trait, injected at construction
//! - Resilience first: breakers, caches, and fallbacks keep one bad
//!   dependency from failing a whole run
//! - The structured path never errors past query validation; failures
//!   surface inside the response as `validation_errors`
//!
//! # Usage
//!
//! ```rust,ignore
//! use scholarseek::{Depth, OpenAiModel, Pipeline};
//! use scholarseek::traits::fetcher::HttpFetcher;
//! use scholarseek::traits::searcher::SerpApiSearcher;
//!
//! let pipeline = Pipeline::new(
//!     SerpApiSearcher::from_env()?,
//!     HttpFetcher::new(),
//!     OpenAiModel::from_env()?,
//! );
//!
//! let response = pipeline
//!     .structured_search("indonesia", Some("en"), Depth::Standard)
//!     .await?;
//! ```
//!
//! # Modules
//!
//! - [`traits`] - Trait seams (SearchProvider, UrlFetcher, LanguageModel)
//! - [`types`] - Domain data types and schema validation
//! - [`pipeline`] - The staged pipeline and its orchestrator
//! - [`util`] - TTL cache, circuit breaker, bounded queue
//! - [`ai`] - OpenAI language model implementation
//! - [`security`] - Credential handling
//! - [`testing`] - Mock implementations for tests

pub mod ai;
pub mod error;
pub mod pipeline;
pub mod security;
pub mod testing;
pub mod traits;
pub mod types;
pub mod util;

// Re-export core types at crate root
pub use error::{FetchError, PipelineError, Result, SearchError};
pub use pipeline::{Evidence, Pipeline};
pub use traits::{
    ai::{CompletionParams, LanguageModel},
    fetcher::{HttpFetcher, RawBody, UrlFetcher},
    searcher::{offline_sample_results, SearchProvider, SerpApiSearcher},
};
pub use types::{
    config::{ChunkConfig, FetchConfig, PipelineConfig, SearchConfig},
    page::{CachedPage, EvidenceChunk, PageDocument},
    scholarship::{Scholarship, ScholarshipType, SearchOutcome, SearchRequest},
    search::{Depth, SearchResult},
    structured::{
        repair_structured, validate_structured, Citation, StructuredItem, StructuredResponse,
        Validated,
    },
};

pub use ai::OpenAiModel;
pub use security::SecretString;
pub use util::{BoundedQueue, CircuitBreaker, CircuitState, TtlCache};
