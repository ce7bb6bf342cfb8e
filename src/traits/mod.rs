//! Trait seams for injectable collaborators.
//!
//! The pipeline is generic over these traits so every external service
//! can be swapped for a mock in tests.

pub mod ai;
pub mod fetcher;
pub mod searcher;

pub use ai::{CompletionParams, LanguageModel};
pub use fetcher::{RawBody, UrlFetcher};
pub use searcher::SearchProvider;
