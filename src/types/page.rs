//! Fetched page and evidence chunk types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A fetched, boilerplate-stripped page.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PageDocument {
    /// Source URL (also the cache key).
    pub url: String,

    /// Page title ("Untitled" when the page has none).
    pub title: String,

    /// Collapsed body text, bounded in length.
    pub text: String,

    /// When the page was fetched.
    pub fetched_at: DateTime<Utc>,
}

impl PageDocument {
    /// Create a document fetched now.
    pub fn new(
        url: impl Into<String>,
        title: impl Into<String>,
        text: impl Into<String>,
    ) -> Self {
        Self {
            url: url.into(),
            title: title.into(),
            text: text.into(),
            fetched_at: Utc::now(),
        }
    }
}

/// Cached title/text pair stored under a page URL.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CachedPage {
    pub title: String,
    pub text: String,
}

/// A bounded slice of page text used as synthesis input.
///
/// Ephemeral: created per pipeline run, ranked, then discarded.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EvidenceChunk {
    /// URL of the page the chunk came from.
    pub url: String,

    /// Title of that page.
    pub title: String,

    /// Window of page text; consecutive chunks from the same page overlap.
    pub text: String,
}
