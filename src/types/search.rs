//! Search provider result types.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// One entry from a search-engine results page.
///
/// Immutable once created; aggregated result sets are deduplicated by
/// `link`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchResult {
    /// Page title as reported by the provider.
    pub title: String,

    /// Result URL; unique key within an aggregated set.
    pub link: String,

    /// Provider snippet/description.
    pub snippet: String,

    /// Source domain (hostname without a leading "www.").
    pub source: String,
}

impl SearchResult {
    /// Create a result, deriving `source` from the link's hostname.
    pub fn new(
        title: impl Into<String>,
        link: impl Into<String>,
        snippet: impl Into<String>,
    ) -> Self {
        let link = link.into();
        let source = source_domain(&link);
        Self {
            title: title.into(),
            link,
            snippet: snippet.into(),
            source,
        }
    }
}

/// Extract the source domain of a URL: hostname minus a leading "www.".
///
/// Unparsable URLs map to "Unknown source" rather than failing.
pub fn source_domain(link: &str) -> String {
    url::Url::parse(link)
        .ok()
        .and_then(|u| u.host_str().map(|h| h.to_string()))
        .map(|h| h.strip_prefix("www.").unwrap_or(&h).to_string())
        .unwrap_or_else(|| "Unknown source".to_string())
}

/// Effort knob controlling how many sub-queries are generated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum Depth {
    /// 3 sub-queries.
    Fast,
    /// 5 sub-queries (default).
    #[default]
    Standard,
    /// 6 sub-queries.
    Deep,
}

impl Depth {
    /// Target sub-query count for this depth.
    pub fn target_count(self) -> usize {
        match self {
            Depth::Fast => 3,
            Depth::Standard => 5,
            Depth::Deep => 6,
        }
    }

    /// Parse from the wire form ("fast" | "standard" | "deep").
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "fast" => Some(Depth::Fast),
            "standard" => Some(Depth::Standard),
            "deep" => Some(Depth::Deep),
            _ => None,
        }
    }

    /// Wire form of this depth.
    pub fn as_str(self) -> &'static str {
        match self {
            Depth::Fast => "fast",
            Depth::Standard => "standard",
            Depth::Deep => "deep",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_source_domain_strips_www() {
        assert_eq!(source_domain("https://www.example.edu/page"), "example.edu");
        assert_eq!(source_domain("https://example.org/a?b=c"), "example.org");
    }

    #[test]
    fn test_source_domain_unparsable() {
        assert_eq!(source_domain("not a url"), "Unknown source");
        assert_eq!(source_domain(""), "Unknown source");
    }

    #[test]
    fn test_depth_target_counts() {
        assert_eq!(Depth::Fast.target_count(), 3);
        assert_eq!(Depth::Standard.target_count(), 5);
        assert_eq!(Depth::Deep.target_count(), 6);
    }

    #[test]
    fn test_depth_wire_round_trip() {
        for depth in [Depth::Fast, Depth::Standard, Depth::Deep] {
            assert_eq!(Depth::parse(depth.as_str()), Some(depth));
        }
        assert_eq!(Depth::parse("turbo"), None);
    }
}
