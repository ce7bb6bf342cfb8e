//! Evidence chunking and term-overlap ranking.
//!
//! Pages are cut into overlapping character windows so scholarship
//! details split across a window boundary still appear whole in at
//! least one chunk. Chunks are then scored by how many query terms
//! they contain and the best ones are kept.

use crate::types::config::ChunkConfig;
use crate::types::page::{EvidenceChunk, PageDocument};

/// Cut one page into overlapping windows.
///
/// Windows advance by `window_chars - overlap_chars`; fragments whose
/// trimmed length is below `min_chars` are dropped, and at most
/// `max_per_page` windows are taken per page.
pub fn chunk_document(page: &PageDocument, config: &ChunkConfig) -> Vec<EvidenceChunk> {
    let chars: Vec<char> = page.text.chars().collect();
    let step = config.window_chars.saturating_sub(config.overlap_chars).max(1);

    let mut chunks = Vec::new();
    let mut start = 0;
    while start < chars.len() && chunks.len() < config.max_per_page {
        let end = (start + config.window_chars).min(chars.len());
        let window: String = chars[start..end].iter().collect();
        if window.trim().chars().count() >= config.min_chars {
            chunks.push(EvidenceChunk {
                url: page.url.clone(),
                title: page.title.clone(),
                text: window,
            });
        }
        if end == chars.len() {
            break;
        }
        start += step;
    }
    chunks
}

/// Build the scoring term set from the query and its expansions.
///
/// Tokens of more than three characters, lowercased, first
/// `max_terms` in arrival order. Duplicates are kept, matching how
/// repeated terms weight the score.
pub fn collect_terms(query: &str, prompts: &[String], max_terms: usize) -> Vec<String> {
    std::iter::once(query)
        .chain(prompts.iter().map(String::as_str))
        .flat_map(|s| s.split_whitespace())
        .map(|t| t.to_lowercase())
        .filter(|t| t.chars().count() > 3)
        .take(max_terms)
        .collect()
}

/// Score a chunk: one point per term that appears in its text.
fn score_chunk(chunk: &EvidenceChunk, terms: &[String]) -> usize {
    let lower = chunk.text.to_lowercase();
    terms.iter().filter(|t| lower.contains(t.as_str())).count()
}

/// Keep the `max_total` highest-scoring chunks.
///
/// The sort is stable, so chunks with equal scores stay in page order.
pub fn rank_chunks(
    chunks: Vec<EvidenceChunk>,
    terms: &[String],
    max_total: usize,
) -> Vec<EvidenceChunk> {
    let mut scored: Vec<(usize, EvidenceChunk)> = chunks
        .into_iter()
        .map(|c| (score_chunk(&c, terms), c))
        .collect();
    scored.sort_by(|a, b| b.0.cmp(&a.0));
    scored.into_iter().take(max_total).map(|(_, c)| c).collect()
}

/// Chunk every page and rank the combined pool.
pub fn chunk_and_rank(
    pages: &[PageDocument],
    query: &str,
    prompts: &[String],
    config: &ChunkConfig,
) -> Vec<EvidenceChunk> {
    let chunks: Vec<EvidenceChunk> = pages
        .iter()
        .flat_map(|p| chunk_document(p, config))
        .collect();
    let terms = collect_terms(query, prompts, config.max_terms);
    let ranked = rank_chunks(chunks, &terms, config.max_total);
    tracing::debug!(
        pages = pages.len(),
        chunks = ranked.len(),
        terms = terms.len(),
        "chunked and ranked evidence"
    );
    ranked
}

#[cfg(test)]
mod tests {
    use super::*;

    fn page(text: &str) -> PageDocument {
        PageDocument::new("https://a.org", "A", text)
    }

    fn small_config() -> ChunkConfig {
        ChunkConfig::default()
            .with_window_chars(10)
            .with_overlap_chars(4)
            .with_max_total(30)
    }

    #[test]
    fn test_windows_overlap() {
        let mut config = small_config();
        config.min_chars = 1;
        let chunks = chunk_document(&page("abcdefghijklmnop"), &config);
        assert_eq!(chunks[0].text, "abcdefghij");
        assert_eq!(chunks[1].text, "ghijklmnop");
    }

    #[test]
    fn test_short_fragments_dropped() {
        let mut config = small_config();
        config.overlap_chars = 0;
        config.min_chars = 8;
        // Second window is the 5-char tail "klmno" and gets dropped
        let chunks = chunk_document(&page("abcdefghijklmno"), &config);
        assert_eq!(chunks.len(), 1);
        assert_eq!(chunks[0].text, "abcdefghij");
    }

    #[test]
    fn test_per_page_cap() {
        let mut config = small_config();
        config.min_chars = 1;
        config.max_per_page = 3;
        let chunks = chunk_document(&page(&"x".repeat(1_000)), &config);
        assert_eq!(chunks.len(), 3);
    }

    #[test]
    fn test_empty_page_yields_no_chunks() {
        let chunks = chunk_document(&page(""), &ChunkConfig::default());
        assert!(chunks.is_empty());
    }

    #[test]
    fn test_collect_terms_filters_short_tokens() {
        let terms = collect_terms(
            "phd funding in EU",
            &["masters scholarships".to_string()],
            40,
        );
        assert_eq!(terms, vec!["funding", "masters", "scholarships"]);
    }

    #[test]
    fn test_collect_terms_caps_count() {
        let prompts: Vec<String> = (0..50).map(|i| format!("keyword{i:02}")).collect();
        let terms = collect_terms("query words here", &prompts, 40);
        assert_eq!(terms.len(), 40);
    }

    #[test]
    fn test_rank_orders_by_term_hits() {
        let chunks = vec![
            EvidenceChunk {
                url: "u1".into(),
                title: "t".into(),
                text: "nothing relevant here".into(),
            },
            EvidenceChunk {
                url: "u2".into(),
                title: "t".into(),
                text: "scholarship funding deadline".into(),
            },
        ];
        let terms = vec!["scholarship".to_string(), "funding".to_string()];
        let ranked = rank_chunks(chunks, &terms, 30);
        assert_eq!(ranked[0].url, "u2");
    }

    #[test]
    fn test_rank_is_stable_for_ties() {
        let chunks: Vec<EvidenceChunk> = (0..3)
            .map(|i| EvidenceChunk {
                url: format!("u{i}"),
                title: "t".into(),
                text: "same score".into(),
            })
            .collect();
        let ranked = rank_chunks(chunks, &["scholarship".to_string()], 30);
        assert_eq!(ranked[0].url, "u0");
        assert_eq!(ranked[2].url, "u2");
    }

    #[test]
    fn test_rank_caps_total() {
        let chunks: Vec<EvidenceChunk> = (0..50)
            .map(|i| EvidenceChunk {
                url: format!("u{i}"),
                title: "t".into(),
                text: "scholarship".into(),
            })
            .collect();
        let ranked = rank_chunks(chunks, &[], 30);
        assert_eq!(ranked.len(), 30);
    }
}
