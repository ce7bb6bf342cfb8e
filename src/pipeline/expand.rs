//! Query expansion.
//!
//! Turns one user query into several scholarship-focused search
//! queries. Model output is filtered for domain relevance and
//! near-duplicates, then padded with deterministic fillers so the
//! stage never returns fewer than three queries and never fails.

use std::collections::HashSet;

use serde::Deserialize;
use serde_json::Value;

use crate::pipeline::prompts;
use crate::traits::ai::{CompletionParams, LanguageModel};
use crate::types::search::Depth;

/// A candidate must mention at least one of these to survive filtering.
const DOMAIN_KEYWORDS: [&str; 11] = [
    "scholarship",
    "grant",
    "funding",
    "financial aid",
    "tuition",
    "degree",
    "university",
    "college",
    "student",
    "academic",
    "research",
];

/// Rotating terms used to pad the list up to the floor.
const FILLER_TERMS: [&str; 4] = ["scholarships", "grants", "funding", "financial aid"];

/// Candidates above this token-set Jaccard similarity are duplicates.
const SIMILARITY_CEILING: f64 = 0.75;

// Entries are kept as raw values: one non-string in the array must not
// discard the valid candidates around it.
#[derive(Debug, Deserialize)]
struct ExpansionResponse {
    #[serde(default)]
    prompts: Vec<Value>,
}

impl ExpansionResponse {
    fn string_prompts(self) -> Vec<String> {
        self.prompts
            .into_iter()
            .filter_map(|v| match v {
                Value::String(s) => Some(s),
                _ => None,
            })
            .collect()
    }
}

/// Lowercase and collapse runs of whitespace.
fn normalize(s: &str) -> String {
    s.to_lowercase().split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Token-set Jaccard similarity of two normalized strings.
fn jaccard(a: &str, b: &str) -> f64 {
    let sa: HashSet<&str> = a.split(' ').collect();
    let sb: HashSet<&str> = b.split(' ').collect();
    let inter = sa.intersection(&sb).count();
    let union = sa.union(&sb).count();
    inter as f64 / union.max(1) as f64
}

fn too_similar(a: &str, b: &str) -> bool {
    let na = normalize(a);
    let nb = normalize(b);
    na == nb || jaccard(&na, &nb) > SIMILARITY_CEILING
}

fn is_domain_related(candidate: &str) -> bool {
    let lower = candidate.to_lowercase();
    DOMAIN_KEYWORDS.iter().any(|k| lower.contains(k))
}

/// Filter model candidates: keep domain-related, near-unique queries,
/// up to `target` of them, in arrival order.
fn filter_candidates(candidates: &[String], target: usize) -> Vec<String> {
    let mut unique: Vec<String> = Vec::new();
    for candidate in candidates {
        let candidate = candidate.trim();
        if candidate.is_empty() {
            continue;
        }
        if !is_domain_related(candidate) {
            tracing::warn!(candidate, "expansion produced off-domain query, dropping");
            continue;
        }
        if unique.iter().any(|u| too_similar(u, candidate)) {
            continue;
        }
        unique.push(candidate.to_string());
        if unique.len() >= target {
            break;
        }
    }
    unique
}

/// Pad with `"{query} {term} for students"` fillers up to the floor.
fn pad_with_fillers(mut queries: Vec<String>, query: &str, target: usize) -> Vec<String> {
    while queries.len() < target.max(3) {
        let term = FILLER_TERMS[queries.len() % FILLER_TERMS.len()];
        queries.push(format!("{query} {term} for students"));
    }
    queries.truncate(target);
    queries
}

/// Expand a user query into `depth.target_count()` search queries.
///
/// Never fails: a model error or unparsable response degrades to
/// filler queries alone.
pub async fn expand_query<L: LanguageModel>(
    model: &L,
    query: &str,
    locale: Option<&str>,
    depth: Depth,
) -> Vec<String> {
    let target = depth.target_count();
    let user = prompts::format_expansion_prompt(query, locale, target);

    let candidates = match model
        .complete(prompts::EXPANSION_SYSTEM, &user, CompletionParams::expansion())
        .await
    {
        Ok(raw) => match serde_json::from_str::<ExpansionResponse>(&raw) {
            Ok(response) => response.string_prompts(),
            Err(e) => {
                tracing::error!(query, error = %e, "expansion response was not valid JSON");
                vec![]
            }
        },
        Err(e) => {
            tracing::error!(query, error = %e, "expansion call failed, using fillers");
            vec![]
        }
    };

    let unique = filter_candidates(&candidates, target);
    let queries = pad_with_fillers(unique, query, target);

    tracing::debug!(query, count = queries.len(), "expanded query");
    queries
}
