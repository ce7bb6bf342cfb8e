//! Evidence synthesis into a structured response.
//!
//! One model call, one local structural repair, never an error: this
//! stage always returns a schema-valid [`StructuredResponse`], using
//! `validation_errors` to report what went wrong when it could not be
//! saved.

use serde_json::{json, Value};

use crate::pipeline::prompts;
use crate::traits::ai::{CompletionParams, LanguageModel};
use crate::types::page::EvidenceChunk;
use crate::types::search::Depth;
use crate::types::structured::{
    repair_structured, validate_structured, Citation, StructuredResponse, Validated,
};

/// Everything the synthesizer sees.
#[derive(Debug, Clone)]
pub struct Evidence {
    /// The expanded sub-queries that produced the results.
    pub prompts: Vec<String>,

    /// Citations for every fetched top link.
    pub sources: Vec<Citation>,

    /// Ranked page chunks.
    pub chunks: Vec<EvidenceChunk>,
}

/// Fill request context the model omitted.
fn backfill(
    mut response: StructuredResponse,
    raw: &Value,
    query: &str,
    locale: Option<&str>,
    depth: Depth,
) -> StructuredResponse {
    if response.query.is_none() {
        response.query = Some(query.to_string());
    }
    if response.locale.is_none() {
        response.locale = locale.map(|l| l.to_string());
    }
    // Serde defaults cannot tell an absent depth from an explicit
    // "standard", so consult the raw JSON.
    if raw.get("depth").is_none() {
        response.depth = depth;
    }
    response
}

/// Synthesize evidence into a structured response.
pub async fn synthesize<L: LanguageModel>(
    model: &L,
    query: &str,
    locale: Option<&str>,
    depth: Depth,
    evidence: &Evidence,
) -> StructuredResponse {
    let user = prompts::format_synthesis_prompt(
        query,
        locale,
        depth,
        &evidence.prompts,
        &evidence.chunks,
        &evidence.sources,
    );

    let raw = match model
        .complete(prompts::SYNTHESIS_SYSTEM, &user, CompletionParams::synthesis())
        .await
    {
        Ok(raw) => raw,
        Err(e) => {
            tracing::error!(query, error = %e, "synthesis call failed");
            return StructuredResponse::failed(
                query,
                locale,
                depth,
                vec![format!("Synthesis failed: {e}")],
            );
        }
    };

    // An unparsable completion degrades to an empty candidate, which
    // validates as an empty response.
    let parsed: Value = serde_json::from_str(&raw).unwrap_or_else(|e| {
        tracing::warn!(query, error = %e, "synthesis response was not valid JSON");
        json!({})
    });

    match validate_structured(&parsed) {
        Validated::Valid(response) => {
            tracing::debug!(query, items = response.items.len(), "synthesis valid on first pass");
            backfill(response, &parsed, query, locale, depth)
        }
        Validated::Invalid(errors) => {
            tracing::warn!(query, ?errors, "synthesis output invalid, repairing");
            let repaired = repair_structured(parsed);
            match validate_structured(&repaired) {
                Validated::Valid(response) => {
                    tracing::debug!(query, items = response.items.len(), "repair succeeded");
                    backfill(response, &repaired, query, locale, depth)
                }
                Validated::Invalid(errors) => {
                    tracing::error!(query, ?errors, "repair failed");
                    StructuredResponse::failed(query, locale, depth, errors)
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::MockLanguageModel;

    fn evidence() -> Evidence {
        Evidence {
            prompts: vec!["physics scholarships".to_string()],
            sources: vec![Citation::new("https://a.org", "A", "snippet")],
            chunks: vec![EvidenceChunk {
                url: "https://a.org".to_string(),
                title: "A".to_string(),
                text: "Physics scholarship, deadline March 31.".to_string(),
            }],
        }
    }

    #[tokio::test]
    async fn test_valid_response_backfills_context() {
        let model = MockLanguageModel::new().with_response(
            r#"{"items": [{"id": "a", "title": "Physics Fund",
                 "summary": "Covers tuition.",
                 "citations": [{"url": "https://a.org"}]}]}"#,
        );
        let response = synthesize(&model, "physics", Some("en"), Depth::Deep, &evidence()).await;
        assert_eq!(response.query.as_deref(), Some("physics"));
        assert_eq!(response.locale.as_deref(), Some("en"));
        assert_eq!(response.depth, Depth::Deep);
        assert_eq!(response.items.len(), 1);
        assert_eq!(response.items[0].citations[0].title, "Untitled");
        assert!(response.validation_errors.is_none());
    }

    #[tokio::test]
    async fn test_invalid_response_gets_one_repair() {
        // Missing ids and a malformed link; structurally repairable
        let model = MockLanguageModel::new().with_response(
            r#"{"items": [
                 {"title": "First"},
                 {"title": "Second", "application_link": "example.com"}
               ]}"#,
        );
        let response = synthesize(&model, "physics", None, Depth::Standard, &evidence()).await;
        assert_eq!(response.items.len(), 2);
        assert_eq!(response.items[0].id, "item_1");
        assert_eq!(response.items[1].id, "item_2");
        assert_eq!(response.items[1].application_link.as_deref(), Some("Not specified"));
        assert!(response.validation_errors.is_none());
        assert_eq!(model.call_count(), 1);
    }

    #[tokio::test]
    async fn test_unparsable_response_yields_empty_valid() {
        let model = MockLanguageModel::new().with_response("I could not find anything.");
        let response = synthesize(&model, "physics", None, Depth::Fast, &evidence()).await;
        assert!(response.items.is_empty());
        assert!(response.validation_errors.is_none());
        assert_eq!(response.query.as_deref(), Some("physics"));
        assert_eq!(response.depth, Depth::Fast);
    }

    #[tokio::test]
    async fn test_model_failure_reports_validation_errors() {
        let model = MockLanguageModel::new().with_failure("rate limited");
        let response = synthesize(&model, "physics", None, Depth::Standard, &evidence()).await;
        assert!(response.items.is_empty());
        let errors = response.validation_errors.expect("errors present");
        assert!(errors[0].starts_with("Synthesis failed:"));
    }

    #[tokio::test]
    async fn test_explicit_depth_in_response_is_kept() {
        let model = MockLanguageModel::new().with_response(r#"{"depth": "fast", "items": []}"#);
        let response = synthesize(&model, "physics", None, Depth::Deep, &evidence()).await;
        assert_eq!(response.depth, Depth::Fast);
    }
}
