//! Legacy single-pass extraction into flat scholarship records.
//!
//! One provider search, one extraction call, per-record validation
//! with a fix-and-retry pass. Both external calls fall back to canned
//! data so the path always answers.

use serde_json::Value;

use crate::pipeline::prompts;
use crate::traits::ai::{CompletionParams, LanguageModel};
use crate::traits::searcher::{offline_sample_results, SearchProvider};
use crate::types::scholarship::{
    fix_common_issues, parse_record, sanitize_record, Benefits, Requirements, Scholarship,
    ScholarshipType, SearchOutcome, SearchRequest, Timeline,
};
use crate::types::search::SearchResult;

/// Format search results as one text block for extraction.
pub fn prepare_raw_data(results: &[SearchResult]) -> String {
    results
        .iter()
        .enumerate()
        .map(|(i, r)| {
            format!(
                "\nSOURCE {n}: {source}\nTITLE: {title}\nLINK: {link}\nCONTENT: {snippet}\n---\n",
                n = i + 1,
                source = r.source,
                title = r.title,
                link = r.link,
                snippet = r.snippet,
            )
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// Extract flat records from raw search text.
///
/// Each record gets sanitized before parsing and one fix pass after a
/// parse failure; records that still fail are skipped. Errors when the
/// completion is unusable or no record survives.
pub async fn extract_records<L: LanguageModel>(
    model: &L,
    raw_data: &str,
    query: &str,
) -> Result<Vec<Scholarship>, String> {
    let user = prompts::format_extraction_prompt(query, raw_data);
    let raw = model
        .complete(prompts::EXTRACTION_SYSTEM, &user, CompletionParams::extraction())
        .await
        .map_err(|e| format!("extraction call failed: {e}"))?;

    let parsed: Value =
        serde_json::from_str(&raw).map_err(|e| format!("invalid JSON from model: {e}"))?;
    let records = parsed
        .get("scholarships")
        .and_then(Value::as_array)
        .ok_or_else(|| "missing scholarships array".to_string())?;

    let mut scholarships = Vec::new();
    for record in records {
        let sanitized = sanitize_record(record.clone());
        match parse_record(&sanitized) {
            Ok(scholarship) => scholarships.push(scholarship),
            Err(first_error) => {
                let fixed = fix_common_issues(sanitized);
                match parse_record(&fixed) {
                    Ok(scholarship) => {
                        tracing::info!(title = %scholarship.title, "fixed and validated record");
                        scholarships.push(scholarship);
                    }
                    Err(second_error) => {
                        tracing::warn!(
                            %first_error,
                            %second_error,
                            "record failed validation twice, skipping"
                        );
                    }
                }
            }
        }
    }

    if scholarships.is_empty() {
        return Err("no valid scholarships found after validation".to_string());
    }
    Ok(scholarships)
}

/// Canned record used when extraction is unavailable.
pub fn mock_scholarship(query: &str) -> Scholarship {
    Scholarship {
        title: format!("Mock Scholarship for {query}"),
        scholarship_type: ScholarshipType::FullyFunded,
        degree_levels: vec!["Masters".to_string(), "PhD".to_string()],
        host_country: "United States".to_string(),
        benefits: Benefits {
            tuition: "Full tuition coverage".to_string(),
            stipend: "$25,000 per year".to_string(),
            travel: "Round-trip airfare".to_string(),
            insurance: "Comprehensive health insurance".to_string(),
            others: vec![
                "Books and materials".to_string(),
                "Conference travel".to_string(),
            ],
        },
        eligible_countries: "All countries".to_string(),
        requirements: Requirements {
            academic: "Minimum GPA 3.5".to_string(),
            age_limit: "No age limit".to_string(),
            language: "IELTS 7.0 or TOEFL 100".to_string(),
            others: vec!["Research proposal required".to_string()],
        },
        application_timeline: Timeline {
            opening_date: "January 1, 2025".to_string(),
            deadline: "March 31, 2025".to_string(),
            result_announcement: "May 15, 2025".to_string(),
        },
        application_link: "https://example.com/apply".to_string(),
        application_procedure: vec![
            "Submit online application".to_string(),
            "Upload required documents".to_string(),
            "Pay application fee".to_string(),
            "Submit references".to_string(),
        ],
        selection_process: vec![
            "Document review".to_string(),
            "Interview with committee".to_string(),
            "Final selection".to_string(),
        ],
        renewal: "Annual renewal based on academic performance".to_string(),
        source: vec!["https://example.com/scholarship".to_string()],
    }
}

/// Run the full flat-path flow for one request.
pub async fn flat_search<S: SearchProvider, L: LanguageModel>(
    provider: &S,
    model: &L,
    request: &SearchRequest,
) -> Result<SearchOutcome, String> {
    let started = std::time::Instant::now();
    request.validate()?;

    tracing::info!(query = %request.query, limit = request.limit, "starting flat search");

    let results = match provider.search(&request.query, request.limit).await {
        Ok(results) if !results.is_empty() => results,
        Ok(_) => {
            tracing::warn!(query = %request.query, "no search results, using offline samples");
            offline_sample_results(&request.query, request.limit)
        }
        Err(e) => {
            tracing::warn!(query = %request.query, error = %e, "search failed, using offline samples");
            offline_sample_results(&request.query, request.limit)
        }
    };

    if results.is_empty() {
        return Ok(SearchOutcome {
            success: true,
            data: vec![],
            message: Some("No scholarships found for the given query".to_string()),
            processing_time: Some(started.elapsed().as_millis() as u64),
            total_results: Some(0),
        });
    }

    let raw_data = prepare_raw_data(&results);

    let scholarships = match extract_records(model, &raw_data, &request.query).await {
        Ok(scholarships) => scholarships,
        Err(e) => {
            tracing::warn!(query = %request.query, error = %e, "extraction failed, using mock record");
            vec![mock_scholarship(&request.query)]
        }
    };

    let count = scholarships.len();
    tracing::info!(query = %request.query, count, "flat search completed");

    Ok(SearchOutcome {
        success: true,
        data: scholarships,
        message: Some(format!("Found {count} scholarship(s)")),
        processing_time: Some(started.elapsed().as_millis() as u64),
        total_results: Some(count),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::SearchError;
    use crate::testing::{MockLanguageModel, MockSearchProvider};

    #[test]
    fn test_raw_data_blocks() {
        let raw = prepare_raw_data(&[
            SearchResult::new("A", "https://a.org/1", "alpha"),
            SearchResult::new("B", "https://b.org/2", "beta"),
        ]);
        assert!(raw.contains("SOURCE 1: a.org"));
        assert!(raw.contains("TITLE: B"));
        assert!(raw.contains("LINK: https://b.org/2"));
        assert!(raw.contains("CONTENT: alpha"));
        assert!(raw.contains("---"));
    }

    #[tokio::test]
    async fn test_extract_skips_unfixable_records() {
        let model = MockLanguageModel::new().with_response(
            r#"{"scholarships": [
                 {"title": "Good One"},
                 {"title": "Bad Link", "application_link": "not a url"}
               ]}"#,
        );
        let records = extract_records(&model, "raw", "q").await.expect("extract");
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].title, "Good One");
    }

    #[tokio::test]
    async fn test_extract_errors_without_scholarships_array() {
        let model = MockLanguageModel::new().with_response(r#"{"data": []}"#);
        assert!(extract_records(&model, "raw", "q").await.is_err());
    }

    #[tokio::test]
    async fn test_flat_search_happy_path() {
        let provider = MockSearchProvider::new()
            .with_results("chevening", vec![SearchResult::new("A", "https://a.org", "s")]);
        let model = MockLanguageModel::new().with_response(
            r#"{"scholarships": [{"title": "Chevening Awards",
                 "scholarship_type": "fully funded",
                 "host_country": "United Kingdom"}]}"#,
        );
        let outcome = flat_search(&provider, &model, &SearchRequest::new("chevening"))
            .await
            .expect("flat search");
        assert!(outcome.success);
        assert_eq!(outcome.total_results, Some(1));
        assert_eq!(outcome.data[0].host_country, "United Kingdom");
        assert_eq!(outcome.message.as_deref(), Some("Found 1 scholarship(s)"));
    }

    #[tokio::test]
    async fn test_flat_search_falls_back_on_search_failure() {
        let provider = MockSearchProvider::new().with_error("", SearchError::Timeout);
        let model = MockLanguageModel::new().with_failure("offline");
        let outcome = flat_search(&provider, &model, &SearchRequest::new("daad"))
            .await
            .expect("flat search");
        assert_eq!(outcome.data.len(), 1);
        assert_eq!(outcome.data[0].title, "Mock Scholarship for daad");
    }

    #[tokio::test]
    async fn test_flat_search_rejects_invalid_request() {
        let provider = MockSearchProvider::new();
        let model = MockLanguageModel::new();
        let result =
            flat_search(&provider, &model, &SearchRequest::new("q").with_limit(99)).await;
        assert!(result.is_err());
    }
}
