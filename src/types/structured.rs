//! Structured response types, schema validation, and local repair.
//!
//! The synthesizer must hand back a schema-valid `StructuredResponse`.
//! Validation walks the raw JSON once and reports every violation as
//! `"<field path>: <message>"`; the outcome flows through the tagged
//! [`Validated`] union so repair and fallback paths are handled
//! exhaustively rather than by ad hoc null checks.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::types::search::Depth;

/// Placeholder accepted wherever a URL could not be recovered.
pub const URL_PLACEHOLDER: &str = "Not specified";

/// A reference back to a source chunk supporting an item.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct Citation {
    /// Source URL, or "Not specified" when unrecoverable.
    pub url: String,

    /// Source title.
    #[serde(default = "default_citation_title")]
    pub title: String,

    /// Supporting snippet.
    #[serde(default)]
    pub snippet: String,

    /// Confidence in the citation, 0.0 to 1.0.
    #[serde(default = "default_confidence")]
    pub confidence: f64,
}

fn default_citation_title() -> String {
    "Untitled".to_string()
}

fn default_confidence() -> f64 {
    0.5
}

impl Citation {
    /// Create a citation with default confidence.
    pub fn new(url: impl Into<String>, title: impl Into<String>, snippet: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            title: title.into(),
            snippet: snippet.into(),
            confidence: default_confidence(),
        }
    }

    /// Set the confidence.
    pub fn with_confidence(mut self, confidence: f64) -> Self {
        self.confidence = confidence;
        self
    }
}

/// One synthesized scholarship opportunity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct StructuredItem {
    /// Stable identifier within the response.
    pub id: String,

    /// Opportunity title.
    pub title: String,

    /// Summary of what the opportunity covers.
    #[serde(default)]
    pub summary: String,

    /// Eligibility requirements.
    #[serde(default)]
    pub eligibility: Vec<String>,

    /// Benefits (tuition, stipend, travel, ...).
    #[serde(default)]
    pub benefits: Vec<String>,

    /// Relevant dates (opening, deadline, announcement).
    #[serde(default)]
    pub deadlines: Vec<String>,

    /// Direct application URL, when known.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub application_link: Option<String>,

    /// Citations back to source chunks.
    #[serde(default)]
    pub citations: Vec<Citation>,
}

/// The pipeline's final output.
///
/// `items` is empty whenever `validation_errors` is non-empty; success
/// and failure shapes are mutually exclusive.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct StructuredResponse {
    /// The original user query (back-filled if the model omitted it).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub query: Option<String>,

    /// Requested locale, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub locale: Option<String>,

    /// Effort depth used for this run.
    #[serde(default)]
    pub depth: Depth,

    /// Synthesized opportunities.
    #[serde(default)]
    pub items: Vec<StructuredItem>,

    /// All discovered sources.
    #[serde(default)]
    pub sources: Vec<Citation>,

    /// Schema violations when synthesis could not be repaired.
    #[serde(
        default,
        rename = "validationErrors",
        skip_serializing_if = "Option::is_none"
    )]
    pub validation_errors: Option<Vec<String>>,
}

impl StructuredResponse {
    /// An empty, schema-valid failure response carrying the violations.
    pub fn failed(
        query: impl Into<String>,
        locale: Option<&str>,
        depth: Depth,
        errors: Vec<String>,
    ) -> Self {
        Self {
            query: Some(query.into()),
            locale: locale.map(|l| l.to_string()),
            depth,
            items: vec![],
            sources: vec![],
            validation_errors: Some(errors),
        }
    }
}

/// Tagged validation outcome: a schema-valid value or the violations.
#[derive(Debug, Clone)]
pub enum Validated<T> {
    /// The candidate conformed to the schema.
    Valid(T),
    /// The candidate violated the schema; one message per violation.
    Invalid(Vec<String>),
}

impl<T> Validated<T> {
    /// True for the `Valid` arm.
    pub fn is_valid(&self) -> bool {
        matches!(self, Validated::Valid(_))
    }
}

/// True when the string is an http(s) URL or the accepted placeholder.
fn acceptable_url(s: &str) -> bool {
    if s == URL_PLACEHOLDER {
        return true;
    }
    (s.starts_with("http://") || s.starts_with("https://")) && url::Url::parse(s).is_ok()
}

/// Validate a raw JSON candidate against the structured-response shape.
///
/// Absent fields take their documented defaults (mirroring the schema);
/// present fields must conform. Every violation is collected, not just
/// the first.
pub fn validate_structured(candidate: &Value) -> Validated<StructuredResponse> {
    let mut errors: Vec<String> = Vec::new();

    let Some(obj) = candidate.as_object() else {
        return Validated::Invalid(vec![": expected object".to_string()]);
    };

    for field in ["query", "locale"] {
        if let Some(v) = obj.get(field) {
            if !v.is_string() {
                errors.push(format!("{field}: expected string"));
            }
        }
    }

    if let Some(v) = obj.get("depth") {
        match v.as_str().and_then(Depth::parse) {
            Some(_) => {}
            None => errors.push("depth: expected one of fast|standard|deep".to_string()),
        }
    }

    if let Some(items) = obj.get("items") {
        match items.as_array() {
            Some(items) => {
                for (i, item) in items.iter().enumerate() {
                    validate_item(item, &format!("items[{i}]"), &mut errors);
                }
            }
            None => errors.push("items: expected array".to_string()),
        }
    }

    if let Some(sources) = obj.get("sources") {
        match sources.as_array() {
            Some(sources) => {
                for (i, source) in sources.iter().enumerate() {
                    validate_citation(source, &format!("sources[{i}]"), &mut errors);
                }
            }
            None => errors.push("sources: expected array".to_string()),
        }
    }

    if let Some(v) = obj.get("validationErrors") {
        let ok = v
            .as_array()
            .map(|a| a.iter().all(Value::is_string))
            .unwrap_or(false);
        if !ok {
            errors.push("validationErrors: expected array of strings".to_string());
        }
    }

    if !errors.is_empty() {
        return Validated::Invalid(errors);
    }

    match serde_json::from_value::<StructuredResponse>(candidate.clone()) {
        Ok(response) => Validated::Valid(response),
        Err(e) => Validated::Invalid(vec![format!(": {e}")]),
    }
}

fn validate_item(item: &Value, path: &str, errors: &mut Vec<String>) {
    let Some(obj) = item.as_object() else {
        errors.push(format!("{path}: expected object"));
        return;
    };

    for field in ["id", "title"] {
        match obj.get(field).and_then(Value::as_str) {
            Some(s) if !s.is_empty() => {}
            Some(_) => errors.push(format!("{path}.{field}: must not be empty")),
            None => errors.push(format!("{path}.{field}: required")),
        }
    }

    if let Some(v) = obj.get("summary") {
        match v.as_str() {
            Some(s) if !s.is_empty() => {}
            Some(_) => errors.push(format!("{path}.summary: must not be empty")),
            None => errors.push(format!("{path}.summary: expected string")),
        }
    }

    for field in ["eligibility", "benefits", "deadlines"] {
        if let Some(v) = obj.get(field) {
            let ok = v
                .as_array()
                .map(|a| a.iter().all(Value::is_string))
                .unwrap_or(false);
            if !ok {
                errors.push(format!("{path}.{field}: expected array of strings"));
            }
        }
    }

    if let Some(v) = obj.get("application_link") {
        match v.as_str() {
            Some(s) if acceptable_url(s) => {}
            Some(_) => errors.push(format!("{path}.application_link: invalid URL")),
            None => errors.push(format!("{path}.application_link: expected string")),
        }
    }

    if let Some(v) = obj.get("citations") {
        match v.as_array() {
            Some(citations) => {
                for (i, citation) in citations.iter().enumerate() {
                    validate_citation(citation, &format!("{path}.citations[{i}]"), errors);
                }
            }
            None => errors.push(format!("{path}.citations: expected array")),
        }
    }
}

fn validate_citation(citation: &Value, path: &str, errors: &mut Vec<String>) {
    let Some(obj) = citation.as_object() else {
        errors.push(format!("{path}: expected object"));
        return;
    };

    match obj.get("url").and_then(Value::as_str) {
        Some(s) if acceptable_url(s) => {}
        Some(_) => errors.push(format!("{path}.url: invalid URL")),
        None => errors.push(format!("{path}.url: required")),
    }

    if let Some(v) = obj.get("title") {
        match v.as_str() {
            Some(s) if !s.is_empty() => {}
            Some(_) => errors.push(format!("{path}.title: must not be empty")),
            None => errors.push(format!("{path}.title: expected string")),
        }
    }

    if let Some(v) = obj.get("snippet") {
        if !v.is_string() {
            errors.push(format!("{path}.snippet: expected string"));
        }
    }

    if let Some(v) = obj.get("confidence") {
        match v.as_f64() {
            Some(c) if (0.0..=1.0).contains(&c) => {}
            _ => errors.push(format!("{path}.confidence: expected number in [0, 1]")),
        }
    }
}

/// Structurally repair a candidate so it conforms to the schema.
///
/// Coerces missing/mistyped arrays to empty arrays, fills missing
/// required strings with placeholders ("item_1", "Unknown Scholarship",
/// "Untitled", ...), and replaces malformed URLs with "Not specified".
/// Applied at most once; the repaired value is re-validated by the
/// caller.
pub fn repair_structured(candidate: Value) -> Value {
    let mut obj = match candidate {
        Value::Object(obj) => obj,
        _ => return json!({}),
    };

    for field in ["query", "locale"] {
        if obj.get(field).map(|v| !v.is_string()).unwrap_or(false) {
            obj.remove(field);
        }
    }

    if let Some(v) = obj.get("depth") {
        if v.as_str().and_then(Depth::parse).is_none() {
            obj.remove("depth");
        }
    }

    let items = take_array(&mut obj, "items");
    let repaired_items: Vec<Value> = items
        .into_iter()
        .enumerate()
        .map(|(i, item)| repair_item(item, i))
        .collect();
    obj.insert("items".to_string(), Value::Array(repaired_items));

    let sources = take_array(&mut obj, "sources");
    let repaired_sources: Vec<Value> = sources.into_iter().map(repair_citation).collect();
    obj.insert("sources".to_string(), Value::Array(repaired_sources));

    if let Some(v) = obj.get("validationErrors") {
        let ok = v
            .as_array()
            .map(|a| a.iter().all(Value::is_string))
            .unwrap_or(false);
        if !ok {
            obj.remove("validationErrors");
        }
    }

    Value::Object(obj)
}

fn take_array(obj: &mut serde_json::Map<String, Value>, field: &str) -> Vec<Value> {
    match obj.remove(field) {
        Some(Value::Array(a)) => a,
        _ => vec![],
    }
}

fn repair_item(item: Value, index: usize) -> Value {
    let mut obj = match item {
        Value::Object(obj) => obj,
        _ => serde_json::Map::new(),
    };

    fill_string(&mut obj, "id", &format!("item_{}", index + 1));
    fill_string(&mut obj, "title", "Unknown Scholarship");
    fill_string(&mut obj, "summary", "No description available");

    for field in ["eligibility", "benefits", "deadlines"] {
        let values = take_array(&mut obj, field);
        let strings: Vec<Value> = values.into_iter().filter(|v| v.is_string()).collect();
        obj.insert(field.to_string(), Value::Array(strings));
    }

    if let Some(v) = obj.get("application_link") {
        let keep = v.as_str().map(acceptable_url).unwrap_or(false);
        if !keep {
            obj.insert(
                "application_link".to_string(),
                json!(URL_PLACEHOLDER),
            );
        }
    }

    let citations = take_array(&mut obj, "citations");
    let repaired: Vec<Value> = citations.into_iter().map(repair_citation).collect();
    obj.insert("citations".to_string(), Value::Array(repaired));

    Value::Object(obj)
}

fn repair_citation(citation: Value) -> Value {
    let mut obj = match citation {
        Value::Object(obj) => obj,
        _ => serde_json::Map::new(),
    };

    let url_ok = obj
        .get("url")
        .and_then(Value::as_str)
        .map(acceptable_url)
        .unwrap_or(false);
    if !url_ok {
        obj.insert("url".to_string(), json!(URL_PLACEHOLDER));
    }

    fill_string(&mut obj, "title", "Untitled");

    let snippet_ok = obj.get("snippet").map(Value::is_string).unwrap_or(false);
    if !snippet_ok {
        obj.insert("snippet".to_string(), json!(""));
    }

    let confidence = obj
        .get("confidence")
        .and_then(Value::as_f64)
        .filter(|c| (0.0..=1.0).contains(c))
        .unwrap_or(0.5);
    obj.insert("confidence".to_string(), json!(confidence));

    Value::Object(obj)
}

fn fill_string(obj: &mut serde_json::Map<String, Value>, field: &str, fallback: &str) {
    let present = obj
        .get(field)
        .and_then(Value::as_str)
        .map(|s| !s.is_empty())
        .unwrap_or(false);
    if !present {
        obj.insert(field.to_string(), json!(fallback));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_object_is_valid_empty_response() {
        let validated = validate_structured(&json!({}));
        match validated {
            Validated::Valid(response) => {
                assert!(response.items.is_empty());
                assert!(response.sources.is_empty());
                assert_eq!(response.depth, Depth::Standard);
                assert!(response.validation_errors.is_none());
            }
            Validated::Invalid(errors) => panic!("expected valid, got {errors:?}"),
        }
    }

    #[test]
    fn test_missing_item_id_reports_path() {
        let candidate = json!({
            "items": [
                { "title": "A Scholarship" },
                { "id": "x", "title": "B Scholarship" }
            ]
        });
        match validate_structured(&candidate) {
            Validated::Invalid(errors) => {
                assert!(errors.iter().any(|e| e == "items[0].id: required"));
                assert_eq!(errors.len(), 1);
            }
            Validated::Valid(_) => panic!("expected invalid"),
        }
    }

    #[test]
    fn test_non_array_items_rejected() {
        let candidate = json!({ "items": "oops" });
        match validate_structured(&candidate) {
            Validated::Invalid(errors) => {
                assert!(errors.iter().any(|e| e == "items: expected array"));
            }
            Validated::Valid(_) => panic!("expected invalid"),
        }
    }

    #[test]
    fn test_bad_confidence_and_url_rejected() {
        let candidate = json!({
            "sources": [
                { "url": "ftp://example.com", "confidence": 1.5 }
            ]
        });
        match validate_structured(&candidate) {
            Validated::Invalid(errors) => {
                assert!(errors.iter().any(|e| e == "sources[0].url: invalid URL"));
                assert!(errors
                    .iter()
                    .any(|e| e == "sources[0].confidence: expected number in [0, 1]"));
            }
            Validated::Valid(_) => panic!("expected invalid"),
        }
    }

    #[test]
    fn test_repair_assigns_sequential_ids() {
        let candidate = json!({
            "items": [
                { "title": "First" },
                { "title": "Second", "summary": "Covers tuition" },
                { "id": "keep-me", "title": "Third" }
            ]
        });
        let repaired = repair_structured(candidate);
        match validate_structured(&repaired) {
            Validated::Valid(response) => {
                assert_eq!(response.items[0].id, "item_1");
                assert_eq!(response.items[1].id, "item_2");
                assert_eq!(response.items[2].id, "keep-me");
                assert!(response.validation_errors.is_none());
            }
            Validated::Invalid(errors) => panic!("repair should converge, got {errors:?}"),
        }
    }

    #[test]
    fn test_repair_replaces_malformed_urls() {
        let candidate = json!({
            "items": [{
                "id": "a",
                "title": "T",
                "application_link": "example.com/apply",
                "citations": [{ "url": "nota url", "title": "", "confidence": 7 }]
            }]
        });
        let repaired = repair_structured(candidate);
        match validate_structured(&repaired) {
            Validated::Valid(response) => {
                let item = &response.items[0];
                assert_eq!(item.application_link.as_deref(), Some(URL_PLACEHOLDER));
                assert_eq!(item.citations[0].url, URL_PLACEHOLDER);
                assert_eq!(item.citations[0].title, "Untitled");
                assert_eq!(item.citations[0].confidence, 0.5);
            }
            Validated::Invalid(errors) => panic!("repair should converge, got {errors:?}"),
        }
    }

    #[test]
    fn test_repair_of_non_object_yields_empty_object() {
        let repaired = repair_structured(json!("just text"));
        assert!(validate_structured(&repaired).is_valid());
    }

    #[test]
    fn test_failed_response_shape_is_mutually_exclusive() {
        let response = StructuredResponse::failed(
            "physics",
            Some("en"),
            Depth::Fast,
            vec!["items[0].id: required".to_string()],
        );
        assert!(response.items.is_empty());
        assert!(response.sources.is_empty());
        assert!(response.validation_errors.is_some());
    }

    #[test]
    fn test_serialization_uses_wire_field_names() {
        let response = StructuredResponse::failed("q", None, Depth::Standard, vec!["e".into()]);
        let value = serde_json::to_value(&response).expect("serialize");
        assert!(value.get("validationErrors").is_some());
        assert!(value.get("locale").is_none());
        assert_eq!(value.get("depth"), Some(&json!("standard")));
    }
}
