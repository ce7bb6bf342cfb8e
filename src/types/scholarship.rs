//! Flat scholarship records for the legacy single-pass extraction path.
//!
//! Records arrive as model JSON, pass through [`sanitize_record`], are
//! parsed, and get one [`fix_common_issues`] retry before being
//! skipped.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

const NOT_SPECIFIED: &str = "Not specified";
const FALLBACK_LINK: &str = "https://example.com/not-specified";

/// Funding level of a scholarship.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, JsonSchema)]
pub enum ScholarshipType {
    #[default]
    #[serde(rename = "fully funded")]
    FullyFunded,
    #[serde(rename = "partial high")]
    PartialHigh,
    #[serde(rename = "partial low")]
    PartialLow,
}

/// What the scholarship covers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct Benefits {
    #[serde(default = "not_specified")]
    pub tuition: String,
    #[serde(default = "not_specified")]
    pub stipend: String,
    #[serde(default = "not_specified")]
    pub travel: String,
    #[serde(default = "not_specified")]
    pub insurance: String,
    #[serde(default)]
    pub others: Vec<String>,
}

/// Who may apply.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct Requirements {
    #[serde(default = "not_specified")]
    pub academic: String,
    #[serde(default = "not_specified")]
    pub age_limit: String,
    #[serde(default = "not_specified")]
    pub language: String,
    #[serde(default)]
    pub others: Vec<String>,
}

/// Key application dates.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct Timeline {
    #[serde(default = "not_specified")]
    pub opening_date: String,
    #[serde(default = "not_specified")]
    pub deadline: String,
    #[serde(default = "not_specified")]
    pub result_announcement: String,
}

/// One fully described scholarship.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct Scholarship {
    pub title: String,

    #[serde(default)]
    pub scholarship_type: ScholarshipType,

    #[serde(default = "default_degree_levels")]
    pub degree_levels: Vec<String>,

    #[serde(default = "not_specified")]
    pub host_country: String,

    #[serde(default = "default_benefits")]
    pub benefits: Benefits,

    #[serde(default = "not_specified")]
    pub eligible_countries: String,

    #[serde(default = "default_requirements")]
    pub requirements: Requirements,

    #[serde(default = "default_timeline")]
    pub application_timeline: Timeline,

    #[serde(default = "default_link")]
    pub application_link: String,

    #[serde(default = "not_specified_list")]
    pub application_procedure: Vec<String>,

    #[serde(default = "not_specified_list")]
    pub selection_process: Vec<String>,

    #[serde(default = "not_specified")]
    pub renewal: String,

    #[serde(default = "not_specified_list")]
    pub source: Vec<String>,
}

fn not_specified() -> String {
    NOT_SPECIFIED.to_string()
}

fn not_specified_list() -> Vec<String> {
    vec![NOT_SPECIFIED.to_string()]
}

fn default_degree_levels() -> Vec<String> {
    vec!["Masters".to_string()]
}

fn default_link() -> String {
    FALLBACK_LINK.to_string()
}

fn default_benefits() -> Benefits {
    Benefits {
        tuition: not_specified(),
        stipend: not_specified(),
        travel: not_specified(),
        insurance: not_specified(),
        others: vec![],
    }
}

fn default_requirements() -> Requirements {
    Requirements {
        academic: not_specified(),
        age_limit: not_specified(),
        language: not_specified(),
        others: vec![],
    }
}

fn default_timeline() -> Timeline {
    Timeline {
        opening_date: not_specified(),
        deadline: not_specified(),
        result_announcement: not_specified(),
    }
}

/// A flat-path search request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchRequest {
    /// Free-text query, 1 to 500 characters.
    pub query: String,

    /// Result cap, 1 to 10. Defaults to 5.
    #[serde(default = "default_limit")]
    pub limit: usize,
}

fn default_limit() -> usize {
    5
}

impl SearchRequest {
    /// Create a request with the default limit.
    pub fn new(query: impl Into<String>) -> Self {
        Self {
            query: query.into(),
            limit: default_limit(),
        }
    }

    /// Set the result cap.
    pub fn with_limit(mut self, limit: usize) -> Self {
        self.limit = limit;
        self
    }

    /// Check the query length and limit range.
    pub fn validate(&self) -> Result<(), String> {
        if self.query.is_empty() {
            return Err("query: required".to_string());
        }
        if self.query.chars().count() > 500 {
            return Err("query: too long (max 500 characters)".to_string());
        }
        if self.limit == 0 || self.limit > 10 {
            return Err("limit: must be between 1 and 10".to_string());
        }
        Ok(())
    }
}

/// The flat-path response envelope.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchOutcome {
    pub success: bool,
    pub data: Vec<Scholarship>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    /// Wall-clock processing time in milliseconds.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub processing_time: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub total_results: Option<usize>,
}

/// True for a present, non-empty string value.
fn has_string(value: Option<&Value>) -> bool {
    value.and_then(Value::as_str).map(|s| !s.is_empty()).unwrap_or(false)
}

fn ensure_string(obj: &mut serde_json::Map<String, Value>, field: &str, fallback: &str) {
    if !has_string(obj.get(field)) {
        obj.insert(field.to_string(), json!(fallback));
    }
}

fn ensure_string_array(obj: &mut serde_json::Map<String, Value>, field: &str, fallback: Vec<&str>) {
    let ok = obj
        .get(field)
        .and_then(Value::as_array)
        .map(|a| !a.is_empty() && a.iter().all(Value::is_string))
        .unwrap_or(false);
    if !ok {
        obj.insert(field.to_string(), json!(fallback));
    }
}

/// First normalization pass over a raw model record.
///
/// Fills missing top-level fields with placeholders and coerces the
/// list fields to non-empty string arrays.
pub fn sanitize_record(record: Value) -> Value {
    let mut obj = match record {
        Value::Object(obj) => obj,
        _ => serde_json::Map::new(),
    };

    ensure_string(&mut obj, "title", "Unknown Scholarship");
    let type_ok = obj
        .get("scholarship_type")
        .map(|v| serde_json::from_value::<ScholarshipType>(v.clone()).is_ok())
        .unwrap_or(false);
    if !type_ok {
        obj.insert("scholarship_type".to_string(), json!("fully funded"));
    }
    ensure_string_array(&mut obj, "degree_levels", vec!["Masters"]);
    ensure_string(&mut obj, "host_country", NOT_SPECIFIED);
    if !obj.get("benefits").map(Value::is_object).unwrap_or(false) {
        obj.insert("benefits".to_string(), json!({}));
    }
    if !obj.get("requirements").map(Value::is_object).unwrap_or(false) {
        obj.insert("requirements".to_string(), json!({}));
    }
    if !obj
        .get("application_timeline")
        .map(Value::is_object)
        .unwrap_or(false)
    {
        obj.insert("application_timeline".to_string(), json!({}));
    }
    ensure_string_array(&mut obj, "application_procedure", vec![NOT_SPECIFIED]);
    ensure_string_array(&mut obj, "selection_process", vec![NOT_SPECIFIED]);
    ensure_string_array(&mut obj, "source", vec![NOT_SPECIFIED]);

    Value::Object(obj)
}

/// Second-chance repair applied when a sanitized record fails to parse.
///
/// Fills the nested benefit/requirement/timeline fields and the
/// application link, which the first pass leaves alone.
pub fn fix_common_issues(record: Value) -> Value {
    let mut obj = match record {
        Value::Object(obj) => obj,
        _ => serde_json::Map::new(),
    };

    if let Some(Value::Object(benefits)) = obj.get_mut("benefits") {
        ensure_string(benefits, "tuition", NOT_SPECIFIED);
        ensure_string(benefits, "stipend", NOT_SPECIFIED);
        ensure_string(benefits, "travel", NOT_SPECIFIED);
        ensure_string(benefits, "insurance", NOT_SPECIFIED);
        if !benefits.get("others").map(Value::is_array).unwrap_or(false) {
            benefits.insert("others".to_string(), json!([]));
        }
    }

    if let Some(Value::Object(requirements)) = obj.get_mut("requirements") {
        ensure_string(requirements, "academic", NOT_SPECIFIED);
        ensure_string(requirements, "age_limit", NOT_SPECIFIED);
        ensure_string(requirements, "language", NOT_SPECIFIED);
        if !requirements.get("others").map(Value::is_array).unwrap_or(false) {
            requirements.insert("others".to_string(), json!([]));
        }
    }

    if let Some(Value::Object(timeline)) = obj.get_mut("application_timeline") {
        ensure_string(timeline, "opening_date", NOT_SPECIFIED);
        ensure_string(timeline, "deadline", NOT_SPECIFIED);
        ensure_string(timeline, "result_announcement", NOT_SPECIFIED);
    }

    ensure_string(&mut obj, "application_link", FALLBACK_LINK);
    ensure_string(&mut obj, "renewal", NOT_SPECIFIED);

    Value::Object(obj)
}

/// Parse a sanitized record into a [`Scholarship`].
///
/// Rejects records whose `application_link` is present but not a valid
/// URL, then defers remaining shape checks to deserialization.
pub fn parse_record(record: &Value) -> Result<Scholarship, String> {
    if let Some(link) = record.get("application_link") {
        match link.as_str() {
            Some(s) if url::Url::parse(s).is_ok() => {}
            _ => return Err("application_link: must be a valid URL".to_string()),
        }
    }
    serde_json::from_value(record.clone()).map_err(|e| e.to_string())
}
