//! Shape dispatch for raw workflow payloads.
//!
//! A decoded response body is classified into one of four [`Payload`]
//! shapes. Each shape has its own conversion into a flat field map, and the
//! map is read into a [`WorkingResult`] through `Option`-returning lookups.

use serde_json::{Map, Value};
use tracing::debug;

use super::ResolutionStatus;
use crate::conflict::contains_marker_token;

pub(crate) const DEFAULT_EXPLANATION: &str = "Merge conflict resolved";
pub(crate) const NO_RESULT_EXPLANATION: &str = "No result returned";
pub(crate) const UNMERGED_TEXT_WARNING: &str = "Partial merge warning: the AI response contains \
     unresolved conflict markers. Check the workflow or review the result manually.";

/// Ordered field paths searched for merged code. The first non-blank string
/// wins.
const MERGED_CODE_FIELDS: &[&[&str]] = &[
    &["mergedCode"],
    &["merged_code"],
    &["result"],
    &["solution"],
    &["response", "mergedCode"],
    &["response", "merged_code"],
];

// ---------------------------------------------------------------------------
// Payload
// ---------------------------------------------------------------------------

/// The recognized shapes of a raw payload.
#[derive(Debug, Clone, PartialEq)]
pub enum Payload {
    /// Array-like; only the first element is used.
    Sequence(Vec<Value>),
    /// A bare string reply.
    Text(String),
    /// An object carrying result fields.
    Structured(Map<String, Value>),
    /// Null, number, boolean, or nothing usable.
    Empty,
}

impl Payload {
    /// Classify a decoded value by its top-level shape.
    pub fn classify(value: &Value) -> Self {
        match value {
            Value::Array(items) => Self::Sequence(items.clone()),
            Value::String(text) => Self::Text(text.clone()),
            Value::Object(map) => Self::Structured(map.clone()),
            Value::Null | Value::Bool(_) | Value::Number(_) => Self::Empty,
        }
    }

    /// Convert into the flat field map consumed by [`WorkingResult::from_fields`].
    pub fn into_fields(self) -> Map<String, Value> {
        match self {
            Self::Sequence(items) => sequence_fields(items),
            Self::Text(text) => text_fields(text),
            Self::Structured(map) => structured_fields(map),
            Self::Empty => empty_fields(),
        }
    }

    /// Shape dispatch followed by field extraction.
    pub fn into_working(self) -> WorkingResult {
        WorkingResult::from_fields(&self.into_fields())
    }
}

/// First item wins; an `output` field may hold the real payload, possibly as
/// a JSON-encoded string.
fn sequence_fields(items: Vec<Value>) -> Map<String, Value> {
    let Some(first) = items.into_iter().next() else {
        debug!("empty sequence payload");
        return empty_fields();
    };

    let effective = match first {
        Value::Object(mut map) if map.contains_key("output") => {
            match map.remove("output").unwrap_or(Value::Null) {
                Value::String(raw) => match serde_json::from_str::<Value>(&raw) {
                    Ok(decoded) => {
                        debug!("decoded JSON from output field");
                        element_payload(decoded)
                    }
                    Err(_) => Payload::Text(raw),
                },
                other => element_payload(other),
            }
        }
        other => element_payload(other),
    };

    effective.into_fields()
}

/// Shape of the value taken out of a sequence. Sequences are unwrapped once
/// only, so a nested array carries no result fields.
fn element_payload(value: Value) -> Payload {
    match value {
        Value::String(text) => Payload::Text(text),
        Value::Object(map) => Payload::Structured(map),
        Value::Array(_) | Value::Null | Value::Bool(_) | Value::Number(_) => Payload::Empty,
    }
}

fn text_fields(text: String) -> Map<String, Value> {
    let mut fields = Map::new();
    if contains_marker_token(&text) {
        fields.insert("status".into(), ResolutionStatus::Unresolved.as_str().into());
        fields.insert("confidence".into(), 0.into());
        fields.insert("explanation".into(), UNMERGED_TEXT_WARNING.into());
    } else {
        fields.insert("status".into(), ResolutionStatus::Success.as_str().into());
        fields.insert("confidence".into(), 1.into());
        fields.insert("explanation".into(), DEFAULT_EXPLANATION.into());
    }
    fields.insert("mergedCode".into(), Value::String(text));
    fields
}

fn structured_fields(mut map: Map<String, Value>) -> Map<String, Value> {
    // Placeholder only; the final status is always recomputed.
    if lookup_str(&map, "status").map_or(true, str::is_empty) {
        map.insert("status".into(), ResolutionStatus::Success.as_str().into());
    }
    map
}

fn empty_fields() -> Map<String, Value> {
    let mut fields = Map::new();
    fields.insert("status".into(), ResolutionStatus::AiFailed.as_str().into());
    fields.insert("confidence".into(), 0.into());
    fields.insert("mergedCode".into(), "".into());
    fields.insert("explanation".into(), NO_RESULT_EXPLANATION.into());
    fields
}

// ---------------------------------------------------------------------------
// Lookups
// ---------------------------------------------------------------------------

/// String value of `key`, if present and a string.
pub fn lookup_str<'a>(map: &'a Map<String, Value>, key: &str) -> Option<&'a str> {
    map.get(key).and_then(Value::as_str)
}

/// Numeric value of `key`, if present and a JSON number.
pub fn lookup_f64(map: &Map<String, Value>, key: &str) -> Option<f64> {
    map.get(key).and_then(Value::as_f64)
}

/// String value at a nested object path such as `["response", "mergedCode"]`.
pub fn lookup_path<'a>(map: &'a Map<String, Value>, path: &[&str]) -> Option<&'a str> {
    let (last, parents) = path.split_last()?;
    let mut current = map;
    for key in parents {
        current = current.get(*key)?.as_object()?;
    }
    lookup_str(current, last)
}

/// Step B: the first non-blank merged-code candidate, or an empty string.
pub fn extract_merged_code(map: &Map<String, Value>) -> String {
    MERGED_CODE_FIELDS
        .iter()
        .filter_map(|path| lookup_path(map, path))
        .find(|candidate| !candidate.trim().is_empty())
        .map(str::to_string)
        .unwrap_or_default()
}

// ---------------------------------------------------------------------------
// Working result
// ---------------------------------------------------------------------------

/// Status as asserted by the payload before final determination.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WorkingStatus {
    Known(ResolutionStatus),
    /// A status string outside the known set.
    Custom(String),
}

impl WorkingStatus {
    fn parse(raw: &str) -> Self {
        raw.parse()
            .map(Self::Known)
            .unwrap_or_else(|_| Self::Custom(raw.to_string()))
    }
}

/// Intermediate record threaded through the normalization steps.
#[derive(Debug, Clone, PartialEq)]
pub struct WorkingResult {
    pub status: WorkingStatus,
    /// Confidence as supplied, only when it was a number.
    pub confidence: Option<f64>,
    pub explanation: Option<String>,
    /// Effective merged code chosen by the alias table.
    pub merged_code: String,
    pub file_name: Option<String>,
    pub head_version: Option<String>,
    pub incoming_version: Option<String>,
}

impl WorkingResult {
    /// Read a field map into a working result.
    pub fn from_fields(fields: &Map<String, Value>) -> Self {
        let status = lookup_str(fields, "status")
            .filter(|s| !s.is_empty())
            .map(WorkingStatus::parse)
            .unwrap_or(WorkingStatus::Known(ResolutionStatus::Success));

        Self {
            status,
            confidence: lookup_f64(fields, "confidence"),
            explanation: lookup_str(fields, "explanation").map(str::to_string),
            merged_code: extract_merged_code(fields),
            file_name: lookup_str(fields, "fileName").map(str::to_string),
            head_version: lookup_str(fields, "headVersion").map(str::to_string),
            incoming_version: lookup_str(fields, "incomingVersion").map(str::to_string),
        }
    }

    /// `true` when the explanation differs from the generic default.
    pub fn has_custom_explanation(&self) -> bool {
        self.explanation
            .as_deref()
            .is_some_and(|e| !e.is_empty() && e != DEFAULT_EXPLANATION)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn working(value: Value) -> WorkingResult {
        Payload::classify(&value).into_working()
    }

    #[test]
    fn test_classify_shapes() {
        assert!(matches!(Payload::classify(&json!([])), Payload::Sequence(_)));
        assert!(matches!(Payload::classify(&json!("x")), Payload::Text(_)));
        assert!(matches!(Payload::classify(&json!({})), Payload::Structured(_)));
        assert_eq!(Payload::classify(&Value::Null), Payload::Empty);
        assert_eq!(Payload::classify(&json!(3)), Payload::Empty);
        assert_eq!(Payload::classify(&json!(true)), Payload::Empty);
    }

    #[test]
    fn test_output_field_json_string() {
        let w = working(json!([{ "output": "{\"mergedCode\":\"m\",\"confidence\":0.7}" }]));
        assert_eq!(w.merged_code, "m");
        assert_eq!(w.confidence, Some(0.7));
    }

    #[test]
    fn test_output_field_plain_string() {
        let w = working(json!([{ "output": "just code" }]));
        assert_eq!(w.merged_code, "just code");
        assert_eq!(w.confidence, Some(1.0));
        assert_eq!(w.status, WorkingStatus::Known(ResolutionStatus::Success));
    }

    #[test]
    fn test_output_field_object() {
        let w = working(json!([{ "output": { "solution": "s" }, "mergedCode": "ignored" }]));
        assert_eq!(w.merged_code, "s");
    }

    #[test]
    fn test_nested_sequences_are_not_unwrapped() {
        let w = working(json!([[{ "mergedCode": "X", "confidence": 0.9 }]]));
        assert_eq!(w.status, WorkingStatus::Known(ResolutionStatus::AiFailed));
        assert_eq!(w.merged_code, "");

        let w = working(json!([{ "output": [{ "mergedCode": "Y", "confidence": 0.95 }] }]));
        assert_eq!(w.status, WorkingStatus::Known(ResolutionStatus::AiFailed));
        assert_eq!(w.merged_code, "");

        let w = working(json!([{ "output": "[{\"mergedCode\":\"Z\"}]" }]));
        assert_eq!(w.status, WorkingStatus::Known(ResolutionStatus::AiFailed));
    }

    #[test]
    fn test_sequence_of_strings() {
        let w = working(json!(["<<<<<<< HEAD", "other"]));
        assert_eq!(w.status, WorkingStatus::Known(ResolutionStatus::Unresolved));
        assert_eq!(w.explanation.as_deref(), Some(UNMERGED_TEXT_WARNING));
    }

    #[test]
    fn test_alias_precedence() {
        let w = working(json!({
            "mergedCode": "   ",
            "merged_code": "",
            "result": "from result",
            "response": { "mergedCode": "nested" }
        }));
        assert_eq!(w.merged_code, "from result");

        let w = working(json!({ "response": { "merged_code": "deep" } }));
        assert_eq!(w.merged_code, "deep");
    }

    #[test]
    fn test_non_string_fields_are_absent() {
        let w = working(json!({
            "mergedCode": 42,
            "confidence": "0.9",
            "explanation": null,
            "headVersion": ["a"]
        }));
        assert_eq!(w.merged_code, "");
        assert_eq!(w.confidence, None);
        assert_eq!(w.explanation, None);
        assert_eq!(w.head_version, None);
    }

    #[test]
    fn test_custom_status_preserved() {
        let w = working(json!({ "status": "needs_review", "mergedCode": "x" }));
        assert_eq!(w.status, WorkingStatus::Custom("needs_review".into()));
    }

    #[test]
    fn test_missing_status_placeholder() {
        let w = working(json!({ "mergedCode": "x" }));
        assert_eq!(w.status, WorkingStatus::Known(ResolutionStatus::Success));
    }

    #[test]
    fn test_has_custom_explanation() {
        let mut w = working(json!({ "mergedCode": "x" }));
        assert!(!w.has_custom_explanation());
        w.explanation = Some(DEFAULT_EXPLANATION.into());
        assert!(!w.has_custom_explanation());
        w.explanation = Some("Combined both imports".into());
        assert!(w.has_custom_explanation());
    }
}
