//! Response normalization pipeline.
//!
//! `normalize` never fails: every input, however malformed, ends in a
//! [`ConflictResult`]. The steps run in a fixed order, each a pure function
//! over a [`WorkingResult`]:
//!
//! 1. shape dispatch and merged-code extraction ([`Payload`]),
//! 2. fallback to the incoming version when no merge was produced,
//! 3. line-ending and trailing-whitespace cleanup,
//! 4. defaults for explanation and confidence,
//! 5. final status determination.

use serde_json::Value;
use tracing::{debug, info};

use super::payload::{Payload, WorkingResult, WorkingStatus, DEFAULT_EXPLANATION};
use super::{ConflictResult, ResolutionStatus};
use crate::conflict::contains_marker_token;

/// Confidence at or above which a merge counts as safe to auto-apply.
pub const DEFAULT_HIGH_CONFIDENCE_THRESHOLD: f64 = 0.8;

/// Confidence assigned to an incoming-version fallback when the payload gave none.
const FALLBACK_CONFIDENCE: f64 = 0.5;

const PARTIAL_MERGE_WARNING: &str = "Partial merge warning: the AI response contains unresolved \
     conflict markers. Review and complete the merge manually.";
const FALLBACK_WARNING: &str = "Fallback merge: the workflow parsed the conflict but did not \
     generate merged code. Using the incoming version as fallback; review carefully.";
const INCOMING_ONLY_WARNING: &str =
    "Fallback merge: using the incoming version. Review recommended.";

/// Tunables for status determination.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NormalizerOptions {
    /// Boundary between `low_confidence` and `success`.
    pub high_confidence_threshold: f64,
}

impl Default for NormalizerOptions {
    fn default() -> Self {
        Self {
            high_confidence_threshold: DEFAULT_HIGH_CONFIDENCE_THRESHOLD,
        }
    }
}

/// Reduces arbitrary workflow payloads to a [`ConflictResult`].
#[derive(Debug, Clone, Default)]
pub struct ResponseNormalizer {
    options: NormalizerOptions,
}

impl ResponseNormalizer {
    pub fn new(options: NormalizerOptions) -> Self {
        Self { options }
    }

    /// Normalizer with a custom high-confidence threshold.
    pub fn with_threshold(high_confidence_threshold: f64) -> Self {
        Self::new(NormalizerOptions {
            high_confidence_threshold,
        })
    }

    pub fn options(&self) -> NormalizerOptions {
        self.options
    }

    /// Normalize one decoded payload.
    pub fn normalize(&self, raw: &Value) -> ConflictResult {
        let working = Payload::classify(raw).into_working();
        debug!(
            status = ?working.status,
            confidence = ?working.confidence,
            merged_len = working.merged_code.len(),
            "payload dispatched"
        );

        let working = apply_fallback(working);
        let working = format_merged_code(working);
        let working = apply_defaults(working);
        let result = self.finalize(working);

        info!(
            status = %result.status,
            confidence = result.confidence,
            "response normalized"
        );
        result
    }

    /// Final status determination.
    ///
    /// Leftover markers always win; then an empty merge; then any status the
    /// payload asserted (other than success/low_confidence) unless
    /// confidence is high; then the confidence threshold.
    fn finalize(&self, working: WorkingResult) -> ConflictResult {
        let threshold = self.options.high_confidence_threshold;
        let confidence = working.confidence.unwrap_or(0.0);

        let status = if contains_marker_token(&working.merged_code) {
            ResolutionStatus::Unresolved
        } else if working.merged_code.trim().is_empty() {
            ResolutionStatus::AiFailed
        } else {
            match working.status {
                WorkingStatus::Known(ResolutionStatus::Success)
                | WorkingStatus::Known(ResolutionStatus::LowConfidence) => {
                    if confidence < threshold {
                        ResolutionStatus::LowConfidence
                    } else {
                        ResolutionStatus::Success
                    }
                }
                _ if confidence >= threshold => ResolutionStatus::Success,
                WorkingStatus::Known(asserted) => asserted,
                WorkingStatus::Custom(ref raw) => {
                    debug!(status = %raw, "unrecognized status, requiring review");
                    ResolutionStatus::LowConfidence
                }
            }
        };

        ConflictResult {
            status,
            confidence,
            merged_code: working.merged_code,
            explanation: working.explanation.unwrap_or_default(),
            file_name: working.file_name,
            head_version: working.head_version,
            incoming_version: working.incoming_version,
        }
    }
}

/// Normalize with the default threshold.
pub fn normalize(raw: &Value) -> ConflictResult {
    ResponseNormalizer::default().normalize(raw)
}

// ---------------------------------------------------------------------------
// Steps
// ---------------------------------------------------------------------------

fn non_empty(value: &Option<String>) -> bool {
    value.as_deref().is_some_and(|s| !s.is_empty())
}

/// Substitute the incoming version when the payload carried no merge.
fn apply_fallback(working: WorkingResult) -> WorkingResult {
    let custom = working.has_custom_explanation();

    if !working.merged_code.is_empty() {
        if contains_marker_token(&working.merged_code) && !custom {
            debug!("merged code still has conflict markers");
            return WorkingResult {
                explanation: Some(PARTIAL_MERGE_WARNING.to_string()),
                ..working
            };
        }
        return working;
    }

    let has_head = non_empty(&working.head_version);
    let incoming = working
        .incoming_version
        .clone()
        .filter(|s| !s.is_empty());

    match incoming {
        Some(incoming) if has_head => {
            debug!("no merged code, falling back to incoming version");
            WorkingResult {
                status: WorkingStatus::Known(ResolutionStatus::Fallback),
                merged_code: incoming,
                confidence: Some(working.confidence.unwrap_or(FALLBACK_CONFIDENCE)),
                explanation: if custom {
                    working.explanation.clone()
                } else {
                    Some(FALLBACK_WARNING.to_string())
                },
                ..working
            }
        }
        Some(incoming) => {
            debug!("no merged code or head version, using incoming version");
            WorkingResult {
                status: WorkingStatus::Known(ResolutionStatus::Fallback),
                merged_code: incoming,
                explanation: if custom {
                    working.explanation.clone()
                } else {
                    Some(INCOMING_ONLY_WARNING.to_string())
                },
                ..working
            }
        }
        None => working,
    }
}

/// Clean up the merged code's line endings and trailing whitespace.
fn format_merged_code(working: WorkingResult) -> WorkingResult {
    if working.merged_code.is_empty() {
        return working;
    }
    WorkingResult {
        merged_code: normalize_code_formatting(&working.merged_code),
        ..working
    }
}

/// Fill in the default explanation and a numeric confidence.
fn apply_defaults(working: WorkingResult) -> WorkingResult {
    let explanation = match working.explanation {
        Some(ref e) if !e.is_empty() => working.explanation.clone(),
        _ => Some(DEFAULT_EXPLANATION.to_string()),
    };
    WorkingResult {
        confidence: Some(working.confidence.unwrap_or(0.0)),
        explanation,
        ..working
    }
}

/// Convert CRLF to LF and strip trailing whitespace from every line.
///
/// Idempotent: applying it to its own output changes nothing.
pub fn normalize_code_formatting(code: &str) -> String {
    code.replace("\r\n", "\n")
        .split('\n')
        .map(str::trim_end)
        .collect::<Vec<_>>()
        .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_formatting() {
        assert_eq!(normalize_code_formatting("a  \r\nb\t\r\n"), "a\nb\n");
        assert_eq!(normalize_code_formatting("x \n\n  y"), "x\n\n  y");
    }

    #[test]
    fn test_formatting_idempotent() {
        let samples = ["a \r\n\r\n b\r\r\n", "  \t", "\r", "line\r \r\nnext  ", ""];
        for s in samples {
            let once = normalize_code_formatting(s);
            assert_eq!(normalize_code_formatting(&once), once, "sample {s:?}");
        }
    }

    #[test]
    fn test_custom_explanation_survives_partial_merge() {
        let result = normalize(&json!({
            "mergedCode": "a\n=======\nb",
            "explanation": "Kept both branches"
        }));
        assert_eq!(result.status, ResolutionStatus::Unresolved);
        assert_eq!(result.explanation, "Kept both branches");
    }

    #[test]
    fn test_partial_merge_gets_warning() {
        let result = normalize(&json!({ "mergedCode": "a\n>>>>>>> dev" }));
        assert_eq!(result.status, ResolutionStatus::Unresolved);
        assert_eq!(result.explanation, PARTIAL_MERGE_WARNING);
        assert_eq!(result.merged_code, "a\n>>>>>>> dev");
    }

    #[test]
    fn test_fallback_keeps_supplied_confidence() {
        let result = normalize(&json!({
            "headVersion": "A",
            "incomingVersion": "B",
            "confidence": 0.3
        }));
        assert_eq!(result.status, ResolutionStatus::Fallback);
        assert_eq!(result.confidence, 0.3);
        assert_eq!(result.explanation, FALLBACK_WARNING);
    }

    #[test]
    fn test_fallback_high_confidence_overrides_to_success() {
        let result = normalize(&json!({
            "headVersion": "A",
            "incomingVersion": "B",
            "confidence": 0.9
        }));
        assert_eq!(result.status, ResolutionStatus::Success);
        assert_eq!(result.merged_code, "B");
    }

    #[test]
    fn test_incoming_only_fallback() {
        let result = normalize(&json!({ "incomingVersion": "B\r\n" }));
        assert_eq!(result.status, ResolutionStatus::Fallback);
        assert_eq!(result.merged_code, "B\n");
        assert_eq!(result.confidence, 0.0);
        assert_eq!(result.explanation, INCOMING_ONLY_WARNING);
    }

    #[test]
    fn test_fallback_incoming_with_markers_is_unresolved() {
        let result = normalize(&json!({
            "headVersion": "A",
            "incomingVersion": "<<<<<<< HEAD\nB"
        }));
        assert_eq!(result.status, ResolutionStatus::Unresolved);
    }

    #[test]
    fn test_asserted_status_kept_below_threshold() {
        let result = normalize(&json!({
            "status": "fallback",
            "mergedCode": "code",
            "confidence": 0.6
        }));
        assert_eq!(result.status, ResolutionStatus::Fallback);
    }

    #[test]
    fn test_custom_status_requires_review() {
        let result = normalize(&json!({
            "status": "partially_done",
            "mergedCode": "code",
            "confidence": 0.6
        }));
        assert_eq!(result.status, ResolutionStatus::LowConfidence);

        let result = normalize(&json!({
            "status": "partially_done",
            "mergedCode": "code",
            "confidence": 0.95
        }));
        assert_eq!(result.status, ResolutionStatus::Success);
    }

    #[test]
    fn test_asserted_success_without_code_fails() {
        let result = normalize(&json!({ "status": "success", "confidence": 1.0 }));
        assert_eq!(result.status, ResolutionStatus::AiFailed);
        assert_eq!(result.merged_code, "");
        assert_eq!(result.explanation, DEFAULT_EXPLANATION);
    }

    #[test]
    fn test_custom_threshold() {
        let normalizer = ResponseNormalizer::with_threshold(0.6);
        let result = normalizer.normalize(&json!({ "mergedCode": "ok", "confidence": 0.65 }));
        assert_eq!(result.status, ResolutionStatus::Success);
        let result = normalize(&json!({ "mergedCode": "ok", "confidence": 0.65 }));
        assert_eq!(result.status, ResolutionStatus::LowConfidence);
    }

    #[test]
    fn test_carried_fields() {
        let result = normalize(&json!({
            "mergedCode": "x",
            "confidence": 0.9,
            "fileName": "app.ts",
            "headVersion": "h",
            "incomingVersion": "i"
        }));
        assert_eq!(result.file_name.as_deref(), Some("app.ts"));
        assert_eq!(result.head_version.as_deref(), Some("h"));
        assert_eq!(result.incoming_version.as_deref(), Some("i"));
        assert_eq!(result.merged_code, "x");
    }

    #[test]
    fn test_whitespace_string_payload_fails() {
        let result = normalize(&json!("   \n  "));
        assert_eq!(result.status, ResolutionStatus::AiFailed);
    }
}
