//! Normalization of AI workflow responses.
//!
//! The upstream workflow answers with loosely structured JSON (arrays,
//! strings, objects with differently named fields). This module reduces any
//! such payload to a single [`ConflictResult`] with a definitive
//! [`ResolutionStatus`].

pub mod normalizer;
pub mod payload;

use std::str::FromStr;

use serde::{Deserialize, Serialize};

pub use normalizer::{
    normalize, normalize_code_formatting, NormalizerOptions, ResponseNormalizer,
    DEFAULT_HIGH_CONFIDENCE_THRESHOLD,
};
pub use payload::{Payload, WorkingResult, WorkingStatus};

// ---------------------------------------------------------------------------
// Status
// ---------------------------------------------------------------------------

/// Outcome classification of one resolution attempt.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum ResolutionStatus {
    /// Conflict resolved with high confidence.
    Success,
    /// Merged code is usable but needs human review.
    LowConfidence,
    /// Merged code still contains conflict markers.
    Unresolved,
    /// The workflow produced no usable merged code.
    AiFailed,
    /// The incoming version was substituted for a missing merge.
    Fallback,
}

impl ResolutionStatus {
    /// Wire name of the status.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Success => "success",
            Self::LowConfidence => "low_confidence",
            Self::Unresolved => "unresolved",
            Self::AiFailed => "ai_failed",
            Self::Fallback => "fallback",
        }
    }
}

impl std::fmt::Display for ResolutionStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when a status string is not one of the five known values.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownStatus(pub String);

impl std::fmt::Display for UnknownStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "unknown resolution status '{}'", self.0)
    }
}

impl std::error::Error for UnknownStatus {}

impl FromStr for ResolutionStatus {
    type Err = UnknownStatus;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "success" => Ok(Self::Success),
            "low_confidence" => Ok(Self::LowConfidence),
            "unresolved" => Ok(Self::Unresolved),
            "ai_failed" => Ok(Self::AiFailed),
            "fallback" => Ok(Self::Fallback),
            other => Err(UnknownStatus(other.to_string())),
        }
    }
}

// ---------------------------------------------------------------------------
// Result
// ---------------------------------------------------------------------------

/// The canonical outcome of one resolution attempt.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConflictResult {
    /// Final status.
    pub status: ResolutionStatus,
    /// Confidence score, nominally in `[0, 1]`; `0` means no signal.
    pub confidence: f64,
    /// Text offered as the resolved result.
    pub merged_code: String,
    /// Human-readable rationale, never empty.
    pub explanation: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub head_version: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub incoming_version: Option<String>,
}

impl ConflictResult {
    /// `true` when the merged code has non-whitespace content.
    pub fn has_merged_code(&self) -> bool {
        !self.merged_code.trim().is_empty()
    }

    /// `true` when confidence meets `threshold`.
    pub fn is_high_confidence(&self, threshold: f64) -> bool {
        self.confidence >= threshold
    }
}
