//! Confidence tiers and user-facing status wording.
//!
//! Tiers are presentation only: they never feed back into status
//! determination, which uses the normalizer's threshold alone.

use serde::{Deserialize, Serialize};

use crate::response::{ConflictResult, ResolutionStatus};

/// Lower bound of the high tier.
pub const HIGH_TIER_FLOOR: f64 = 0.8;
/// Lower bound of the medium tier.
pub const MEDIUM_TIER_FLOOR: f64 = 0.5;

/// Display bucket for a confidence score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConfidenceTier {
    High,
    Medium,
    Low,
}

impl ConfidenceTier {
    pub fn from_confidence(confidence: f64) -> Self {
        if confidence >= HIGH_TIER_FLOOR {
            Self::High
        } else if confidence >= MEDIUM_TIER_FLOOR {
            Self::Medium
        } else {
            Self::Low
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::High => "High",
            Self::Medium => "Medium",
            Self::Low => "Low",
        }
    }

    /// What the user should do with a merge in this tier.
    pub fn guidance(&self) -> &'static str {
        match self {
            Self::High => "Auto-apply recommended",
            Self::Medium => "Review suggested before applying",
            Self::Low => "Manual resolution recommended",
        }
    }
}

impl std::fmt::Display for ConfidenceTier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// Confidence as a rounded percentage, clamped to `0..=100`.
pub fn confidence_percent(confidence: f64) -> u32 {
    (confidence * 100.0).round().clamp(0.0, 100.0) as u32
}

/// One-line summary of a result for display.
pub fn status_message(result: &ConflictResult) -> String {
    let percent = confidence_percent(result.confidence);
    let tier = ConfidenceTier::from_confidence(result.confidence);
    match result.status {
        ResolutionStatus::Success if tier == ConfidenceTier::High => {
            format!("High confidence merge ({}%) - {}", percent, tier.guidance())
        }
        ResolutionStatus::Success => format!("Merge completed successfully ({}%)", percent),
        ResolutionStatus::LowConfidence => format!(
            "{} confidence merge ({}%) - {}",
            tier.label(),
            percent,
            tier.guidance()
        ),
        ResolutionStatus::Unresolved => {
            "Conflict markers remain in the merged result - manual resolution required".to_string()
        }
        ResolutionStatus::AiFailed => {
            "The AI workflow did not produce merged code".to_string()
        }
        ResolutionStatus::Fallback => {
            format!("Fallback merge using the incoming version ({}%)", percent)
        }
    }
}

/// Gate for one-click application of the AI merge.
pub fn auto_apply_recommended(result: &ConflictResult, threshold: f64) -> bool {
    result.status == ResolutionStatus::Success
        && result.has_merged_code()
        && result.is_high_confidence(threshold)
}
