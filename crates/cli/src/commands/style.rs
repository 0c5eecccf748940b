//! Shared styling utilities for CLI output.

use console::Style;

use mergesense_core::confidence::{confidence_percent, ConfidenceTier};
use mergesense_core::response::{ConflictResult, ResolutionStatus};

/// Create a success-styled string (green with checkmark).
pub fn success(msg: &str) -> String {
    let style = Style::new().green();
    format!("{} {}", style.apply_to("✓"), msg)
}

/// Create an error-styled string (red with cross).
pub fn error(msg: &str) -> String {
    let style = Style::new().red();
    format!("{} {}", style.apply_to("✗"), msg)
}

/// Create a warning-styled string (yellow).
pub fn warn(msg: &str) -> String {
    let style = Style::new().yellow();
    format!("{} {}", style.apply_to("⚠"), msg)
}

/// Create a header-styled string (bold, white).
pub fn header(msg: &str) -> String {
    let style = Style::new().bold();
    style.apply_to(msg).to_string()
}

/// Create a dim-styled string.
pub fn dim(msg: &str) -> String {
    let style = Style::new().dim();
    style.apply_to(msg).to_string()
}

fn tier_style(tier: ConfidenceTier) -> Style {
    match tier {
        ConfidenceTier::High => Style::new().green().bold(),
        ConfidenceTier::Medium => Style::new().yellow().bold(),
        ConfidenceTier::Low => Style::new().red().bold(),
    }
}

/// Confidence badge, e.g. `[High 92%]`, colored by tier.
pub fn confidence_badge(confidence: f64) -> String {
    let tier = ConfidenceTier::from_confidence(confidence);
    tier_style(tier)
        .apply_to(format!("[{} {}%]", tier.label(), confidence_percent(confidence)))
        .to_string()
}

/// Status line prefixed with a marker that matches the outcome.
pub fn status_line(result: &ConflictResult, msg: &str) -> String {
    match result.status {
        ResolutionStatus::Success => success(msg),
        ResolutionStatus::LowConfidence | ResolutionStatus::Fallback => warn(msg),
        ResolutionStatus::Unresolved | ResolutionStatus::AiFailed => error(msg),
    }
}
