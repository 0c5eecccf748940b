//! Conflict-block extraction.
//!
//! Scans a text buffer for Git-style conflict blocks and returns them as
//! structured [`ConflictRegion`] records in the order they appear.

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use super::markers;

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// One delimited conflict inside a text buffer.
///
/// Line indices are zero-based and inclusive: `start_line` is the
/// `<<<<<<<` line and `end_line` is the `>>>>>>>` line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConflictRegion {
    /// Line index of the opening marker.
    pub start_line: usize,
    /// Line index of the closing marker.
    pub end_line: usize,
    /// Label after the opening marker (trimmed, may be empty).
    pub head_branch: String,
    /// Label after the closing marker (trimmed, may be empty).
    pub incoming_branch: String,
    /// Lines strictly between the opening marker and the separator.
    pub head_content: String,
    /// Lines strictly between the separator and the closing marker.
    pub incoming_content: String,
    /// The exact original text from `start_line` to `end_line` inclusive.
    pub full_conflict: String,
}

// ---------------------------------------------------------------------------
// Extractor
// ---------------------------------------------------------------------------

/// Stateless conflict extractor.
pub struct ConflictExtractor;

impl ConflictExtractor {
    /// Fast pre-check: `true` when a start line, a separator line, and an end
    /// line all occur somewhere in `text`, in any order.
    pub fn has_conflict_markers(text: &str) -> bool {
        let (mut start, mut separator, mut end) = (false, false, false);
        for line in text.split('\n') {
            start = start || markers::match_start(line).is_some();
            separator = separator || markers::is_separator(line);
            end = end || markers::match_end(line).is_some();
            if start && separator && end {
                return true;
            }
        }
        false
    }

    /// Extract every well-formed conflict block from `text`.
    ///
    /// Scanning stops at the first block that is missing its separator or
    /// end marker; regions found before that point are still returned.
    pub fn extract_conflicts(text: &str) -> Vec<ConflictRegion> {
        let lines: Vec<&str> = text.split('\n').collect();
        let mut regions = Vec::new();
        let mut i = 0;

        while i < lines.len() {
            let Some(head_branch) = markers::match_start(lines[i]) else {
                i += 1;
                continue;
            };
            let start_line = i;

            let Some(separator_line) = (start_line + 1..lines.len())
                .find(|&idx| markers::is_separator(lines[idx]))
            else {
                warn!(start_line, "conflict block has no separator, stopping scan");
                break;
            };

            let Some((end_line, incoming_branch)) = (separator_line + 1..lines.len())
                .find_map(|idx| markers::match_end(lines[idx]).map(|label| (idx, label)))
            else {
                warn!(start_line, "conflict block has no end marker, stopping scan");
                break;
            };

            debug!(start_line, separator_line, end_line, "conflict block found");
            regions.push(ConflictRegion {
                start_line,
                end_line,
                head_branch,
                incoming_branch,
                head_content: lines[start_line + 1..separator_line].join("\n"),
                incoming_content: lines[separator_line + 1..end_line].join("\n"),
                full_conflict: lines[start_line..=end_line].join("\n"),
            });

            i = end_line + 1;
        }

        info!(count = regions.len(), "conflict extraction complete");
        regions
    }

    /// Return `text` with the region's lines replaced by `replacement`.
    ///
    /// Lines outside `start_line..=end_line` are left byte-for-byte intact.
    pub fn replace_region(text: &str, region: &ConflictRegion, replacement: &str) -> String {
        let lines: Vec<&str> = text.split('\n').collect();
        let end = region.end_line.min(lines.len().saturating_sub(1));
        let start = region.start_line.min(end);

        let mut out: Vec<&str> = Vec::with_capacity(lines.len());
        out.extend_from_slice(&lines[..start]);
        out.push(replacement);
        out.extend_from_slice(&lines[end + 1..]);
        out.join("\n")
    }
}
