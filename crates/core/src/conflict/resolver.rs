//! Conflict resolution actions.
//!
//! The [`ConflictResolver`] turns a user's choice (accept head, accept
//! incoming, or accept the AI merge) into replacement text and applies it to
//! the buffer the conflict was extracted from.

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::errors::ResolutionError;
use crate::response::{ConflictResult, ResolutionStatus};

use super::extractor::{ConflictExtractor, ConflictRegion};

/// Named resolution strategies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Resolution {
    /// Keep the head side of the conflict.
    AcceptHead,
    /// Keep the incoming side of the conflict.
    AcceptIncoming,
    /// Use the normalized AI merge.
    AcceptMerged,
}

impl std::fmt::Display for Resolution {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::AcceptHead => write!(f, "accept_head"),
            Self::AcceptIncoming => write!(f, "accept_incoming"),
            Self::AcceptMerged => write!(f, "accept_merged"),
        }
    }
}

/// Stateless conflict resolution operations.
pub struct ConflictResolver;

impl ConflictResolver {
    /// Get the content that should replace the conflict block.
    ///
    /// The AI merge is only offered when it carries merged code and its
    /// status is not `unresolved` or `ai_failed`.
    pub fn resolved_content(
        resolution: Resolution,
        region: &ConflictRegion,
        result: Option<&ConflictResult>,
    ) -> Option<String> {
        match resolution {
            Resolution::AcceptHead => Some(region.head_content.clone()),
            Resolution::AcceptIncoming => Some(region.incoming_content.clone()),
            Resolution::AcceptMerged => result
                .filter(|r| {
                    r.has_merged_code()
                        && !matches!(
                            r.status,
                            ResolutionStatus::Unresolved | ResolutionStatus::AiFailed
                        )
                })
                .map(|r| r.merged_code.clone()),
        }
    }

    /// Apply a resolution to `text`, replacing the region's lines.
    pub fn apply(
        text: &str,
        region: &ConflictRegion,
        resolution: Resolution,
        result: Option<&ConflictResult>,
    ) -> Result<String, ResolutionError> {
        info!(
            start_line = region.start_line,
            end_line = region.end_line,
            %resolution,
            "applying conflict resolution"
        );

        let lines = text.split('\n').count();
        if region.end_line >= lines || region.start_line > region.end_line {
            return Err(ResolutionError::RegionOutOfBounds {
                start_line: region.start_line,
                end_line: region.end_line,
                lines,
            });
        }

        let replacement = Self::resolved_content(resolution, region, result).ok_or_else(|| {
            ResolutionError::NoMergedCode(
                result
                    .map(|r| r.status.to_string())
                    .unwrap_or_else(|| "missing".to_string()),
            )
        })?;

        debug!(len = replacement.len(), "replacement content resolved");
        Ok(ConflictExtractor::replace_region(text, region, &replacement))
    }
}
