//! Git conflict-marker tokens and line predicates.
//!
//! Two kinds of checks live here:
//! - a cheap substring test for any marker token, used when judging whether
//!   merged output still carries an unresolved conflict;
//! - anchored per-line patterns used by the extractor to find the start,
//!   separator, and end lines of a conflict block.

use std::sync::LazyLock;

use regex_lite::Regex;

/// Opening marker (`<<<<<<< HEAD`).
pub const START_TOKEN: &str = "<<<<<<<";
/// Separator between the head and incoming sides.
pub const SEPARATOR_TOKEN: &str = "=======";
/// Closing marker (`>>>>>>> feature`).
pub const END_TOKEN: &str = ">>>>>>>";

/// All three tokens, in block order.
pub const MARKER_TOKENS: [&str; 3] = [START_TOKEN, SEPARATOR_TOKEN, END_TOKEN];

static START_LINE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^<<<<<<< (.+)$").expect("start marker pattern is valid"));
static SEPARATOR_LINE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^=======$").expect("separator pattern is valid"));
static END_LINE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^>>>>>>> (.+)$").expect("end marker pattern is valid"));

/// Return `true` if `text` contains any of the three marker tokens anywhere.
pub fn contains_marker_token(text: &str) -> bool {
    MARKER_TOKENS.iter().any(|token| text.contains(token))
}

/// Strip a trailing carriage return so CRLF buffers match like LF ones.
fn bare(line: &str) -> &str {
    line.strip_suffix('\r').unwrap_or(line)
}

/// If `line` is a start marker, return its trimmed branch label.
pub fn match_start(line: &str) -> Option<String> {
    START_LINE
        .captures(bare(line))
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().trim().to_string())
}

/// Return `true` if `line` is exactly the separator.
pub fn is_separator(line: &str) -> bool {
    SEPARATOR_LINE.is_match(bare(line))
}

/// If `line` is an end marker, return its trimmed branch label.
pub fn match_end(line: &str) -> Option<String> {
    END_LINE
        .captures(bare(line))
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().trim().to_string())
}
