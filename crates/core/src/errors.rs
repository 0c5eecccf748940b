//! Error types for the MergeSense core library.
//!
//! Each subsystem has its own error type derived with `thiserror`, and a
//! top-level [`CoreError`] enum unifies them for callers that want a single
//! error type.

use thiserror::Error;

// ---------------------------------------------------------------------------
// Top-level error
// ---------------------------------------------------------------------------

/// Unified error type for the core library.
#[derive(Debug, Error)]
pub enum CoreError {
    #[error(transparent)]
    Webhook(#[from] WebhookError),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Resolution(#[from] ResolutionError),
}

// ---------------------------------------------------------------------------
// Webhook errors
// ---------------------------------------------------------------------------

/// Errors from calling the AI merge workflow.
///
/// Messages are written to be shown to the user as-is, so each one names
/// the likely fix.
#[derive(Debug, Error)]
pub enum WebhookError {
    /// The request did not complete within the configured timeout.
    #[error(
        "webhook request timed out after {timeout_ms}ms; the workflow may be overloaded, \
         try again or raise webhook.timeout_ms"
    )]
    Timeout { timeout_ms: u64 },

    /// No connection could be made to the webhook host.
    #[error(
        "cannot reach webhook at {url}: {detail}; check that the workflow service is running, \
         the URL is correct, and no firewall blocks the connection"
    )]
    Unreachable { url: String, detail: String },

    /// The webhook rejected our credentials.
    #[error("webhook authentication failed (HTTP {status}); check the configured API key")]
    AuthenticationFailed { status: u16 },

    /// The webhook path does not exist.
    #[error("webhook endpoint not found at {url}; check the webhook URL and that the workflow is active")]
    NotFound { url: String },

    /// The workflow itself failed.
    #[error("webhook server error (HTTP {status}): {body}")]
    ServerError { status: u16, body: String },

    /// Any other non-success status.
    #[error("webhook returned unexpected HTTP {status}: {body}")]
    UnexpectedStatus { status: u16, body: String },

    /// A success status with a body that is not JSON.
    #[error(
        "webhook returned a response that is not valid JSON ({detail}): {body}; \
         check that the URL points at the workflow and not at a proxy or login page"
    )]
    InvalidBody { body: String, detail: String },

    /// The HTTP client could not be constructed.
    #[error("failed to build webhook HTTP client: {0}")]
    ClientBuild(String),

    /// Transport error not covered by a more specific variant.
    #[error("webhook HTTP error: {0}")]
    Http(#[from] reqwest::Error),
}

// ---------------------------------------------------------------------------
// Configuration errors
// ---------------------------------------------------------------------------

/// Errors from configuration loading and validation.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Config file not found.
    #[error("configuration file not found: {0}")]
    FileNotFound(String),

    /// TOML parse error.
    #[error("configuration parse error: {0}")]
    ParseError(String),

    /// A config value is invalid.
    #[error("invalid configuration value for '{field}': {detail}")]
    InvalidValue { field: String, detail: String },

    /// Generic I/O error reading or writing the config file.
    #[error("configuration I/O error: {0}")]
    IoError(#[from] std::io::Error),
}

// ---------------------------------------------------------------------------
// Resolution errors
// ---------------------------------------------------------------------------

/// Errors from applying a resolution to a conflicted buffer.
#[derive(Debug, Error)]
pub enum ResolutionError {
    /// The AI merge was requested but no usable merged code is available.
    #[error("no usable AI merge to apply (status: {0})")]
    NoMergedCode(String),

    /// The region does not fit the buffer it is being applied to.
    #[error("conflict region {start_line}..={end_line} is outside the buffer ({lines} lines)")]
    RegionOutOfBounds {
        start_line: usize,
        end_line: usize,
        lines: usize,
    },
}
