//! HTTP client for the AI merge workflow.
//!
//! Sends one conflict to the configured webhook and hands the decoded reply
//! to the [`ResponseNormalizer`]. Transport and status failures are reported
//! as [`WebhookError`] and never reach the normalizer.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, info, instrument, warn};

use crate::config::WebhookConfig;
use crate::errors::WebhookError;
use crate::response::{ConflictResult, ResponseNormalizer};

/// File name sent when the caller does not know one.
pub const DEFAULT_FILE_NAME: &str = "example.ts";

/// Longest body preview written to the debug log.
const BODY_PREVIEW_CHARS: usize = 200;

/// Request body posted to the workflow.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WebhookRequest {
    pub file_name: String,
    pub conflict_text: String,
}

impl WebhookRequest {
    pub fn new(file_name: impl Into<String>, conflict_text: impl Into<String>) -> Self {
        Self {
            file_name: file_name.into(),
            conflict_text: conflict_text.into(),
        }
    }
}

/// Asynchronous client for the conflict-resolution webhook.
#[derive(Clone)]
pub struct WebhookClient {
    http: reqwest::Client,
    url: String,
    api_key: Option<String>,
    timeout_ms: u64,
}

impl WebhookClient {
    /// Build a client from resolved webhook settings.
    pub fn new(config: &WebhookConfig) -> Result<Self, WebhookError> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_millis(config.timeout_ms))
            .user_agent(concat!("mergesense/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| WebhookError::ClientBuild(e.to_string()))?;

        let api_key = config
            .api_key
            .as_deref()
            .map(str::trim)
            .filter(|k| !k.is_empty())
            .map(str::to_string);

        let url = config.url.trim().to_string();
        info!(
            url = %url,
            timeout_ms = config.timeout_ms,
            has_api_key = api_key.is_some(),
            "created WebhookClient"
        );

        Ok(Self {
            http,
            url,
            api_key,
            timeout_ms: config.timeout_ms,
        })
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn timeout_ms(&self) -> u64 {
        self.timeout_ms
    }

    /// `true` when requests carry a bearer token.
    pub fn has_api_key(&self) -> bool {
        self.api_key.is_some()
    }

    /// Post a conflict and return the decoded reply body.
    ///
    /// An empty body decodes to `null`; a non-empty body that is not JSON is
    /// [`WebhookError::InvalidBody`].
    #[instrument(skip(self, request), fields(file_name = %request.file_name))]
    pub async fn send(&self, request: &WebhookRequest) -> Result<Value, WebhookError> {
        debug!(
            url = %self.url,
            conflict_len = request.conflict_text.len(),
            "posting conflict to webhook"
        );

        let mut req = self.http.post(&self.url).json(request);
        if let Some(ref key) = self.api_key {
            req = req.bearer_auth(key);
        }

        let resp = req.send().await.map_err(|e| self.classify(e))?;
        let status = resp.status();
        let body = resp.text().await.map_err(|e| self.classify(e))?;
        debug!(
            status = status.as_u16(),
            body_len = body.len(),
            preview = %preview(&body),
            "webhook responded"
        );

        self.check_status(status, &body)?;
        decode_body(&body)
    }

    /// Send a conflict and normalize the reply.
    #[instrument(skip(self, conflict_text, normalizer))]
    pub async fn resolve(
        &self,
        file_name: &str,
        conflict_text: &str,
        normalizer: &ResponseNormalizer,
    ) -> Result<ConflictResult, WebhookError> {
        let request = WebhookRequest::new(file_name, conflict_text);
        let raw = self.send(&request).await?;
        let mut result = normalizer.normalize(&raw);
        if result.file_name.is_none() {
            result.file_name = Some(request.file_name);
        }
        info!(status = %result.status, confidence = result.confidence, "conflict resolved by webhook");
        Ok(result)
    }

    /// Map a non-success status to a [`WebhookError`].
    fn check_status(&self, status: reqwest::StatusCode, body: &str) -> Result<(), WebhookError> {
        if status.is_success() {
            return Ok(());
        }
        let code = status.as_u16();
        warn!(status = code, "webhook returned error status");
        match code {
            401 | 403 => Err(WebhookError::AuthenticationFailed { status: code }),
            404 => Err(WebhookError::NotFound {
                url: self.url.clone(),
            }),
            500..=599 => Err(WebhookError::ServerError {
                status: code,
                body: preview(body),
            }),
            _ => Err(WebhookError::UnexpectedStatus {
                status: code,
                body: preview(body),
            }),
        }
    }

    /// Map a transport error to a [`WebhookError`].
    fn classify(&self, err: reqwest::Error) -> WebhookError {
        if err.is_timeout() {
            warn!(timeout_ms = self.timeout_ms, "webhook request timed out");
            WebhookError::Timeout {
                timeout_ms: self.timeout_ms,
            }
        } else if err.is_connect() {
            warn!(url = %self.url, "webhook unreachable");
            WebhookError::Unreachable {
                url: self.url.clone(),
                detail: root_cause(&err),
            }
        } else {
            WebhookError::Http(err)
        }
    }
}

/// Decode a webhook reply body: empty → `null`, otherwise it must be JSON.
pub fn decode_body(body: &str) -> Result<Value, WebhookError> {
    if body.trim().is_empty() {
        return Ok(Value::Null);
    }
    serde_json::from_str(body).map_err(|e| {
        warn!(error = %e, "webhook body is not JSON");
        WebhookError::InvalidBody {
            body: preview(body),
            detail: e.to_string(),
        }
    })
}

/// Decode a saved payload file. Unlike [`decode_body`], text that is not
/// JSON is kept as a string payload.
pub fn decode_saved_payload(text: &str) -> Value {
    if text.trim().is_empty() {
        return Value::Null;
    }
    serde_json::from_str(text).unwrap_or_else(|_| {
        debug!("saved payload is not JSON, treating as text");
        Value::String(text.to_string())
    })
}

fn preview(body: &str) -> String {
    let mut chars = body.chars();
    let head: String = chars.by_ref().take(BODY_PREVIEW_CHARS).collect();
    if chars.next().is_some() {
        format!("{}...", head)
    } else {
        head
    }
}

fn root_cause(err: &(dyn std::error::Error + 'static)) -> String {
    let mut current = err;
    while let Some(source) = current.source() {
        current = source;
    }
    current.to_string()
}
