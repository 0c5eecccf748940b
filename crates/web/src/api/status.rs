//! Status and health check endpoints, plus the shared API error type.

use std::sync::Arc;

use axum::extract::State;
use axum::http::StatusCode;
use axum::routing::get;
use axum::{Json, Router};
use serde::Serialize;
use tracing::warn;

use mergesense_core::errors::WebhookError;

use crate::AppState;

/// Health check response.
#[derive(Serialize)]
struct HealthResponse {
    ok: bool,
    version: String,
}

/// Effective runtime settings, without secrets.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct StatusResponse {
    version: String,
    webhook_url: String,
    has_api_key: bool,
    timeout_ms: u64,
    high_confidence_threshold: f64,
}

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/api/status", get(get_status))
        .route("/api/status/health", get(health_check))
}

async fn health_check() -> Json<HealthResponse> {
    Json(HealthResponse {
        ok: true,
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

async fn get_status(State(state): State<Arc<AppState>>) -> Json<StatusResponse> {
    Json(StatusResponse {
        version: env!("CARGO_PKG_VERSION").to_string(),
        webhook_url: state.client.url().to_string(),
        has_api_key: state.client.has_api_key(),
        timeout_ms: state.client.timeout_ms(),
        high_confidence_threshold: state.normalizer.options().high_confidence_threshold,
    })
}

// ---------------------------------------------------------------------------
// Shared error type for API handlers
// ---------------------------------------------------------------------------

/// Simple API error type that converts to an Axum response.
#[derive(Debug)]
pub enum AppError {
    BadRequest(String),
    /// The workflow answered badly or could not be reached.
    BadGateway(String),
    /// The workflow did not answer in time.
    GatewayTimeout(String),
    Internal(String),
}

impl From<WebhookError> for AppError {
    fn from(err: WebhookError) -> Self {
        warn!(error = %err, "webhook call failed");
        match err {
            WebhookError::Timeout { .. } => AppError::GatewayTimeout(err.to_string()),
            WebhookError::ClientBuild(_) => AppError::Internal(err.to_string()),
            _ => AppError::BadGateway(err.to_string()),
        }
    }
}

impl axum::response::IntoResponse for AppError {
    fn into_response(self) -> axum::response::Response {
        let (status, message) = match self {
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            AppError::BadGateway(msg) => (StatusCode::BAD_GATEWAY, msg),
            AppError::GatewayTimeout(msg) => (StatusCode::GATEWAY_TIMEOUT, msg),
            AppError::Internal(msg) => (StatusCode::INTERNAL_SERVER_ERROR, msg),
        };

        let body = serde_json::json!({ "error": message });
        (status, Json(body)).into_response()
    }
}
