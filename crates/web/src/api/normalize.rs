//! Normalization of raw workflow payloads posted by the client.

use std::sync::Arc;

use axum::extract::State;
use axum::routing::post;
use axum::{Json, Router};
use serde_json::Value;
use tracing::debug;

use mergesense_core::response::ConflictResult;

use crate::AppState;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new().route("/api/normalize", post(normalize_payload))
}

async fn normalize_payload(
    State(state): State<Arc<AppState>>,
    Json(raw): Json<Value>,
) -> Json<ConflictResult> {
    let result = state.normalizer.normalize(&raw);
    debug!(status = %result.status, "payload normalized");
    Json(result)
}
