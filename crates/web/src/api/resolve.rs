//! Conflict resolution proxy.
//!
//! Forwards one conflict to the AI workflow and answers with the normalized
//! result, so the browser never talks to the workflow directly.

use std::sync::Arc;

use axum::extract::State;
use axum::routing::post;
use axum::{Json, Router};
use serde::Deserialize;
use tracing::info;

use mergesense_core::response::ConflictResult;
use mergesense_core::webhook::DEFAULT_FILE_NAME;

use crate::api::status::AppError;
use crate::AppState;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResolveConflictRequest {
    #[serde(default)]
    pub file_name: Option<String>,
    #[serde(default)]
    pub conflict_text: String,
}

pub fn routes() -> Router<Arc<AppState>> {
    Router::new().route("/api/resolve-conflict", post(resolve_conflict))
}

async fn resolve_conflict(
    State(state): State<Arc<AppState>>,
    Json(body): Json<ResolveConflictRequest>,
) -> Result<Json<ConflictResult>, AppError> {
    if body.conflict_text.trim().is_empty() {
        return Err(AppError::BadRequest("conflictText must not be empty".into()));
    }

    let file_name = body
        .file_name
        .as_deref()
        .map(str::trim)
        .filter(|name| !name.is_empty())
        .unwrap_or(DEFAULT_FILE_NAME);

    let result = state
        .client
        .resolve(file_name, &body.conflict_text, &state.normalizer)
        .await?;

    info!(
        file_name,
        status = %result.status,
        confidence = result.confidence,
        "resolve-conflict completed"
    );
    Ok(Json(result))
}
