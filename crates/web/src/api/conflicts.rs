//! Conflict-marker extraction endpoint.

use std::sync::Arc;

use axum::routing::post;
use axum::{Json, Router};
use serde::{Deserialize, Serialize};

use mergesense_core::conflict::{ConflictExtractor, ConflictRegion};

use crate::AppState;

// ---------------------------------------------------------------------------
// Request / response types
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
pub struct ExtractRequest {
    #[serde(default)]
    pub text: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ExtractResponse {
    has_conflict_markers: bool,
    conflicts: Vec<ConflictRegion>,
}

// ---------------------------------------------------------------------------
// Routes
// ---------------------------------------------------------------------------

pub fn routes() -> Router<Arc<AppState>> {
    Router::new().route("/api/conflicts/extract", post(extract_conflicts))
}

async fn extract_conflicts(Json(body): Json<ExtractRequest>) -> Json<ExtractResponse> {
    let has_conflict_markers = ConflictExtractor::has_conflict_markers(&body.text);
    let conflicts = if has_conflict_markers {
        ConflictExtractor::extract_conflicts(&body.text)
    } else {
        Vec::new()
    };
    Json(ExtractResponse {
        has_conflict_markers,
        conflicts,
    })
}
