//! # GET /api/health

use std::sync::Arc;

use axum::extract::State;
use axum::Json;

use launchpad_types::HealthResponse;

use crate::config::AppState;

/// GET /api/health — 死活確認。決して失敗しない。
pub async fn handle_health(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        timestamp: chrono::Utc::now().to_rfc3339(),
        storage_mode: state.storage_mode.to_string(),
        submission_mode: state.config.submission_mode.as_str().to_string(),
    })
}
