// src/handlers/health.rs

use axum::{Json, extract::State, response::IntoResponse};
use serde_json::json;

use crate::state::AppState;

/// Liveness plus whether the spreadsheet is currently reachable.
pub async fn health(State(state): State<AppState>) -> impl IntoResponse {
    let configured = state.connection.is_configured().await;
    let snapshot = state.cache.peek().await;

    Json(json!({
        "success": true,
        "status": "ok",
        "configured": configured,
        "cachedQuestions": snapshot.questions.len(),
        "lastRefresh": snapshot.fetched_at,
        "uptimeSeconds": state.started_at.elapsed().as_secs(),
        "timestamp": chrono::Utc::now(),
    }))
}
