// src/handlers/quiz.rs

use std::sync::Arc;

use axum::{
    Json,
    extract::{Path, Query, State, rejection::QueryRejection},
    response::IntoResponse,
};
use serde::Deserialize;
use serde_json::json;

use crate::{error::AppError, services::cache::QuestionCache};

/// Query parameters for listing questions.
#[derive(Debug, Deserialize)]
pub struct ListParams {
    /// Maximum number of questions to return; all when absent.
    pub count: Option<usize>,
}

/// Lists cached questions, refreshing from the sheet when stale.
pub async fn list_questions(
    State(cache): State<Arc<QuestionCache>>,
    params: Result<Query<ListParams>, QueryRejection>,
) -> Result<impl IntoResponse, AppError> {
    let Query(params) = params?;
    let snapshot = cache.snapshot().await?;

    let limit = params.count.unwrap_or(snapshot.questions.len());
    let questions: Vec<_> = snapshot.questions.iter().take(limit).collect();

    Ok(Json(json!({
        "success": true,
        "count": questions.len(),
        "total": snapshot.questions.len(),
        "questions": questions,
    })))
}

/// Retrieves a single question by ID.
pub async fn get_question(
    State(cache): State<Arc<QuestionCache>>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let not_found = || AppError::NotFound(format!("Question {} not found", id));

    let id: u32 = id.parse().map_err(|_| not_found())?;
    let snapshot = cache.snapshot().await?;
    let question = snapshot.question(id).ok_or_else(not_found)?;

    Ok(Json(json!({
        "success": true,
        "question": question,
    })))
}

/// Question counts per weightage plus the time of the last refresh.
pub async fn question_stats(
    State(cache): State<Arc<QuestionCache>>,
) -> Result<impl IntoResponse, AppError> {
    let snapshot = cache.snapshot().await?;

    Ok(Json(json!({
        "success": true,
        "stats": snapshot.stats(),
    })))
}

/// Forces the cache to re-read the sheet.
pub async fn refresh_questions(
    State(cache): State<Arc<QuestionCache>>,
) -> Result<impl IntoResponse, AppError> {
    let snapshot = cache.refresh().await?;

    Ok(Json(json!({
        "success": true,
        "message": "Questions refreshed",
        "count": snapshot.questions.len(),
        "lastRefresh": snapshot.fetched_at,
    })))
}
