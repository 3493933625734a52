// src/handlers/submission.rs

use std::sync::Arc;

use axum::{Json, body::Bytes, extract::State, response::IntoResponse};
use serde_json::{Value, json};

use crate::{
    error::AppError, models::submission::Submission, services::recorder::SubmissionRecorder,
};

/// Stores a finished quiz in the results sheet.
///
/// Responds with success even when the result could not be written; the
/// reason is reported in `warning`. Only a body that is not JSON at all is
/// rejected (400); field types are never checked.
pub async fn submit_user_data(
    State(recorder): State<Arc<SubmissionRecorder>>,
    body: Bytes,
) -> Result<impl IntoResponse, AppError> {
    let payload: Value = serde_json::from_slice(&body)?;
    let submission = Submission::from_json(payload);

    let ack = recorder.record(&submission).await;

    let mut body = json!({
        "success": true,
        "message": "Quiz result received",
        "persisted": ack.persisted,
    });
    if let Some(warning) = ack.warning {
        body["warning"] = json!(warning);
    }

    Ok(Json(body))
}
