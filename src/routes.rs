// src/routes.rs

use axum::{
    Router,
    http::{HeaderValue, Method, header},
    routing::{get, post},
};
use tower::ServiceBuilder;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::{
    handlers::{health, quiz, submission},
    state::AppState,
};

/// Assembles the main application router.
///
/// * Question routes are served from the question cache.
/// * Applies global middleware (Trace, CORS).
/// * Injects global state (cache, recorder, connection).
pub fn create_router(state: AppState) -> Router {
    let origins: Vec<HeaderValue> = state
        .config
        .cors_origins
        .iter()
        .filter_map(|origin| match origin.parse() {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!("Ignoring invalid CORS origin: {}", origin);
                None
            }
        })
        .collect();

    let cors = CorsLayer::new()
        .allow_origin(origins)
        .allow_methods([Method::GET, Method::POST])
        .allow_headers([header::CONTENT_TYPE]);

    // Static segments take precedence over `{id}`.
    Router::new()
        .route("/health", get(health::health))
        .route("/questions", get(quiz::list_questions))
        .route("/questions/stats", get(quiz::question_stats))
        .route("/questions/refresh", post(quiz::refresh_questions))
        .route("/questions/{id}", get(quiz::get_question))
        .route("/user-data", post(submission::submit_user_data))
        // Global Middleware (applied from outside in)
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(cors),
        )
        .with_state(state)
}
