// src/main.rs

use quiz_backend::config::Config;
use quiz_backend::routes;
use quiz_backend::services::credentials::EnvCredentialProvider;
use quiz_backend::sheets::client::GoogleSheetsConnector;
use quiz_backend::state::AppState;
use dotenvy::dotenv;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Load .env file (if present)
    dotenv().ok();

    // Load configuration from environment
    let config = Config::from_env();

    let file_appender = tracing_appender::rolling::daily("logs", "app.log");
    let (non_blocking, _guard) = tracing_appender::non_blocking(file_appender);
    let env_filter = EnvFilter::new(&config.rust_log);
    let stdout_layer = fmt::layer().with_writer(std::io::stdout).with_target(false);
    let file_layer = fmt::layer().with_writer(non_blocking).with_ansi(false);

    // Initialize Tracing (Logging)
    tracing_subscriber::registry()
        .with(env_filter)
        .with(stdout_layer)
        .with(file_layer)
        .init();

    let connector = GoogleSheetsConnector::new(Duration::from_secs(config.sheets_timeout_secs))?;

    // Create AppState; credentials are re-read from the environment on each resolution
    let state = AppState::new(config.clone(), Arc::new(EnvCredentialProvider), Arc::new(connector));

    // Warm the cache; failures are logged and retried on the first request.
    match state.cache.get_questions().await {
        Ok(questions) => tracing::info!("Question cache primed with {} questions", questions.len()),
        Err(e) => tracing::warn!("Starting with an empty question cache: {}", e),
    }

    // Create the Axum application router
    let app = routes::create_router(state);

    // Bind to the listening address
    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    tracing::info!("Quiz backend listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;

    // Start the server
    axum::serve(listener, app).await?;
    Ok(())
}
