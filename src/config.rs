// src/config.rs

use std::env;
use std::path::PathBuf;
use dotenvy::dotenv;

pub const DEFAULT_QUESTIONS_RANGE: &str = "Questions!A:G";
pub const DEFAULT_RESULTS_RANGE: &str = "Results!A:H";
pub const DEFAULT_CACHE_TTL_SECS: u64 = 5 * 60;

#[derive(Debug, Clone)]
pub struct Config {
    /// Target spreadsheet. Without it the service runs unconfigured.
    pub spreadsheet_id: Option<String>,
    /// Inline service-account key (JSON text).
    pub credentials_json: Option<String>,
    /// Path to a service-account key file.
    pub credentials_path: Option<PathBuf>,
    pub questions_range: String,
    pub results_range: String,
    pub cache_ttl_secs: u64,
    pub sheets_timeout_secs: u64,
    pub port: u16,
    pub cors_origins: Vec<String>,
    pub rust_log: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            spreadsheet_id: None,
            credentials_json: None,
            credentials_path: None,
            questions_range: DEFAULT_QUESTIONS_RANGE.to_string(),
            results_range: DEFAULT_RESULTS_RANGE.to_string(),
            cache_ttl_secs: DEFAULT_CACHE_TTL_SECS,
            sheets_timeout_secs: 10,
            port: 3000,
            cors_origins: vec![
                "http://localhost:3000".to_string(),
                "http://127.0.0.1:3000".to_string(),
            ],
            rust_log: "info".to_string(),
        }
    }
}

impl Config {
    pub fn from_env() -> Self {
        dotenv().ok();

        let defaults = Self::default();

        let spreadsheet_id = non_empty_var("GOOGLE_SHEET_ID");
        let credentials_json = non_empty_var("GOOGLE_CREDENTIALS");
        let credentials_path = non_empty_var("GOOGLE_APPLICATION_CREDENTIALS").map(PathBuf::from);

        let questions_range =
            non_empty_var("QUESTIONS_RANGE").unwrap_or(defaults.questions_range);
        let results_range = non_empty_var("RESULTS_RANGE").unwrap_or(defaults.results_range);

        let cache_ttl_secs = parsed_var("CACHE_TTL_SECS").unwrap_or(defaults.cache_ttl_secs);
        let sheets_timeout_secs =
            parsed_var("SHEETS_TIMEOUT_SECS").unwrap_or(defaults.sheets_timeout_secs);
        let port = parsed_var("PORT").unwrap_or(defaults.port);

        let cors_origins = non_empty_var("CORS_ORIGINS")
            .map(|v| {
                v.split(',')
                    .map(|o| o.trim().to_string())
                    .filter(|o| !o.is_empty())
                    .collect()
            })
            .unwrap_or(defaults.cors_origins);

        let rust_log = env::var("RUST_LOG")
            .unwrap_or_else(|_| "info".to_string());

        Self {
            spreadsheet_id,
            credentials_json,
            credentials_path,
            questions_range,
            results_range,
            cache_ttl_secs,
            sheets_timeout_secs,
            port,
            cors_origins,
            rust_log,
        }
    }
}

pub(crate) fn non_empty_var(key: &str) -> Option<String> {
    env::var(key)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn parsed_var<T: std::str::FromStr>(key: &str) -> Option<T> {
    let raw = non_empty_var(key)?;
    match raw.parse() {
        Ok(value) => Some(value),
        Err(_) => {
            tracing::warn!("Ignoring invalid value for {}: {:?}", key, raw);
            None
        }
    }
}
