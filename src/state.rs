use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::config::Config;
use crate::services::{
    cache::QuestionCache,
    connection::SheetsConnection,
    credentials::{CredentialProvider, CredentialResolver},
    recorder::SubmissionRecorder,
};
use crate::sheets::SheetsConnector;
use axum::extract::FromRef;

#[derive(Clone)]
pub struct AppState {
    pub config: Config,
    pub connection: Arc<SheetsConnection>,
    pub cache: Arc<QuestionCache>,
    pub recorder: Arc<SubmissionRecorder>,
    pub started_at: Instant,
}

impl AppState {
    /// Wires the cache and recorder to one shared spreadsheet connection.
    pub fn new(
        config: Config,
        credentials: Arc<dyn CredentialProvider>,
        connector: Arc<dyn SheetsConnector>,
    ) -> Self {
        let resolver = CredentialResolver::new(credentials, connector);
        let connection = Arc::new(SheetsConnection::new(resolver));
        let cache = Arc::new(QuestionCache::new(
            connection.clone(),
            config.questions_range.clone(),
            Duration::from_secs(config.cache_ttl_secs),
        ));
        let recorder = Arc::new(SubmissionRecorder::new(
            connection.clone(),
            config.results_range.clone(),
        ));

        Self {
            config,
            connection,
            cache,
            recorder,
            started_at: Instant::now(),
        }
    }
}

impl FromRef<AppState> for Arc<QuestionCache> {
    fn from_ref(state: &AppState) -> Self {
        state.cache.clone()
    }
}

impl FromRef<AppState> for Arc<SubmissionRecorder> {
    fn from_ref(state: &AppState) -> Self {
        state.recorder.clone()
    }
}
