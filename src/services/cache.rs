// src/services/cache.rs

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use tokio::sync::{Mutex, RwLock};
use tokio::time::Instant;

use super::connection::SheetsConnection;
use super::transform::transform;
use crate::error::AppError;
use crate::models::question::{Question, QuestionStats, WeightageBreakdown};

/// Questions as of one successful fetch. Never mutated once built.
#[derive(Debug, Default)]
pub struct Snapshot {
    pub questions: Vec<Question>,
    pub fetched_at: Option<DateTime<Utc>>,
}

impl Snapshot {
    pub fn question(&self, id: u32) -> Option<&Question> {
        self.questions.iter().find(|q| q.id == id)
    }

    pub fn stats(&self) -> QuestionStats {
        let mut by_weightage = WeightageBreakdown::default();
        for q in &self.questions {
            match q.weightage {
                5 => by_weightage.easy += 1,
                10 => by_weightage.medium += 1,
                20 => by_weightage.hard += 1,
                _ => by_weightage.other += 1,
            }
        }
        QuestionStats {
            total: self.questions.len(),
            by_weightage,
            last_refresh: self.fetched_at,
        }
    }
}

struct CacheState {
    snapshot: Arc<Snapshot>,
    /// `None` while empty or after an explicit invalidation.
    expires_at: Option<Instant>,
}

/// Time-bounded cache of the question sheet.
///
/// A fresh snapshot is served without I/O. Otherwise the sheet is read
/// again; if that is impossible the previous snapshot is served as long as
/// it has questions. Refreshes are serialized so concurrent misses share a
/// single upstream read.
pub struct QuestionCache {
    connection: Arc<SheetsConnection>,
    range: String,
    ttl: Duration,
    state: RwLock<CacheState>,
    refresh_gate: Mutex<()>,
}

impl QuestionCache {
    pub fn new(connection: Arc<SheetsConnection>, range: impl Into<String>, ttl: Duration) -> Self {
        Self {
            connection,
            range: range.into(),
            ttl,
            state: RwLock::new(CacheState {
                snapshot: Arc::new(Snapshot::default()),
                expires_at: None,
            }),
            refresh_gate: Mutex::new(()),
        }
    }

    pub async fn get_questions(&self) -> Result<Vec<Question>, AppError> {
        Ok(self.snapshot().await?.questions.clone())
    }

    /// Current snapshot, refreshing it first when stale.
    pub async fn snapshot(&self) -> Result<Arc<Snapshot>, AppError> {
        if let Some(snapshot) = self.fresh().await {
            return Ok(snapshot);
        }

        let _gate = self.refresh_gate.lock().await;
        // Another caller may have refreshed while we waited.
        if let Some(snapshot) = self.fresh().await {
            return Ok(snapshot);
        }
        self.refresh_locked().await
    }

    /// Drops freshness and reads the sheet again regardless of age.
    pub async fn refresh(&self) -> Result<Arc<Snapshot>, AppError> {
        let _gate = self.refresh_gate.lock().await;
        self.state.write().await.expires_at = None;
        tracing::info!("Question cache invalidated");
        self.refresh_locked().await
    }

    /// Last snapshot without triggering a refresh.
    pub async fn peek(&self) -> Arc<Snapshot> {
        self.state.read().await.snapshot.clone()
    }

    async fn fresh(&self) -> Option<Arc<Snapshot>> {
        let state = self.state.read().await;
        match state.expires_at {
            Some(expires_at) if Instant::now() < expires_at => Some(state.snapshot.clone()),
            _ => None,
        }
    }

    async fn refresh_locked(&self) -> Result<Arc<Snapshot>, AppError> {
        let Some(backend) = self.connection.backend().await else {
            tracing::warn!("Google Sheets unavailable; cannot refresh questions");
            return self.fallback().await;
        };

        let rows = match backend.read(&self.range).await {
            Ok(rows) => rows,
            Err(e) => {
                tracing::error!("Failed to fetch questions from {}: {}", self.range, e);
                return self.fallback().await;
            }
        };

        let questions = transform(&rows);
        tracing::info!(
            "Loaded {} questions from {} rows of {}",
            questions.len(),
            rows.len(),
            self.range
        );

        let snapshot = Arc::new(Snapshot {
            questions,
            fetched_at: Some(Utc::now()),
        });
        let mut state = self.state.write().await;
        state.snapshot = snapshot.clone();
        state.expires_at = Some(Instant::now() + self.ttl);
        Ok(snapshot)
    }

    async fn fallback(&self) -> Result<Arc<Snapshot>, AppError> {
        let snapshot = self.peek().await;
        if snapshot.questions.is_empty() {
            return Err(AppError::NoSourceAvailable);
        }
        tracing::warn!("Serving {} cached questions", snapshot.questions.len());
        Ok(snapshot)
    }
}
