// src/sheets/fake.rs

//! In-memory spreadsheet backend for tests. Not selected by the binary.

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::Mutex;

use super::auth::ServiceAccountKey;
use super::{Row, SheetsBackend, SheetsConnector, SheetsError};

#[derive(Default)]
pub struct FakeSheets {
    pub ranges: Mutex<HashMap<String, Vec<Row>>>,
    pub appended: Mutex<Vec<(String, Row)>>,
    pub read_calls: AtomicU64,
    pub verify_calls: AtomicU64,
    pub fail_verify: AtomicBool,
    pub fail_reads: AtomicBool,
    pub fail_appends: AtomicBool,
    /// Artificial latency for reads, to widen race windows in tests.
    pub read_delay: Option<Duration>,
}

impl FakeSheets {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn with_read_delay(delay: Duration) -> Arc<Self> {
        Arc::new(Self {
            read_delay: Some(delay),
            ..Self::default()
        })
    }

    pub async fn set_rows(&self, range: &str, rows: Vec<Row>) {
        self.ranges.lock().await.insert(range.to_string(), rows);
    }

    pub fn reads(&self) -> u64 {
        self.read_calls.load(Ordering::SeqCst)
    }

    pub fn set_failing_reads(&self, failing: bool) {
        self.fail_reads.store(failing, Ordering::SeqCst);
    }

    pub fn set_failing_appends(&self, failing: bool) {
        self.fail_appends.store(failing, Ordering::SeqCst);
    }

    fn unavailable() -> SheetsError {
        SheetsError::Status {
            status: 503,
            body: "backend unavailable".to_string(),
        }
    }
}

#[async_trait]
impl SheetsBackend for FakeSheets {
    async fn verify(&self) -> Result<(), SheetsError> {
        self.verify_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_verify.load(Ordering::SeqCst) {
            return Err(Self::unavailable());
        }
        Ok(())
    }

    async fn read(&self, range: &str) -> Result<Vec<Row>, SheetsError> {
        self.read_calls.fetch_add(1, Ordering::SeqCst);
        if let Some(delay) = self.read_delay {
            tokio::time::sleep(delay).await;
        }
        if self.fail_reads.load(Ordering::SeqCst) {
            return Err(Self::unavailable());
        }
        Ok(self.ranges.lock().await.get(range).cloned().unwrap_or_default())
    }

    async fn append(&self, range: &str, row: Row) -> Result<(), SheetsError> {
        if self.fail_appends.load(Ordering::SeqCst) {
            return Err(Self::unavailable());
        }
        self.appended.lock().await.push((range.to_string(), row));
        Ok(())
    }
}

/// Hands out the same [`FakeSheets`] for every key.
pub struct FakeConnector {
    pub sheets: Arc<FakeSheets>,
    pub connects: AtomicU64,
}

impl FakeConnector {
    pub fn new(sheets: Arc<FakeSheets>) -> Arc<Self> {
        Arc::new(Self {
            sheets,
            connects: AtomicU64::new(0),
        })
    }
}

impl SheetsConnector for FakeConnector {
    fn connect(
        &self,
        _spreadsheet_id: &str,
        _key: ServiceAccountKey,
    ) -> Result<Arc<dyn SheetsBackend>, SheetsError> {
        self.connects.fetch_add(1, Ordering::SeqCst);
        Ok(self.sheets.clone())
    }
}
