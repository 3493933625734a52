// src/services/recorder.rs

use std::sync::Arc;

use super::connection::SheetsConnection;
use crate::models::submission::{Ack, Submission};
use crate::sheets::SheetsError;

pub const NOT_CONFIGURED_WARNING: &str =
    "Google Sheets is not configured; result was not persisted";

/// Appends quiz results to the results sheet on a best-effort basis.
pub struct SubmissionRecorder {
    connection: Arc<SheetsConnection>,
    range: String,
}

impl SubmissionRecorder {
    pub fn new(connection: Arc<SheetsConnection>, range: impl Into<String>) -> Self {
        Self {
            connection,
            range: range.into(),
        }
    }

    /// Never fails: write problems come back as a warning on the [`Ack`].
    pub async fn record(&self, submission: &Submission) -> Ack {
        match self.append(submission).await {
            Ok(true) => {
                tracing::info!("Recorded quiz result for {}", submission.display_name());
                Ack::persisted()
            }
            Ok(false) => {
                tracing::warn!("Quiz result received but Google Sheets is not configured");
                Ack::not_persisted(NOT_CONFIGURED_WARNING)
            }
            Err(e) => {
                tracing::warn!("Failed to append quiz result to {}: {}", self.range, e);
                Ack::not_persisted(format!("Result was not persisted: {}", e))
            }
        }
    }

    /// `Ok(false)` when there is nowhere to write.
    async fn append(&self, submission: &Submission) -> Result<bool, SheetsError> {
        let Some(backend) = self.connection.backend().await else {
            return Ok(false);
        };
        backend
            .append(&self.range, submission.to_row(chrono::Utc::now()))
            .await?;
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::credentials::{CredentialProvider, CredentialResolver, CredentialSources};
    use crate::sheets::fake::{FakeConnector, FakeSheets};
    use serde_json::json;

    const RANGE: &str = "Results!A:H";

    struct Sources(CredentialSources);

    impl CredentialProvider for Sources {
        fn sources(&self) -> CredentialSources {
            self.0.clone()
        }
    }

    fn recorder(sheets: Arc<FakeSheets>, configured: bool) -> SubmissionRecorder {
        let sources = if configured {
            CredentialSources {
                spreadsheet_id: Some("sheet".to_string()),
                key_json: Some(r#"{"client_email":"a@b.c","private_key":"k"}"#.to_string()),
                key_path: None,
            }
        } else {
            CredentialSources::default()
        };
        let resolver = CredentialResolver::new(Arc::new(Sources(sources)), FakeConnector::new(sheets));
        SubmissionRecorder::new(Arc::new(SheetsConnection::new(resolver)), RANGE)
    }

    fn submission() -> Submission {
        Submission::from_json(json!({
            "name": "Grace",
            "email": "grace@example.com",
            "score": 20,
            "totalQuestions": 2,
            "correctAnswers": 2,
            "percentage": 100,
            "answers": [0, 1]
        }))
    }

    #[tokio::test]
    async fn appends_one_row() {
        let sheets = FakeSheets::new();
        let ack = recorder(sheets.clone(), true).record(&submission()).await;

        assert_eq!(ack, Ack::persisted());
        let appended = sheets.appended.lock().await;
        assert_eq!(appended.len(), 1);
        assert_eq!(appended[0].0, RANGE);
        assert_eq!(appended[0].1[1], json!("Grace"));
    }

    #[tokio::test]
    async fn unconfigured_is_acknowledged_with_warning() {
        let ack = recorder(FakeSheets::new(), false).record(&submission()).await;

        assert!(!ack.persisted);
        assert_eq!(ack.warning.as_deref(), Some(NOT_CONFIGURED_WARNING));
    }

    #[tokio::test]
    async fn write_failure_is_acknowledged_with_warning() {
        let sheets = FakeSheets::new();
        sheets.set_failing_appends(true);

        let ack = recorder(sheets.clone(), true).record(&submission()).await;

        assert!(!ack.persisted);
        assert!(ack.warning.unwrap().contains("not persisted"));
        assert!(sheets.appended.lock().await.is_empty());
    }
}
