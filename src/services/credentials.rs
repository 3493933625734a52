// src/services/credentials.rs

use std::path::PathBuf;
use std::sync::Arc;

use crate::config::{Config, non_empty_var};
use crate::sheets::auth::ServiceAccountKey;
use crate::sheets::{SheetsBackend, SheetsConnector};

/// Where the service-account key comes from.
#[derive(Debug, Clone, Default)]
pub struct CredentialSources {
    pub spreadsheet_id: Option<String>,
    /// Inline key JSON; takes precedence over `key_path`.
    pub key_json: Option<String>,
    pub key_path: Option<PathBuf>,
}

/// Supplies the current credential sources. Queried on every resolution;
/// key files are re-read each time as well.
pub trait CredentialProvider: Send + Sync {
    fn sources(&self) -> CredentialSources;
}

/// Reads the sources from the process environment on every call, so
/// `GOOGLE_SHEET_ID` and `GOOGLE_CREDENTIALS` set after startup are picked
/// up by the next resolution.
#[derive(Debug, Clone, Default)]
pub struct EnvCredentialProvider;

impl CredentialProvider for EnvCredentialProvider {
    fn sources(&self) -> CredentialSources {
        CredentialSources {
            spreadsheet_id: non_empty_var("GOOGLE_SHEET_ID"),
            key_json: non_empty_var("GOOGLE_CREDENTIALS"),
            key_path: non_empty_var("GOOGLE_APPLICATION_CREDENTIALS").map(PathBuf::from),
        }
    }
}

/// Fixed sources taken from the loaded [`Config`].
impl CredentialProvider for Config {
    fn sources(&self) -> CredentialSources {
        CredentialSources {
            spreadsheet_id: self.spreadsheet_id.clone(),
            key_json: self.credentials_json.clone(),
            key_path: self.credentials_path.clone(),
        }
    }
}

/// Decides whether the spreadsheet is usable and builds a verified handle.
///
/// Holds no memory of earlier failures: every call re-reads the provider,
/// reloads the key and re-runs verification.
#[derive(Clone)]
pub struct CredentialResolver {
    provider: Arc<dyn CredentialProvider>,
    connector: Arc<dyn SheetsConnector>,
}

impl CredentialResolver {
    pub fn new(provider: Arc<dyn CredentialProvider>, connector: Arc<dyn SheetsConnector>) -> Self {
        Self {
            provider,
            connector,
        }
    }

    /// Returns a verified backend, or `None` when unconfigured.
    pub async fn resolve(&self) -> Option<Arc<dyn SheetsBackend>> {
        let sources = self.provider.sources();

        let Some(spreadsheet_id) = sources.spreadsheet_id else {
            tracing::warn!("GOOGLE_SHEET_ID is not set; Google Sheets is disabled");
            return None;
        };

        let key = load_key(&sources.key_json, &sources.key_path).await?;

        let backend = match self.connector.connect(&spreadsheet_id, key) {
            Ok(backend) => backend,
            Err(e) => {
                tracing::error!("Failed to build Google Sheets client: {}", e);
                return None;
            }
        };

        match backend.verify().await {
            Ok(()) => {
                tracing::info!("Google Sheets configured for spreadsheet {}", spreadsheet_id);
                Some(backend)
            }
            Err(e) => {
                tracing::error!("Google Sheets verification failed: {}", e);
                None
            }
        }
    }
}

/// Inline key first; a key that fails to parse falls through to the file.
async fn load_key(
    key_json: &Option<String>,
    key_path: &Option<PathBuf>,
) -> Option<ServiceAccountKey> {
    if let Some(raw) = key_json {
        match ServiceAccountKey::from_json(raw) {
            Ok(key) => return Some(key),
            Err(e) => tracing::warn!("Ignoring GOOGLE_CREDENTIALS: {}", e),
        }
    }

    if let Some(path) = key_path {
        match ServiceAccountKey::from_file(path).await {
            Ok(key) => return Some(key),
            Err(e) => {
                tracing::error!("Failed to load service account key file: {}", e);
                return None;
            }
        }
    }

    tracing::warn!("No Google credentials found; Google Sheets is disabled");
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sheets::{Row, SheetsError};
    use async_trait::async_trait;
    use std::sync::Mutex;

    const PRIVATE_KEY: &str = include_str!("../../tests/fixtures/test_key.pem");

    fn key_json(email: &str) -> String {
        serde_json::json!({ "client_email": email, "private_key": PRIVATE_KEY }).to_string()
    }

    struct Fixed(CredentialSources);

    impl CredentialProvider for Fixed {
        fn sources(&self) -> CredentialSources {
            self.0.clone()
        }
    }

    struct Probe {
        healthy: bool,
    }

    #[async_trait]
    impl SheetsBackend for Probe {
        async fn verify(&self) -> Result<(), SheetsError> {
            if self.healthy {
                Ok(())
            } else {
                Err(SheetsError::Status {
                    status: 403,
                    body: "forbidden".to_string(),
                })
            }
        }

        async fn read(&self, _range: &str) -> Result<Vec<Row>, SheetsError> {
            Ok(Vec::new())
        }

        async fn append(&self, _range: &str, _row: Row) -> Result<(), SheetsError> {
            Ok(())
        }
    }

    /// Records which key each connection was built from.
    struct RecordingConnector {
        healthy: bool,
        emails: Mutex<Vec<String>>,
    }

    impl RecordingConnector {
        fn new(healthy: bool) -> Arc<Self> {
            Arc::new(Self {
                healthy,
                emails: Mutex::new(Vec::new()),
            })
        }
    }

    impl SheetsConnector for RecordingConnector {
        fn connect(
            &self,
            _spreadsheet_id: &str,
            key: ServiceAccountKey,
        ) -> Result<Arc<dyn SheetsBackend>, SheetsError> {
            self.emails.lock().unwrap().push(key.client_email);
            Ok(Arc::new(Probe {
                healthy: self.healthy,
            }))
        }
    }

    fn resolver(sources: CredentialSources, connector: Arc<RecordingConnector>) -> CredentialResolver {
        CredentialResolver::new(Arc::new(Fixed(sources)), connector)
    }

    #[tokio::test]
    async fn missing_spreadsheet_id_short_circuits() {
        let connector = RecordingConnector::new(true);
        let sources = CredentialSources {
            spreadsheet_id: None,
            key_json: Some(key_json("inline@example.com")),
            key_path: None,
        };

        assert!(resolver(sources, connector.clone()).resolve().await.is_none());
        assert!(connector.emails.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn no_credentials_is_unconfigured() {
        let connector = RecordingConnector::new(true);
        let sources = CredentialSources {
            spreadsheet_id: Some("sheet".to_string()),
            ..Default::default()
        };

        assert!(resolver(sources, connector).resolve().await.is_none());
    }

    #[tokio::test]
    async fn inline_key_wins_over_file() {
        let dir = std::env::temp_dir().join(format!("quiz-cred-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("inline_wins.json");
        std::fs::write(&path, key_json("file@example.com")).unwrap();

        let connector = RecordingConnector::new(true);
        let sources = CredentialSources {
            spreadsheet_id: Some("sheet".to_string()),
            key_json: Some(key_json("inline@example.com")),
            key_path: Some(path),
        };

        assert!(resolver(sources, connector.clone()).resolve().await.is_some());
        assert_eq!(*connector.emails.lock().unwrap(), vec!["inline@example.com"]);
    }

    #[tokio::test]
    async fn unparseable_inline_key_falls_back_to_file() {
        let dir = std::env::temp_dir().join(format!("quiz-cred-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("fallback.json");
        std::fs::write(&path, key_json("file@example.com")).unwrap();

        let connector = RecordingConnector::new(true);
        let sources = CredentialSources {
            spreadsheet_id: Some("sheet".to_string()),
            key_json: Some("{broken".to_string()),
            key_path: Some(path),
        };

        assert!(resolver(sources, connector.clone()).resolve().await.is_some());
        assert_eq!(*connector.emails.lock().unwrap(), vec!["file@example.com"]);
    }

    #[tokio::test]
    async fn missing_key_file_is_unconfigured() {
        let connector = RecordingConnector::new(true);
        let sources = CredentialSources {
            spreadsheet_id: Some("sheet".to_string()),
            key_json: None,
            key_path: Some(PathBuf::from("/nonexistent/quiz-key.json")),
        };

        assert!(resolver(sources, connector).resolve().await.is_none());
    }

    #[tokio::test]
    async fn failed_verification_is_unconfigured() {
        let connector = RecordingConnector::new(false);
        let sources = CredentialSources {
            spreadsheet_id: Some("sheet".to_string()),
            key_json: Some(key_json("inline@example.com")),
            key_path: None,
        };

        assert!(resolver(sources, connector).resolve().await.is_none());
    }

    // The only test in this crate that touches these variables.
    #[test]
    fn env_provider_sees_changes_between_calls() {
        const VARS: [&str; 3] = [
            "GOOGLE_SHEET_ID",
            "GOOGLE_CREDENTIALS",
            "GOOGLE_APPLICATION_CREDENTIALS",
        ];
        let saved: Vec<_> = VARS.iter().map(|k| std::env::var(k).ok()).collect();
        let provider = EnvCredentialProvider;

        unsafe {
            for key in VARS {
                std::env::remove_var(key);
            }
        }
        assert!(provider.sources().spreadsheet_id.is_none());
        assert!(provider.sources().key_json.is_none());

        unsafe {
            std::env::set_var("GOOGLE_SHEET_ID", " late-sheet ");
            std::env::set_var("GOOGLE_CREDENTIALS", "{}");
            std::env::set_var("GOOGLE_APPLICATION_CREDENTIALS", "   ");
        }
        let sources = provider.sources();
        assert_eq!(sources.spreadsheet_id.as_deref(), Some("late-sheet"));
        assert_eq!(sources.key_json.as_deref(), Some("{}"));
        assert!(sources.key_path.is_none());

        unsafe {
            for (key, value) in VARS.iter().zip(saved) {
                match value {
                    Some(v) => std::env::set_var(key, v),
                    None => std::env::remove_var(key),
                }
            }
        }
    }

    #[test]
    fn config_provides_its_own_sources() {
        let config = Config {
            spreadsheet_id: Some("sheet".to_string()),
            credentials_path: Some(PathBuf::from("key.json")),
            ..Default::default()
        };

        let sources = config.sources();
        assert_eq!(sources.spreadsheet_id.as_deref(), Some("sheet"));
        assert!(sources.key_json.is_none());
        assert_eq!(sources.key_path, Some(PathBuf::from("key.json")));
    }
}
