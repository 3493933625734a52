// src/services/connection.rs

use std::sync::Arc;

use tokio::sync::RwLock;

use super::credentials::CredentialResolver;
use crate::sheets::SheetsBackend;

/// The shared "currently configured" spreadsheet handle.
///
/// Starts empty. While empty, every request for a backend runs the
/// resolver again; once a backend verifies it is kept for the process
/// lifetime.
pub struct SheetsConnection {
    resolver: CredentialResolver,
    backend: RwLock<Option<Arc<dyn SheetsBackend>>>,
}

impl SheetsConnection {
    pub fn new(resolver: CredentialResolver) -> Self {
        Self {
            resolver,
            backend: RwLock::new(None),
        }
    }

    pub async fn is_configured(&self) -> bool {
        self.backend.read().await.is_some()
    }

    /// The configured backend, resolving credentials first if needed.
    pub async fn backend(&self) -> Option<Arc<dyn SheetsBackend>> {
        if let Some(backend) = self.backend.read().await.as_ref() {
            return Some(backend.clone());
        }

        let resolved = self.resolver.resolve().await?;
        *self.backend.write().await = Some(resolved.clone());
        Some(resolved)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::credentials::{CredentialProvider, CredentialSources};
    use crate::sheets::fake::{FakeConnector, FakeSheets};
    use std::sync::atomic::{AtomicBool, Ordering};

    struct Toggle(AtomicBool);

    impl CredentialProvider for Toggle {
        fn sources(&self) -> CredentialSources {
            if !self.0.load(Ordering::SeqCst) {
                return CredentialSources::default();
            }
            CredentialSources {
                spreadsheet_id: Some("sheet".to_string()),
                key_json: Some(r#"{"client_email":"a@b.c","private_key":"k"}"#.to_string()),
                key_path: None,
            }
        }
    }

    #[tokio::test]
    async fn resolves_lazily_and_keeps_the_backend() {
        let provider = Arc::new(Toggle(AtomicBool::new(false)));
        let connector = FakeConnector::new(FakeSheets::new());
        let connection =
            SheetsConnection::new(CredentialResolver::new(provider.clone(), connector.clone()));

        assert!(connection.backend().await.is_none());
        assert!(!connection.is_configured().await);

        provider.0.store(true, Ordering::SeqCst);
        assert!(connection.backend().await.is_some());
        assert!(connection.is_configured().await);

        provider.0.store(false, Ordering::SeqCst);
        assert!(connection.backend().await.is_some());
        assert_eq!(connector.connects.load(Ordering::SeqCst), 1);
    }
}
