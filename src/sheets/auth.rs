// src/sheets/auth.rs

use std::fmt;
use std::path::Path;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use jsonwebtoken::{Algorithm, EncodingKey, Header, encode};
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;
use tokio::time::Instant;

use super::SheetsError;

/// Read/write access to spreadsheet values.
pub const SPREADSHEETS_SCOPE: &str = "https://www.googleapis.com/auth/spreadsheets";

const DEFAULT_TOKEN_URI: &str = "https://oauth2.googleapis.com/token";
const JWT_BEARER_GRANT: &str = "urn:ietf:params:oauth:grant-type:jwt-bearer";

/// Assertions are valid for one hour, the maximum Google accepts.
const ASSERTION_LIFETIME_SECS: u64 = 3600;

/// Tokens are refreshed this long before they actually expire.
const EXPIRY_MARGIN: Duration = Duration::from_secs(60);

/// The subset of a Google service-account key file this crate needs.
#[derive(Clone, Deserialize)]
pub struct ServiceAccountKey {
    pub client_email: String,
    pub private_key: String,
    #[serde(default)]
    pub private_key_id: Option<String>,
    #[serde(default = "default_token_uri")]
    pub token_uri: String,
}

fn default_token_uri() -> String {
    DEFAULT_TOKEN_URI.to_string()
}

impl fmt::Debug for ServiceAccountKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ServiceAccountKey")
            .field("client_email", &self.client_email)
            .field("private_key_id", &self.private_key_id)
            .field("token_uri", &self.token_uri)
            .finish_non_exhaustive()
    }
}

impl ServiceAccountKey {
    pub fn from_json(raw: &str) -> Result<Self, SheetsError> {
        let key: Self = serde_json::from_str(raw)
            .map_err(|e| SheetsError::Credentials(format!("malformed key json: {}", e)))?;
        if key.client_email.is_empty() || key.private_key.is_empty() {
            return Err(SheetsError::Credentials(
                "client_email and private_key are required".to_string(),
            ));
        }
        Ok(key)
    }

    pub async fn from_file(path: &Path) -> Result<Self, SheetsError> {
        let raw = tokio::fs::read_to_string(path).await.map_err(|e| {
            SheetsError::Credentials(format!("cannot read {}: {}", path.display(), e))
        })?;
        Self::from_json(&raw)
    }
}

/// Claims of the self-signed assertion exchanged for an access token.
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct AssertionClaims {
    /// Issuer - the service account email.
    pub iss: String,
    pub scope: String,
    /// Audience - the token endpoint.
    pub aud: String,
    pub iat: u64,
    pub exp: u64,
}

/// Signs an RS256 assertion for `scope` with the key's private key.
pub fn sign_assertion(key: &ServiceAccountKey, scope: &str) -> Result<String, SheetsError> {
    let now = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map_err(|e| SheetsError::Auth(e.to_string()))?
        .as_secs();

    let claims = AssertionClaims {
        iss: key.client_email.clone(),
        scope: scope.to_owned(),
        aud: key.token_uri.clone(),
        iat: now,
        exp: now + ASSERTION_LIFETIME_SECS,
    };

    let mut header = Header::new(Algorithm::RS256);
    header.kid = key.private_key_id.clone();

    let encoding_key = EncodingKey::from_rsa_pem(key.private_key.as_bytes())
        .map_err(|e| SheetsError::Credentials(format!("invalid private key: {}", e)))?;

    Ok(encode(&header, &claims, &encoding_key)?)
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    #[serde(default = "default_expires_in")]
    expires_in: u64,
}

fn default_expires_in() -> u64 {
    ASSERTION_LIFETIME_SECS
}

struct CachedToken {
    value: String,
    expires_at: Instant,
}

/// Hands out access tokens for one key and scope, exchanging a fresh
/// assertion only when the cached token is about to expire.
pub struct TokenSource {
    http: reqwest::Client,
    key: ServiceAccountKey,
    scope: String,
    cached: Mutex<Option<CachedToken>>,
}

impl TokenSource {
    pub fn new(http: reqwest::Client, key: ServiceAccountKey, scope: &str) -> Self {
        Self {
            http,
            key,
            scope: scope.to_owned(),
            cached: Mutex::new(None),
        }
    }

    pub fn client_email(&self) -> &str {
        &self.key.client_email
    }

    pub async fn access_token(&self) -> Result<String, SheetsError> {
        let mut cached = self.cached.lock().await;
        if let Some(token) = cached.as_ref() {
            if token.expires_at > Instant::now() + EXPIRY_MARGIN {
                return Ok(token.value.clone());
            }
        }

        let assertion = sign_assertion(&self.key, &self.scope)?;
        let response = self
            .http
            .post(&self.key.token_uri)
            .form(&[("grant_type", JWT_BEARER_GRANT), ("assertion", assertion.as_str())])
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(SheetsError::Auth(format!(
                "token endpoint returned {}: {}",
                status.as_u16(),
                body
            )));
        }

        let token: TokenResponse = response.json().await?;
        tracing::debug!(
            "Obtained access token for {} (expires in {}s)",
            self.key.client_email,
            token.expires_in
        );

        let value = token.access_token.clone();
        *cached = Some(CachedToken {
            value: token.access_token,
            expires_at: Instant::now() + Duration::from_secs(token.expires_in),
        });
        Ok(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use jsonwebtoken::{DecodingKey, Validation, decode};

    const PRIVATE_KEY: &str = include_str!("../../tests/fixtures/test_key.pem");
    const PUBLIC_KEY: &str = include_str!("../../tests/fixtures/test_key.pub.pem");

    fn key_json() -> String {
        serde_json::json!({
            "type": "service_account",
            "client_email": "quiz@example.iam.gserviceaccount.com",
            "private_key": PRIVATE_KEY,
            "private_key_id": "abc123"
        })
        .to_string()
    }

    #[test]
    fn parses_key_and_defaults_token_uri() {
        let key = ServiceAccountKey::from_json(&key_json()).unwrap();
        assert_eq!(key.client_email, "quiz@example.iam.gserviceaccount.com");
        assert_eq!(key.token_uri, DEFAULT_TOKEN_URI);
    }

    #[test]
    fn rejects_malformed_key() {
        assert!(matches!(
            ServiceAccountKey::from_json("{not json"),
            Err(SheetsError::Credentials(_))
        ));
        assert!(matches!(
            ServiceAccountKey::from_json(r#"{"client_email":"","private_key":""}"#),
            Err(SheetsError::Credentials(_))
        ));
    }

    #[test]
    fn debug_output_hides_private_key() {
        let key = ServiceAccountKey::from_json(&key_json()).unwrap();
        assert!(!format!("{:?}", key).contains("PRIVATE KEY"));
    }

    #[test]
    fn assertion_is_signed_with_scope_and_audience() {
        let key = ServiceAccountKey::from_json(&key_json()).unwrap();
        let token = sign_assertion(&key, SPREADSHEETS_SCOPE).unwrap();

        let mut validation = Validation::new(Algorithm::RS256);
        validation.set_audience(&[DEFAULT_TOKEN_URI]);
        let data = decode::<AssertionClaims>(
            &token,
            &DecodingKey::from_rsa_pem(PUBLIC_KEY.as_bytes()).unwrap(),
            &validation,
        )
        .unwrap();

        assert_eq!(data.header.kid.as_deref(), Some("abc123"));
        assert_eq!(data.claims.iss, "quiz@example.iam.gserviceaccount.com");
        assert_eq!(data.claims.scope, SPREADSHEETS_SCOPE);
        assert_eq!(data.claims.exp - data.claims.iat, ASSERTION_LIFETIME_SECS);
    }

    #[test]
    fn garbage_private_key_is_a_credentials_error() {
        let mut key = ServiceAccountKey::from_json(&key_json()).unwrap();
        key.private_key = "not a pem".to_string();
        assert!(matches!(
            sign_assertion(&key, SPREADSHEETS_SCOPE),
            Err(SheetsError::Credentials(_))
        ));
    }
}
