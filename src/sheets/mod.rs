// src/sheets/mod.rs

//! Access to the spreadsheet that stores questions and quiz results.
//!
//! The rest of the crate only talks to [`SheetsBackend`]; the Google
//! implementation lives in [`client`] and service-account token handling in
//! [`auth`].

pub mod auth;
pub mod client;
pub mod fake;

use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;

use self::auth::ServiceAccountKey;

/// One spreadsheet row as returned by the values API.
pub type Row = Vec<Value>;

/// Errors raised while talking to the spreadsheet API.
#[derive(Debug)]
pub enum SheetsError {
    /// Key payload or key file could not be read or parsed.
    Credentials(String),
    /// Signing the assertion or exchanging it for an access token failed.
    Auth(String),
    /// Transport level failure (connect, timeout, body decoding).
    Http(reqwest::Error),
    /// The API answered with a non-success status.
    Status { status: u16, body: String },
    InvalidUrl(String),
}

impl fmt::Display for SheetsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SheetsError::Credentials(msg) => write!(f, "invalid credentials: {}", msg),
            SheetsError::Auth(msg) => write!(f, "authentication failed: {}", msg),
            SheetsError::Http(err) => write!(f, "request failed: {}", err),
            SheetsError::Status { status, body } => {
                write!(f, "sheets api returned {}: {}", status, body)
            }
            SheetsError::InvalidUrl(msg) => write!(f, "invalid url: {}", msg),
        }
    }
}

impl std::error::Error for SheetsError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            SheetsError::Http(err) => Some(err),
            _ => None,
        }
    }
}

impl From<reqwest::Error> for SheetsError {
    fn from(err: reqwest::Error) -> Self {
        SheetsError::Http(err)
    }
}

impl From<jsonwebtoken::errors::Error> for SheetsError {
    fn from(err: jsonwebtoken::errors::Error) -> Self {
        SheetsError::Auth(err.to_string())
    }
}

impl From<url::ParseError> for SheetsError {
    fn from(err: url::ParseError) -> Self {
        SheetsError::InvalidUrl(err.to_string())
    }
}

/// An authenticated handle bound to a single spreadsheet.
#[async_trait]
pub trait SheetsBackend: Send + Sync {
    /// Cheap probe proving the credentials can reach the spreadsheet.
    async fn verify(&self) -> Result<(), SheetsError>;

    /// Reads a rectangular range, e.g. `Questions!A:G`.
    async fn read(&self, range: &str) -> Result<Vec<Row>, SheetsError>;

    /// Appends one row after the last row of `range`.
    async fn append(&self, range: &str, row: Row) -> Result<(), SheetsError>;
}

/// Builds backends from a spreadsheet id and a service-account key.
pub trait SheetsConnector: Send + Sync {
    fn connect(
        &self,
        spreadsheet_id: &str,
        key: ServiceAccountKey,
    ) -> Result<Arc<dyn SheetsBackend>, SheetsError>;
}
