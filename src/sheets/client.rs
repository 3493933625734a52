// src/sheets/client.rs

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::json;
use url::Url;

use super::auth::{SPREADSHEETS_SCOPE, ServiceAccountKey, TokenSource};
use super::{Row, SheetsBackend, SheetsConnector, SheetsError};

pub const DEFAULT_API_BASE: &str = "https://sheets.googleapis.com";

/// Response body of `spreadsheets.values.get`.
#[derive(Debug, Deserialize)]
struct ValueRange {
    #[serde(default)]
    values: Vec<Row>,
}

/// Creates [`GoogleSheetsClient`]s sharing one HTTP connection pool.
#[derive(Clone)]
pub struct GoogleSheetsConnector {
    http: reqwest::Client,
    api_base: Url,
}

impl GoogleSheetsConnector {
    pub fn new(timeout: Duration) -> Result<Self, SheetsError> {
        let http = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            http,
            api_base: Url::parse(DEFAULT_API_BASE)?,
        })
    }

    /// Points the connector at another API host (used against local mocks).
    pub fn with_api_base(mut self, api_base: &str) -> Result<Self, SheetsError> {
        self.api_base = Url::parse(api_base)?;
        Ok(self)
    }
}

impl SheetsConnector for GoogleSheetsConnector {
    fn connect(
        &self,
        spreadsheet_id: &str,
        key: ServiceAccountKey,
    ) -> Result<Arc<dyn SheetsBackend>, SheetsError> {
        Ok(Arc::new(GoogleSheetsClient {
            http: self.http.clone(),
            api_base: self.api_base.clone(),
            spreadsheet_id: spreadsheet_id.to_owned(),
            tokens: TokenSource::new(self.http.clone(), key, SPREADSHEETS_SCOPE),
        }))
    }
}

/// Google Sheets v4 REST client bound to one spreadsheet.
pub struct GoogleSheetsClient {
    http: reqwest::Client,
    api_base: Url,
    spreadsheet_id: String,
    tokens: TokenSource,
}

impl GoogleSheetsClient {
    /// `{base}/v4/spreadsheets/{id}/{segments...}` with each segment
    /// percent-encoded.
    fn endpoint(&self, segments: &[&str]) -> Result<Url, SheetsError> {
        let mut url = self.api_base.clone();
        url.path_segments_mut()
            .map_err(|_| SheetsError::InvalidUrl(self.api_base.to_string()))?
            .pop_if_empty()
            .extend(["v4", "spreadsheets", self.spreadsheet_id.as_str()])
            .extend(segments);
        Ok(url)
    }

    async fn send(&self, request: reqwest::RequestBuilder) -> Result<reqwest::Response, SheetsError> {
        let token = self.tokens.access_token().await?;
        let response = request.bearer_auth(token).send().await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(SheetsError::Status {
                status: status.as_u16(),
                body,
            });
        }
        Ok(response)
    }
}

#[async_trait]
impl SheetsBackend for GoogleSheetsClient {
    async fn verify(&self) -> Result<(), SheetsError> {
        let url = self.endpoint(&[])?;
        self.send(self.http.get(url).query(&[("fields", "spreadsheetId")]))
            .await?;
        tracing::info!(
            "Verified access to spreadsheet {} as {}",
            self.spreadsheet_id,
            self.tokens.client_email()
        );
        Ok(())
    }

    async fn read(&self, range: &str) -> Result<Vec<Row>, SheetsError> {
        let url = self.endpoint(&["values", range])?;
        let response = self
            .send(self.http.get(url).query(&[("majorDimension", "ROWS")]))
            .await?;
        let body: ValueRange = response.json().await?;
        Ok(body.values)
    }

    async fn append(&self, range: &str, row: Row) -> Result<(), SheetsError> {
        let action = format!("{}:append", range);
        let url = self.endpoint(&["values", action.as_str()])?;
        self.send(
            self.http
                .post(url)
                .query(&[
                    ("valueInputOption", "USER_ENTERED"),
                    ("insertDataOption", "INSERT_ROWS"),
                ])
                .json(&json!({ "values": [row] })),
        )
        .await?;
        Ok(())
    }
}
