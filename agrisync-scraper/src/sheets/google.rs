//! Google Sheets v4 REST backend

use super::auth::{ServiceAccountKey, SPREADSHEETS_SCOPE};
use super::{SheetConnector, Worksheet};
use crate::error::{SyncError, SyncResult};
use async_trait::async_trait;
use reqwest::{Client, Response, Url};
use serde::Deserialize;
use serde_json::json;
use std::time::Duration;

const SHEETS_API_BASE_URL: &str = "https://sheets.googleapis.com/v4/spreadsheets";

/// Connects to one worksheet of one spreadsheet with a service account
pub struct GoogleSheetsConnector {
    http_client: Client,
    base_url: String,
    spreadsheet_id: String,
    service_account_json: String,
    sheet_title: String,
}

impl GoogleSheetsConnector {
    pub fn new(
        spreadsheet_id: impl Into<String>,
        service_account_json: impl Into<String>,
        sheet_title: impl Into<String>,
    ) -> SyncResult<Self> {
        Ok(Self {
            http_client: http_client()?,
            base_url: SHEETS_API_BASE_URL.to_string(),
            spreadsheet_id: spreadsheet_id.into(),
            service_account_json: service_account_json.into(),
            sheet_title: sheet_title.into(),
        })
    }
}

fn http_client() -> SyncResult<Client> {
    Client::builder()
        .timeout(Duration::from_secs(30))
        .build()
        .map_err(|e| SyncError::Write(format!("HTTP client setup failed: {}", e)))
}

#[derive(Debug, Deserialize)]
struct SpreadsheetMeta {
    #[serde(default)]
    sheets: Vec<SheetMeta>,
}

#[derive(Debug, Deserialize)]
struct SheetMeta {
    properties: SheetProperties,
}

#[derive(Debug, Deserialize)]
struct SheetProperties {
    title: String,
}

#[derive(Debug, Deserialize)]
struct ValueRange {
    #[serde(default)]
    values: Vec<Vec<String>>,
}

#[async_trait]
impl SheetConnector for GoogleSheetsConnector {
    type Sheet = GoogleWorksheet;

    async fn connect(&self) -> SyncResult<GoogleWorksheet> {
        let key = ServiceAccountKey::from_json(&self.service_account_json)?;
        let token = key
            .fetch_access_token(&self.http_client, SPREADSHEETS_SCOPE)
            .await?;

        let worksheet = GoogleWorksheet::new(
            self.http_client.clone(),
            &self.base_url,
            &self.spreadsheet_id,
            &self.sheet_title,
            token,
        )?;
        worksheet.ensure_exists().await?;

        tracing::info!(
            spreadsheet = %self.spreadsheet_id,
            sheet = %self.sheet_title,
            account = %key.client_email,
            "Connected to Google Sheets"
        );
        Ok(worksheet)
    }
}

/// Authorized handle to one worksheet
pub struct GoogleWorksheet {
    http_client: Client,
    spreadsheet_url: Url,
    sheet_title: String,
    access_token: String,
}

impl GoogleWorksheet {
    pub fn new(
        http_client: Client,
        base_url: &str,
        spreadsheet_id: &str,
        sheet_title: &str,
        access_token: String,
    ) -> SyncResult<Self> {
        let mut spreadsheet_url = Url::parse(base_url)
            .map_err(|e| SyncError::Write(format!("invalid Sheets API URL: {}", e)))?;
        spreadsheet_url
            .path_segments_mut()
            .map_err(|_| SyncError::Write("Sheets API URL cannot be a base".to_string()))?
            .pop_if_empty()
            .push(spreadsheet_id);

        Ok(Self {
            http_client,
            spreadsheet_url,
            sheet_title: sheet_title.to_string(),
            access_token,
        })
    }

    /// A1 range covering the whole sheet
    fn sheet_range(&self) -> String {
        format!("'{}'", self.sheet_title.replace('\'', "''"))
    }

    /// `.../values/<range><suffix>`
    fn values_url(&self, range: &str, suffix: &str) -> Url {
        let mut url = self.spreadsheet_url.clone();
        if let Ok(mut segments) = url.path_segments_mut() {
            segments.push("values").push(&format!("{}{}", range, suffix));
        }
        url
    }

    async fn ensure_exists(&self) -> SyncResult<()> {
        let mut url = self.spreadsheet_url.clone();
        url.query_pairs_mut().append_pair("fields", "sheets.properties.title");

        let meta: SpreadsheetMeta = checked(
            self.http_client
                .get(url)
                .bearer_auth(&self.access_token)
                .send()
                .await,
        )
        .await?
        .json()
        .await
        .map_err(|e| SyncError::Write(format!("invalid spreadsheet metadata: {}", e)))?;

        if meta.sheets.iter().any(|s| s.properties.title == self.sheet_title) {
            Ok(())
        } else {
            Err(SyncError::Write(format!("worksheet '{}' not found", self.sheet_title)))
        }
    }
}

/// Turn transport errors and non-2xx statuses into `Write` errors
async fn checked(result: reqwest::Result<Response>) -> SyncResult<Response> {
    let response = result.map_err(|e| SyncError::Write(format!("Sheets API request failed: {}", e)))?;
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    Err(SyncError::Write(format!("Sheets API returned {}: {}", status, body)))
}

#[async_trait]
impl Worksheet for GoogleWorksheet {
    async fn clear(&self) -> SyncResult<()> {
        let url = self.values_url(&self.sheet_range(), ":clear");
        checked(
            self.http_client
                .post(url)
                .bearer_auth(&self.access_token)
                .json(&json!({}))
                .send()
                .await,
        )
        .await?;
        Ok(())
    }

    async fn update(&self, values: Vec<Vec<String>>) -> SyncResult<()> {
        let range = format!("{}!A1", self.sheet_range());
        let mut url = self.values_url(&range, "");
        url.query_pairs_mut().append_pair("valueInputOption", "RAW");

        checked(
            self.http_client
                .put(url)
                .bearer_auth(&self.access_token)
                .json(&json!({
                    "range": range,
                    "majorDimension": "ROWS",
                    "values": values,
                }))
                .send()
                .await,
        )
        .await?;
        Ok(())
    }

    async fn get_all_values(&self) -> SyncResult<Vec<Vec<String>>> {
        let url = self.values_url(&self.sheet_range(), "");
        let range: ValueRange = checked(
            self.http_client
                .get(url)
                .bearer_auth(&self.access_token)
                .send()
                .await,
        )
        .await?
        .json()
        .await
        .map_err(|e| SyncError::Write(format!("invalid values response: {}", e)))?;
        Ok(range.values)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn worksheet(title: &str) -> GoogleWorksheet {
        GoogleWorksheet::new(
            Client::new(),
            "https://sheets.googleapis.com/v4/spreadsheets",
            "sheet-123",
            title,
            "token".to_string(),
        )
        .unwrap()
    }

    #[test]
    fn test_values_url_encodes_sheet_title() {
        let ws = worksheet("作業記録");
        let url = ws.values_url(&ws.sheet_range(), ":clear");
        assert!(url
            .as_str()
            .starts_with("https://sheets.googleapis.com/v4/spreadsheets/sheet-123/values/"));
        assert!(url.as_str().ends_with(":clear"));
        // non-ASCII title is percent-encoded, never sent raw
        assert!(url.as_str().is_ascii());
    }

    #[test]
    fn test_sheet_range_escapes_quotes() {
        assert_eq!(worksheet("Bob's").sheet_range(), "'Bob''s'");
    }
}
