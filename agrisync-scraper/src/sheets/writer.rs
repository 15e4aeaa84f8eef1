//! Spreadsheet writer with a lazily established, cached connection

use super::google::GoogleSheetsConnector;
use super::{SheetConnector, Worksheet, WORKSHEET_NAME};
use crate::error::{SyncError, SyncResult};
use crate::table::{Cell, SheetValues, Table};
use agrisync_common::config::{Config, ConfigKey};
use tokio::sync::OnceCell;

/// Publishes tables to the destination worksheet
///
/// The worksheet connection is made on first use and reused for the life of
/// the writer.
pub struct SpreadSheetWriter<C: SheetConnector> {
    connector: C,
    worksheet: OnceCell<C::Sheet>,
}

impl SpreadSheetWriter<GoogleSheetsConnector> {
    /// Writer for the configured Google spreadsheet
    ///
    /// Fails immediately when the spreadsheet id or service account is missing.
    pub fn from_config(config: &Config) -> SyncResult<Self> {
        let spreadsheet_id = config.get(ConfigKey::SpreadsheetId);
        let service_account = config.get(ConfigKey::ServiceAccountJson);
        match (spreadsheet_id, service_account) {
            (Some(id), Some(sa_json)) => Ok(Self::new(GoogleSheetsConnector::new(
                id,
                sa_json,
                WORKSHEET_NAME,
            )?)),
            _ => Err(SyncError::Write("環境変数の取得に失敗しました".to_string())),
        }
    }
}

impl<C: SheetConnector> SpreadSheetWriter<C> {
    pub fn new(connector: C) -> Self {
        Self {
            connector,
            worksheet: OnceCell::new(),
        }
    }

    async fn worksheet(&self) -> SyncResult<&C::Sheet> {
        self.worksheet
            .get_or_try_init(|| async {
                self.connector.connect().await.map_err(|e| {
                    SyncError::Write(format!("GoogleSpreadsheetへの接続に失敗しました: {}", e))
                })
            })
            .await
    }

    /// Read the sheet as a table (first row = header)
    ///
    /// Never fails: connection or read errors are logged and yield an empty table.
    pub async fn read_all(&self) -> Table {
        let worksheet = match self.worksheet().await {
            Ok(ws) => ws,
            Err(e) => {
                tracing::error!("読込に失敗しました: {}", e);
                return Table::default();
            }
        };

        tracing::info!("スプレッドシートからデータ取得中...");
        match worksheet.get_all_values().await {
            Ok(values) => records_to_table(values),
            Err(e) => {
                tracing::error!("読込に失敗しました: {}", e);
                Table::default()
            }
        }
    }

    /// Replace the whole sheet with `values` (clear, then one bulk write)
    pub async fn write_all(&self, values: &SheetValues) -> SyncResult<()> {
        let worksheet = self.worksheet().await?;
        tracing::info!(rows = values.len(), "スプレッドシートを更新中...");

        worksheet
            .clear()
            .await
            .map_err(|e| SyncError::Write(format!("書込に失敗しました: {}", e)))?;
        worksheet
            .update(values.to_grid())
            .await
            .map_err(|e| SyncError::Write(format!("書込に失敗しました: {}", e)))?;

        tracing::info!("書込が完了しました");
        Ok(())
    }
}

/// Header row + records; short rows are padded with empty text
fn records_to_table(values: Vec<Vec<String>>) -> Table {
    let mut rows = values.into_iter();
    let Some(header) = rows.next() else {
        return Table::default();
    };

    let mut table = Table::new(header);
    for row in rows {
        let mut cells: Vec<Cell> = row.into_iter().map(Cell::Text).collect();
        cells.resize(table.columns.len(), Cell::Text(String::new()));
        table.push_row(cells);
    }
    table
}
