//! Destination spreadsheet (Sheet Publisher)
//!
//! - [`SheetConnector`] / [`Worksheet`]: the remote service seam
//! - [`google`]: Google Sheets v4 implementation with service-account auth
//! - [`SpreadSheetWriter`]: lazy cached connection, replace-all and read-all

pub mod auth;
pub mod google;
mod writer;

pub use writer::SpreadSheetWriter;

use crate::error::SyncResult;
use async_trait::async_trait;

/// Worksheet the data is published to
pub const WORKSHEET_NAME: &str = "作業記録";

/// Establishes a connection to one worksheet
#[async_trait]
pub trait SheetConnector: Send + Sync {
    type Sheet: Worksheet;

    async fn connect(&self) -> SyncResult<Self::Sheet>;
}

/// Operations on a connected worksheet
#[async_trait]
pub trait Worksheet: Send + Sync {
    /// Remove every value from the sheet
    async fn clear(&self) -> SyncResult<()>;

    /// Write a grid of values starting at A1 in one request
    async fn update(&self, values: Vec<Vec<String>>) -> SyncResult<()>;

    /// All populated rows, top to bottom (rows may be ragged)
    async fn get_all_values(&self) -> SyncResult<Vec<Vec<String>>>;
}
