//! agrisync-scraper library interface
//!
//! Portal scraping, report normalization and spreadsheet publishing for one
//! sync run. The binary in `main.rs` wires these together from configuration.

pub mod archive;
pub mod browser;
pub mod error;
pub mod formatter;
pub mod handler;
pub mod orchestrator;
pub mod scraper;
pub mod sheets;
pub mod table;
pub mod workbook;

pub use crate::error::{SyncError, SyncResult};
pub use crate::handler::{handle_job, Notifier};
pub use crate::orchestrator::{SyncOrchestrator, SyncRunner};
