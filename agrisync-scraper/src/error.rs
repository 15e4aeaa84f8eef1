//! Error taxonomy for the sync workflow
//!
//! Acquirer and Publisher failures travel up to the orchestrator unchanged;
//! the orchestrator is the only place that turns them into a user-visible
//! message.

use thiserror::Error;

/// Sync workflow error
#[derive(Debug, Error)]
pub enum SyncError {
    /// Portal rejected the credentials (user-actionable)
    #[error("{0}")]
    Login(String),

    /// Portal reached neither the logged-in page nor the known error banner
    /// (UI probably changed; needs a code update)
    #[error("{0}")]
    UnexpectedState(String),

    /// Expected report file missing from the downloaded archive
    #[error("{0}")]
    NotFound(String),

    /// Destination spreadsheet unreachable or misconfigured
    #[error("{0}")]
    Write(String),

    /// WebDriver command failed or timed out
    #[error("Browser error: {0}")]
    Browser(String),

    /// Archive could not be opened or read
    #[error("Archive error: {0}")]
    Archive(#[from] zip::result::ZipError),

    /// Workbook could not be opened or parsed
    #[error("Workbook error: {0}")]
    Workbook(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Missing or invalid configuration
    #[error(transparent)]
    Common(#[from] agrisync_common::Error),
}

impl From<fantoccini::error::CmdError> for SyncError {
    fn from(err: fantoccini::error::CmdError) -> Self {
        SyncError::Browser(err.to_string())
    }
}

impl From<fantoccini::error::NewSessionError> for SyncError {
    fn from(err: fantoccini::error::NewSessionError) -> Self {
        SyncError::Browser(format!("could not start WebDriver session: {}", err))
    }
}

impl From<calamine::Error> for SyncError {
    fn from(err: calamine::Error) -> Self {
        SyncError::Workbook(err.to_string())
    }
}

/// Result type for the sync workflow
pub type SyncResult<T> = Result<T, SyncError>;
