//! Common error types for AgriSync

use thiserror::Error;

/// Common result type for AgriSync operations
pub type Result<T> = std::result::Result<T, Error>;

/// Common error types across AgriSync services
#[derive(Error, Debug)]
pub enum Error {
    /// Configuration loading or validation error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Outbound HTTP request failed before a response was decoded
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Slack answered with `ok: false`
    #[error("Slack API {method} failed: {error}")]
    Slack { method: String, error: String },
}
