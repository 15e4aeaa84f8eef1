//! Error types for agrisync-relay

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum RelayError {
    #[error("Missing signature headers")]
    MissingSignature,

    #[error("Invalid request signature")]
    InvalidSignature,

    #[error("Failed to launch sync job: {0}")]
    Launch(String),

    #[error("Scheduler error: {0}")]
    Scheduler(String),

    #[error(transparent)]
    Common(#[from] agrisync_common::Error),
}

impl IntoResponse for RelayError {
    fn into_response(self) -> Response {
        let status = match self {
            RelayError::MissingSignature | RelayError::InvalidSignature => StatusCode::UNAUTHORIZED,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };

        let body = Json(json!({
            "error": self.to_string(),
        }));

        (status, body).into_response()
    }
}

pub type RelayResult<T> = std::result::Result<T, RelayError>;
