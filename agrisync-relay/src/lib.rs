//! agrisync-relay library - Slack webhook relay
//!
//! Verifies signed Slack requests, serves the App Home control panel and
//! launches scraper runs without waiting for them.

use agrisync_common::slack::SlackClient;
use axum::Router;
use std::sync::Arc;
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::trace::TraceLayer;

pub mod api;
pub mod error;
pub mod home_view;
pub mod launcher;
pub mod scheduler;

pub use error::{RelayError, RelayResult};
pub use launcher::{JobLauncher, ProcessLauncher};

/// Largest accepted request body
pub const MAX_BODY_BYTES: usize = 1024 * 1024;

/// Application state shared across HTTP handlers
#[derive(Clone)]
pub struct AppState {
    /// Slack app signing secret
    pub signing_secret: Arc<str>,
    /// Bot client for publishing the home view (None when no token is configured)
    pub slack: Option<SlackClient>,
    pub launcher: Arc<dyn JobLauncher>,
}

impl AppState {
    pub fn new(
        signing_secret: impl Into<Arc<str>>,
        slack: Option<SlackClient>,
        launcher: Arc<dyn JobLauncher>,
    ) -> Self {
        Self {
            signing_secret: signing_secret.into(),
            slack,
            launcher,
        }
    }
}

/// Build application router
pub fn build_router(state: AppState) -> Router {
    use axum::routing::post;

    Router::new()
        .route("/slack/events", post(api::slack_events))
        .merge(api::health_routes())
        .layer(RequestBodyLimitLayer::new(MAX_BODY_BYTES))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
