//! Slack Web API client
//!
//! Covers the two outbound calls AgriSync makes:
//! - `chat.postMessage` for run status notifications
//! - `views.publish` for the Home tab control panel
//!
//! Slack reports most failures as HTTP 200 with `{"ok": false, "error": ...}`,
//! so both the status code and the `ok` flag are checked.

use crate::{Error, Result};
use serde::Deserialize;
use serde_json::{json, Value};
use std::time::Duration;

const SLACK_API_BASE_URL: &str = "https://slack.com/api";
const USER_AGENT: &str = concat!("agrisync/", env!("CARGO_PKG_VERSION"));

#[derive(Debug, Deserialize)]
struct SlackResponse {
    ok: bool,
    #[serde(default)]
    error: Option<String>,
}

/// Bearer-token authenticated Slack client
#[derive(Clone)]
pub struct SlackClient {
    http_client: reqwest::Client,
    base_url: String,
    bot_token: String,
}

impl SlackClient {
    pub fn new(bot_token: impl Into<String>) -> Result<Self> {
        Self::with_base_url(bot_token, SLACK_API_BASE_URL)
    }

    /// Client against a different API root (used by tests)
    pub fn with_base_url(bot_token: impl Into<String>, base_url: impl Into<String>) -> Result<Self> {
        let http_client = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(Duration::from_secs(30))
            .build()?;

        Ok(Self {
            http_client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            bot_token: bot_token.into(),
        })
    }

    /// Send a text message to a channel or user (user ID opens the DM)
    pub async fn post_message(&self, channel: &str, text: &str) -> Result<()> {
        self.call("chat.postMessage", json!({ "channel": channel, "text": text }))
            .await?;
        tracing::info!(channel = %channel, "Slack notification sent");
        Ok(())
    }

    /// Publish a Home tab view for a user
    pub async fn publish_view(&self, user_id: &str, view: &Value) -> Result<()> {
        self.call("views.publish", json!({ "user_id": user_id, "view": view }))
            .await?;
        tracing::info!(user = %user_id, "Home view published");
        Ok(())
    }

    async fn call(&self, method: &str, payload: Value) -> Result<()> {
        let url = format!("{}/{}", self.base_url, method);
        tracing::debug!(method = %method, "Calling Slack API");

        let response = self
            .http_client
            .post(&url)
            .bearer_auth(&self.bot_token)
            .json(&payload)
            .send()
            .await?
            .error_for_status()?;

        let body: SlackResponse = response.json().await?;
        if !body.ok {
            return Err(Error::Slack {
                method: method.to_string(),
                error: body.error.unwrap_or_else(|| "unknown_error".to_string()),
            });
        }
        Ok(())
    }
}
