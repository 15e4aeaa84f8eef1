//! Job request passed from a trigger (relay button, scheduler, operator) to the scraper

use serde::{Deserialize, Serialize};
use std::fmt;

/// Notification text sent when a button-triggered run starts
pub const MSG_STARTED: &str = "アグリノート同期ジョブを開始";

/// Notification text sent when a run completes
pub const MSG_SUCCEEDED: &str = "アグリノートからスプレッドシートへの同期が完了しました！";

/// Prefix of the notification sent when a run fails
pub const MSG_FAILED_PREFIX: &str = "エラー発生！: ";

/// Where a sync run was triggered from
///
/// Only scheduled runs stay silent in chat; everything else reports back to
/// the invoking user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum TriggerSource {
    /// Timer-driven run (relay scheduler, cron, cloud scheduler)
    #[serde(alias = "eventbridge-scheduled")]
    Scheduled,
    /// Control-panel button press in Slack
    SlackButton,
    /// Operator invocation, or any unrecognised tag
    #[default]
    #[serde(other)]
    Manual,
}

impl TriggerSource {
    /// Whether chat notifications are sent for this source
    pub fn notifies(self) -> bool {
        !matches!(self, TriggerSource::Scheduled)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            TriggerSource::Scheduled => "scheduled",
            TriggerSource::SlackButton => "slack_button",
            TriggerSource::Manual => "manual",
        }
    }
}

impl fmt::Display for TriggerSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Payload of a fire-and-forget scraper invocation: `{"user_id": ..., "source": ...}`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct JobRequest {
    /// Slack user to notify (also used as the DM channel)
    #[serde(default)]
    pub user_id: Option<String>,
    #[serde(default)]
    pub source: TriggerSource,
}

impl JobRequest {
    pub fn new(user_id: Option<String>, source: TriggerSource) -> Self {
        Self { user_id, source }
    }

    /// Slack user to notify, if this run reports to chat at all
    pub fn notify_target(&self) -> Option<&str> {
        if !self.source.notifies() {
            return None;
        }
        self.user_id.as_deref().filter(|id| !id.is_empty())
    }
}

/// Transient result of one sync run, only ever surfaced as a message
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SyncOutcome {
    Started,
    Succeeded,
    Failed(String),
}

impl SyncOutcome {
    /// Chat message for this outcome
    pub fn message(&self) -> String {
        match self {
            SyncOutcome::Started => MSG_STARTED.to_string(),
            SyncOutcome::Succeeded => MSG_SUCCEEDED.to_string(),
            SyncOutcome::Failed(reason) => format!("{}{}", MSG_FAILED_PREFIX, reason),
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, SyncOutcome::Succeeded)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_payload_shape() {
        let req = JobRequest::new(Some("U123".to_string()), TriggerSource::SlackButton);
        let json = serde_json::to_value(&req).unwrap();
        assert_eq!(json, serde_json::json!({"user_id": "U123", "source": "slack_button"}));
    }

    #[test]
    fn test_legacy_scheduled_tag() {
        let req: JobRequest =
            serde_json::from_str(r#"{"source": "eventbridge-scheduled"}"#).unwrap();
        assert_eq!(req.source, TriggerSource::Scheduled);
        assert_eq!(req.user_id, None);
    }

    #[test]
    fn test_unknown_source_is_manual() {
        let req: JobRequest =
            serde_json::from_str(r#"{"user_id": "U9", "source": "Lambda1-Trigger"}"#).unwrap();
        assert_eq!(req.source, TriggerSource::Manual);
        assert_eq!(req.notify_target(), Some("U9"));
    }

    #[test]
    fn test_scheduled_never_notifies() {
        let req = JobRequest::new(Some("U1".to_string()), TriggerSource::Scheduled);
        assert_eq!(req.notify_target(), None);
    }

    #[test]
    fn test_outcome_messages() {
        assert_eq!(SyncOutcome::Started.message(), MSG_STARTED);
        assert_eq!(SyncOutcome::Succeeded.message(), MSG_SUCCEEDED);
        assert_eq!(
            SyncOutcome::Failed("boom".to_string()).message(),
            "エラー発生！: boom"
        );
    }
}
