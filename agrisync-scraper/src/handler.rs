//! Job handler: one scraper invocation with chat progress notifications

use crate::error::SyncResult;
use crate::orchestrator::SyncRunner;
use agrisync_common::slack::SlackClient;
use agrisync_common::{JobRequest, SyncOutcome};
use async_trait::async_trait;
use tracing::Instrument;
use uuid::Uuid;

/// Delivers progress messages to a user
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn notify(&self, user_id: &str, text: &str) -> agrisync_common::Result<()>;
}

#[async_trait]
impl Notifier for SlackClient {
    async fn notify(&self, user_id: &str, text: &str) -> agrisync_common::Result<()> {
        self.post_message(user_id, text).await
    }
}

/// Run one sync job for `request`
///
/// `build_runner` is called after the start notification so that
/// configuration errors are reported to the user like any other failure.
/// Notification failures are logged and never change the outcome.
pub async fn handle_job<R, B>(
    request: &JobRequest,
    notifier: Option<&dyn Notifier>,
    build_runner: B,
) -> SyncOutcome
where
    R: SyncRunner,
    B: FnOnce() -> SyncResult<R>,
{
    let span = tracing::info_span!(
        "sync_job",
        run_id = %Uuid::new_v4(),
        source = %request.source,
    );

    async move {
        tracing::info!(user_id = ?request.user_id, "Sync job received");

        let target = match (request.notify_target(), notifier) {
            (Some(user), Some(notifier)) => Some((user, notifier)),
            (Some(_), None) => {
                tracing::warn!("BOT_TOKEN not configured, notifications disabled");
                None
            }
            _ => None,
        };

        if let Some((user, notifier)) = target {
            send(notifier, user, &SyncOutcome::Started).await;
        }

        let outcome = match build_runner() {
            Ok(runner) => runner.run().await,
            Err(e) => {
                tracing::error!(error = ?e, "ジョブ失敗: {}", e);
                SyncOutcome::Failed(e.to_string())
            }
        };

        if let Some((user, notifier)) = target {
            send(notifier, user, &outcome).await;
        }

        tracing::info!(success = outcome.is_success(), "Sync job finished");
        outcome
    }
    .instrument(span)
    .await
}

async fn send(notifier: &dyn Notifier, user: &str, outcome: &SyncOutcome) {
    if let Err(e) = notifier.notify(user, &outcome.message()).await {
        tracing::warn!("Failed to notify {}: {}", user, e);
    }
}
