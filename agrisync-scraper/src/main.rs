//! agrisync-scraper - one AgriNote → Google Sheets sync run
//!
//! Invoked by the relay (fire-and-forget, `--payload '{"user_id":..,"source":..}'`),
//! by the relay scheduler, or by an operator from the command line.
//! Exits non-zero when the run fails.

use agrisync_common::config::{Config, ConfigKey};
use agrisync_common::slack::SlackClient;
use agrisync_common::{JobRequest, TriggerSource};
use agrisync_scraper::{handle_job, Notifier, SyncOrchestrator};
use anyhow::{Context, Result};
use clap::Parser;
use std::process::ExitCode;
use tracing::{info, warn};

#[derive(Debug, Parser)]
#[command(name = "agrisync-scraper", version, about = "Sync AgriNote work records to Google Sheets")]
struct Args {
    /// Job request as JSON: {"user_id": "...", "source": "..."}
    #[arg(long, conflicts_with_all = ["user_id", "source"])]
    payload: Option<String>,

    /// Slack user to notify
    #[arg(long)]
    user_id: Option<String>,

    /// Trigger source (scheduled, slack_button, manual)
    #[arg(long)]
    source: Option<String>,
}

impl Args {
    fn job_request(&self) -> Result<JobRequest> {
        if let Some(payload) = &self.payload {
            return serde_json::from_str(payload).context("Invalid --payload JSON");
        }
        let source = match &self.source {
            Some(tag) => serde_json::from_value(serde_json::Value::String(tag.clone()))
                .context("Invalid --source")?,
            None => TriggerSource::Manual,
        };
        Ok(JobRequest::new(self.user_id.clone(), source))
    }
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .init();

    info!(
        "Starting AgriSync scraper (agrisync-scraper) v{} [{}] built {} ({})",
        env!("CARGO_PKG_VERSION"),
        env!("GIT_HASH"),
        env!("BUILD_TIMESTAMP"),
        env!("BUILD_PROFILE")
    );

    let args = Args::parse();
    let request = args.job_request()?;
    let config = Config::load();

    let slack = match config.get(ConfigKey::BotToken) {
        Some(token) => Some(SlackClient::new(token)?),
        None => {
            warn!("BOT_TOKEN not set, Slack notifications disabled");
            None
        }
    };
    let notifier = slack.as_ref().map(|client| client as &dyn Notifier);

    let outcome = handle_job(&request, notifier, || SyncOrchestrator::from_config(&config)).await;

    if outcome.is_success() {
        Ok(ExitCode::SUCCESS)
    } else {
        Ok(ExitCode::FAILURE)
    }
}
