//! agrisync-relay - Slack webhook relay for AgriSync
//!
//! Receives signed Slack Events API / Interactivity requests, publishes the
//! App Home control panel and launches `agrisync-scraper` runs.

use agrisync_common::config::{Config, ConfigKey};
use agrisync_common::slack::SlackClient;
use agrisync_relay::{build_router, scheduler, AppState, JobLauncher, ProcessLauncher};
use anyhow::{Context, Result};
use clap::Parser;
use std::sync::Arc;
use tracing::{info, warn};

#[derive(Debug, Parser)]
#[command(name = "agrisync-relay", version, about = "Slack webhook relay for AgriSync")]
struct Args {
    /// Listen address (overrides AGRISYNC_BIND and the config file)
    #[arg(long)]
    bind: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .init();

    info!(
        "Starting AgriSync relay (agrisync-relay) v{} [{}] built {} ({})",
        env!("CARGO_PKG_VERSION"),
        env!("GIT_HASH"),
        env!("BUILD_TIMESTAMP"),
        env!("BUILD_PROFILE")
    );

    let args = Args::parse();
    let config = Config::load();

    let signing_secret = config.require(ConfigKey::SigningSecret)?;

    let slack = match config.get(ConfigKey::BotToken) {
        Some(token) => Some(SlackClient::new(token)?),
        None => {
            warn!("BOT_TOKEN not set, App Home view will not be published");
            None
        }
    };

    let scraper_bin = config.require(ConfigKey::ScraperBin)?;
    info!("Scraper binary: {}", scraper_bin);
    let launcher: Arc<dyn JobLauncher> = Arc::new(ProcessLauncher::new(scraper_bin));

    // Kept alive for the lifetime of the server
    let _scheduler = match config.get(ConfigKey::Schedule) {
        Some(schedule) => Some(scheduler::start(&schedule, launcher.clone()).await?),
        None => None,
    };

    let state = AppState::new(signing_secret, slack, launcher);
    let app = build_router(state);

    let bind = match args.bind {
        Some(bind) => bind,
        None => config.require(ConfigKey::Bind)?,
    };
    let listener = tokio::net::TcpListener::bind(&bind)
        .await
        .with_context(|| format!("Failed to bind {}", bind))?;
    info!("agrisync-relay listening on http://{}", bind);
    info!("Slack endpoint: http://{}/slack/events", bind);
    info!("Health check: http://{}/health", bind);

    axum::serve(listener, app).await?;

    Ok(())
}
