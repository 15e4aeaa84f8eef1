//! Fire-and-forget launch of a scraper run

use crate::error::{RelayError, RelayResult};
use agrisync_common::JobRequest;
use std::path::PathBuf;
use std::process::Stdio;
use tokio::process::Command;

/// Starts a sync run without waiting for it
pub trait JobLauncher: Send + Sync {
    fn launch(&self, request: &JobRequest) -> RelayResult<()>;
}

/// Spawns the scraper binary as a detached child: `<program> --payload <json>`
///
/// The child's exit status is collected in the background and logged; the
/// caller returns as soon as the process has started.
#[derive(Debug, Clone)]
pub struct ProcessLauncher {
    program: PathBuf,
}

impl ProcessLauncher {
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
        }
    }

    pub fn program(&self) -> &PathBuf {
        &self.program
    }
}

impl JobLauncher for ProcessLauncher {
    fn launch(&self, request: &JobRequest) -> RelayResult<()> {
        let payload = serde_json::to_string(request)
            .map_err(|e| RelayError::Launch(format!("cannot encode payload: {}", e)))?;

        let mut child = Command::new(&self.program)
            .arg("--payload")
            .arg(&payload)
            .stdin(Stdio::null())
            .spawn()
            .map_err(|e| RelayError::Launch(format!("{}: {}", self.program.display(), e)))?;

        tracing::info!(
            pid = ?child.id(),
            source = %request.source,
            user_id = ?request.user_id,
            "Sync job launched"
        );

        // Reap the child so it never lingers as a zombie
        tokio::spawn(async move {
            match child.wait().await {
                Ok(status) if status.success() => tracing::info!("Sync job finished"),
                Ok(status) => tracing::warn!("Sync job exited with {}", status),
                Err(e) => tracing::warn!("Failed to wait for sync job: {}", e),
            }
        });

        Ok(())
    }
}
