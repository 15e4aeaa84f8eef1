//! Optional in-process schedule for unattended sync runs
//!
//! Cron expressions use the six-field form with seconds first,
//! e.g. `0 0 6 * * *` for every day at 06:00.

use crate::error::{RelayError, RelayResult};
use crate::launcher::JobLauncher;
use agrisync_common::{JobRequest, TriggerSource};
use std::sync::Arc;
use tokio_cron_scheduler::{Job, JobScheduler};

/// Register the scheduled sync and start the scheduler
///
/// Scheduled runs carry no user and the `scheduled` source, so they never
/// post chat messages. The returned scheduler must be kept alive.
pub async fn start(schedule: &str, launcher: Arc<dyn JobLauncher>) -> RelayResult<JobScheduler> {
    let scheduler = JobScheduler::new()
        .await
        .map_err(|e| RelayError::Scheduler(format!("creating scheduler: {}", e)))?;

    let job = Job::new_async(schedule, move |_uuid, _lock| {
        let launcher = launcher.clone();
        Box::pin(async move {
            tracing::info!("Scheduled sync triggered");
            if let Err(e) = launcher.launch(&JobRequest::new(None, TriggerSource::Scheduled)) {
                tracing::error!("Scheduled sync failed to start: {}", e);
            }
        })
    })
    .map_err(|e| RelayError::Scheduler(format!("invalid schedule '{}': {}", schedule, e)))?;

    scheduler
        .add(job)
        .await
        .map_err(|e| RelayError::Scheduler(format!("adding scheduled job: {}", e)))?;
    scheduler
        .start()
        .await
        .map_err(|e| RelayError::Scheduler(format!("starting scheduler: {}", e)))?;

    tracing::info!(schedule = %schedule, "Scheduled sync enabled");
    Ok(scheduler)
}
