//! Weekly collection trigger.
//!
//! The scheduler only invokes the same [`run_collection`] entry point the
//! manual endpoint uses, so it can be replaced by cron or a managed
//! scheduler without touching core logic.

use anyhow::{Context, Result};
use tokio_cron_scheduler::{Job, JobScheduler};
use tracing::{error, info};

use crate::collection::run_collection;
use crate::state::AppState;

/// Monday 09:00 UTC (sec min hour day-of-month month day-of-week).
const WEEKLY_SCHEDULE: &str = "0 0 9 * * Mon";

/// Starts the weekly collection job. The returned scheduler must be kept
/// alive for the job to keep firing.
pub async fn start_weekly_collection(state: AppState) -> Result<JobScheduler> {
    let scheduler = JobScheduler::new().await.context("creating scheduler")?;

    let job = Job::new_async(WEEKLY_SCHEDULE, move |_uuid, _lock| {
        let state = state.clone();
        Box::pin(async move {
            info!("Weekly collection triggered");
            match run_collection(&state).await {
                Ok(outcome) => info!(
                    items_collected = outcome.items_collected,
                    items_skipped = outcome.items_skipped,
                    "Weekly collection finished"
                ),
                Err(e) => error!("Weekly collection failed: {e}"),
            }
        })
    })
    .context("creating weekly collection job")?;

    scheduler.add(job).await.context("adding weekly collection job")?;
    scheduler.start().await.context("starting scheduler")?;
    info!("Weekly collection scheduled ({WEEKLY_SCHEDULE})");

    Ok(scheduler)
}
