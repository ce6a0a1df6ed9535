//! Periodic housekeeping: expired sessions and stale login counters
//!
//! Expired tokens are already rejected at validation time; the sweep only
//! keeps the sessions table and the rate limiter from growing.

use tokio_cron_scheduler::{Job, JobScheduler, JobSchedulerError};
use tracing::{debug, error, info};

use crate::service::AuthService;

/// Start a scheduler that sweeps expired sessions and prunes the login
/// rate limiter on `schedule`.
///
/// The returned scheduler must be kept alive for the job to keep running.
pub async fn start_sweeper(
    service: AuthService,
    schedule: &str,
) -> Result<JobScheduler, JobSchedulerError> {
    let scheduler = JobScheduler::new().await?;

    let job = Job::new_async(schedule, move |_, _| {
        let service = service.clone();
        Box::pin(async move {
            if let Err(e) = service.sessions().sweep_expired().await {
                error!("Failed to sweep expired sessions: {}", e);
            }

            let pruned = service.rate_limiter().prune().await;
            if pruned > 0 {
                debug!("Pruned {} stale login counters", pruned);
            }
        })
    })?;

    scheduler.add(job).await?;
    scheduler.start().await?;

    info!("Started sweeper with schedule: {}", schedule);
    Ok(scheduler)
}
