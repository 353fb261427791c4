use crate::config::MarketJobConfig;
use crate::errors::{AppError, AppResult};
use crate::market;
use std::sync::Arc;
use tokio::time::Duration;
use tokio_cron_scheduler::{Job, JobScheduler};
use tracing::{error, info};

/// Runs the market report once at startup, then on every cron trigger.
/// A failed round is logged and retried at the next trigger; the schedule
/// itself keeps running. At most one round runs per process.
pub async fn run_market_schedule(config: MarketJobConfig) -> AppResult<()> {
    let scheduler = JobScheduler::new()
        .await
        .map_err(|err| AppError::Internal(format!("create scheduler: {err}")))?;

    let cron = config.cron.clone();
    let config = Arc::new(config);

    let job_config = config.clone();
    let job = Job::new_async(cron.as_str(), move |_uuid, _lock| {
        let config = job_config.clone();
        Box::pin(async move {
            if let Err(err) = market::run_market_report(&config).await {
                error!(error = %err, "scheduled market report failed");
            }
        })
    })
    .map_err(|err| AppError::Config(format!("cron expression {cron:?}: {err}")))?;

    scheduler
        .add(job)
        .await
        .map_err(|err| AppError::Internal(format!("register job: {err}")))?;
    scheduler
        .start()
        .await
        .map_err(|err| AppError::Internal(format!("start scheduler: {err}")))?;

    // One immediate round so a fresh deployment reports without waiting a day.
    if let Err(err) = market::run_market_report(&config).await {
        error!(error = %err, "startup market report failed");
    }

    info!(cron = %cron, "scheduler started, waiting for next trigger");
    loop {
        tokio::time::sleep(Duration::from_secs(3600)).await;
    }
}
