//! Background jobs: the notification dispatcher and the statistics cache
//! eviction schedule.

use anyhow::Result;
use chrono::Utc;
use tokio_cron_scheduler::{Job, JobScheduler};
use tracing::{debug, error, info};

use crate::notifier::NotificationService;
use crate::stats::{self, StatsService};

/// Eviction cadence per aggregate. Faster-moving views refresh more often;
/// everything is dropped at midnight so calendar windows roll over.
const EVICTIONS: [(&str, &[&str]); 4] = [
    ("0 */2 * * * *", &[stats::DAILY_KEY]),
    ("0 */5 * * * *", &[stats::DASHBOARD_KEY]),
    ("0 */10 * * * *", &[stats::MONTHLY_KEY, stats::REVENUE_KEY]),
    ("0 */15 * * * *", &[stats::VEHICLE_TYPES_KEY, stats::REGIONS_KEY]),
];

/// Start the dispatcher and eviction jobs; the returned scheduler must be
/// kept alive for the jobs to run
pub async fn start_jobs(
    notifier: NotificationService,
    stats: StatsService,
) -> Result<JobScheduler> {
    let scheduler = JobScheduler::new().await?;

    // Flush due scheduled notifications every minute.
    let dispatcher = notifier.clone();
    let job = Job::new_async("0 * * * * *", move |_, _| {
        let dispatcher = dispatcher.clone();
        Box::pin(async move {
            match dispatcher.dispatch_due(Utc::now()).await {
                Ok(0) => {}
                Ok(n) => info!("Notification dispatcher sent {} notification(s)", n),
                Err(e) => error!("Notification dispatch failed: {}", e),
            }
        })
    })?;
    scheduler.add(job).await?;

    for (schedule, keys) in EVICTIONS {
        let stats = stats.clone();
        let job = Job::new_async(schedule, move |_, _| {
            let stats = stats.clone();
            Box::pin(async move {
                stats.evict(keys).await;
                debug!("Evicted stats cache keys: {:?}", keys);
            })
        })?;
        scheduler.add(job).await?;
    }

    // Full reset at midnight UTC.
    let stats_midnight = stats.clone();
    let job = Job::new_async("0 0 0 * * *", move |_, _| {
        let stats = stats_midnight.clone();
        Box::pin(async move {
            stats.evict(&stats::ALL_KEYS).await;
            info!("Evicted all stats cache keys for the new day");
        })
    })?;
    scheduler.add(job).await?;

    scheduler.start().await?;
    info!("Background jobs started: dispatcher + {} eviction schedules", EVICTIONS.len() + 1);

    Ok(scheduler)
}
