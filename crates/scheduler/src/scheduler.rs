use anyhow::{Context, Result};
use std::future::Future;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use time::OffsetDateTime;
use tokio_cron_scheduler::{Job, JobScheduler};
use tracing::{error, info, warn};

/// Every eight hours, on the hour.
pub const DEFAULT_SCHEDULE: &str = "0 0 */8 * * *";

/// Runs collection cycles on a cron schedule. A tick that fires while the
/// previous cycle is still running is skipped.
pub struct CycleScheduler {
    scheduler: JobScheduler,
}

impl CycleScheduler {
    pub async fn new() -> Result<Self> {
        let scheduler = JobScheduler::new().await?;
        Ok(Self { scheduler })
    }

    pub async fn schedule_cycles<F, Fut>(&mut self, cron: &str, cycle: F) -> Result<()>
    where
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<()>> + Send + 'static,
    {
        let cycle = Arc::new(cycle);
        let running = Arc::new(AtomicBool::new(false));

        let job = Job::new_async(cron, move |_uuid, _l| {
            let cycle = cycle.clone();
            let running = running.clone();
            Box::pin(async move {
                if running.swap(true, Ordering::SeqCst) {
                    warn!("Previous cycle still running, skipping tick");
                    return;
                }
                info!("Collection cycle started at {}", OffsetDateTime::now_utc());
                if let Err(e) = cycle().await {
                    error!("Collection cycle failed: {:#}", e);
                } else {
                    info!("Collection cycle finished");
                }
                running.store(false, Ordering::SeqCst);
            })
        })
        .with_context(|| format!("invalid cron expression '{}'", cron))?;

        self.scheduler.add(job).await?;
        info!("Collection cycles scheduled with cron '{}'", cron);
        Ok(())
    }

    /// Starts the scheduler and blocks until Ctrl+C.
    pub async fn run_until_interrupted(mut self) -> Result<()> {
        self.scheduler.start().await?;
        info!("Press Ctrl+C to stop the scheduler");

        tokio::signal::ctrl_c().await?;
        info!("Received interrupt signal, shutting down...");
        self.scheduler.shutdown().await?;
        Ok(())
    }
}
