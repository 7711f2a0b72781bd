mod scheduler;

use anyhow::Result;
use scheduler::{CycleScheduler, DEFAULT_SCHEDULE};
use std::env;
use tracing::info;

#[tokio::main]
async fn main() -> Result<()> {
    let _ = dotenv::dotenv();
    common::logging::init_tracing()?;

    let cron = env::var("SCHEDULE_CRON").unwrap_or_else(|_| DEFAULT_SCHEDULE.to_string());
    info!("Starting timeline collection scheduler ({})", cron);

    let mut scheduler = CycleScheduler::new().await?;
    scheduler
        .schedule_cycles(&cron, || async { twitter::run_twitter_crawler().await })
        .await?;
    scheduler.run_until_interrupted().await?;

    Ok(())
}
