use anyhow::Result;
use common::{Config, CrawlerManager, RunContext};
use tracing::info;
use twitter::TwitterTimelineCrawler;

#[tokio::main]
async fn main() -> Result<()> {
    let _ = dotenv::dotenv();
    common::logging::init_tracing()?;

    let config = Config::from_env()?;
    let ctx = RunContext::now();
    info!("Run started at {}", ctx.started_at());

    let twitter = TwitterTimelineCrawler::from_config(&config).await?;
    let manager = CrawlerManager::new().add_crawler(Box::new(twitter));

    manager.run_all(&ctx).await?;
    Ok(())
}
