use async_trait::async_trait;
use tracing::{error, info, warn};

use crate::error::{CrawlerError, CrawlerResult};
use crate::run_context::RunContext;

#[async_trait]
pub trait Crawler: Send + Sync {
    async fn run(&self, ctx: &RunContext) -> CrawlerResult<()>;
    fn name(&self) -> &'static str;
}

/// Runs registered crawlers one after another against a shared run context.
#[derive(Default)]
pub struct CrawlerManager {
    crawlers: Vec<Box<dyn Crawler>>,
}

impl CrawlerManager {
    pub fn new() -> Self {
        Self {
            crawlers: Vec::new(),
        }
    }

    pub fn add_crawler(mut self, crawler: Box<dyn Crawler>) -> Self {
        self.crawlers.push(crawler);
        self
    }

    pub async fn run_all(&self, ctx: &RunContext) -> CrawlerResult<()> {
        let mut success_count = 0;
        let mut error_count = 0;

        for crawler in &self.crawlers {
            let name = crawler.name();
            match crawler.run(ctx).await {
                Ok(()) => {
                    info!("{} completed successfully", name);
                    success_count += 1;
                }
                Err(e) if e.is_recoverable() => {
                    warn!("{} finished with a recoverable error: {}", name, e);
                    success_count += 1;
                }
                Err(e) => {
                    error!("{} failed: {}", name, e);
                    error_count += 1;
                }
            }
        }

        info!(
            "All crawlers finished. Successful: {}, Failed: {}",
            success_count, error_count
        );

        if error_count > 0 {
            return Err(CrawlerError::Api(format!(
                "Some crawlers failed: {} failed, {} succeeded",
                error_count, success_count
            )));
        }

        Ok(())
    }
}
