pub mod api;
pub mod archive;
pub mod fetch;
pub mod merge;
pub mod models;
pub mod stix;
pub mod writer;

use std::fs;
use std::sync::Arc;

use api::{AccountFetchError, TimelineSource, TwitterApi};
use async_trait::async_trait;
use common::config::{load_accounts, load_credentials};
use common::{
    Config, Crawler, CrawlerResult, OutputConfig, RemotePublisher, RunContext, SupabaseStorageClient,
    TwitterConfig,
};
use tracing::info;

/// What one fetch-merge-persist cycle did.
#[derive(Debug)]
pub struct RunSummary {
    pub fetched: usize,
    pub failed_accounts: Vec<(String, AccountFetchError)>,
    pub merged: usize,
    pub uploaded_keys: Vec<String>,
}

pub struct TwitterTimelineCrawler {
    source: Arc<dyn TimelineSource>,
    publisher: RemotePublisher,
    accounts: Vec<String>,
    settings: TwitterConfig,
    output: OutputConfig,
}

impl TwitterTimelineCrawler {
    pub fn new(
        source: Arc<dyn TimelineSource>,
        publisher: RemotePublisher,
        accounts: Vec<String>,
        settings: TwitterConfig,
        output: OutputConfig,
    ) -> Self {
        Self {
            source,
            publisher,
            accounts,
            settings,
            output,
        }
    }

    /// Loads both documents and authenticates against the API.
    pub async fn from_config(config: &Config) -> CrawlerResult<Self> {
        let credentials = load_credentials(
            &config.twitter.credentials_path,
            config.twitter.profile.as_deref(),
        )?;
        let accounts = load_accounts(&config.twitter.accounts_path)?;
        info!("Monitoring {} accounts", accounts.len());

        let api = TwitterApi::authenticate(&config.twitter.api_base_url, &credentials).await?;

        let storage_client = SupabaseStorageClient::new(
            &config.supabase.storage_url,
            &config.supabase.key,
            &config.supabase.bucket,
        );
        let publisher = RemotePublisher::new(Arc::new(storage_client), &config.twitter.source_tag)
            .retain_local(config.output.retain_local);

        Ok(Self::new(
            Arc::new(api),
            publisher,
            accounts,
            config.twitter.clone(),
            config.output.clone(),
        ))
    }

    pub async fn run_cycle(&self, ctx: &RunContext) -> CrawlerResult<RunSummary> {
        let outcome =
            fetch::fetch_all(self.source.as_ref(), &self.accounts, self.settings.post_limit).await;
        let fetched = outcome.records.len();
        info!(
            "Fetched {} records, {} accounts failed",
            fetched,
            outcome.failures.len()
        );

        fs::create_dir_all(&self.output.dir)?;
        let archive_path = self.output.dir.join(ctx.daily_file_name("csv"));
        let archived = archive::load_or_empty(&archive_path);

        let merged = merge::merge(archived, outcome.records, ctx, self.settings.window());
        writer::write_csv(&archive_path, &merged)?;

        let mut artifacts = vec![archive_path];
        if self.output.export_stix {
            let stix_path = self.output.dir.join(ctx.daily_file_name("json"));
            stix::write_bundle(&stix_path, &stix::build_bundle(&merged, ctx))?;
            artifacts.push(stix_path);
        }

        let mut uploaded_keys = Vec::with_capacity(artifacts.len());
        for artifact in &artifacts {
            uploaded_keys.push(self.publisher.publish(artifact, ctx.date()).await?);
        }

        Ok(RunSummary {
            fetched,
            failed_accounts: outcome.failures,
            merged: merged.len(),
            uploaded_keys,
        })
    }
}

#[async_trait]
impl Crawler for TwitterTimelineCrawler {
    async fn run(&self, ctx: &RunContext) -> CrawlerResult<()> {
        info!("Twitter timeline collector starting up");
        let summary = self.run_cycle(ctx).await?;

        info!(
            "Merged archive holds {} records ({} accounts skipped); uploaded {}",
            summary.merged,
            summary.failed_accounts.len(),
            summary.uploaded_keys.join(", ")
        );
        Ok(())
    }

    fn name(&self) -> &'static str {
        "Twitter Timelines"
    }
}

pub async fn run_twitter_crawler() -> anyhow::Result<()> {
    let _ = dotenv::dotenv();
    let config = Config::from_env()?;
    let crawler = TwitterTimelineCrawler::from_config(&config).await?;
    crawler
        .run(&RunContext::now())
        .await
        .map_err(|e| anyhow::anyhow!(e))
}
