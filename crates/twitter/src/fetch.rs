use tracing::{info, warn};

use crate::api::{AccountFetchError, TimelineSource};
use crate::models::{normalize, NormalizedRecord};

/// Records gathered across all accounts plus the accounts that failed.
#[derive(Debug, Default)]
pub struct FetchOutcome {
    pub records: Vec<NormalizedRecord>,
    pub failures: Vec<(String, AccountFetchError)>,
}

/// Fetches each account in order. A failing account is logged and recorded;
/// it never stops the remaining accounts from being fetched.
pub async fn fetch_all(source: &dyn TimelineSource, accounts: &[String], limit: usize) -> FetchOutcome {
    let mut outcome = FetchOutcome::default();

    for account in accounts {
        info!("Fetching timeline for {}", account);
        match source.user_timeline(account, limit).await {
            Ok(posts) => {
                info!("{} posts fetched for {}", posts.len(), account);
                outcome
                    .records
                    .extend(posts.iter().map(|post| normalize(account, post)));
            }
            Err(e) => {
                warn!("{}", e.to_crawler_error(account));
                outcome.failures.push((account.clone(), e));
            }
        }
    }

    outcome
}
