use async_trait::async_trait;
use common::{CrawlerError, CrawlerResult, TwitterCredentials};
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use serde_json::Value;
use thiserror::Error;
use tracing::{debug, info};

use crate::models::{account_reference, RawPost};

/// The v1.1 timeline endpoint refuses counts above this.
const MAX_TIMELINE_COUNT: usize = 200;

#[derive(Debug, Clone, Error)]
pub enum AccountFetchError {
    #[error("account {0} not found")]
    AccountNotFound(String),

    #[error("upstream error: {0}")]
    Upstream(String),
}

impl AccountFetchError {
    pub fn to_crawler_error(&self, account: &str) -> CrawlerError {
        CrawlerError::AccountFetch {
            account: account.to_string(),
            reason: self.to_string(),
        }
    }
}

/// Anything that can hand back the most recent posts of an account.
#[async_trait]
pub trait TimelineSource: Send + Sync {
    async fn user_timeline(&self, account: &str, count: usize) -> Result<Vec<RawPost>, AccountFetchError>;
}

#[derive(Deserialize)]
struct TokenResponse {
    token_type: String,
    access_token: String,
}

#[derive(Clone)]
pub struct TwitterApi {
    client: Client,
    base_url: String,
    bearer: String,
}

impl TwitterApi {
    pub fn with_bearer(base_url: &str, bearer: &str) -> CrawlerResult<Self> {
        Ok(Self {
            client: build_client()?,
            base_url: base_url.trim_end_matches('/').to_string(),
            bearer: bearer.to_string(),
        })
    }

    /// Uses the profile's bearer token when present, otherwise trades the
    /// consumer key pair for an application token.
    pub async fn authenticate(base_url: &str, credentials: &TwitterCredentials) -> CrawlerResult<Self> {
        let base_url = base_url.trim_end_matches('/').to_string();
        let client = build_client()?;

        let bearer = match credentials.bearer_token.as_deref().map(str::trim) {
            Some(token) if !token.is_empty() => token.to_string(),
            _ => request_bearer_token(&client, &base_url, credentials).await?,
        };

        Ok(Self {
            client,
            base_url,
            bearer,
        })
    }
}

fn build_client() -> CrawlerResult<Client> {
    Client::builder()
        .user_agent(concat!("timeline-collector/", env!("CARGO_PKG_VERSION")))
        .build()
        .map_err(CrawlerError::HttpRequest)
}

async fn request_bearer_token(
    client: &Client,
    base_url: &str,
    credentials: &TwitterCredentials,
) -> CrawlerResult<String> {
    let url = format!("{}/oauth2/token", base_url);
    info!("Requesting application token from {}", url);

    let response = client
        .post(&url)
        .basic_auth(&credentials.consumer_key, Some(&credentials.consumer_secret))
        .form(&[("grant_type", "client_credentials")])
        .send()
        .await?;

    if !response.status().is_success() {
        let status = response.status();
        let text = response.text().await.unwrap_or_default();
        return Err(CrawlerError::ConfigLoad(format!(
            "token request rejected: {} - {}",
            status, text
        )));
    }

    let token: TokenResponse = response.json().await?;
    if !token.token_type.eq_ignore_ascii_case("bearer") {
        return Err(CrawlerError::ConfigLoad(format!(
            "unexpected token type '{}'",
            token.token_type
        )));
    }
    Ok(token.access_token)
}

#[async_trait]
impl TimelineSource for TwitterApi {
    async fn user_timeline(&self, account: &str, count: usize) -> Result<Vec<RawPost>, AccountFetchError> {
        let screen_name = account_reference(account);
        let url = format!("{}/1.1/statuses/user_timeline.json", self.base_url);
        let count = count.clamp(1, MAX_TIMELINE_COUNT).to_string();

        let response = self
            .client
            .get(&url)
            .bearer_auth(&self.bearer)
            .query(&[
                ("screen_name", screen_name),
                ("count", count.as_str()),
                ("tweet_mode", "extended"),
            ])
            .send()
            .await
            .map_err(|e| AccountFetchError::Upstream(e.to_string()))?;

        let status = response.status();
        if status == StatusCode::NOT_FOUND {
            return Err(AccountFetchError::AccountNotFound(screen_name.to_string()));
        }
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            return Err(AccountFetchError::Upstream(format!("{} - {}", status, text)));
        }

        let body: Value = response
            .json()
            .await
            .map_err(|e| AccountFetchError::Upstream(e.to_string()))?;

        match body {
            Value::Array(items) => {
                debug!("{} posts returned for {}", items.len(), screen_name);
                Ok(items.into_iter().map(RawPost::from_payload).collect())
            }
            other => Err(AccountFetchError::Upstream(format!(
                "expected a list of posts, got {}",
                other
            ))),
        }
    }
}
