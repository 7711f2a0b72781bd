use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use time::Duration;

use crate::error::{CrawlerError, CrawlerResult};

#[derive(Debug, Clone)]
pub struct SupabaseConfig {
    pub storage_url: String,
    pub key: String,
    pub bucket: String,
}

#[derive(Debug, Clone)]
pub struct TwitterConfig {
    pub credentials_path: PathBuf,
    pub accounts_path: PathBuf,
    pub profile: Option<String>,
    pub api_base_url: String,
    pub post_limit: usize,
    /// Trailing filter window in hours; zero disables the filter.
    pub window_hours: u32,
    pub source_tag: String,
}

impl Default for TwitterConfig {
    fn default() -> Self {
        Self {
            credentials_path: PathBuf::from("./credential.json"),
            accounts_path: PathBuf::from("./users.json"),
            profile: None,
            api_base_url: "https://api.twitter.com".to_string(),
            post_limit: 200,
            window_hours: 1,
            source_tag: "TWITTER".to_string(),
        }
    }
}

impl TwitterConfig {
    pub fn window(&self) -> Option<Duration> {
        (self.window_hours > 0).then(|| Duration::hours(i64::from(self.window_hours)))
    }
}

#[derive(Debug, Clone)]
pub struct OutputConfig {
    pub dir: PathBuf,
    pub export_stix: bool,
    pub retain_local: bool,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            dir: PathBuf::from("."),
            export_stix: true,
            retain_local: false,
        }
    }
}

#[derive(Debug, Clone)]
pub struct Config {
    pub supabase: SupabaseConfig,
    pub twitter: TwitterConfig,
    pub output: OutputConfig,
}

impl Config {
    pub fn from_env() -> CrawlerResult<Self> {
        let supabase_url = require_var("SUPABASE_URL")?;
        let supabase_key = require_var("SUPABASE_SERVICE_ROLE_KEY")?;
        let supabase_bucket = require_var("SUPABASE_BUCKET_NAME")?;

        let storage_url = storage_endpoint(&supabase_url);

        let defaults = TwitterConfig::default();
        let twitter = TwitterConfig {
            credentials_path: env::var("TWITTER_CREDENTIALS_PATH")
                .map(PathBuf::from)
                .unwrap_or(defaults.credentials_path),
            accounts_path: env::var("TWITTER_ACCOUNTS_PATH")
                .map(PathBuf::from)
                .unwrap_or(defaults.accounts_path),
            profile: env::var("TWITTER_PROFILE")
                .ok()
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty()),
            api_base_url: env::var("TWITTER_API_BASE_URL").unwrap_or(defaults.api_base_url),
            post_limit: parsed_var("TWITTER_POST_LIMIT").unwrap_or(defaults.post_limit),
            window_hours: parsed_var("TWITTER_WINDOW_HOURS").unwrap_or(defaults.window_hours),
            source_tag: env::var("TWITTER_SOURCE_TAG").unwrap_or(defaults.source_tag),
        };

        let output_defaults = OutputConfig::default();
        let output = OutputConfig {
            dir: env::var("OUTPUT_DIR")
                .map(PathBuf::from)
                .unwrap_or(output_defaults.dir),
            export_stix: bool_var("EXPORT_STIX").unwrap_or(output_defaults.export_stix),
            retain_local: bool_var("RETAIN_LOCAL_ARCHIVE").unwrap_or(output_defaults.retain_local),
        };

        Ok(Config {
            supabase: SupabaseConfig {
                storage_url,
                key: supabase_key,
                bucket: supabase_bucket,
            },
            twitter,
            output,
        })
    }
}

/// Object storage lives under the project URL.
fn storage_endpoint(project_url: &str) -> String {
    format!("{}/storage/v1", project_url.trim().trim_end_matches('/'))
}

fn require_var(name: &str) -> CrawlerResult<String> {
    env::var(name).map_err(|_| CrawlerError::ConfigLoad(format!("{} must be set", name)))
}

fn parsed_var<T: std::str::FromStr>(name: &str) -> Option<T> {
    env::var(name).ok().and_then(|s| s.trim().parse().ok())
}

fn bool_var(name: &str) -> Option<bool> {
    env::var(name).ok().and_then(|s| parse_bool(&s))
}

fn parse_bool(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

/// Key material for one profile of the credentials document.
#[derive(Debug, Clone, Deserialize)]
pub struct TwitterCredentials {
    pub consumer_key: String,
    pub consumer_secret: String,
    #[serde(default)]
    pub access_token: Option<String>,
    #[serde(default)]
    pub access_secret: Option<String>,
    #[serde(default)]
    pub bearer_token: Option<String>,
}

/// Reads the credentials document and returns the requested profile, or the
/// first profile in document order when none is named.
pub fn load_credentials(path: &Path, profile: Option<&str>) -> CrawlerResult<TwitterCredentials> {
    let raw = read_document(path)?;
    let profiles: serde_json::Map<String, serde_json::Value> = serde_json::from_str(&raw)
        .map_err(|e| {
            CrawlerError::ConfigLoad(format!("invalid credentials document {}: {}", path.display(), e))
        })?;

    let (name, value): (&str, &serde_json::Value) = match profile {
        Some(name) => profiles
            .get(name)
            .map(|value| (name, value))
            .ok_or_else(|| CrawlerError::ConfigLoad(format!("credential profile '{}' not found", name)))?,
        None => profiles
            .iter()
            .next()
            .map(|(name, value)| (name.as_str(), value))
            .ok_or_else(|| {
                CrawlerError::ConfigLoad(format!("no credential profiles in {}", path.display()))
            })?,
    };

    serde_json::from_value(value.clone()).map_err(|e| {
        CrawlerError::ConfigLoad(format!("credential profile '{}' is malformed: {}", name, e))
    })
}

#[derive(Debug, Deserialize)]
struct AccountsDocument {
    user_to_follow: Vec<String>,
}

/// Reads the list of accounts to monitor, preserving configured order.
pub fn load_accounts(path: &Path) -> CrawlerResult<Vec<String>> {
    let raw = read_document(path)?;
    let doc: AccountsDocument = serde_json::from_str(&raw).map_err(|e| {
        CrawlerError::ConfigLoad(format!("invalid accounts document {}: {}", path.display(), e))
    })?;

    Ok(doc
        .user_to_follow
        .into_iter()
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect())
}

fn read_document(path: &Path) -> CrawlerResult<String> {
    fs::read_to_string(path)
        .map_err(|e| CrawlerError::ConfigLoad(format!("cannot read {}: {}", path.display(), e)))
}
