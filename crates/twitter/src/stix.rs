//! STIX 2.1 export of the merged archive: one `observed-data` object per
//! record, wrapping the posting account and the post content.

use std::fs;
use std::path::Path;

use common::{CrawlerError, CrawlerResult, RunContext};
use serde::{Deserialize, Serialize};
use serde_json::ser::{PrettyFormatter, Serializer};
use time::OffsetDateTime;
use tracing::info;
use uuid::Uuid;

use crate::models::{normalize_text, NormalizedRecord};

pub const SOCIAL_OBJECT_TYPE: &str = "x-csaware-social";
const SOURCE: &str = "twitter";
const SPEC_VERSION: &str = "2.1";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Bundle {
    #[serde(rename = "type")]
    pub kind: String,
    pub id: String,
    pub objects: Vec<ObservedData>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ObservedData {
    #[serde(rename = "type")]
    pub kind: String,
    pub spec_version: String,
    pub id: String,
    #[serde(with = "time::serde::rfc3339")]
    pub created: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub modified: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub first_observed: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub last_observed: OffsetDateTime,
    pub number_observed: u32,
    pub objects: ObservedObjects,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ObservedObjects {
    #[serde(rename = "0")]
    pub account: UserAccount,
    #[serde(rename = "1")]
    pub content: SocialContent,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserAccount {
    #[serde(rename = "type")]
    pub kind: String,
    pub user_id: String,
    pub display_name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SocialContent {
    #[serde(rename = "type")]
    pub kind: String,
    pub source: String,
    pub title: String,
    pub text: String,
    pub subject: String,
}

/// Stable per-record id, so re-exporting an unchanged archive keeps ids.
fn observed_data_id(record: &NormalizedRecord) -> String {
    let (account, nanos) = record.key();
    let name = format!("{}|{}", account, nanos);
    format!(
        "observed-data--{}",
        Uuid::new_v5(&Uuid::NAMESPACE_OID, name.as_bytes())
    )
}

pub fn observed_data(record: &NormalizedRecord, ctx: &RunContext) -> ObservedData {
    ObservedData {
        kind: "observed-data".to_string(),
        spec_version: SPEC_VERSION.to_string(),
        id: observed_data_id(record),
        created: ctx.started_at(),
        modified: ctx.started_at(),
        first_observed: record.timestamp,
        last_observed: record.timestamp,
        number_observed: 1,
        objects: ObservedObjects {
            account: UserAccount {
                kind: "user-account".to_string(),
                user_id: record.account_reference.clone(),
                display_name: record.author_display_name.clone(),
            },
            content: SocialContent {
                kind: SOCIAL_OBJECT_TYPE.to_string(),
                source: SOURCE.to_string(),
                title: String::new(),
                text: normalize_text(&record.text),
                subject: String::new(),
            },
        },
    }
}

pub fn build_bundle(records: &[NormalizedRecord], ctx: &RunContext) -> Bundle {
    Bundle {
        kind: "bundle".to_string(),
        id: format!("bundle--{}", Uuid::new_v4()),
        objects: records.iter().map(|r| observed_data(r, ctx)).collect(),
    }
}

pub fn to_json_bytes(bundle: &Bundle) -> CrawlerResult<Vec<u8>> {
    let mut out = Vec::new();
    let mut serializer = Serializer::with_formatter(&mut out, PrettyFormatter::with_indent(b"    "));
    bundle
        .serialize(&mut serializer)
        .map_err(|e| CrawlerError::Serialization(e.to_string()))?;
    Ok(out)
}

pub fn write_bundle(path: &Path, bundle: &Bundle) -> CrawlerResult<()> {
    let bytes = to_json_bytes(bundle)?;
    fs::write(path, bytes)
        .map_err(|e| CrawlerError::Serialization(format!("{}: {}", path.display(), e)))?;
    info!(
        "Wrote STIX bundle with {} objects to {}",
        bundle.objects.len(),
        path.display()
    );
    Ok(())
}
