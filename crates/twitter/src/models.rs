use serde::{Deserialize, Serialize};
use serde_json::Value;
use time::format_description::well_known::Rfc3339;
use time::macros::format_description;
use time::{OffsetDateTime, UtcOffset};

/// Column order of the daily CSV archive.
pub const CSV_COLUMNS: [&str; 5] = [
    "account_reference",
    "author_display_name",
    "timestamp",
    "text",
    "raw_payload",
];

/// A timeline entry as returned by the API, with the fields the collector
/// cares about pulled out and the full payload kept as-is.
#[derive(Debug, Clone)]
pub struct RawPost {
    pub author_id: String,
    pub author_name: String,
    pub created_at: Option<String>,
    pub text: String,
    pub payload: Value,
}

impl RawPost {
    pub fn from_payload(payload: Value) -> Self {
        let str_at = |pointer: &str| {
            payload
                .pointer(pointer)
                .and_then(Value::as_str)
                .map(str::to_string)
        };

        Self {
            author_id: str_at("/user/screen_name").unwrap_or_default(),
            author_name: str_at("/user/name").unwrap_or_default(),
            created_at: str_at("/created_at"),
            text: str_at("/full_text")
                .or_else(|| str_at("/text"))
                .unwrap_or_default(),
            payload,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NormalizedRecord {
    pub account_reference: String,
    pub author_display_name: String,
    #[serde(with = "time::serde::rfc3339")]
    pub timestamp: OffsetDateTime,
    pub text: String,
    pub raw_payload: String,
}

/// Dedup key: account plus the post instant in nanoseconds.
pub type RecordKey<'a> = (&'a str, i128);

impl NormalizedRecord {
    pub fn key(&self) -> RecordKey<'_> {
        (self.account_reference.as_str(), self.timestamp.unix_timestamp_nanos())
    }
}

/// Account references are configured as `@name` or `name`.
pub fn account_reference(account: &str) -> &str {
    account.trim().trim_start_matches('@')
}

/// Parses `Wed Oct 10 20:19:24 +0000 2018`, or RFC 3339 as a fallback.
pub fn parse_timestamp(value: &str) -> Option<OffsetDateTime> {
    let value = value.trim();
    let legacy = format_description!(
        "[weekday repr:short] [month repr:short] [day] [hour]:[minute]:[second] [offset_hour sign:mandatory][offset_minute] [year]"
    );

    OffsetDateTime::parse(value, legacy)
        .or_else(|_| OffsetDateTime::parse(value, &Rfc3339))
        .ok()
        .and_then(|ts| ts.checked_to_offset(UtcOffset::UTC))
}

/// Projects a raw post onto the archive shape. Missing fields become empty
/// strings and an unreadable timestamp becomes the Unix epoch.
pub fn normalize(account: &str, post: &RawPost) -> NormalizedRecord {
    let timestamp = post
        .created_at
        .as_deref()
        .and_then(parse_timestamp)
        .unwrap_or(OffsetDateTime::UNIX_EPOCH);

    NormalizedRecord {
        account_reference: account_reference(account).to_string(),
        author_display_name: post.author_name.clone(),
        timestamp,
        text: post.text.clone(),
        raw_payload: post.payload.to_string(),
    }
}

/// Text as written to disk: UTF-8, LF line endings, no NUL bytes.
pub fn normalize_text(text: &str) -> String {
    text.replace("\r\n", "\n").replace('\r', "\n").replace('\0', "")
}
