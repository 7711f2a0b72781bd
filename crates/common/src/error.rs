use thiserror::Error;

#[derive(Debug, Error)]
pub enum CrawlerError {
    #[error("HTTP request failed: {0}")]
    HttpRequest(#[from] reqwest::Error),

    #[error("Configuration load failed: {0}")]
    ConfigLoad(String),

    #[error("Fetch failed for account {account}: {reason}")]
    AccountFetch { account: String, reason: String },

    #[error("Archive read failed: {0}")]
    ArchiveRead(String),

    #[error("Serialization failed: {0}")]
    Serialization(String),

    #[error("Storage upload failed: {0}")]
    StorageUpload(String),

    #[error("API error: {0}")]
    Api(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl CrawlerError {
    /// Errors the run can absorb without aborting: a single account failing
    /// or the day's archive being unreadable.
    pub fn is_recoverable(&self) -> bool {
        matches!(self, Self::AccountFetch { .. } | Self::ArchiveRead(_))
    }
}

pub type CrawlerResult<T> = Result<T, CrawlerError>;
