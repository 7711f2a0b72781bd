use std::fs;
use std::path::Path;

use common::{CrawlerError, CrawlerResult};
use tracing::{info, warn};

use crate::models::{NormalizedRecord, CSV_COLUMNS};

/// Parses archive bytes. Invalid UTF-8 is replaced rather than rejected.
pub fn parse_archive(bytes: &[u8]) -> CrawlerResult<Vec<NormalizedRecord>> {
    let text = String::from_utf8_lossy(bytes);
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .from_reader(text.as_bytes());

    let headers = reader
        .headers()
        .map_err(|e| CrawlerError::ArchiveRead(e.to_string()))?;
    if headers.iter().ne(CSV_COLUMNS.iter().copied()) {
        return Err(CrawlerError::ArchiveRead(format!(
            "unexpected header row: {:?}",
            headers
        )));
    }

    reader
        .deserialize::<NormalizedRecord>()
        .map(|row| row.map_err(|e| CrawlerError::ArchiveRead(e.to_string())))
        .collect()
}

pub fn read_archive(path: &Path) -> CrawlerResult<Vec<NormalizedRecord>> {
    let bytes = fs::read(path)
        .map_err(|e| CrawlerError::ArchiveRead(format!("{}: {}", path.display(), e)))?;
    parse_archive(&bytes)
}

/// The day's archive, or nothing when the file is absent or unreadable.
pub fn load_or_empty(path: &Path) -> Vec<NormalizedRecord> {
    if !path.exists() {
        info!("Initializing new archive of the day at {}", path.display());
        return Vec::new();
    }

    match read_archive(path) {
        Ok(records) => {
            info!("Loaded {} archived records from {}", records.len(), path.display());
            records
        }
        Err(e) => {
            warn!("{}; continuing with an empty archive", e);
            Vec::new()
        }
    }
}
