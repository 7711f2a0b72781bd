use std::fs;
use std::path::Path;

use common::{CrawlerError, CrawlerResult};
use csv::{QuoteStyle, WriterBuilder};
use tracing::info;

use crate::models::{normalize_text, NormalizedRecord, CSV_COLUMNS};

/// Renders the header plus one row per record, every field quoted.
pub fn to_csv_bytes(records: &[NormalizedRecord]) -> CrawlerResult<Vec<u8>> {
    let mut writer = WriterBuilder::new()
        .quote_style(QuoteStyle::Always)
        .has_headers(false)
        .from_writer(Vec::new());

    writer
        .write_record(CSV_COLUMNS)
        .map_err(|e| CrawlerError::Serialization(e.to_string()))?;

    for record in records {
        let row = NormalizedRecord {
            text: normalize_text(&record.text),
            ..record.clone()
        };
        writer
            .serialize(&row)
            .map_err(|e| CrawlerError::Serialization(e.to_string()))?;
    }

    writer
        .into_inner()
        .map_err(|e| CrawlerError::Serialization(e.to_string()))
}

/// Replaces the file at `path` with the given records.
pub fn write_csv(path: &Path, records: &[NormalizedRecord]) -> CrawlerResult<()> {
    let bytes = to_csv_bytes(records)?;
    fs::write(path, bytes)
        .map_err(|e| CrawlerError::Serialization(format!("{}: {}", path.display(), e)))?;
    info!("Wrote {} records to {}", records.len(), path.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::archive::{parse_archive, read_archive};
    use tempfile::tempdir;
    use time::macros::datetime;

    fn sample() -> Vec<NormalizedRecord> {
        vec![
            NormalizedRecord {
                account_reference: "CERT_EU".into(),
                author_display_name: "CERT-EU".into(),
                timestamp: datetime!(2024-03-07 09:30 UTC),
                text: "Advisory, \"critical\"\nsee thread".into(),
                raw_payload: r#"{"full_text":"Advisory","user":{"name":"CERT-EU"}}"#.into(),
            },
            NormalizedRecord {
                account_reference: "enisa_eu".into(),
                author_display_name: "".into(),
                timestamp: datetime!(2024-03-07 09:45:12 UTC),
                text: "Ünïcödé ✓".into(),
                raw_payload: "{}".into(),
            },
        ]
    }

    #[test]
    fn test_every_field_quoted() {
        let bytes = to_csv_bytes(&sample()[1..]).expect("csv");
        let text = String::from_utf8(bytes).expect("utf8");
        let mut lines = text.lines();

        assert_eq!(
            lines.next(),
            Some("\"account_reference\",\"author_display_name\",\"timestamp\",\"text\",\"raw_payload\"")
        );
        assert_eq!(
            lines.next(),
            Some("\"enisa_eu\",\"\",\"2024-03-07T09:45:12Z\",\"Ünïcödé ✓\",\"{}\"")
        );
        assert_eq!(lines.next(), None);
    }

    #[test]
    fn test_round_trip() {
        let tmp = tempdir().expect("tempdir");
        let path = tmp.path().join("output_20240307.csv");

        write_csv(&path, &sample()).expect("write");
        assert_eq!(read_archive(&path).expect("read"), sample());
    }

    #[test]
    fn test_text_normalized_on_write() {
        let mut records = sample();
        records[0].text = "line one\r\nline two\0".into();

        let parsed = parse_archive(&to_csv_bytes(&records).expect("csv")).expect("parse");
        assert_eq!(parsed[0].text, "line one\nline two");
        assert_eq!(parsed[1], records[1]);
    }

    #[test]
    fn test_empty_set_still_has_header() {
        let bytes = to_csv_bytes(&[]).expect("csv");
        assert!(parse_archive(&bytes).expect("parse").is_empty());
    }

    #[test]
    fn test_overwrites_existing_file() {
        let tmp = tempdir().expect("tempdir");
        let path = tmp.path().join("output_20240307.csv");

        write_csv(&path, &sample()).expect("first write");
        write_csv(&path, &sample()[..1]).expect("second write");
        assert_eq!(read_archive(&path).expect("read").len(), 1);
    }
}
