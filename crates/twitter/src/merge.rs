//! Combines a freshly fetched batch with the day's archive.
//!
//! Archive records go first and fresh records after them; on a dedup key
//! collision the later occurrence wins, so a fresh record replaces the
//! archived one. Survivors keep the position of their winning occurrence.

use std::collections::HashSet;

use common::RunContext;
use time::Duration;

use crate::models::NormalizedRecord;

/// Keeps records at or after `started_at - window`. `None` keeps everything.
pub fn filter_window(
    records: Vec<NormalizedRecord>,
    ctx: &RunContext,
    window: Option<Duration>,
) -> Vec<NormalizedRecord> {
    match window {
        Some(window) => {
            let since = ctx.window_start(window);
            records.into_iter().filter(|r| r.timestamp >= since).collect()
        }
        None => records,
    }
}

/// Drops every record whose key occurs again later in the sequence.
pub fn dedupe_keep_last(records: Vec<NormalizedRecord>) -> Vec<NormalizedRecord> {
    let mut seen: HashSet<(String, i128)> = HashSet::with_capacity(records.len());
    let mut kept: Vec<NormalizedRecord> = records
        .into_iter()
        .rev()
        .filter(|r| {
            let (account, nanos) = r.key();
            seen.insert((account.to_string(), nanos))
        })
        .collect();
    kept.reverse();
    kept
}

pub fn merge(
    archive: Vec<NormalizedRecord>,
    fresh: Vec<NormalizedRecord>,
    ctx: &RunContext,
    window: Option<Duration>,
) -> Vec<NormalizedRecord> {
    let fresh = filter_window(fresh, ctx, window);

    let mut working = archive;
    working.extend(fresh);
    dedupe_keep_last(working)
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::macros::datetime;
    use time::OffsetDateTime;

    fn record(account: &str, ts: OffsetDateTime, text: &str) -> NormalizedRecord {
        NormalizedRecord {
            account_reference: account.to_string(),
            author_display_name: format!("{} display", account),
            timestamp: ts,
            text: text.to_string(),
            raw_payload: format!("{{\"text\":\"{}\"}}", text),
        }
    }

    fn ctx() -> RunContext {
        RunContext::new(datetime!(2024-03-07 10:00 UTC))
    }

    fn assert_unique_keys(records: &[NormalizedRecord]) {
        let mut keys = HashSet::new();
        for r in records {
            let (account, nanos) = r.key();
            assert!(
                keys.insert((account.to_string(), nanos)),
                "duplicate key {:?}",
                r.key()
            );
        }
    }

    #[test]
    fn test_fresh_record_overwrites_archived() {
        let t = datetime!(2024-03-07 09:30 UTC);
        let archive = vec![record("a", t, "old")];
        let fresh = vec![record("a", t, "new")];

        let merged = merge(archive, fresh, &ctx(), None);
        assert_eq!(merged.len(), 1);
        assert_eq!(merged[0].text, "new");
    }

    #[test]
    fn test_merge_twice_is_idempotent() {
        let archive = vec![
            record("a", datetime!(2024-03-07 01:00 UTC), "night"),
            record("b", datetime!(2024-03-07 02:00 UTC), "early"),
        ];
        let fresh = vec![
            record("a", datetime!(2024-03-07 09:45 UTC), "latest"),
            record("b", datetime!(2024-03-07 02:00 UTC), "early"),
            record("c", datetime!(2024-03-07 09:15 UTC), "third"),
        ];

        let once = merge(archive, fresh.clone(), &ctx(), None);
        let twice = merge(once.clone(), fresh, &ctx(), None);

        assert_eq!(once, twice);
        assert_eq!(once.len(), 4);
        assert_unique_keys(&once);
    }

    #[test]
    fn test_same_timestamp_different_accounts_both_kept() {
        let t = datetime!(2024-03-07 09:30 UTC);
        let merged = merge(
            Vec::new(),
            vec![record("a", t, "x"), record("b", t, "y")],
            &ctx(),
            None,
        );
        assert_eq!(merged.len(), 2);
    }

    #[test]
    fn test_window_boundary() {
        let fresh = vec![
            record("a", datetime!(2024-03-07 08:59 UTC), "too old"),
            record("a", datetime!(2024-03-07 09:00 UTC), "edge"),
            record("a", datetime!(2024-03-07 09:01 UTC), "recent"),
        ];

        let kept = filter_window(fresh, &ctx(), Some(Duration::hours(1)));
        let texts: Vec<&str> = kept.iter().map(|r| r.text.as_str()).collect();
        assert_eq!(texts, vec!["edge", "recent"]);
    }

    #[test]
    fn test_oversized_window_keeps_everything() {
        let fresh = vec![
            record("a", OffsetDateTime::UNIX_EPOCH, "placeholder timestamp"),
            record("a", datetime!(2024-03-07 09:30 UTC), "recent"),
        ];

        let kept = filter_window(fresh, &ctx(), Some(Duration::hours(i64::from(u32::MAX))));
        assert_eq!(kept.len(), 2);
    }

    #[test]
    fn test_window_never_drops_archived_records() {
        let archive = vec![record("a", datetime!(2024-03-07 00:10 UTC), "archived")];
        let fresh = vec![record("a", datetime!(2024-03-07 00:20 UTC), "stale fetch")];

        let merged = merge(archive, fresh, &ctx(), Some(Duration::hours(1)));
        assert_eq!(merged.len(), 1);
        assert_eq!(merged[0].text, "archived");
    }

    #[test]
    fn test_empty_archive_yields_deduped_batch() {
        let t = datetime!(2024-03-07 09:30 UTC);
        let fresh = vec![
            record("a", t, "first copy"),
            record("b", t, "other"),
            record("a", t, "second copy"),
        ];

        let merged = merge(Vec::new(), fresh, &ctx(), None);
        assert_eq!(merged.len(), 2);
        assert_eq!(merged[0].account_reference, "b");
        assert_eq!(merged[1].text, "second copy");
        assert_unique_keys(&merged);
    }

    #[test]
    fn test_keys_compare_instants_not_offsets() {
        let utc = datetime!(2024-03-07 09:30 UTC);
        let cet = datetime!(2024-03-07 10:30 +01:00);
        let merged = merge(
            vec![record("a", utc, "old")],
            vec![record("a", cet, "new")],
            &ctx(),
            None,
        );
        assert_eq!(merged.len(), 1);
        assert_eq!(merged[0].text, "new");
    }
}
