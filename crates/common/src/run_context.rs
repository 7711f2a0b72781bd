use time::{Date, Duration, OffsetDateTime, PrimitiveDateTime};

/// The instant a run started. Everything date-dependent in a cycle (archive
/// file names, remote keys, the trailing window) is derived from this value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunContext {
    started_at: OffsetDateTime,
}

impl RunContext {
    pub fn new(started_at: OffsetDateTime) -> Self {
        Self {
            started_at: started_at.to_offset(time::UtcOffset::UTC),
        }
    }

    pub fn now() -> Self {
        Self::new(OffsetDateTime::now_utc())
    }

    pub fn started_at(&self) -> OffsetDateTime {
        self.started_at
    }

    pub fn date(&self) -> Date {
        self.started_at.date()
    }

    /// `YYYYMMDD`
    pub fn date_stamp(&self) -> String {
        let date = self.date();
        format!("{:04}{:02}{:02}", date.year(), u8::from(date.month()), date.day())
    }

    /// Daily file name, e.g. `output_20240131.csv`.
    pub fn daily_file_name(&self, extension: &str) -> String {
        format!("output_{}.{}", self.date_stamp(), extension)
    }

    /// Lower bound (inclusive) of a trailing window ending at run start.
    /// Saturates at the earliest representable instant.
    pub fn window_start(&self, window: Duration) -> OffsetDateTime {
        self.started_at
            .checked_sub(window)
            .unwrap_or_else(|| PrimitiveDateTime::MIN.assume_utc())
    }
}
