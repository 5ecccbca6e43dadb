//! Date ranges ending now.

use time::macros::format_description;
use time::{Duration, OffsetDateTime};

/// A range of whole days ending at a given instant, in UTC.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RecentRange {
    start: OffsetDateTime,
    end: OffsetDateTime,
}

impl RecentRange {
    /// The range covering `days` days up to `end`.
    ///
    /// Returns `None` if the start falls outside the representable dates.
    #[must_use]
    pub fn ending_at(end: OffsetDateTime, days: u32) -> Option<Self> {
        let end = end.to_offset(time::UtcOffset::UTC);
        let start = end.checked_sub(Duration::days(i64::from(days)))?;
        Some(Self { start, end })
    }

    /// Start and end as `YYYY-MM-DD`.
    ///
    /// # Errors
    ///
    /// Returns an error if a date cannot be formatted.
    pub fn dates(&self) -> Result<(String, String), time::error::Format> {
        let format = format_description!("[year]-[month]-[day]");
        Ok((self.start.format(&format)?, self.end.format(&format)?))
    }

    /// Start and end as `YYYY-MM-DD HH:MM:SS`.
    ///
    /// # Errors
    ///
    /// Returns an error if a time cannot be formatted.
    pub fn times(&self) -> Result<(String, String), time::error::Format> {
        let format = format_description!("[year]-[month]-[day] [hour]:[minute]:[second]");
        Ok((self.start.format(&format)?, self.end.format(&format)?))
    }
}
