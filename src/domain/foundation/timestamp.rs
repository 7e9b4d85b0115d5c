//! Timestamp value object for immutable points in time.

use chrono::{DateTime, Datelike, Duration, Months, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// Immutable point in time, always UTC.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Timestamp(DateTime<Utc>);

impl Timestamp {
    pub fn now() -> Self {
        Self(Utc::now())
    }

    pub fn from_datetime(dt: DateTime<Utc>) -> Self {
        Self(dt)
    }

    /// Out-of-range values clamp to the Unix epoch.
    pub fn from_unix_secs(secs: u64) -> Self {
        Self(DateTime::from_timestamp(secs as i64, 0).unwrap_or_default())
    }

    pub fn as_datetime(&self) -> &DateTime<Utc> {
        &self.0
    }

    pub fn is_before(&self, other: &Timestamp) -> bool {
        self.0 < other.0
    }

    pub fn is_after(&self, other: &Timestamp) -> bool {
        self.0 > other.0
    }

    /// Signed duration from `other` to `self`.
    pub fn duration_since(&self, other: &Timestamp) -> Duration {
        self.0.signed_duration_since(other.0)
    }

    /// Negative values subtract days.
    pub fn add_days(&self, days: i64) -> Self {
        Self(self.0 + Duration::days(days))
    }

    pub fn minus_days(&self, days: i64) -> Self {
        Self(self.0 - Duration::days(days))
    }

    /// Calendar-aware month addition. Jan 31 + 1 month lands on the last
    /// day of February.
    pub fn add_months(&self, months: u32) -> Self {
        self.0
            .checked_add_months(Months::new(months))
            .map(Self)
            .unwrap_or_else(|| self.add_days(i64::from(months) * 30))
    }

    pub fn add_years(&self, years: u32) -> Self {
        self.add_months(years.saturating_mul(12))
    }

    pub fn plus_secs(&self, secs: u64) -> Self {
        Self(self.0 + Duration::seconds(secs as i64))
    }

    /// UTC calendar date.
    pub fn date(&self) -> NaiveDate {
        self.0.date_naive()
    }

    pub fn as_unix_secs(&self) -> i64 {
        self.0.timestamp()
    }

    pub fn as_unix_millis(&self) -> i64 {
        self.0.timestamp_millis()
    }

    pub fn to_rfc3339(&self) -> String {
        self.0.to_rfc3339()
    }
}

impl Default for Timestamp {
    fn default() -> Self {
        Self::now()
    }
}

impl From<DateTime<Utc>> for Timestamp {
    fn from(dt: DateTime<Utc>) -> Self {
        Self(dt)
    }
}

/// First day of the month containing `date`.
pub fn month_start(date: NaiveDate) -> NaiveDate {
    date.with_day(1).unwrap_or(date)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn at(y: i32, m: u32, d: u32) -> Timestamp {
        Timestamp::from_datetime(Utc.with_ymd_and_hms(y, m, d, 12, 0, 0).unwrap())
    }

    #[test]
    fn add_months_is_calendar_aware() {
        assert_eq!(at(2024, 1, 15).add_months(1), at(2024, 2, 15));
        assert_eq!(at(2024, 1, 31).add_months(1), at(2024, 2, 29));
        assert_eq!(at(2023, 12, 10).add_months(1), at(2024, 1, 10));
    }

    #[test]
    fn add_years_handles_leap_day() {
        assert_eq!(at(2024, 3, 1).add_years(1), at(2025, 3, 1));
        assert_eq!(at(2024, 2, 29).add_years(1), at(2025, 2, 28));
    }

    #[test]
    fn comparisons() {
        let earlier = at(2024, 5, 1);
        let later = at(2024, 5, 2);
        assert!(earlier.is_before(&later));
        assert!(later.is_after(&earlier));
        assert_eq!(later.duration_since(&earlier), Duration::days(1));
    }

    #[test]
    fn month_start_truncates_day() {
        let date = NaiveDate::from_ymd_opt(2024, 7, 23).unwrap();
        assert_eq!(month_start(date), NaiveDate::from_ymd_opt(2024, 7, 1).unwrap());
    }

    #[test]
    fn serializes_as_rfc3339_string() {
        let json = serde_json::to_string(&at(2024, 1, 15)).unwrap();
        assert_eq!(json, "\"2024-01-15T12:00:00Z\"");
    }
}
