//! Utility functions for SQLite storage operations.
//!
//! Timestamps are stored as RFC 3339 text in UTC with a fixed microsecond
//! precision, so that comparing the text column orders instants correctly.

use chrono::{DateTime, SecondsFormat, Utc};

use crate::errors::StorageError;

pub fn format_timestamp(instant: DateTime<Utc>) -> String {
    instant.to_rfc3339_opts(SecondsFormat::Micros, true)
}

pub fn parse_timestamp(value: &str) -> Result<DateTime<Utc>, StorageError> {
    DateTime::parse_from_rfc3339(value)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| StorageError::Decode(format!("invalid timestamp '{}': {}", value, e)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    #[test]
    fn test_format_timestamp_is_fixed_width_utc() {
        let instant = Utc.with_ymd_and_hms(2026, 4, 5, 6, 7, 8).unwrap();
        assert_eq!(format_timestamp(instant), "2026-04-05T06:07:08.000000Z");
    }

    #[test]
    fn test_text_order_matches_instant_order() {
        let earlier = Utc.with_ymd_and_hms(2026, 4, 5, 6, 7, 8).unwrap();
        let later = earlier + Duration::microseconds(1);
        assert!(format_timestamp(earlier) < format_timestamp(later));
    }

    #[test]
    fn test_parse_accepts_offsets() {
        let parsed = parse_timestamp("2026-04-05T08:07:08+02:00").unwrap();
        assert_eq!(parsed, Utc.with_ymd_and_hms(2026, 4, 5, 6, 7, 8).unwrap());
    }

    #[test]
    fn test_parse_rejects_garbage() {
        assert!(parse_timestamp("yesterday").is_err());
    }
}
