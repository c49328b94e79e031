use chrono::{NaiveDate, NaiveDateTime, NaiveTime};

use crate::domain::error::TransferError;

// ─────────────────────────────────────────────────────────────────────────────
// SQLite bind values
// ─────────────────────────────────────────────────────────────────────────────

/// A value in one of SQLite's five storage classes, ready to bind into an
/// INSERT. The value adapter produces these from MySQL wire values; nothing
/// downstream needs to know the source type anymore.
#[derive(Debug, Clone, PartialEq)]
pub enum SqliteValue {
    Null,
    Integer(i64),
    Real(f64),
    Text(String),
    Blob(Vec<u8>),
}

impl SqliteValue {
    pub fn is_null(&self) -> bool {
        matches!(self, SqliteValue::Null)
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Date/time formatting (write side)
// ─────────────────────────────────────────────────────────────────────────────
//
// SQLite stores dates and times as ISO-8601 text; fractional seconds are
// written only when present so that the common case round-trips byte-exact.

pub fn format_date(d: &NaiveDate) -> String {
    d.format("%Y-%m-%d").to_string()
}

pub fn format_datetime(dt: &NaiveDateTime) -> String {
    if subsec_micros(&dt.time()) == 0 {
        dt.format("%Y-%m-%d %H:%M:%S").to_string()
    } else {
        dt.format("%Y-%m-%d %H:%M:%S%.6f").to_string()
    }
}

pub fn format_time(t: &NaiveTime) -> String {
    if subsec_micros(t) == 0 {
        t.format("%H:%M:%S").to_string()
    } else {
        t.format("%H:%M:%S%.6f").to_string()
    }
}

fn subsec_micros(t: &NaiveTime) -> u32 {
    use chrono::Timelike;
    (t.nanosecond() % 1_000_000_000) / 1_000
}

// ─────────────────────────────────────────────────────────────────────────────
// Date/time readback (lenient)
// ─────────────────────────────────────────────────────────────────────────────
//
// Used by tests and identity checks when reading the destination back.
// ISO-8601 is tried first; a handful of permissive fallback formats follow.
// Anything else is a MalformedTemporal error.

const DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M",
    "%Y/%m/%d %H:%M:%S",
    "%d.%m.%Y %H:%M:%S",
];

const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%Y/%m/%d", "%d.%m.%Y"];

const TIME_FORMATS: &[&str] = &["%H:%M:%S%.f", "%H:%M"];

pub fn parse_datetime(s: &str) -> Result<NaiveDateTime, TransferError> {
    let trimmed = s.trim();
    for fmt in DATETIME_FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(trimmed, fmt) {
            return Ok(dt);
        }
    }
    // A bare date reads back as midnight.
    if let Ok(d) = parse_date(trimmed) {
        if let Some(dt) = d.and_hms_opt(0, 0, 0) {
            return Ok(dt);
        }
    }
    Err(TransferError::MalformedTemporal(s.to_string()))
}

pub fn parse_date(s: &str) -> Result<NaiveDate, TransferError> {
    let trimmed = s.trim();
    for fmt in DATE_FORMATS {
        if let Ok(d) = NaiveDate::parse_from_str(trimmed, fmt) {
            return Ok(d);
        }
    }
    Err(TransferError::MalformedTemporal(s.to_string()))
}

pub fn parse_time(s: &str) -> Result<NaiveTime, TransferError> {
    let trimmed = s.trim();
    for fmt in TIME_FORMATS {
        if let Ok(t) = NaiveTime::parse_from_str(trimmed, fmt) {
            return Ok(t);
        }
    }
    Err(TransferError::MalformedTemporal(s.to_string()))
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_datetime_omits_zero_fraction() {
        let dt = NaiveDate::from_ymd_opt(2024, 3, 1)
            .unwrap()
            .and_hms_opt(12, 30, 45)
            .unwrap();
        assert_eq!(format_datetime(&dt), "2024-03-01 12:30:45");
    }

    #[test]
    fn test_format_datetime_keeps_microseconds() {
        let dt = NaiveDate::from_ymd_opt(2024, 3, 1)
            .unwrap()
            .and_hms_micro_opt(12, 30, 45, 123456)
            .unwrap();
        assert_eq!(format_datetime(&dt), "2024-03-01 12:30:45.123456");
    }

    #[test]
    fn test_format_date_and_time() {
        let d = NaiveDate::from_ymd_opt(1999, 12, 31).unwrap();
        assert_eq!(format_date(&d), "1999-12-31");
        let t = NaiveTime::from_hms_opt(7, 5, 3).unwrap();
        assert_eq!(format_time(&t), "07:05:03");
    }

    #[test]
    fn test_parse_datetime_iso_first() {
        let dt = parse_datetime("2024-03-01 12:30:45").unwrap();
        assert_eq!(format_datetime(&dt), "2024-03-01 12:30:45");
        let dt = parse_datetime("2024-03-01T12:30:45.5").unwrap();
        assert_eq!(dt.format("%H:%M:%S%.1f").to_string(), "12:30:45.5");
    }

    #[test]
    fn test_parse_datetime_permissive_fallbacks() {
        assert!(parse_datetime("2024/03/01 12:30:45").is_ok());
        assert!(parse_datetime("01.03.2024 12:30:45").is_ok());
        // Bare date → midnight.
        let dt = parse_datetime("2024-03-01").unwrap();
        assert_eq!(format_datetime(&dt), "2024-03-01 00:00:00");
    }

    #[test]
    fn test_parse_datetime_malformed_is_dedicated_error() {
        let err = parse_datetime("not a date").unwrap_err();
        assert!(matches!(err, TransferError::MalformedTemporal(_)));
        assert!(err.to_string().contains("not a date"));
    }

    #[test]
    fn test_parse_time_roundtrip() {
        let t = parse_time("23:59:59").unwrap();
        assert_eq!(format_time(&t), "23:59:59");
        assert!(parse_time("25:00:00").is_err());
    }

    #[test]
    fn test_parse_date_malformed() {
        assert!(matches!(
            parse_date("2024-13-40"),
            Err(TransferError::MalformedTemporal(_))
        ));
    }
}
