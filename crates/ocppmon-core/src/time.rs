//! Wire timestamp parsing.
//!
//! OCPP payloads carry RFC 3339 timestamps (`"2024-01-01T00:00:00Z"`).
//! Devices in the field occasionally omit or mangle them, so parsing is
//! fallible and callers substitute the arrival time on `None`.

use chrono::{DateTime, Utc};

/// Parses an RFC 3339 wire timestamp into UTC.
///
/// Returns `None` for anything chrono cannot parse; the caller decides
/// on a fallback.
pub fn parse_wire_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(raw)
        .ok()
        .map(|dt| dt.with_timezone(&Utc))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn parses_utc_timestamp() {
        let parsed = parse_wire_timestamp("2024-01-01T00:00:00Z").unwrap();
        assert_eq!(parsed, Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap());
    }

    #[test]
    fn parses_offset_timestamp_to_utc() {
        let parsed = parse_wire_timestamp("2024-01-01T02:00:00+02:00").unwrap();
        assert_eq!(parsed, Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap());
    }

    #[test]
    fn rejects_garbage() {
        assert!(parse_wire_timestamp("not-a-timestamp").is_none());
        assert!(parse_wire_timestamp("").is_none());
    }
}
