//! Fixed-offset wall-clock to UTC conversion for scheduled publish times.

use chrono::{FixedOffset, NaiveDateTime, TimeZone, Utc};

/// Queue timestamps are written in this fixed UTC offset (JST, +9h). The
/// offset is deliberately fixed, not a named time zone: the observed remote
/// boundary does not track daylight saving.
pub const SOURCE_UTC_OFFSET_HOURS: i32 = 9;

/// Convert `YYYY-MM-DD HH:MM:SS` (or without seconds) interpreted under the
/// given fixed offset into a canonical UTC wire timestamp
/// (`YYYY-MM-DDTHH:MM:SSZ`). Returns `None` for blank or unparseable input.
pub fn to_utc_rfc3339(raw: &str, offset_hours: i32) -> Option<String> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }

    let naive = NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S")
        .or_else(|_| NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M"))
        .ok()?;

    let offset = FixedOffset::east_opt(offset_hours.checked_mul(3600)?)?;
    let local = offset.from_local_datetime(&naive).single()?;
    Some(local.with_timezone(&Utc).format("%Y-%m-%dT%H:%M:%SZ").to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn jst_morning_converts_to_previous_utc_day_hour() {
        assert_eq!(
            to_utc_rfc3339("2025-11-20 10:00:00", 9).as_deref(),
            Some("2025-11-20T01:00:00Z")
        );
    }

    #[test]
    fn seconds_are_optional() {
        assert_eq!(
            to_utc_rfc3339("2025-11-20 10:00", 9).as_deref(),
            Some("2025-11-20T01:00:00Z")
        );
    }

    #[test]
    fn crosses_date_boundary() {
        assert_eq!(
            to_utc_rfc3339("2025-11-20 05:30", 9).as_deref(),
            Some("2025-11-19T20:30:00Z")
        );
    }

    #[test]
    fn whitespace_is_trimmed() {
        assert_eq!(
            to_utc_rfc3339("  2025-11-20 10:00:00  ", 9).as_deref(),
            Some("2025-11-20T01:00:00Z")
        );
    }

    #[test]
    fn blank_and_garbage_yield_none() {
        assert_eq!(to_utc_rfc3339("", 9), None);
        assert_eq!(to_utc_rfc3339("   ", 9), None);
        assert_eq!(to_utc_rfc3339("20/11/2025 10:00", 9), None);
        assert_eq!(to_utc_rfc3339("2025-11-20", 9), None);
    }

    #[test]
    fn other_offsets_apply() {
        assert_eq!(
            to_utc_rfc3339("2025-11-20 10:00:00", 0).as_deref(),
            Some("2025-11-20T10:00:00Z")
        );
        assert_eq!(
            to_utc_rfc3339("2025-11-20 10:00:00", -5).as_deref(),
            Some("2025-11-20T15:00:00Z")
        );
    }
}
