//! Timezone and calendar-day arithmetic.
//!
//! Pure helpers shared by the expander and the range resolver. Nothing here
//! reads the system clock; every instant is supplied by the caller.
//!
//! # Day windows
//!
//! Two kinds of day window exist in the engine:
//!
//! - [`utc_day_window`] — the UTC calendar day containing an instant. Used by
//!   overlap detection, which always expands recurring bookings against the
//!   appointment's own UTC day.
//! - [`local_day_window`] — local midnight of a date in a named zone, plus 24
//!   hours. Used by the calendar day view.
//!
//! Both are half-open: the end instant belongs to the next window.

use chrono::{DateTime, Duration, LocalResult, NaiveDate, NaiveDateTime, SecondsFormat, TimeZone, Utc};
use chrono_tz::Tz;

use crate::error::BookingError;

/// Zone used by the day view when the caller names none.
pub const DEFAULT_TIMEZONE: &str = "Etc/UTC";

/// Parse an RFC 3339 datetime string and normalize it to UTC.
///
/// Strings without an explicit offset are rejected; a naive local time
/// cannot be compared against stored UTC instants.
pub fn parse_rfc3339(s: &str) -> Result<DateTime<Utc>, BookingError> {
    DateTime::parse_from_rfc3339(s.trim())
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| BookingError::InvalidDatetime(format!("'{}': {}", s, e)))
}

/// Parse an IANA timezone string into `Tz`.
pub fn parse_timezone(s: &str) -> Result<Tz, BookingError> {
    s.parse::<Tz>()
        .map_err(|_| BookingError::UnknownTimeZone(format!("'{}'", s)))
}

/// Parse a strict `YYYY-MM-DD` calendar date.
///
/// Shapes chrono would tolerate (`2018-1-7`, surrounding whitespace) are
/// rejected so that a date either round-trips exactly or fails.
pub fn parse_date(s: &str) -> Result<NaiveDate, BookingError> {
    let bytes = s.as_bytes();
    let shaped = bytes.len() == 10
        && bytes[4] == b'-'
        && bytes[7] == b'-'
        && bytes
            .iter()
            .enumerate()
            .all(|(i, b)| i == 4 || i == 7 || b.is_ascii_digit());
    if !shaped {
        return Err(BookingError::InvalidDate(format!(
            "'{}' is not a YYYY-MM-DD date",
            s
        )));
    }
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .map_err(|e| BookingError::InvalidDate(format!("'{}': {}", s, e)))
}

/// Format an instant as `YYYY-MM-DDTHH:MM:SSZ`.
pub fn format_utc(dt: DateTime<Utc>) -> String {
    dt.to_rfc3339_opts(SecondsFormat::Secs, true)
}

/// Midnight UTC of the date, as an instant.
pub fn utc_midnight(date: NaiveDate) -> DateTime<Utc> {
    date.and_time(chrono::NaiveTime::MIN).and_utc()
}

/// The UTC calendar day containing `instant`: `[00:00Z, 00:00Z + 24h)`.
pub fn utc_day_window(instant: DateTime<Utc>) -> (DateTime<Utc>, DateTime<Utc>) {
    let start = utc_midnight(instant.date_naive());
    (start, saturating_add(start, Duration::days(1)))
}

/// The UTC bounds of a local calendar day: `[local midnight, +24h)`.
///
/// The window is always exactly 24 hours, also on DST transition days.
pub fn local_day_window(date: NaiveDate, tz: &Tz) -> (DateTime<Utc>, DateTime<Utc>) {
    let start = start_of_local_day(date, tz).with_timezone(&Utc);
    (start, saturating_add(start, Duration::hours(24)))
}

/// `instant + delta`, clamped to the last representable instant.
pub fn saturating_add(instant: DateTime<Utc>, delta: Duration) -> DateTime<Utc> {
    instant
        .checked_add_signed(delta)
        .unwrap_or(DateTime::<Utc>::MAX_UTC)
}

/// First instant of `date` in `tz`.
///
/// When midnight is ambiguous (clocks fall back onto it) the earlier
/// instant wins. When midnight does not exist (clocks spring forward over
/// it) the first valid local time after the gap is used.
pub fn start_of_local_day(date: NaiveDate, tz: &Tz) -> DateTime<Tz> {
    let midnight = date.and_time(chrono::NaiveTime::MIN);
    if let Some(dt) = resolve_local(tz, &midnight) {
        return dt;
    }
    // Gaps are at most a few hours long and aligned to whole minutes.
    (1..=24 * 60)
        .filter_map(|m| midnight.checked_add_signed(Duration::minutes(m)))
        .find_map(|naive| resolve_local(tz, &naive))
        .unwrap_or_else(|| tz.from_utc_datetime(&midnight))
}

fn resolve_local(tz: &Tz, naive: &NaiveDateTime) -> Option<DateTime<Tz>> {
    match tz.from_local_datetime(naive) {
        LocalResult::Single(dt) => Some(dt),
        LocalResult::Ambiguous(earliest, _) => Some(earliest),
        LocalResult::None => None,
    }
}

// ── Tests ───────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    fn utc(s: &str) -> DateTime<Utc> {
        parse_rfc3339(s).unwrap()
    }

    #[test]
    fn test_parse_rfc3339_normalizes_offset() {
        let dt = parse_rfc3339("2018-10-17T03:00:00-07:00").unwrap();
        assert_eq!(format_utc(dt), "2018-10-17T10:00:00Z");
    }

    #[test]
    fn test_parse_rfc3339_rejects_naive() {
        let err = parse_rfc3339("2018-10-17T10:00:00").unwrap_err();
        assert!(matches!(err, BookingError::InvalidDatetime(_)), "got: {err}");
    }

    #[test]
    fn test_parse_timezone_unknown() {
        let err = parse_timezone("NotAReal/TimeZone").unwrap_err();
        assert!(err.to_string().contains("Unknown timezone"), "got: {err}");
    }

    #[test]
    fn test_parse_timezone_default_is_valid() {
        assert!(parse_timezone(DEFAULT_TIMEZONE).is_ok());
    }

    #[test]
    fn test_parse_date_strict() {
        assert_eq!(
            parse_date("2018-10-17").unwrap(),
            NaiveDate::from_ymd_opt(2018, 10, 17).unwrap()
        );
        assert!(parse_date("2018-13-07").is_err());
        assert!(parse_date("2018-02-30").is_err());
        assert!(parse_date("2018-1-07").is_err());
        assert!(parse_date(" 2018-10-17").is_err());
        assert!(parse_date("not-a-date").is_err());
    }

    #[test]
    fn test_utc_day_window_truncates() {
        let (start, end) = utc_day_window(utc("2018-10-17T23:59:59Z"));
        assert_eq!(format_utc(start), "2018-10-17T00:00:00Z");
        assert_eq!(format_utc(end), "2018-10-18T00:00:00Z");
    }

    #[test]
    fn test_utc_day_window_at_midnight() {
        let (start, _) = utc_day_window(utc("2018-10-17T00:00:00Z"));
        assert_eq!(format_utc(start), "2018-10-17T00:00:00Z");
    }

    #[test]
    fn test_utc_day_window_on_last_day_saturates() {
        let (start, end) = utc_day_window(DateTime::<Utc>::MAX_UTC);
        assert_eq!(start, utc_midnight(DateTime::<Utc>::MAX_UTC.date_naive()));
        assert_eq!(end, DateTime::<Utc>::MAX_UTC);
    }

    #[test]
    fn test_local_day_window_los_angeles() {
        let tz = parse_timezone("America/Los_Angeles").unwrap();
        let date = parse_date("2018-10-17").unwrap();
        let (start, end) = local_day_window(date, &tz);
        // October 17 2018 is PDT (UTC-7)
        assert_eq!(format_utc(start), "2018-10-17T07:00:00Z");
        assert_eq!(format_utc(end), "2018-10-18T07:00:00Z");
    }

    #[test]
    fn test_local_day_window_is_24h_across_dst() {
        // November 4 2018: US fall back, local day is 25 hours long
        let tz = parse_timezone("America/Los_Angeles").unwrap();
        let date = parse_date("2018-11-04").unwrap();
        let (start, end) = local_day_window(date, &tz);
        assert_eq!(format_utc(start), "2018-11-04T07:00:00Z");
        assert_eq!(end - start, Duration::hours(24));
    }

    #[test]
    fn test_start_of_local_day_in_gap() {
        // November 4 2018: Brazil sprang forward at local midnight
        let tz = parse_timezone("America/Sao_Paulo").unwrap();
        let date = parse_date("2018-11-04").unwrap();
        let start = start_of_local_day(date, &tz);
        assert_eq!(format_utc(start.with_timezone(&Utc)), "2018-11-04T03:00:00Z");
    }

    #[test]
    fn test_local_day_window_utc_zone() {
        let tz = parse_timezone(DEFAULT_TIMEZONE).unwrap();
        let date = parse_date("2018-10-17").unwrap();
        let (start, end) = local_day_window(date, &tz);
        assert_eq!(format_utc(start), "2018-10-17T00:00:00Z");
        assert_eq!(format_utc(end), "2018-10-18T00:00:00Z");
    }
}
