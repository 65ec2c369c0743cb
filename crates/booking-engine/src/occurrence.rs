//! Turn block bookings into concrete occurrence intervals.
//!
//! A booking's [`Schedule`] is either a single interval or an anchored weekly
//! pattern. [`expand_in_window`] produces the intervals whose start lies in a
//! half-open window; [`expand_for_day`] fixes that window to the UTC calendar
//! day of a given instant, which is what overlap detection uses.
//!
//! Only the start of an occurrence decides whether it belongs to a window. An
//! occurrence that starts at 23:00Z on the previous day and runs past
//! midnight is not part of the next day's expansion.

use chrono::{DateTime, Utc};

use crate::booking::BlockBooking;
use crate::error::BookingError;
use crate::interval::Interval;
use crate::recurrence::RecurrencePattern;
use crate::temporal::utc_day_window;

/// How a block booking repeats.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Schedule {
    Single(Interval),
    Weekly {
        pattern: RecurrencePattern,
        duration_minutes: i64,
    },
}

impl Schedule {
    /// Derive the schedule of a stored booking.
    ///
    /// # Errors
    ///
    /// Returns [`BookingError::RecurrenceParse`] if the booking carries a
    /// recurrence outside the supported grammar.
    pub fn of(booking: &BlockBooking) -> Result<Self, BookingError> {
        match booking.recurrence.as_deref().map(str::trim) {
            None | Some("") => Ok(Schedule::Single(booking.interval())),
            Some(rule) => Ok(Schedule::Weekly {
                pattern: RecurrencePattern::parse(rule, booking.start_time, booking.end_date)?,
                duration_minutes: booking.duration,
            }),
        }
    }

    /// Occurrence intervals starting in `[window_start, window_end)`, ascending.
    pub fn in_window(&self, window_start: DateTime<Utc>, window_end: DateTime<Utc>) -> Vec<Interval> {
        match self {
            Schedule::Single(interval) => {
                let starts_inside = window_start <= interval.start() && interval.start() < window_end;
                if starts_inside {
                    vec![*interval]
                } else {
                    Vec::new()
                }
            }
            Schedule::Weekly {
                pattern,
                duration_minutes,
            } => pattern
                .occurrences(window_start, window_end)
                .map(|start| Interval::from_minutes(start, *duration_minutes))
                .collect(),
        }
    }
}

/// Occurrences of `booking` whose start lies in `[window_start, window_end)`.
pub fn expand_in_window(
    booking: &BlockBooking,
    window_start: DateTime<Utc>,
    window_end: DateTime<Utc>,
) -> Result<Vec<Interval>, BookingError> {
    Ok(Schedule::of(booking)?.in_window(window_start, window_end))
}

/// Occurrences of `booking` on the UTC calendar day containing `instant`.
pub fn expand_for_day(
    booking: &BlockBooking,
    instant: DateTime<Utc>,
) -> Result<Vec<Interval>, BookingError> {
    let (day_start, day_end) = utc_day_window(instant);
    expand_in_window(booking, day_start, day_end)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::booking::{BlockBookingId, NewBlockBooking};
    use crate::temporal::{format_utc, parse_date, parse_rfc3339};

    fn utc(s: &str) -> DateTime<Utc> {
        parse_rfc3339(s).unwrap()
    }

    fn booking(id: &str, fields: NewBlockBooking) -> BlockBooking {
        BlockBooking::from_parts(BlockBookingId::from(id), fields)
    }

    fn starts(intervals: &[Interval]) -> Vec<String> {
        intervals.iter().map(|i| format_utc(i.start())).collect()
    }

    #[test]
    fn test_single_on_its_day() {
        let b = booking("1", NewBlockBooking::single("Doctor", utc("2018-10-17T10:00:00Z"), 60));
        let found = expand_for_day(&b, utc("2018-10-17T18:30:00Z")).unwrap();
        assert_eq!(found, vec![b.interval()]);
    }

    #[test]
    fn test_single_on_other_day() {
        let b = booking("1", NewBlockBooking::single("Doctor", utc("2018-10-17T10:00:00Z"), 60));
        assert!(expand_for_day(&b, utc("2018-10-18T10:00:00Z")).unwrap().is_empty());
        assert!(expand_for_day(&b, utc("2018-09-17T10:20:00Z")).unwrap().is_empty());
    }

    #[test]
    fn test_single_cross_midnight_not_in_next_day() {
        let b = booking("1", NewBlockBooking::single("Late", utc("2018-10-17T23:30:00Z"), 60));
        assert!(expand_for_day(&b, utc("2018-10-18T00:10:00Z")).unwrap().is_empty());
    }

    #[test]
    fn test_recurring_maps_duration() {
        let b = booking(
            "3",
            NewBlockBooking::recurring(
                "Early Friday Close",
                utc("2018-06-24T13:00:00Z"),
                300,
                "RRULE:FREQ=WEEKLY;BYDAY=FR",
                None,
            ),
        );
        let found = expand_for_day(&b, utc("2018-06-29T09:00:00Z")).unwrap();
        assert_eq!(starts(&found), vec!["2018-06-29T13:00:00Z"]);
        assert_eq!(format_utc(found[0].end()), "2018-06-29T18:00:00Z");
    }

    #[test]
    fn test_recurring_respects_end_date() {
        let b = booking(
            "2",
            NewBlockBooking::recurring(
                "Tee Time",
                utc("2018-08-13T15:00:00Z"),
                240,
                "RRULE:FREQ=WEEKLY;BYDAY=MO,WE,FR",
                Some(parse_date("2018-09-19").unwrap()),
            ),
        );
        assert_eq!(expand_for_day(&b, utc("2018-09-19T00:00:00Z")).unwrap().len(), 1);
        assert!(expand_for_day(&b, utc("2018-09-21T15:00:00Z")).unwrap().is_empty());
    }

    #[test]
    fn test_recurring_malformed_rule_is_error() {
        let b = booking(
            "4",
            NewBlockBooking::recurring("Broken", utc("2018-06-24T13:00:00Z"), 60, "FREQ=YEARLY", None),
        );
        let err = expand_for_day(&b, utc("2018-06-29T09:00:00Z")).unwrap_err();
        assert!(matches!(err, BookingError::RecurrenceParse(_)), "got: {err}");
    }

    #[test]
    fn test_blank_recurrence_is_single() {
        let mut fields = NewBlockBooking::single("Doctor", utc("2018-10-17T10:00:00Z"), 60);
        fields.recurrence = Some("  ".to_string());
        let b = booking("1", fields);
        assert!(matches!(Schedule::of(&b).unwrap(), Schedule::Single(_)));
    }

    #[test]
    fn test_in_window_multi_day() {
        let b = booking(
            "3",
            NewBlockBooking::recurring(
                "Early Friday Close",
                utc("2018-06-24T13:00:00Z"),
                300,
                "RRULE:FREQ=WEEKLY;BYDAY=FR",
                None,
            ),
        );
        let found =
            expand_in_window(&b, utc("2018-07-01T00:00:00Z"), utc("2018-08-01T00:00:00Z")).unwrap();
        assert_eq!(
            starts(&found),
            vec![
                "2018-07-06T13:00:00Z",
                "2018-07-13T13:00:00Z",
                "2018-07-20T13:00:00Z",
                "2018-07-27T13:00:00Z",
            ]
        );
    }
}
