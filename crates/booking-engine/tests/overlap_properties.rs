//! Property tests for the overlap predicate and recurrence expansion.

use booking_engine::recurrence::{RecurrencePattern, RecurrenceRule};
use booking_engine::Interval;
use chrono::{DateTime, Datelike, Duration, TimeZone, Utc, Weekday};
use proptest::prelude::*;

fn base() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2018, 1, 1, 0, 0, 0).unwrap()
}

fn instant() -> impl Strategy<Value = DateTime<Utc>> {
    (0i64..60 * 24 * 365).prop_map(|m| base() + Duration::minutes(m))
}

const WEEK: [Weekday; 7] = [
    Weekday::Mon,
    Weekday::Tue,
    Weekday::Wed,
    Weekday::Thu,
    Weekday::Fri,
    Weekday::Sat,
    Weekday::Sun,
];

fn weekday_set() -> impl Strategy<Value = Vec<Weekday>> {
    prop::collection::vec(0usize..7, 0..7)
        .prop_map(|days| days.into_iter().map(|d| WEEK[d]).collect())
}

proptest! {
    #[test]
    fn disjoint_or_abutting_never_overlap(start in instant(), a_len in 0i64..600, gap in 0i64..600, b_len in 0i64..600) {
        let a = Interval::from_minutes(start, a_len);
        let b = Interval::from_minutes(a.end() + Duration::minutes(gap), b_len);
        prop_assert!(!a.overlaps(&b));
        prop_assert!(!b.overlaps(&a));
    }

    #[test]
    fn intersecting_positive_intervals_overlap(
        a_start in instant(),
        b_start in instant(),
        a_len in 1i64..600,
        b_len in 1i64..600,
    ) {
        let a = Interval::from_minutes(a_start, a_len);
        let b = Interval::from_minutes(b_start, b_len);
        let disjoint = a.end() <= b.start() || b.end() <= a.start();
        prop_assert_eq!(a.overlaps(&b), !disjoint);
        prop_assert_eq!(a.overlaps(&b), b.overlaps(&a));
    }

    #[test]
    fn zero_length_overlaps_nothing(point in instant(), other in instant(), len in 0i64..600) {
        let empty = Interval::from_minutes(point, 0);
        let b = Interval::from_minutes(other, len);
        prop_assert!(!empty.overlaps(&b));
    }

    #[test]
    fn expansion_is_deterministic_and_bounded(
        anchor in instant(),
        days in weekday_set(),
        window_start in instant(),
        window_days in 0i64..60,
        until_offset in prop::option::of(0i64..400),
    ) {
        let until = until_offset.map(|d| (anchor + Duration::days(d)).date_naive());
        let pattern = RecurrencePattern::new(RecurrenceRule::weekly(days.clone()), anchor, until);
        let window_end = window_start + Duration::days(window_days);

        let first: Vec<_> = pattern.occurrences(window_start, window_end).collect();
        let second: Vec<_> = pattern.occurrences(window_start, window_end).collect();
        prop_assert_eq!(&first, &second);

        for pair in first.windows(2) {
            prop_assert!(pair[0] < pair[1]);
        }
        for occurrence in &first {
            prop_assert!(*occurrence >= window_start && *occurrence < window_end);
            prop_assert!(*occurrence >= anchor);
            prop_assert_eq!(occurrence.time(), anchor.time());
            if let Some(until) = until {
                prop_assert!(occurrence.date_naive() <= until);
            }
            if days.is_empty() {
                prop_assert_eq!(occurrence.weekday(), anchor.weekday());
            } else {
                prop_assert!(days.contains(&occurrence.weekday()));
            }
        }
    }

    #[test]
    fn rule_display_reparses(days in weekday_set()) {
        let rule = RecurrenceRule::weekly(days);
        let reparsed: RecurrenceRule = rule.to_string().parse().unwrap();
        prop_assert_eq!(reparsed, rule);
    }
}
