//! Weekly recurrence rules and their expansion.
//!
//! The supported grammar is the subset of RFC 5545 RRULE that block bookings
//! use:
//!
//! ```text
//! [RRULE:]FREQ=WEEKLY[;BYDAY=<code>[,<code>]*]
//! code := MO | TU | WE | TH | FR | SA | SU
//! ```
//!
//! Parts may appear in any order. Anything else (other frequencies,
//! `INTERVAL`, `COUNT`, `UNTIL`, numbered weekdays) is a parse error. The
//! upper bound of a rule comes from the booking's end date, not the rule
//! text.
//!
//! A [`RecurrencePattern`] ties a rule to its anchor (`DTSTART`) and optional
//! inclusive end date, and yields occurrence start instants for a window:
//!
//! ```
//! use booking_engine::recurrence::RecurrencePattern;
//! use booking_engine::temporal::{format_utc, parse_rfc3339};
//!
//! let anchor = parse_rfc3339("2018-06-24T13:00:00Z").unwrap();
//! let pattern = RecurrencePattern::parse("RRULE:FREQ=WEEKLY;BYDAY=MO,WE,FR", anchor, None).unwrap();
//!
//! let start = parse_rfc3339("2018-06-29T00:00:00Z").unwrap();
//! let end = parse_rfc3339("2018-06-30T00:00:00Z").unwrap();
//! let found: Vec<String> = pattern.occurrences(start, end).map(format_utc).collect();
//! assert_eq!(found, vec!["2018-06-29T13:00:00Z"]);
//! ```

use std::fmt;
use std::iter::FusedIterator;
use std::str::FromStr;

use chrono::{DateTime, Datelike, Duration, NaiveDate, NaiveTime, Utc, Weekday};

use crate::error::BookingError;

/// Rule frequency. Only weekly rules are supported.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Frequency {
    Weekly,
}

impl FromStr for Frequency {
    type Err = BookingError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "WEEKLY" => Ok(Frequency::Weekly),
            other => Err(BookingError::RecurrenceParse(format!(
                "unsupported frequency '{}', only WEEKLY is supported",
                other
            ))),
        }
    }
}

impl fmt::Display for Frequency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Frequency::Weekly => f.write_str("WEEKLY"),
        }
    }
}

/// A parsed recurrence rule, not yet anchored in time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecurrenceRule {
    frequency: Frequency,
    /// Sorted Monday first, no duplicates. Empty means "the anchor's weekday".
    by_weekday: Vec<Weekday>,
}

impl RecurrenceRule {
    pub fn weekly(days: impl IntoIterator<Item = Weekday>) -> Self {
        let mut by_weekday: Vec<Weekday> = days.into_iter().collect();
        by_weekday.sort_by_key(|d| d.num_days_from_monday());
        by_weekday.dedup();
        Self {
            frequency: Frequency::Weekly,
            by_weekday,
        }
    }

    pub fn frequency(&self) -> Frequency {
        self.frequency
    }

    pub fn by_weekday(&self) -> &[Weekday] {
        &self.by_weekday
    }
}

impl FromStr for RecurrenceRule {
    type Err = BookingError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        let body = trimmed
            .strip_prefix("RRULE:")
            .unwrap_or(trimmed)
            .trim_end_matches(';');
        if body.is_empty() {
            return Err(BookingError::RecurrenceParse("empty rule".to_string()));
        }

        let mut frequency = None;
        let mut by_weekday = None;
        for part in body.split(';') {
            let (key, value) = part.split_once('=').ok_or_else(|| {
                BookingError::RecurrenceParse(format!("expected KEY=VALUE, got '{}'", part))
            })?;
            match key {
                "FREQ" if frequency.is_none() => frequency = Some(value.parse::<Frequency>()?),
                "BYDAY" if by_weekday.is_none() => by_weekday = Some(parse_weekday_list(value)?),
                "FREQ" | "BYDAY" => {
                    return Err(BookingError::RecurrenceParse(format!(
                        "duplicate {} in '{}'",
                        key, trimmed
                    )))
                }
                other => {
                    return Err(BookingError::RecurrenceParse(format!(
                        "unsupported rule part '{}'",
                        other
                    )))
                }
            }
        }

        let frequency = frequency.ok_or_else(|| {
            BookingError::RecurrenceParse(format!("missing FREQ in '{}'", trimmed))
        })?;
        let mut rule = RecurrenceRule::weekly(by_weekday.unwrap_or_default());
        rule.frequency = frequency;
        Ok(rule)
    }
}

impl fmt::Display for RecurrenceRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "RRULE:FREQ={}", self.frequency)?;
        if !self.by_weekday.is_empty() {
            let codes: Vec<&str> = self.by_weekday.iter().map(|d| weekday_code(*d)).collect();
            write!(f, ";BYDAY={}", codes.join(","))?;
        }
        Ok(())
    }
}

fn parse_weekday_list(value: &str) -> Result<Vec<Weekday>, BookingError> {
    if value.is_empty() {
        return Err(BookingError::RecurrenceParse("empty BYDAY list".to_string()));
    }
    value.split(',').map(parse_weekday_code).collect()
}

fn parse_weekday_code(code: &str) -> Result<Weekday, BookingError> {
    match code {
        "MO" => Ok(Weekday::Mon),
        "TU" => Ok(Weekday::Tue),
        "WE" => Ok(Weekday::Wed),
        "TH" => Ok(Weekday::Thu),
        "FR" => Ok(Weekday::Fri),
        "SA" => Ok(Weekday::Sat),
        "SU" => Ok(Weekday::Sun),
        other => Err(BookingError::RecurrenceParse(format!(
            "invalid weekday code '{}'",
            other
        ))),
    }
}

fn weekday_code(day: Weekday) -> &'static str {
    match day {
        Weekday::Mon => "MO",
        Weekday::Tue => "TU",
        Weekday::Wed => "WE",
        Weekday::Thu => "TH",
        Weekday::Fri => "FR",
        Weekday::Sat => "SA",
        Weekday::Sun => "SU",
    }
}

// ── RecurrencePattern ───────────────────────────────────────────────────────

/// A rule anchored at its first instant, optionally bounded by an inclusive
/// end date.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecurrencePattern {
    rule: RecurrenceRule,
    anchor: DateTime<Utc>,
    until: Option<NaiveDate>,
}

impl RecurrencePattern {
    pub fn new(rule: RecurrenceRule, anchor: DateTime<Utc>, until: Option<NaiveDate>) -> Self {
        Self {
            rule,
            anchor,
            until,
        }
    }

    /// Parse `expression` and anchor it.
    ///
    /// # Errors
    ///
    /// Returns [`BookingError::RecurrenceParse`] if the expression is not in
    /// the supported grammar.
    pub fn parse(
        expression: &str,
        anchor: DateTime<Utc>,
        until: Option<NaiveDate>,
    ) -> Result<Self, BookingError> {
        Ok(Self::new(expression.parse()?, anchor, until))
    }

    pub fn rule(&self) -> &RecurrenceRule {
        &self.rule
    }

    pub fn anchor(&self) -> DateTime<Utc> {
        self.anchor
    }

    pub fn until(&self) -> Option<NaiveDate> {
        self.until
    }

    /// Whether the rule fires on `day`. A rule without `BYDAY` fires on the
    /// anchor's weekday.
    fn fires_on(&self, day: Weekday) -> bool {
        match self.rule.by_weekday.as_slice() {
            [] => day == self.anchor.weekday(),
            days => days.contains(&day),
        }
    }

    /// Occurrence start instants in `[window_start, window_end)`, ascending.
    ///
    /// Each occurrence falls on a matching weekday at the anchor's UTC time
    /// of day. Nothing before the anchor and nothing after the end date is
    /// produced. The iterator borrows the pattern and can be recreated any
    /// number of times with identical results.
    pub fn occurrences(
        &self,
        window_start: DateTime<Utc>,
        window_end: DateTime<Utc>,
    ) -> Occurrences<'_> {
        let first = window_start.date_naive().max(self.anchor.date_naive());
        let mut last = window_end.date_naive();
        if let Some(until) = self.until {
            last = last.min(until);
        }
        Occurrences {
            pattern: self,
            time_of_day: self.anchor.time(),
            cursor: (window_start < window_end).then_some(first),
            last,
            window_start,
            window_end,
        }
    }

    /// Exclusive upper bound implied by the end date: midnight UTC after it.
    fn cutoff(&self) -> Option<DateTime<Utc>> {
        self.until.map(|d| {
            crate::temporal::saturating_add(crate::temporal::utc_midnight(d), Duration::days(1))
        })
    }
}

/// Lazy iterator over the occurrences of a [`RecurrencePattern`] in a window.
#[derive(Debug, Clone)]
pub struct Occurrences<'a> {
    pattern: &'a RecurrencePattern,
    time_of_day: NaiveTime,
    cursor: Option<NaiveDate>,
    last: NaiveDate,
    window_start: DateTime<Utc>,
    window_end: DateTime<Utc>,
}

impl Iterator for Occurrences<'_> {
    type Item = DateTime<Utc>;

    fn next(&mut self) -> Option<Self::Item> {
        while let Some(date) = self.cursor {
            if date > self.last {
                self.cursor = None;
                break;
            }
            self.cursor = date.succ_opt();

            if !self.pattern.fires_on(date.weekday()) {
                continue;
            }
            let instant = date.and_time(self.time_of_day).and_utc();
            if instant < self.window_start || instant >= self.window_end {
                continue;
            }
            if instant < self.pattern.anchor {
                continue;
            }
            if self.pattern.cutoff().is_some_and(|cutoff| instant >= cutoff) {
                continue;
            }
            return Some(instant);
        }
        None
    }
}

impl FusedIterator for Occurrences<'_> {}

// ── Tests ───────────────────────────────────────────────────────────────────
