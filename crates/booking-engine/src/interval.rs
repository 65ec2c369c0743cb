//! Half-open time intervals.
//!
//! An [`Interval`] covers `[start, start + duration)`. Every overlap decision
//! in this crate goes through [`Interval::overlaps`]; there is no other
//! comparison of booking spans.

use chrono::{DateTime, Duration, TimeDelta, Utc};
use serde::Serialize;

/// A half-open span of time, `[start, end)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Interval {
    start: DateTime<Utc>,
    end: DateTime<Utc>,
}

impl Interval {
    /// Build the interval `[start, start + minutes)`.
    ///
    /// Negative durations are clamped to zero, which yields an empty
    /// interval that overlaps nothing. An end past the last representable
    /// instant saturates to [`DateTime::<Utc>::MAX_UTC`].
    pub fn from_minutes(start: DateTime<Utc>, minutes: i64) -> Self {
        let end = TimeDelta::try_minutes(minutes.max(0))
            .and_then(|delta| start.checked_add_signed(delta))
            .unwrap_or(DateTime::<Utc>::MAX_UTC);
        Self { start, end }
    }

    pub fn start(&self) -> DateTime<Utc> {
        self.start
    }

    pub fn end(&self) -> DateTime<Utc> {
        self.end
    }

    pub fn is_empty(&self) -> bool {
        self.start >= self.end
    }

    pub fn duration(&self) -> Duration {
        self.end - self.start
    }

    /// True when the two intervals share at least one instant.
    ///
    /// Abutting intervals (one ends exactly where the other starts) do not
    /// overlap, and an empty interval overlaps nothing.
    pub fn overlaps(&self, other: &Interval) -> bool {
        if self.is_empty() || other.is_empty() {
            return false;
        }
        self.start < other.end && other.start < self.end
    }

    /// True when `instant` lies in `[start, end)`.
    pub fn contains_instant(&self, instant: DateTime<Utc>) -> bool {
        self.start <= instant && instant < self.end
    }
}

/// Wire form of an interval: both bounds as RFC 3339 UTC strings.
#[derive(Debug, Clone, Serialize)]
pub struct IntervalView {
    pub start: String,
    pub end: String,
}

impl From<&Interval> for IntervalView {
    fn from(interval: &Interval) -> Self {
        Self {
            start: crate::temporal::format_utc(interval.start),
            end: crate::temporal::format_utc(interval.end),
        }
    }
}
