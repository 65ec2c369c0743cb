//! Block bookings and appointments.
//!
//! JSON field names follow the scheduling API: `startTime`, `duration`
//! (minutes), `recurrence`, `endDate`. Empty strings for `recurrence` and
//! `endDate` are read as "absent".

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Deserializer, Serialize};

use crate::error::BookingError;
use crate::interval::Interval;
use crate::recurrence::RecurrenceRule;
use crate::temporal::parse_date;

/// Longest stored block booking, in minutes: one leap year.
pub const MAX_DURATION_MINUTES: i64 = 366 * 24 * 60;

/// Opaque block booking identifier.
///
/// Only equality and ordering are meaningful; the format is up to the store.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BlockBookingId(String);

impl BlockBookingId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for BlockBookingId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for BlockBookingId {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

impl From<String> for BlockBookingId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

/// A stored closure or standing commitment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BlockBooking {
    pub id: BlockBookingId,
    pub description: String,
    /// Occurrence instant for a single booking, anchor for a recurring one.
    pub start_time: DateTime<Utc>,
    /// Minutes.
    pub duration: i64,
    #[serde(default, deserialize_with = "empty_as_none")]
    pub recurrence: Option<String>,
    #[serde(default, deserialize_with = "empty_date_as_none")]
    pub end_date: Option<NaiveDate>,
}

impl BlockBooking {
    pub fn is_recurring(&self) -> bool {
        self.recurrence.is_some()
    }

    /// The booking's own span, `[start_time, start_time + duration)`.
    pub fn interval(&self) -> Interval {
        Interval::from_minutes(self.start_time, self.duration)
    }

    pub(crate) fn from_parts(id: BlockBookingId, fields: NewBlockBooking) -> Self {
        Self {
            id,
            description: fields.description,
            start_time: fields.start_time,
            duration: fields.duration,
            recurrence: fields.recurrence,
            end_date: fields.end_date,
        }
    }
}

/// Fields of a block booking that does not have an id yet, or the
/// replacement fields for an update.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewBlockBooking {
    pub description: String,
    pub start_time: DateTime<Utc>,
    pub duration: i64,
    #[serde(default, deserialize_with = "empty_as_none")]
    pub recurrence: Option<String>,
    #[serde(default, deserialize_with = "empty_date_as_none")]
    pub end_date: Option<NaiveDate>,
}

impl NewBlockBooking {
    pub fn single(description: impl Into<String>, start_time: DateTime<Utc>, duration: i64) -> Self {
        Self {
            description: description.into(),
            start_time,
            duration,
            recurrence: None,
            end_date: None,
        }
    }

    pub fn recurring(
        description: impl Into<String>,
        start_time: DateTime<Utc>,
        duration: i64,
        recurrence: impl Into<String>,
        end_date: Option<NaiveDate>,
    ) -> Self {
        Self {
            description: description.into(),
            start_time,
            duration,
            recurrence: Some(recurrence.into()),
            end_date,
        }
    }

    /// Check every field and report all problems at once.
    ///
    /// # Errors
    ///
    /// Returns [`BookingError::InvalidBooking`] listing each violation,
    /// separated by `"; "`. A recurrence outside the supported grammar is
    /// reported here rather than at check time.
    pub fn validate(&self) -> Result<(), BookingError> {
        let mut messages = Vec::new();

        if self.description.trim().is_empty() {
            messages.push("blockBooking must have a description".to_string());
        }
        if self.duration <= 0 {
            messages.push(format!(
                "blockBooking duration '{}' must be positive",
                self.duration
            ));
        } else if self.duration > MAX_DURATION_MINUTES {
            messages.push(format!(
                "blockBooking duration '{}' must not exceed {} minutes",
                self.duration, MAX_DURATION_MINUTES
            ));
        }
        let recurrence = self.recurrence.as_deref().map(str::trim).filter(|r| !r.is_empty());
        match recurrence {
            None if self.end_date.is_some() => {
                messages.push("blockBooking must have an end date only for recurring event".to_string());
            }
            Some(rule) => {
                if let Err(e) = rule.parse::<RecurrenceRule>() {
                    messages.push(format!("blockBooking recurrence '{}': {}", rule, e));
                }
            }
            None => {}
        }

        if messages.is_empty() {
            Ok(())
        } else {
            Err(BookingError::InvalidBooking(messages.join("; ")))
        }
    }
}

/// A proposed appointment, reduced to what overlap checking needs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Appointment {
    pub start_time: DateTime<Utc>,
    /// Minutes.
    pub duration: i64,
}

impl Appointment {
    pub fn new(start_time: DateTime<Utc>, duration: i64) -> Self {
        Self {
            start_time,
            duration,
        }
    }

    pub fn interval(&self) -> Interval {
        Interval::from_minutes(self.start_time, self.duration)
    }
}

/// The `{"blockBookings": [...]}` envelope used by bookings files and list
/// responses.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlockBookingList {
    #[serde(rename = "blockBookings")]
    pub block_bookings: Vec<BlockBooking>,
}

impl BlockBookingList {
    pub fn from_json(s: &str) -> Result<Self, BookingError> {
        serde_json::from_str(s).map_err(|e| BookingError::Storage(format!("bad bookings JSON: {}", e)))
    }
}

fn empty_as_none<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: FromStr,
    T::Err: fmt::Display,
{
    let raw = Option::<String>::deserialize(deserializer)?;
    match raw.as_deref().map(str::trim) {
        None | Some("") => Ok(None),
        Some(s) => s.parse().map(Some).map_err(serde::de::Error::custom),
    }
}

/// Like [`empty_as_none`], but only accepts a strict `YYYY-MM-DD` date.
fn empty_date_as_none<'de, D>(deserializer: D) -> Result<Option<NaiveDate>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<String>::deserialize(deserializer)?;
    match raw.as_deref().map(str::trim) {
        None | Some("") => Ok(None),
        Some(s) => parse_date(s).map(Some).map_err(serde::de::Error::custom),
    }
}
