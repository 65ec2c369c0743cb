//! # booking-engine
//!
//! Block-booking checks for appointment scheduling.
//!
//! A block booking is a closure or standing commitment, either a single
//! occurrence or a weekly rule with an optional inclusive end date. The
//! engine answers two questions: does a proposed appointment overlap any
//! block booking, and which block bookings start on a given local day.
//! Everything is computed in UTC over half-open intervals.
//!
//! ## Modules
//!
//! - [`interval`] — Half-open `[start, end)` spans and the overlap predicate
//! - [`recurrence`] — Weekly `RRULE` subset parsing and occurrence expansion
//! - [`occurrence`] — Booking → concrete occurrence intervals for a window
//! - [`conflict`] — First block booking overlapping an appointment
//! - [`range`] — Block bookings starting on a local calendar day
//! - [`store`] — Storage trait and in-memory implementation
//! - [`booking`] — Block booking and appointment types
//! - [`temporal`] — Timezone parsing and day-window arithmetic
//! - [`error`] — Error types

pub mod booking;
pub mod conflict;
pub mod error;
pub mod interval;
pub mod occurrence;
pub mod range;
pub mod recurrence;
pub mod store;
pub mod temporal;

pub use booking::{
    Appointment, BlockBooking, BlockBookingId, BlockBookingList, NewBlockBooking, MAX_DURATION_MINUTES,
};
pub use conflict::{find_conflict, first_conflict};
pub use error::{BookingError, Result};
pub use interval::{Interval, IntervalView};
pub use occurrence::{expand_for_day, expand_in_window, Schedule};
pub use range::list_in_range;
pub use recurrence::{Frequency, Occurrences, RecurrencePattern, RecurrenceRule};
pub use store::{BlockBookingStore, InMemoryStore};
pub use temporal::DEFAULT_TIMEZONE;
