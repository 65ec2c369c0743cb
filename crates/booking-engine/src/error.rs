//! Error types for booking-engine operations.

use thiserror::Error;

use crate::booking::BlockBookingId;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum BookingError {
    #[error("Invalid RRULE: {0}")]
    RecurrenceParse(String),

    #[error("Unknown timezone: {0}")]
    UnknownTimeZone(String),

    #[error("Invalid date: {0}")]
    InvalidDate(String),

    #[error("Invalid datetime: {0}")]
    InvalidDatetime(String),

    #[error("Invalid block booking: {0}")]
    InvalidBooking(String),

    #[error("No block booking with id '{0}'")]
    NotFound(BlockBookingId),

    #[error("Storage error: {0}")]
    Storage(String),
}

pub type Result<T> = std::result::Result<T, BookingError>;
