//! Detect block bookings that overlap a proposed appointment.
//!
//! Every booking is expanded for the appointment's UTC calendar day and each
//! occurrence is tested with [`Interval::overlaps`]. The scan stops at the
//! first booking, in store order, with an overlapping occurrence.
//!
//! The check reads a snapshot and writes nothing. Pairing it atomically with
//! the appointment write is up to the caller.

use tracing::debug;

use crate::booking::{Appointment, BlockBooking, BlockBookingId};
use crate::error::BookingError;
use crate::interval::Interval;
use crate::occurrence::expand_for_day;
use crate::store::BlockBookingStore;

/// Id of the first block booking that overlaps `appointment`, if any.
///
/// # Errors
///
/// Propagates store failures unchanged, and returns
/// [`BookingError::RecurrenceParse`] if a stored booking carries a rule
/// outside the supported grammar.
pub fn find_conflict<S>(store: &S, appointment: &Appointment) -> Result<Option<BlockBookingId>, BookingError>
where
    S: BlockBookingStore + ?Sized,
{
    let bookings = store.get_all()?;
    first_conflict(&bookings, appointment)
}

/// Same as [`find_conflict`] over an already loaded snapshot, in slice order.
pub fn first_conflict(
    bookings: &[BlockBooking],
    appointment: &Appointment,
) -> Result<Option<BlockBookingId>, BookingError> {
    let candidate = appointment.interval();
    for booking in bookings {
        if let Some(hit) = overlapping_occurrence(booking, &candidate, appointment)? {
            debug!(
                id = %booking.id,
                occurrence_start = %hit.start(),
                appointment_start = %appointment.start_time,
                "appointment overlaps block booking"
            );
            return Ok(Some(booking.id.clone()));
        }
    }
    debug!(
        appointment_start = %appointment.start_time,
        checked = bookings.len(),
        "no block booking overlaps appointment"
    );
    Ok(None)
}

fn overlapping_occurrence(
    booking: &BlockBooking,
    candidate: &Interval,
    appointment: &Appointment,
) -> Result<Option<Interval>, BookingError> {
    Ok(expand_for_day(booking, appointment.start_time)?
        .into_iter()
        .find(|occurrence| occurrence.overlaps(candidate)))
}
