//! Calendar day view: block bookings starting on a local date.
//!
//! The day is `[local midnight, local midnight + 24h)` in the requested zone,
//! converted to UTC and passed to [`BlockBookingStore::get_between`].
//! Recurring bookings are not expanded here; a booking is listed only if
//! its stored start time falls inside the window.

use tracing::debug;

use crate::booking::BlockBooking;
use crate::error::BookingError;
use crate::store::BlockBookingStore;
use crate::temporal::{format_utc, local_day_window, parse_date, parse_timezone};

/// Block bookings whose stored start lies on `local_date` in `time_zone`,
/// ascending by start time.
///
/// # Errors
///
/// - [`BookingError::UnknownTimeZone`] if `time_zone` is not an IANA zone
///   name. HTTP callers answer this with 400.
/// - [`BookingError::InvalidDate`] if `local_date` is not a valid
///   `YYYY-MM-DD` date. HTTP callers answer this with 404.
///
/// The zone is checked before the date.
pub fn list_in_range<S>(
    store: &S,
    local_date: &str,
    time_zone: &str,
) -> Result<Vec<BlockBooking>, BookingError>
where
    S: BlockBookingStore + ?Sized,
{
    let tz = parse_timezone(time_zone)?;
    let date = parse_date(local_date)?;
    let (window_start, window_end) = local_day_window(date, &tz);
    debug!(
        date = %date,
        zone = time_zone,
        window_start = %format_utc(window_start),
        window_end = %format_utc(window_end),
        "listing block bookings for day"
    );
    store.get_between(window_start, window_end)
}
