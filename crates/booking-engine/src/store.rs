//! Block booking storage.
//!
//! [`BlockBookingStore`] is the only way the engine reads bookings. Every
//! engine operation takes the store as an explicit argument; there is no
//! process-wide handle.
//!
//! [`InMemoryStore`] keeps rows keyed by an integer id and exposes that id as
//! an opaque string. Ids that are not positive integers never match a row.

use std::collections::BTreeMap;
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use chrono::{DateTime, Utc};
use tracing::{debug, info};

use crate::booking::{BlockBooking, BlockBookingId, NewBlockBooking};
use crate::error::BookingError;

pub trait BlockBookingStore {
    /// Every booking, ascending by id.
    fn get_all(&self) -> Result<Vec<BlockBooking>, BookingError>;

    fn get(&self, id: &BlockBookingId) -> Result<Option<BlockBooking>, BookingError>;

    /// Bookings whose stored `start_time` lies in `[start, end)`, ascending by
    /// start time (ties by id).
    fn get_between(
        &self,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Vec<BlockBooking>, BookingError>;

    /// Validate and insert, assigning a fresh id.
    fn create(&self, fields: NewBlockBooking) -> Result<BlockBooking, BookingError>;

    /// Validate and replace every field of an existing booking.
    fn update(&self, id: &BlockBookingId, fields: NewBlockBooking) -> Result<BlockBooking, BookingError>;

    fn delete(&self, id: &BlockBookingId) -> Result<(), BookingError>;
}

#[derive(Debug, Default)]
struct Rows {
    by_id: BTreeMap<u64, BlockBooking>,
    last_id: u64,
}

/// A [`BlockBookingStore`] held in memory.
#[derive(Debug, Default)]
pub struct InMemoryStore {
    rows: RwLock<Rows>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a store from existing records, keeping their ids in canonical
    /// decimal form (`"02"` is stored as `"2"`).
    ///
    /// # Errors
    ///
    /// Returns [`BookingError::Storage`] for ids that are not positive
    /// integers or appear twice, and [`BookingError::InvalidBooking`] for
    /// records that fail validation.
    pub fn from_bookings(
        bookings: impl IntoIterator<Item = BlockBooking>,
    ) -> Result<Self, BookingError> {
        let mut rows = Rows::default();
        for booking in bookings {
            let key = row_key(&booking.id).ok_or_else(|| {
                BookingError::Storage(format!("block booking id '{}' is not a positive integer", booking.id))
            })?;
            let fields = normalize(NewBlockBooking {
                description: booking.description,
                start_time: booking.start_time,
                duration: booking.duration,
                recurrence: booking.recurrence,
                end_date: booking.end_date,
            });
            fields.validate()?;
            if rows.by_id.contains_key(&key) {
                return Err(BookingError::Storage(format!(
                    "duplicate block booking id '{}'",
                    booking.id
                )));
            }
            rows.by_id.insert(key, BlockBooking::from_parts(canonical_id(key), fields));
            rows.last_id = rows.last_id.max(key);
        }
        debug!(count = rows.by_id.len(), "seeded block booking store");
        Ok(Self {
            rows: RwLock::new(rows),
        })
    }

    /// Number of stored bookings.
    pub fn count(&self) -> Result<usize, BookingError> {
        Ok(self.read()?.by_id.len())
    }

    fn read(&self) -> Result<RwLockReadGuard<'_, Rows>, BookingError> {
        self.rows
            .read()
            .map_err(|_| BookingError::Storage("block booking store lock poisoned".to_string()))
    }

    fn write(&self) -> Result<RwLockWriteGuard<'_, Rows>, BookingError> {
        self.rows
            .write()
            .map_err(|_| BookingError::Storage("block booking store lock poisoned".to_string()))
    }
}

impl BlockBookingStore for InMemoryStore {
    fn get_all(&self) -> Result<Vec<BlockBooking>, BookingError> {
        Ok(self.read()?.by_id.values().cloned().collect())
    }

    fn get(&self, id: &BlockBookingId) -> Result<Option<BlockBooking>, BookingError> {
        let Some(key) = row_key(id) else {
            return Ok(None);
        };
        Ok(self.read()?.by_id.get(&key).cloned())
    }

    fn get_between(
        &self,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Vec<BlockBooking>, BookingError> {
        let rows = self.read()?;
        let mut found: Vec<(u64, BlockBooking)> = rows
            .by_id
            .iter()
            .filter(|(_, b)| start <= b.start_time && b.start_time < end)
            .map(|(key, b)| (*key, b.clone()))
            .collect();
        found.sort_by_key(|(key, b)| (b.start_time, *key));
        Ok(found.into_iter().map(|(_, b)| b).collect())
    }

    fn create(&self, fields: NewBlockBooking) -> Result<BlockBooking, BookingError> {
        let fields = normalize(fields);
        fields.validate()?;

        let mut rows = self.write()?;
        let key = rows
            .last_id
            .checked_add(1)
            .ok_or_else(|| BookingError::Storage("block booking ids exhausted".to_string()))?;
        rows.last_id = key;
        let booking = BlockBooking::from_parts(canonical_id(key), fields);
        rows.by_id.insert(key, booking.clone());
        info!(id = %booking.id, recurring = booking.is_recurring(), "created block booking");
        Ok(booking)
    }

    fn update(&self, id: &BlockBookingId, fields: NewBlockBooking) -> Result<BlockBooking, BookingError> {
        let fields = normalize(fields);
        fields.validate()?;

        let mut rows = self.write()?;
        let (key, slot) = row_key(id)
            .and_then(|key| rows.by_id.get_mut(&key).map(|slot| (key, slot)))
            .ok_or_else(|| BookingError::NotFound(id.clone()))?;
        *slot = BlockBooking::from_parts(canonical_id(key), fields);
        info!(id = %slot.id, "updated block booking");
        Ok(slot.clone())
    }

    fn delete(&self, id: &BlockBookingId) -> Result<(), BookingError> {
        let mut rows = self.write()?;
        row_key(id)
            .and_then(|key| rows.by_id.remove(&key))
            .ok_or_else(|| BookingError::NotFound(id.clone()))?;
        info!(id = %id, "deleted block booking");
        Ok(())
    }
}

/// Integer row key behind an opaque id.
fn row_key(id: &BlockBookingId) -> Option<u64> {
    id.as_str().parse::<u64>().ok().filter(|key| *key > 0)
}

/// The id a row is stored and returned under.
fn canonical_id(key: u64) -> BlockBookingId {
    BlockBookingId::new(key.to_string())
}

/// A blank recurrence is stored as absent.
fn normalize(mut fields: NewBlockBooking) -> NewBlockBooking {
    fields.recurrence = fields
        .recurrence
        .map(|r| r.trim().to_string())
        .filter(|r| !r.is_empty());
    fields
}
