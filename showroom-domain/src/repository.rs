use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::booking::{Booking, NewBooking};
use crate::error::BookingResult;

/// Durable access to booking rows.
///
/// Implementations own every booking row and must make [`insert`] atomic with
/// respect to the capacity check: two callers racing on the same
/// `(showroom_id, slot_time)` can never both see room and both insert.
///
/// [`insert`]: BookingStore::insert
#[async_trait]
pub trait BookingStore: Send + Sync {
    /// Number of `confirmed` bookings for the exact slot.
    async fn count_confirmed(
        &self,
        showroom_id: Uuid,
        slot_time: DateTime<Utc>,
    ) -> BookingResult<i64>;

    /// Check capacity and insert as `confirmed` in one atomic unit.
    ///
    /// Fails with `SlotFull` when the slot already holds `capacity` confirmed
    /// bookings and with `DuplicateBooking` when the user already has a
    /// non-cancelled booking for the slot.
    async fn insert(&self, booking: NewBooking, capacity: u32) -> BookingResult<Booking>;

    async fn get(&self, id: Uuid) -> BookingResult<Option<Booking>>;

    /// All bookings of a user, cancelled ones included, latest slot first.
    async fn list_by_user(&self, user_id: Uuid) -> BookingResult<Vec<Booking>>;

    /// Transition `confirmed -> cancelled`. Ownership is the caller's concern.
    async fn cancel(&self, id: Uuid) -> BookingResult<Booking>;
}
