use std::sync::Arc;

use chrono::{DateTime, TimeZone, Utc};
use showroom_domain::{slot, Booking, BookingError, BookingResult, BookingStore, NewBooking};
use tracing::{error, info, warn};
use uuid::Uuid;

/// Book / list / cancel use cases on top of a [`BookingStore`].
///
/// Holds no state of its own; every decision re-reads the store, so one
/// coordinator can be cloned into any number of concurrent tasks (and any
/// number of processes can share the same database).
#[derive(Clone)]
pub struct BookingCoordinator {
    store: Arc<dyn BookingStore>,
}

impl BookingCoordinator {
    pub fn new(store: Arc<dyn BookingStore>) -> Self {
        Self { store }
    }

    /// Book one place in `(showroom_id, slot_time)` for `requester_id`.
    ///
    /// The slot is normalised to UTC minute granularity before it reaches the
    /// store. `SlotFull` is returned as-is and never retried: a full slot is a
    /// stable answer, the caller has to pick another one.
    pub async fn book<Tz: TimeZone>(
        &self,
        requester_id: Uuid,
        showroom_id: Uuid,
        slot_time: DateTime<Tz>,
        capacity: u32,
    ) -> BookingResult<Booking> {
        let new_booking = NewBooking::new(requester_id, showroom_id, slot::normalize(slot_time));
        let slot_time = new_booking.slot_time;

        match self.store.insert(new_booking, capacity).await {
            Ok(booking) => {
                info!(
                    "Booking confirmed: {} (user {}, showroom {}, slot {})",
                    booking.id, requester_id, showroom_id, slot_time
                );
                Ok(booking)
            }
            Err(BookingError::SlotFull) => {
                warn!("Slot full: showroom {} at {} (capacity {})", showroom_id, slot_time, capacity);
                Err(BookingError::SlotFull)
            }
            Err(BookingError::DuplicateBooking) => {
                warn!(
                    "Duplicate booking rejected: user {} already holds showroom {} at {}",
                    requester_id, showroom_id, slot_time
                );
                Err(BookingError::DuplicateBooking)
            }
            Err(e) => {
                error!("Failed to book showroom {} at {}: {}", showroom_id, slot_time, e);
                Err(e)
            }
        }
    }

    /// Bookings of `requester_id`, cancelled ones included, latest slot first.
    pub async fn list_mine(&self, requester_id: Uuid) -> BookingResult<Vec<Booking>> {
        self.store.list_by_user(requester_id).await
    }

    /// Cancel a booking on behalf of its owner or an admin.
    pub async fn cancel(
        &self,
        booking_id: Uuid,
        requester_id: Uuid,
        is_admin: bool,
    ) -> BookingResult<Booking> {
        let booking = self
            .store
            .get(booking_id)
            .await?
            .ok_or(BookingError::BookingNotFound)?;

        if !booking.can_be_managed_by(requester_id, is_admin) {
            warn!("User {} may not cancel booking {}", requester_id, booking_id);
            return Err(BookingError::UnauthorizedOwner);
        }
        if booking.is_cancelled() {
            return Err(BookingError::AlreadyCancelled);
        }

        let cancelled = self.store.cancel(booking_id).await?;
        info!(
            "Booking cancelled: {} by {}{}",
            booking_id,
            requester_id,
            if is_admin { " (admin)" } else { "" }
        );
        Ok(cancelled)
    }

    /// Current confirmed count for a slot. Informational only: the number can
    /// be stale by the time the caller acts on it.
    pub async fn count_confirmed<Tz: TimeZone>(
        &self,
        showroom_id: Uuid,
        slot_time: DateTime<Tz>,
    ) -> BookingResult<i64> {
        let slot_time: DateTime<Utc> = slot::normalize(slot_time);
        self.store.count_confirmed(showroom_id, slot_time).await
    }
}
