use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use showroom_domain::{
    Booking, BookingError, BookingResult, BookingStatus, BookingStore, NewBooking,
};
use tokio::sync::Mutex;
use uuid::Uuid;

/// Booking store kept in process memory.
///
/// Every operation runs under one mutex, so the capacity check and the insert
/// are a single critical section. Only suitable for tests and single-process
/// local runs; state is lost on drop.
#[derive(Default)]
pub struct InMemoryBookingStore {
    bookings: Mutex<HashMap<Uuid, Booking>>,
}

impl InMemoryBookingStore {
    pub fn new() -> Self {
        Self::default()
    }
}

fn count_slot(
    bookings: &HashMap<Uuid, Booking>,
    showroom_id: Uuid,
    slot_time: DateTime<Utc>,
) -> i64 {
    let n = bookings
        .values()
        .filter(|b| {
            b.showroom_id == showroom_id
                && b.slot_time == slot_time
                && b.status == BookingStatus::Confirmed
        })
        .count();
    i64::try_from(n).unwrap_or(i64::MAX)
}

#[async_trait]
impl BookingStore for InMemoryBookingStore {
    async fn count_confirmed(
        &self,
        showroom_id: Uuid,
        slot_time: DateTime<Utc>,
    ) -> BookingResult<i64> {
        let bookings = self.bookings.lock().await;
        Ok(count_slot(&bookings, showroom_id, slot_time))
    }

    async fn insert(&self, booking: NewBooking, capacity: u32) -> BookingResult<Booking> {
        let mut bookings = self.bookings.lock().await;

        let current = count_slot(&bookings, booking.showroom_id, booking.slot_time);
        if current >= i64::from(capacity) {
            return Err(BookingError::SlotFull);
        }

        // mirrors the partial unique index on non-cancelled rows
        let duplicate = bookings.values().any(|b| {
            b.user_id == booking.user_id
                && b.showroom_id == booking.showroom_id
                && b.slot_time == booking.slot_time
                && !b.is_cancelled()
        });
        if duplicate {
            return Err(BookingError::DuplicateBooking);
        }
        if bookings.contains_key(&booking.id) {
            return Err(BookingError::storage(format!("duplicate booking id {}", booking.id)));
        }

        let confirmed = booking.confirm();
        bookings.insert(confirmed.id, confirmed.clone());
        Ok(confirmed)
    }

    async fn get(&self, id: Uuid) -> BookingResult<Option<Booking>> {
        Ok(self.bookings.lock().await.get(&id).cloned())
    }

    async fn list_by_user(&self, user_id: Uuid) -> BookingResult<Vec<Booking>> {
        let bookings = self.bookings.lock().await;
        let mut list: Vec<Booking> = bookings
            .values()
            .filter(|b| b.user_id == user_id)
            .cloned()
            .collect();
        list.sort_by(|a, b| {
            b.slot_time
                .cmp(&a.slot_time)
                .then_with(|| b.created_at.cmp(&a.created_at))
                .then_with(|| b.id.cmp(&a.id))
        });
        Ok(list)
    }

    async fn cancel(&self, id: Uuid) -> BookingResult<Booking> {
        let mut bookings = self.bookings.lock().await;
        let booking = bookings.get_mut(&id).ok_or(BookingError::BookingNotFound)?;

        if booking.is_cancelled() {
            return Err(BookingError::AlreadyCancelled);
        }

        booking.status = BookingStatus::Cancelled;
        Ok(booking.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn slot() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 4, 2, 14, 0, 0).unwrap()
    }

    #[tokio::test]
    async fn test_zero_capacity_always_full() {
        let store = InMemoryBookingStore::new();
        let err = store
            .insert(NewBooking::new(Uuid::new_v4(), Uuid::new_v4(), slot()), 0)
            .await
            .unwrap_err();
        assert!(matches!(err, BookingError::SlotFull));
    }

    #[tokio::test]
    async fn test_cancelled_rows_do_not_count() {
        let store = InMemoryBookingStore::new();
        let room = Uuid::new_v4();

        let first = store
            .insert(NewBooking::new(Uuid::new_v4(), room, slot()), 1)
            .await
            .unwrap();
        assert_eq!(store.count_confirmed(room, slot()).await.unwrap(), 1);

        store.cancel(first.id).await.unwrap();
        assert_eq!(store.count_confirmed(room, slot()).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_cancel_unknown_id() {
        let store = InMemoryBookingStore::new();
        let err = store.cancel(Uuid::new_v4()).await.unwrap_err();
        assert!(matches!(err, BookingError::BookingNotFound));
    }

    #[tokio::test]
    async fn test_rebook_after_own_cancellation() {
        let store = InMemoryBookingStore::new();
        let user = Uuid::new_v4();
        let room = Uuid::new_v4();

        let first = store.insert(NewBooking::new(user, room, slot()), 2).await.unwrap();
        store.cancel(first.id).await.unwrap();

        let second = store.insert(NewBooking::new(user, room, slot()), 2).await.unwrap();
        assert_eq!(second.status, BookingStatus::Confirmed);
        assert_ne!(first.id, second.id);
    }
}
