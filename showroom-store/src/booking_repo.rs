use async_trait::async_trait;
use chrono::{DateTime, Utc};
use showroom_domain::{
    Booking, BookingError, BookingResult, BookingStatus, BookingStore, NewBooking,
};
use sqlx::{PgPool, Postgres};
use tracing::{debug, error};
use uuid::Uuid;

use crate::app_config::BookingConfig;

const DUPLICATE_BOOKING_INDEX: &str = "uq_bookings_user_showroom_slot";

/// Postgres-backed [`BookingStore`].
///
/// `insert` runs as one READ COMMITTED transaction that first takes the row
/// lock of the slot's `booking_slots` sentinel, so the capacity count and
/// the insert of concurrent bookers of the same slot execute one at a time,
/// across every process sharing the database. Bookers of other slots are
/// not blocked.
pub struct PostgresBookingStore {
    pool: PgPool,
    limits: BookingConfig,
}

#[derive(sqlx::FromRow)]
struct BookingRow {
    id: Uuid,
    user_id: Uuid,
    showroom_id: Uuid,
    slot_time: DateTime<Utc>,
    status: String,
    created_at: DateTime<Utc>,
}

impl TryFrom<BookingRow> for Booking {
    type Error = BookingError;

    fn try_from(row: BookingRow) -> Result<Self, Self::Error> {
        Ok(Booking {
            id: row.id,
            user_id: row.user_id,
            showroom_id: row.showroom_id,
            slot_time: row.slot_time,
            status: row.status.parse::<BookingStatus>().map_err(BookingError::storage)?,
            created_at: row.created_at,
        })
    }
}

fn storage_error(context: &str, err: sqlx::Error) -> BookingError {
    error!("{}: {}", context, err);
    BookingError::storage(err)
}

fn insert_error(err: sqlx::Error) -> BookingError {
    if let sqlx::Error::Database(db_err) = &err {
        if db_err.is_unique_violation() && db_err.constraint() == Some(DUPLICATE_BOOKING_INDEX) {
            return BookingError::DuplicateBooking;
        }
    }
    storage_error("Failed to insert booking", err)
}

impl PostgresBookingStore {
    pub fn new(pool: PgPool, limits: BookingConfig) -> Self {
        Self { pool, limits }
    }

    /// Bound lock waits and statement time for the rest of the transaction.
    pub async fn apply_limits(
        tx: &mut sqlx::Transaction<'_, Postgres>,
        limits: &BookingConfig,
    ) -> Result<(), sqlx::Error> {
        sqlx::query("SELECT set_config('lock_timeout', $1, true), set_config('statement_timeout', $2, true)")
            .bind(format!("{}ms", limits.lock_timeout_ms))
            .bind(format!("{}ms", limits.statement_timeout_ms))
            .execute(&mut **tx)
            .await?;
        Ok(())
    }

    /// Take the exclusive row lock for a slot, creating its sentinel row on
    /// first use. Held until the transaction ends.
    pub async fn lock_slot(
        tx: &mut sqlx::Transaction<'_, Postgres>,
        showroom_id: Uuid,
        slot_time: DateTime<Utc>,
    ) -> Result<(), sqlx::Error> {
        sqlx::query(
            r#"
            INSERT INTO booking_slots (showroom_id, slot_time)
            VALUES ($1, $2)
            ON CONFLICT (showroom_id, slot_time) DO UPDATE SET last_locked_at = now()
            "#,
        )
        .bind(showroom_id)
        .bind(slot_time)
        .execute(&mut **tx)
        .await?;
        Ok(())
    }

    pub async fn count_confirmed_in(
        tx: &mut sqlx::Transaction<'_, Postgres>,
        showroom_id: Uuid,
        slot_time: DateTime<Utc>,
    ) -> Result<i64, sqlx::Error> {
        sqlx::query_scalar::<_, i64>(
            r#"
            SELECT COUNT(*) FROM bookings
            WHERE showroom_id = $1 AND slot_time = $2 AND status = $3
            "#,
        )
        .bind(showroom_id)
        .bind(slot_time)
        .bind(BookingStatus::Confirmed.as_str())
        .fetch_one(&mut **tx)
        .await
    }
}

#[async_trait]
impl BookingStore for PostgresBookingStore {
    async fn count_confirmed(
        &self,
        showroom_id: Uuid,
        slot_time: DateTime<Utc>,
    ) -> BookingResult<i64> {
        sqlx::query_scalar::<_, i64>(
            r#"
            SELECT COUNT(*) FROM bookings
            WHERE showroom_id = $1 AND slot_time = $2 AND status = $3
            "#,
        )
        .bind(showroom_id)
        .bind(slot_time)
        .bind(BookingStatus::Confirmed.as_str())
        .fetch_one(&self.pool)
        .await
        .map_err(|e| storage_error("Failed to count confirmed bookings", e))
    }

    async fn insert(&self, booking: NewBooking, capacity: u32) -> BookingResult<Booking> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| storage_error("Failed to start booking transaction", e))?;

        Self::apply_limits(&mut tx, &self.limits)
            .await
            .map_err(|e| storage_error("Failed to apply booking limits", e))?;

        Self::lock_slot(&mut tx, booking.showroom_id, booking.slot_time)
            .await
            .map_err(|e| storage_error("Failed to lock slot", e))?;
        debug!("Locked slot {} at {}", booking.showroom_id, booking.slot_time);

        let current = Self::count_confirmed_in(&mut tx, booking.showroom_id, booking.slot_time)
            .await
            .map_err(|e| storage_error("Failed to count confirmed bookings", e))?;

        if current >= i64::from(capacity) {
            tx.rollback()
                .await
                .map_err(|e| storage_error("Failed to roll back booking transaction", e))?;
            return Err(BookingError::SlotFull);
        }

        let row: BookingRow = sqlx::query_as(
            r#"
            INSERT INTO bookings (id, user_id, showroom_id, slot_time, status, created_at)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING id, user_id, showroom_id, slot_time, status, created_at
            "#,
        )
        .bind(booking.id)
        .bind(booking.user_id)
        .bind(booking.showroom_id)
        .bind(booking.slot_time)
        .bind(BookingStatus::Confirmed.as_str())
        .bind(booking.created_at)
        .fetch_one(&mut *tx)
        .await
        .map_err(insert_error)?;

        tx.commit()
            .await
            .map_err(|e| storage_error("Failed to commit booking", e))?;

        Booking::try_from(row)
    }

    async fn get(&self, id: Uuid) -> BookingResult<Option<Booking>> {
        let row: Option<BookingRow> = sqlx::query_as(
            "SELECT id, user_id, showroom_id, slot_time, status, created_at FROM bookings WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| storage_error("Failed to fetch booking", e))?;

        row.map(Booking::try_from).transpose()
    }

    async fn list_by_user(&self, user_id: Uuid) -> BookingResult<Vec<Booking>> {
        let rows: Vec<BookingRow> = sqlx::query_as(
            r#"
            SELECT id, user_id, showroom_id, slot_time, status, created_at
            FROM bookings
            WHERE user_id = $1
            ORDER BY slot_time DESC, created_at DESC, id DESC
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| storage_error("Failed to list bookings", e))?;

        rows.into_iter().map(Booking::try_from).collect()
    }

    async fn cancel(&self, id: Uuid) -> BookingResult<Booking> {
        // conditional update keeps the transition atomic against a concurrent cancel
        let row: Option<BookingRow> = sqlx::query_as(
            r#"
            UPDATE bookings SET status = $2
            WHERE id = $1 AND status <> $2
            RETURNING id, user_id, showroom_id, slot_time, status, created_at
            "#,
        )
        .bind(id)
        .bind(BookingStatus::Cancelled.as_str())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| storage_error("Failed to cancel booking", e))?;

        if let Some(row) = row {
            return Booking::try_from(row);
        }

        let exists: bool = sqlx::query_scalar::<_, bool>("SELECT EXISTS(SELECT 1 FROM bookings WHERE id = $1)")
            .bind(id)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| storage_error("Failed to fetch booking", e))?;

        if exists {
            Err(BookingError::AlreadyCancelled)
        } else {
            Err(BookingError::BookingNotFound)
        }
    }
}
