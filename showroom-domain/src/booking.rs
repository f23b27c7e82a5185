use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::slot;

/// A reservation of one place in a showroom slot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Booking {
    pub id: Uuid,
    pub user_id: Uuid,
    pub showroom_id: Uuid,
    /// UTC, truncated to the minute.
    pub slot_time: DateTime<Utc>,
    pub status: BookingStatus,
    pub created_at: DateTime<Utc>,
}

impl Booking {
    pub fn is_cancelled(&self) -> bool {
        self.status == BookingStatus::Cancelled
    }

    /// Whether `requester_id` may act on this booking.
    pub fn can_be_managed_by(&self, requester_id: Uuid, is_admin: bool) -> bool {
        is_admin || self.user_id == requester_id
    }
}

/// Insert payload handed to a store. The store decides the resulting status.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewBooking {
    pub id: Uuid,
    pub user_id: Uuid,
    pub showroom_id: Uuid,
    pub slot_time: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
}

impl NewBooking {
    pub fn new(user_id: Uuid, showroom_id: Uuid, slot_time: DateTime<Utc>) -> Self {
        Self {
            id: Uuid::new_v4(),
            user_id,
            showroom_id,
            slot_time: slot::normalize(slot_time),
            created_at: Utc::now(),
        }
    }

    /// Materialise the row as it is persisted after a successful capacity check.
    pub fn confirm(self) -> Booking {
        Booking {
            id: self.id,
            user_id: self.user_id,
            showroom_id: self.showroom_id,
            slot_time: self.slot_time,
            status: BookingStatus::Confirmed,
            created_at: self.created_at,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BookingStatus {
    /// Never produced by this core; kept so older rows still decode.
    Pending,
    Confirmed,
    Cancelled,
}

impl BookingStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            BookingStatus::Pending => "pending",
            BookingStatus::Confirmed => "confirmed",
            BookingStatus::Cancelled => "cancelled",
        }
    }
}

impl fmt::Display for BookingStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, thiserror::Error)]
#[error("unknown booking status: {0}")]
pub struct UnknownStatus(pub String);

impl FromStr for BookingStatus {
    type Err = UnknownStatus;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(BookingStatus::Pending),
            "confirmed" => Ok(BookingStatus::Confirmed),
            "cancelled" => Ok(BookingStatus::Cancelled),
            other => Err(UnknownStatus(other.to_string())),
        }
    }
}
