use std::error::Error as StdError;

/// Outcome classes a transport layer maps onto its own status codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Slot full or duplicate self-booking. Pick another slot.
    Conflict,
    NotFound,
    Forbidden,
    InvalidRequest,
    /// Opaque infrastructure failure.
    Storage,
}

#[derive(Debug, thiserror::Error)]
pub enum BookingError {
    #[error("slot is already full")]
    SlotFull,

    #[error("user already holds a booking for this slot")]
    DuplicateBooking,

    #[error("booking not found")]
    BookingNotFound,

    #[error("not owner of the booking")]
    UnauthorizedOwner,

    #[error("booking already cancelled")]
    AlreadyCancelled,

    #[error("invalid slot time: {0}")]
    InvalidSlotTime(String),

    #[error("storage error: {0}")]
    Storage(#[source] Box<dyn StdError + Send + Sync>),
}

impl BookingError {
    pub fn storage<E>(err: E) -> Self
    where
        E: Into<Box<dyn StdError + Send + Sync>>,
    {
        Self::Storage(err.into())
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            BookingError::SlotFull | BookingError::DuplicateBooking => ErrorKind::Conflict,
            BookingError::BookingNotFound => ErrorKind::NotFound,
            BookingError::UnauthorizedOwner => ErrorKind::Forbidden,
            BookingError::AlreadyCancelled | BookingError::InvalidSlotTime(_) => {
                ErrorKind::InvalidRequest
            }
            BookingError::Storage(_) => ErrorKind::Storage,
        }
    }
}

pub type BookingResult<T> = Result<T, BookingError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_conflicts_are_distinguishable_from_storage() {
        assert_eq!(BookingError::SlotFull.kind(), ErrorKind::Conflict);
        assert_eq!(BookingError::DuplicateBooking.kind(), ErrorKind::Conflict);
        assert_eq!(BookingError::UnauthorizedOwner.kind(), ErrorKind::Forbidden);
        assert_eq!(BookingError::BookingNotFound.kind(), ErrorKind::NotFound);
        assert_eq!(BookingError::AlreadyCancelled.kind(), ErrorKind::InvalidRequest);

        let storage = BookingError::storage("connection reset");
        assert_eq!(storage.kind(), ErrorKind::Storage);
        assert_eq!(storage.to_string(), "storage error: connection reset");
        assert!(storage.source().is_some());
    }
}
