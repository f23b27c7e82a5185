pub mod booking;
pub mod error;
pub mod repository;
pub mod slot;

pub use booking::{Booking, BookingStatus, NewBooking};
pub use error::{BookingError, BookingResult, ErrorKind};
pub use repository::BookingStore;
