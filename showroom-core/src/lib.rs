pub mod coordinator;
pub mod memory;

pub use coordinator::BookingCoordinator;
pub use memory::InMemoryBookingStore;
pub use showroom_domain::{Booking, BookingError, BookingResult, BookingStatus, ErrorKind};
