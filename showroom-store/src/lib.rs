pub mod app_config;
pub mod booking_repo;
pub mod database;

pub use app_config::{BookingConfig, Config};
pub use booking_repo::PostgresBookingStore;
pub use database::DbClient;
