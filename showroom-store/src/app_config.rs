use serde::Deserialize;
use std::env;
use std::time::Duration;

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub database: DatabaseConfig,
    #[serde(default)]
    pub booking: BookingConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct DatabaseConfig {
    pub url: String,
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
    #[serde(default = "default_acquire_timeout_secs")]
    pub acquire_timeout_secs: u64,
}

/// Limits applied inside every booking transaction.
#[derive(Debug, Deserialize, Clone, PartialEq, Eq)]
pub struct BookingConfig {
    /// Longest wait for the slot lock before the insert fails with a storage error.
    #[serde(default = "default_lock_timeout_ms")]
    pub lock_timeout_ms: u64,
    #[serde(default = "default_statement_timeout_ms")]
    pub statement_timeout_ms: u64,
}

impl Default for BookingConfig {
    fn default() -> Self {
        Self {
            lock_timeout_ms: default_lock_timeout_ms(),
            statement_timeout_ms: default_statement_timeout_ms(),
        }
    }
}

impl DatabaseConfig {
    pub fn acquire_timeout(&self) -> Duration {
        Duration::from_secs(self.acquire_timeout_secs)
    }
}

fn default_max_connections() -> u32 { 5 }
fn default_acquire_timeout_secs() -> u64 { 3 }
fn default_lock_timeout_ms() -> u64 { 2_000 }
fn default_statement_timeout_ms() -> u64 { 5_000 }

impl Config {
    pub fn load() -> Result<Self, config::ConfigError> {
        let run_mode = env::var("RUN_MODE").unwrap_or_else(|_| "development".into());

        let s = config::Config::builder()
            .add_source(config::File::with_name("config/default"))
            // optional per-environment overrides
            .add_source(config::File::with_name(&format!("config/{}", run_mode)).required(false))
            // not checked in
            .add_source(config::File::with_name("config/local").required(false))
            // e.g. `SHOWROOM__DATABASE__URL=postgres://...`
            .add_source(config::Environment::with_prefix("SHOWROOM").separator("__"))
            .build()?;

        s.try_deserialize()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_booking_limits_default_when_section_missing() {
        let cfg: Config = config::Config::builder()
            .set_override("database.url", "postgres://localhost/showroom")
            .unwrap()
            .build()
            .unwrap()
            .try_deserialize()
            .unwrap();

        assert_eq!(cfg.booking, BookingConfig::default());
        assert_eq!(cfg.database.max_connections, 5);
        assert_eq!(cfg.database.acquire_timeout(), Duration::from_secs(3));
    }

    #[test]
    fn test_overrides_apply() {
        let cfg: Config = config::Config::builder()
            .set_override("database.url", "postgres://db/showroom")
            .unwrap()
            .set_override("booking.lock_timeout_ms", 250_i64)
            .unwrap()
            .build()
            .unwrap()
            .try_deserialize()
            .unwrap();

        assert_eq!(cfg.booking.lock_timeout_ms, 250);
        assert_eq!(cfg.booking.statement_timeout_ms, 5_000);
    }
}
