//! Configuration Module
//!
//! Handles loading the TTL table settings from environment variables.

use std::env;
use std::time::Duration;

/// TTL table and backing store configuration.
///
/// All values can be configured via environment variables with sensible defaults.
#[derive(Debug, Clone)]
pub struct Config {
    /// Name of the TTL table; hashed to namespace its slot markers
    pub table_name: String,
    /// Slot width and sweep period in milliseconds
    pub prune_interval_ms: u64,
    /// Capacity of the backing store, 0 for an unbounded store
    pub store_capacity: usize,
}

impl Config {
    /// Creates a new Config by loading values from environment variables.
    ///
    /// # Environment Variables
    /// - `TTL_TABLE_NAME` - TTL table name (default: "default")
    /// - `PRUNE_INTERVAL_MS` - Prune interval in milliseconds (default: 60000)
    /// - `STORE_CAPACITY` - Backing store capacity, 0 = unbounded (default: 0)
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            table_name: env::var("TTL_TABLE_NAME")
                .ok()
                .filter(|v| !v.is_empty())
                .unwrap_or(defaults.table_name),
            prune_interval_ms: env::var("PRUNE_INTERVAL_MS")
                .ok()
                .and_then(|v| v.parse().ok())
                .filter(|ms| *ms > 0)
                .unwrap_or(defaults.prune_interval_ms),
            store_capacity: env::var("STORE_CAPACITY")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.store_capacity),
        }
    }

    pub fn prune_interval(&self) -> Duration {
        Duration::from_millis(self.prune_interval_ms)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            table_name: "default".to_string(),
            prune_interval_ms: 60_000,
            store_capacity: 0,
        }
    }
}
