//! Configuration Module
//!
//! Resolved store configuration, with defaults and an environment loader.

use std::env;
use std::time::Duration;

use crate::backend::SqlitePool;

/// Sweep period used when none (or zero) is configured.
pub const DEFAULT_GC_INTERVAL: Duration = Duration::from_secs(10);

/// Table used when none is configured.
pub const DEFAULT_TABLE_NAME: &str = "fiber_storage";

/// Store configuration parameters.
///
/// The pool is owned by the caller; the store keeps a clone of the handle and
/// never shuts the pool down.
#[derive(Debug, Clone)]
pub struct Config {
    /// Connection pool for the backing SQLite database
    pub pool: SqlitePool,
    /// Interval between background expiry sweeps
    pub gc_interval: Duration,
    /// Drop the table (and every entry in it) when the store opens
    pub reset: bool,
    /// Table holding this store's entries; matched case-insensitively
    pub table_name: String,
}

impl Config {
    /// Creates a Config over `pool` with default settings.
    pub fn new(pool: SqlitePool) -> Self {
        Self {
            pool,
            gc_interval: DEFAULT_GC_INTERVAL,
            reset: false,
            table_name: DEFAULT_TABLE_NAME.to_string(),
        }
    }

    /// Creates a Config over `pool`, reading the remaining settings from
    /// environment variables.
    ///
    /// # Environment Variables
    /// - `STORE_GC_INTERVAL` - Sweep interval in seconds (default: 10)
    /// - `STORE_TABLE_NAME` - Table name (default: fiber_storage)
    /// - `STORE_RESET` - `true` or `1` to drop the table on open (default: false)
    pub fn from_env(pool: SqlitePool) -> Self {
        Self {
            pool,
            gc_interval: env::var("STORE_GC_INTERVAL")
                .ok()
                .and_then(|v| v.parse().ok())
                .map(Duration::from_secs)
                .unwrap_or(DEFAULT_GC_INTERVAL),
            reset: env::var("STORE_RESET")
                .map(|v| matches!(v.trim(), "1" | "true" | "TRUE" | "True"))
                .unwrap_or(false),
            table_name: env::var("STORE_TABLE_NAME")
                .ok()
                .filter(|v| !v.trim().is_empty())
                .unwrap_or_else(|| DEFAULT_TABLE_NAME.to_string()),
        }
    }

    /// Sets the sweep interval.
    pub fn gc_interval(mut self, interval: Duration) -> Self {
        self.gc_interval = interval;
        self
    }

    /// Sets whether the table is dropped on open.
    pub fn reset(mut self, reset: bool) -> Self {
        self.reset = reset;
        self
    }

    /// Sets the table name.
    pub fn table_name(mut self, name: impl Into<String>) -> Self {
        self.table_name = name.into();
        self
    }

    /// Returns the sweep interval, substituting the default for zero.
    pub fn effective_gc_interval(&self) -> Duration {
        if self.gc_interval.is_zero() {
            DEFAULT_GC_INTERVAL
        } else {
            self.gc_interval
        }
    }
}
