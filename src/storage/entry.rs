//! Entry Module
//!
//! Defines the persisted shape of one stored entry and its expiration rules.

use std::time::Duration;

use chrono::{DateTime, Utc};

/// Expiration sentinel for entries that never expire.
pub const NEVER_EXPIRES: i64 = 0;

// == Entry ==
/// One row of the store's table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Entry {
    /// Primary key (column `k`)
    pub key: String,
    /// Opaque payload (column `v`)
    pub value: Vec<u8>,
    /// Expiration as Unix seconds, `NEVER_EXPIRES` = no expiration (column `e`)
    pub expires_at: i64,
}

impl Entry {
    // == Constructor ==
    /// Creates an entry expiring `ttl` from now. A zero `ttl` never expires.
    pub fn new(key: impl Into<String>, value: impl Into<Vec<u8>>, ttl: Duration) -> Self {
        Self {
            key: key.into(),
            value: value.into(),
            expires_at: expires_at_for(ttl, Utc::now()),
        }
    }

    // == Is Expired ==
    /// Checks if the entry has expired as of `now` (Unix seconds).
    ///
    /// Boundary condition: an entry whose expiration equals `now` is expired,
    /// matching the reaper's `e <= now` sweep condition.
    pub fn is_expired_at(&self, now: i64) -> bool {
        self.expires_at != NEVER_EXPIRES && self.expires_at <= now
    }
}

// == Utility Functions ==
/// Returns the current Unix timestamp in whole seconds.
pub fn unix_now() -> i64 {
    Utc::now().timestamp()
}

/// Computes the absolute expiration for a `ttl` starting at `now`.
///
/// Zero means never expires. Sub-second remainders are truncated, and a ttl
/// too large to represent saturates to `i64::MAX`.
pub fn expires_at_for(ttl: Duration, now: DateTime<Utc>) -> i64 {
    if ttl.is_zero() {
        return NEVER_EXPIRES;
    }
    chrono::Duration::from_std(ttl)
        .ok()
        .and_then(|delta| now.checked_add_signed(delta))
        .map(|at| at.timestamp())
        .unwrap_or(i64::MAX)
}
