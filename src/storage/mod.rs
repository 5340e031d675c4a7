//! Storage Module
//!
//! SQLite-backed key-value storage with per-entry TTL.

pub mod entry;
pub mod schema;
pub(crate) mod store;


use std::time::Duration;

use crate::error::Result;

// Re-export public types
pub use entry::{Entry, NEVER_EXPIRES};
pub use schema::TableName;
pub use store::SqliteStore;

// == Storage Trait ==
/// Backing store contract for session and cache data.
///
/// Absent and expired keys read as `Ok(None)`. Empty keys, and empty values
/// on `set`, are silently ignored.
pub trait Storage: Send + Sync {
    /// Returns the live value stored under `key`.
    fn get(&self, key: &str) -> Result<Option<Vec<u8>>>;

    /// Stores `value` under `key`; a zero `ttl` never expires.
    fn set(&self, key: &str, value: &[u8], ttl: Duration) -> Result<()>;

    /// Removes `key` if present.
    fn delete(&self, key: &str) -> Result<()>;

    /// Removes every entry.
    fn reset(&self) -> Result<()>;

    /// Releases background resources. Safe to call repeatedly.
    fn close(&self) -> Result<()>;
}
