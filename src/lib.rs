//! TTL Store - a SQLite-backed key-value store with per-entry expiration
//!
//! Entries expire lazily (an expired entry reads as absent) and eagerly (a
//! background reaper deletes expired rows on a fixed interval).

pub mod backend;
pub mod config;
pub mod error;
pub mod storage;
mod tasks;

pub use backend::{file_pool, memory_pool, SqlitePool};
pub use config::Config;
pub use error::{Result, StoreError};
pub use storage::{SqliteStore, Storage};
