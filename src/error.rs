//! Error types for the TTL store
//!
//! Provides unified error handling using thiserror.

use thiserror::Error;

// == Store Error Enum ==
/// Unified error type for the TTL store.
///
/// A missing or expired key is never an error: lookups return `Ok(None)`.
#[derive(Error, Debug)]
pub enum StoreError {
    /// Dropping or creating the table failed while opening the store
    #[error("Setup failed: {0}")]
    Setup(String),

    /// Configuration rejected before touching the database
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// No tokio runtime available to host the reaper
    #[error("Runtime unavailable: {0}")]
    Runtime(String),

    /// SQLite reported a fault
    #[error("Backend error: {0}")]
    Backend(#[from] rusqlite::Error),

    /// A pooled connection could not be checked out
    #[error("Connection pool error: {0}")]
    Pool(#[from] r2d2::Error),
}

// == Result Type Alias ==
/// Convenience Result type for the TTL store.
pub type Result<T> = std::result::Result<T, StoreError>;
