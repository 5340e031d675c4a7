//! Backend Module
//!
//! Connection pool helpers for the SQLite database a store lives in.
//! Hosts that already manage a pool can skip these and pass their own.

use std::path::Path;
use std::time::Duration;

use r2d2::Pool;
use r2d2_sqlite::SqliteConnectionManager;
use tracing::debug;

use crate::error::Result;

/// Pool handle type accepted by the store.
pub type SqlitePool = Pool<SqliteConnectionManager>;

/// How long a connection waits on a locked database before failing.
pub const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

/// Default number of pooled connections for file databases.
pub const DEFAULT_POOL_SIZE: u32 = 8;

/// Opens a pool over the SQLite file at `path`, creating it if needed.
///
/// Every connection runs in WAL mode with a busy timeout, so the reaper and
/// foreground writers queue on the database lock instead of failing.
pub fn file_pool(path: impl AsRef<Path>) -> Result<SqlitePool> {
    let path = path.as_ref();
    let manager = SqliteConnectionManager::file(path).with_init(|conn| {
        conn.busy_timeout(BUSY_TIMEOUT)?;
        conn.pragma_update_and_check(None, "journal_mode", "WAL", |_| Ok(()))?;
        conn.pragma_update(None, "synchronous", "NORMAL")
    });

    let pool = Pool::builder().max_size(DEFAULT_POOL_SIZE).build(manager)?;
    debug!(path = %path.display(), "Opened SQLite file pool");
    Ok(pool)
}

/// Opens a pool over a private in-memory database.
///
/// The pool holds exactly one connection that is never recycled, since each
/// in-memory connection is its own database. Callers share that connection
/// in turn.
pub fn memory_pool() -> Result<SqlitePool> {
    let manager = SqliteConnectionManager::memory();
    let pool = Pool::builder()
        .max_size(1)
        .idle_timeout(None)
        .max_lifetime(None)
        .build(manager)?;
    Ok(pool)
}
