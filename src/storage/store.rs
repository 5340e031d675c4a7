//! Store Module
//!
//! Main TTL engine: one SQLite table, lazy expiration on read and a
//! background reaper for eager expiration.

use std::sync::Arc;
use std::time::Duration;

use rusqlite::{params, OptionalExtension};
use tokio::runtime::Handle;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use crate::backend::SqlitePool;
use crate::config::Config;
use crate::error::{Result, StoreError};
use crate::storage::entry::{unix_now, Entry};
use crate::storage::schema::{self, Statements, TableName};
use crate::storage::Storage;
use crate::tasks::spawn_reaper;

// == Table ==
/// The table a store owns, reachable from both the store and its reaper.
#[derive(Debug)]
pub(crate) struct Table {
    pool: SqlitePool,
    name: TableName,
    sql: Statements,
}

impl Table {
    /// Removes every row whose expiration is set and not after `now`.
    pub(crate) fn sweep_expired(&self, now: i64) -> Result<usize> {
        let conn = self.pool.get()?;
        let removed = conn.execute(&self.sql.delete_expired, [now])?;
        Ok(removed)
    }

    pub(crate) fn name(&self) -> &TableName {
        &self.name
    }
}

// == Sqlite Store ==
/// SQLite-backed key-value store with per-entry TTL.
///
/// Operations are synchronous and issue one statement each. Expired entries
/// read as absent immediately and are physically removed by the reaper on
/// its next sweep.
#[derive(Debug)]
pub struct SqliteStore {
    table: Arc<Table>,
    gc_interval: Duration,
    shutdown: CancellationToken,
    reaper: JoinHandle<()>,
}

impl SqliteStore {
    // == Constructor ==
    /// Opens a store over the configured table and starts its reaper.
    ///
    /// Must be called from within a tokio runtime, which hosts the reaper.
    /// With `reset` set the table is dropped first; that and schema creation
    /// failures are reported as `StoreError::Setup`.
    pub fn new(config: Config) -> Result<Self> {
        let runtime = Handle::try_current()
            .map_err(|e| StoreError::Runtime(format!("reaper needs a tokio runtime: {e}")))?;
        let name = TableName::new(config.table_name.as_str())?;
        let gc_interval = config.effective_gc_interval();

        {
            let conn = config.pool.get()?;
            if config.reset {
                schema::drop_table(&conn, &name)
                    .map_err(|e| StoreError::Setup(format!("drop table {name}: {e}")))?;
            }
            schema::migrate(&conn, &name)
                .map_err(|e| StoreError::Setup(format!("create table {name}: {e}")))?;
        }

        info!(
            table = %name,
            gc_interval_ms = gc_interval.as_millis() as u64,
            reset = config.reset,
            "Opened TTL store"
        );

        let table = Arc::new(Table {
            sql: Statements::for_table(&name),
            pool: config.pool,
            name,
        });
        let shutdown = CancellationToken::new();
        let reaper = spawn_reaper(&runtime, Arc::clone(&table), gc_interval, shutdown.clone());

        Ok(Self {
            table,
            gc_interval,
            shutdown,
            reaper,
        })
    }

    // == Get ==
    /// Retrieves the value stored under `key`.
    ///
    /// Returns `Ok(None)` when the key is absent, expired, or empty; an empty
    /// key is indistinguishable from a miss. Expired rows are left in place
    /// for the reaper.
    pub fn get(&self, key: &str) -> Result<Option<Vec<u8>>> {
        if key.is_empty() {
            return Ok(None);
        }

        let conn = self.table.pool.get()?;
        let entry = conn
            .query_row(&self.table.sql.select, [key], |row| {
                Ok(Entry {
                    key: row.get(0)?,
                    value: row.get(1)?,
                    expires_at: row.get(2)?,
                })
            })
            .optional()?;

        Ok(entry
            .filter(|entry| !entry.is_expired_at(unix_now()))
            .map(|entry| entry.value))
    }

    // == Set ==
    /// Stores `value` under `key`, replacing any previous entry.
    ///
    /// A zero `ttl` never expires. Empty keys and empty values are ignored.
    pub fn set(&self, key: &str, value: &[u8], ttl: Duration) -> Result<()> {
        if key.is_empty() || value.is_empty() {
            return Ok(());
        }

        let entry = Entry::new(key, value, ttl);
        let conn = self.table.pool.get()?;
        conn.execute(
            &self.table.sql.upsert,
            params![entry.key, entry.value, entry.expires_at],
        )?;
        Ok(())
    }

    // == Delete ==
    /// Removes the entry under `key`. Missing keys and empty keys are not errors.
    pub fn delete(&self, key: &str) -> Result<()> {
        if key.is_empty() {
            return Ok(());
        }

        let conn = self.table.pool.get()?;
        conn.execute(&self.table.sql.delete_key, [key])?;
        Ok(())
    }

    // == Reset ==
    /// Removes every entry, expired or not.
    pub fn reset(&self) -> Result<()> {
        let conn = self.table.pool.get()?;
        let removed = conn.execute(&self.table.sql.delete_all, [])?;
        debug!(table = %self.table.name(), removed, "Store reset");
        Ok(())
    }

    // == Close ==
    /// Stops the reaper. Safe to call more than once; the pool stays open.
    pub fn close(&self) -> Result<()> {
        if !self.shutdown.is_cancelled() {
            info!(table = %self.table.name(), "Closing TTL store");
        }
        self.shutdown.cancel();
        Ok(())
    }

    // == Sweep Expired ==
    /// Runs one reaper pass now and returns the number of rows removed.
    pub fn sweep_expired(&self) -> Result<usize> {
        self.table.sweep_expired(unix_now())
    }

    // == Length ==
    /// Returns the number of stored rows, including expired rows not yet swept.
    pub fn len(&self) -> Result<usize> {
        let conn = self.table.pool.get()?;
        let count: i64 = conn.query_row(&self.table.sql.count, [], |row| row.get(0))?;
        Ok(usize::try_from(count).unwrap_or(0))
    }

    // == Is Empty ==
    /// Returns true if the table holds no rows.
    pub fn is_empty(&self) -> Result<bool> {
        Ok(self.len()? == 0)
    }

    /// Returns the connection pool this store was opened with.
    pub fn conn(&self) -> &SqlitePool {
        &self.table.pool
    }

    /// Returns the table this store owns.
    pub fn table_name(&self) -> &str {
        self.table.name().as_str()
    }

    /// Returns the effective sweep interval.
    pub fn gc_interval(&self) -> Duration {
        self.gc_interval
    }

    /// Returns true once the reaper task has exited.
    pub fn is_reaper_finished(&self) -> bool {
        self.reaper.is_finished()
    }
}

impl Drop for SqliteStore {
    fn drop(&mut self) {
        self.shutdown.cancel();
    }
}

impl Storage for SqliteStore {
    fn get(&self, key: &str) -> Result<Option<Vec<u8>>> {
        SqliteStore::get(self, key)
    }

    fn set(&self, key: &str, value: &[u8], ttl: Duration) -> Result<()> {
        SqliteStore::set(self, key, value, ttl)
    }

    fn delete(&self, key: &str) -> Result<()> {
        SqliteStore::delete(self, key)
    }

    fn reset(&self) -> Result<()> {
        SqliteStore::reset(self)
    }

    fn close(&self) -> Result<()> {
        SqliteStore::close(self)
    }
}
