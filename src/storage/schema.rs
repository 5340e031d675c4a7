//! Schema Module
//!
//! Table naming, schema migration and the SQL statements a store issues
//! against its table. Column names are `k` (key), `v` (value) and `e`
//! (expiration, Unix seconds).

use std::fmt;

use rusqlite::Connection;
use tracing::debug;

use crate::error::{Result, StoreError};

/// Maximum accepted table name length in bytes.
pub const MAX_TABLE_NAME_LENGTH: usize = 64;

// == Table Name ==
/// A validated SQL table identifier, bound to one store instance.
///
/// Only `[A-Za-z_][A-Za-z0-9_]*` is accepted because the name is spliced into
/// statement text. SQLite resolves table names case-insensitively, so the name
/// is folded to lowercase: `Sessions` and `sessions` are the same namespace.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TableName(String);

impl TableName {
    /// Validates `name` as a table identifier.
    pub fn new(name: impl Into<String>) -> Result<Self> {
        let name = name.into();
        if name.is_empty() || name.len() > MAX_TABLE_NAME_LENGTH {
            return Err(StoreError::InvalidConfig(format!(
                "table name must be 1 to {} bytes, got {}",
                MAX_TABLE_NAME_LENGTH,
                name.len()
            )));
        }

        let mut chars = name.chars();
        let head_ok = chars
            .next()
            .is_some_and(|c| c.is_ascii_alphabetic() || c == '_');
        let tail_ok = chars.all(|c| c.is_ascii_alphanumeric() || c == '_');
        if !head_ok || !tail_ok {
            return Err(StoreError::InvalidConfig(format!(
                "table name {name:?} is not a plain SQL identifier"
            )));
        }

        Ok(Self(name.to_ascii_lowercase()))
    }

    /// Returns the bare name.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Returns the name double-quoted for use in SQL text.
    pub fn quoted(&self) -> String {
        format!("\"{}\"", self.0)
    }
}

impl fmt::Display for TableName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

// == Statements ==
/// Statement text for one table, rendered once when the store opens.
#[derive(Debug, Clone)]
pub(crate) struct Statements {
    pub(crate) select: String,
    pub(crate) upsert: String,
    pub(crate) delete_key: String,
    pub(crate) delete_all: String,
    pub(crate) delete_expired: String,
    pub(crate) count: String,
}

impl Statements {
    pub(crate) fn for_table(table: &TableName) -> Self {
        let t = table.quoted();
        Self {
            select: format!("SELECT k, v, e FROM {t} WHERE k = ?1"),
            upsert: format!(
                "INSERT INTO {t} (k, v, e) VALUES (?1, ?2, ?3) \
                 ON CONFLICT(k) DO UPDATE SET v = excluded.v, e = excluded.e"
            ),
            delete_key: format!("DELETE FROM {t} WHERE k = ?1"),
            delete_all: format!("DELETE FROM {t}"),
            delete_expired: format!("DELETE FROM {t} WHERE e <= ?1 AND e != 0"),
            count: format!("SELECT COUNT(*) FROM {t}"),
        }
    }
}

// == Migration ==
/// Returns the quoted name of the expiration index on `table`.
///
/// Tables and indexes share one name space in SQLite; the `:` keeps this name
/// outside the set `TableName` accepts.
pub fn expiry_index_name(table: &TableName) -> String {
    format!("\"{}:e\"", table.as_str())
}

/// Creates the table and its expiration index if absent.
pub fn migrate(conn: &Connection, table: &TableName) -> Result<()> {
    let t = table.quoted();
    let index = expiry_index_name(table);
    conn.execute_batch(&format!(
        "CREATE TABLE IF NOT EXISTS {t} (
            k TEXT PRIMARY KEY,
            v BLOB,
            e INTEGER NOT NULL DEFAULT 0
        );
        CREATE INDEX IF NOT EXISTS {index} ON {t} (e);"
    ))?;
    debug!(table = %table, "Table schema ensured");
    Ok(())
}

/// Drops the table along with every entry in it.
pub fn drop_table(conn: &Connection, table: &TableName) -> Result<()> {
    conn.execute_batch(&format!("DROP TABLE IF EXISTS {}", table.quoted()))?;
    debug!(table = %table, "Table dropped");
    Ok(())
}
