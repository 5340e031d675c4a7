//! Integration Tests for the TTL store
//!
//! Exercises full store lifecycles against on-disk SQLite databases.

use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

use tempfile::TempDir;
use ttl_store::{file_pool, Config, SqlitePool, SqliteStore, Storage, StoreError};

// == Helper Functions ==

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "ttl_store=debug".into()),
        )
        .with_test_writer()
        .try_init();
}

/// Database file kept alive for the duration of a test.
struct TestDb {
    pool: SqlitePool,
    #[allow(dead_code)]
    dir: TempDir,
}

impl TestDb {
    fn new() -> Self {
        init_tracing();
        let dir = TempDir::new().unwrap();
        let pool = file_pool(dir.path().join("store.db")).unwrap();
        Self { pool, dir }
    }

    fn config(&self) -> Config {
        Config::new(self.pool.clone())
    }

    fn raw_count(&self, table: &str) -> i64 {
        self.pool
            .get()
            .unwrap()
            .query_row(&format!("SELECT COUNT(*) FROM {table}"), [], |row| {
                row.get(0)
            })
            .unwrap()
    }

    fn insert_raw(&self, table: &str, key: &str, expires_at: i64) {
        self.pool
            .get()
            .unwrap()
            .execute(
                &format!("INSERT INTO {table} (k, v, e) VALUES (?1, x'2A', ?2)"),
                rusqlite::params![key, expires_at],
            )
            .unwrap();
    }
}

fn unix_now() -> i64 {
    chrono::Utc::now().timestamp()
}

// == Basic Operations ==

#[tokio::test]
async fn test_roundtrip_without_ttl() {
    let db = TestDb::new();
    let store = SqliteStore::new(db.config()).unwrap();

    store.set("session:1", b"payload", Duration::ZERO).unwrap();

    assert_eq!(
        store.get("session:1").unwrap().as_deref(),
        Some(&b"payload"[..])
    );
    store.close().unwrap();
}

#[tokio::test]
async fn test_entry_expires_after_ttl() {
    let db = TestDb::new();
    let store = SqliteStore::new(db.config()).unwrap();

    store.set("short", b"value", Duration::from_secs(1)).unwrap();
    store.set("forever", b"value", Duration::ZERO).unwrap();
    assert!(store.get("short").unwrap().is_some());

    // Expiration is stored in whole seconds
    tokio::time::sleep(Duration::from_millis(2100)).await;

    assert_eq!(store.get("short").unwrap(), None);
    assert!(store.get("forever").unwrap().is_some());
    // Lazy expiration leaves the row for the reaper
    assert_eq!(db.raw_count("fiber_storage"), 2);
    store.close().unwrap();
}

#[tokio::test]
async fn test_delete_nonexistent_is_ok() {
    let db = TestDb::new();
    let store = SqliteStore::new(db.config()).unwrap();

    assert!(store.delete("missing").is_ok());
    store.close().unwrap();
}

#[tokio::test]
async fn test_reset_clears_everything() {
    let db = TestDb::new();
    let store = SqliteStore::new(db.config()).unwrap();

    store.set("a", b"1", Duration::ZERO).unwrap();
    store.set("b", b"2", Duration::from_secs(300)).unwrap();
    db.insert_raw("fiber_storage", "c", unix_now() - 60);

    store.reset().unwrap();

    for key in ["a", "b", "c"] {
        assert_eq!(store.get(key).unwrap(), None);
    }
    assert_eq!(db.raw_count("fiber_storage"), 0);
    store.close().unwrap();
}

// == Reaper ==

#[tokio::test]
async fn test_reaper_sweeps_only_expired_rows() {
    let db = TestDb::new();
    let store =
        SqliteStore::new(db.config().gc_interval(Duration::from_millis(200))).unwrap();
    let now = unix_now();

    for i in 0..10 {
        db.insert_raw("fiber_storage", &format!("dead{i}"), now - 1 - i);
    }
    for i in 0..5 {
        db.insert_raw("fiber_storage", &format!("live{i}"), now + 3600);
    }
    store.set("forever", b"v", Duration::ZERO).unwrap();

    tokio::time::sleep(Duration::from_millis(700)).await;

    assert_eq!(db.raw_count("fiber_storage"), 6);
    for i in 0..5 {
        assert!(store.get(&format!("live{i}")).unwrap().is_some());
    }
    assert!(store.get("forever").unwrap().is_some());
    store.close().unwrap();
}

#[tokio::test]
async fn test_close_is_idempotent_and_stops_reaper() {
    let db = TestDb::new();
    let store =
        SqliteStore::new(db.config().gc_interval(Duration::from_millis(100))).unwrap();

    store.close().unwrap();
    store.close().unwrap();
    tokio::time::sleep(Duration::from_millis(150)).await;
    assert!(store.is_reaper_finished());

    db.insert_raw("fiber_storage", "dead", unix_now() - 10);
    tokio::time::sleep(Duration::from_millis(300)).await;
    assert_eq!(db.raw_count("fiber_storage"), 1);

    // The caller's pool remains usable after close
    assert!(db.pool.get().is_ok());
}

// == Configuration ==

#[tokio::test]
async fn test_reset_flag_drops_existing_entries() {
    let db = TestDb::new();
    {
        let store = SqliteStore::new(db.config().table_name("sessions")).unwrap();
        store.set("kept", b"v", Duration::ZERO).unwrap();
        store.close().unwrap();
    }

    let reopened = SqliteStore::new(db.config().table_name("sessions")).unwrap();
    assert!(reopened.get("kept").unwrap().is_some());
    reopened.close().unwrap();

    let reset = SqliteStore::new(db.config().table_name("sessions").reset(true)).unwrap();
    assert_eq!(reset.get("kept").unwrap(), None);
    assert!(reset.is_empty().unwrap());
    reset.close().unwrap();
}

#[tokio::test]
async fn test_stores_on_different_tables_are_isolated() {
    let db = TestDb::new();
    let users = SqliteStore::new(db.config().table_name("users")).unwrap();
    let carts = SqliteStore::new(db.config().table_name("carts")).unwrap();

    users.set("id", b"alice", Duration::ZERO).unwrap();
    carts.set("id", b"cart-7", Duration::ZERO).unwrap();

    assert_eq!(users.get("id").unwrap().as_deref(), Some(&b"alice"[..]));
    assert_eq!(carts.get("id").unwrap().as_deref(), Some(&b"cart-7"[..]));

    users.reset().unwrap();
    assert_eq!(users.get("id").unwrap(), None);
    assert!(carts.get("id").unwrap().is_some());

    users.close().unwrap();
    carts.close().unwrap();
}

#[tokio::test]
async fn test_invalid_table_name_is_rejected() {
    let db = TestDb::new();
    let result = SqliteStore::new(db.config().table_name("users; DROP TABLE x"));
    assert!(matches!(result, Err(StoreError::InvalidConfig(_))));
}

#[tokio::test]
async fn test_zero_gc_interval_falls_back_to_default() {
    let db = TestDb::new();
    let store = SqliteStore::new(db.config().gc_interval(Duration::ZERO)).unwrap();
    assert_eq!(store.gc_interval(), ttl_store::config::DEFAULT_GC_INTERVAL);
    store.close().unwrap();
}

// == Concurrency ==

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_operations_with_sweeps() {
    let db = TestDb::new();
    let store: Arc<dyn Storage> = Arc::new(
        SqliteStore::new(db.config().gc_interval(Duration::from_millis(20))).unwrap(),
    );

    // Expired rows give the reaper something to do while workers run
    let now = unix_now();
    for i in 0..50 {
        db.insert_raw("fiber_storage", &format!("stale{i}"), now - 1);
    }

    let mut workers = Vec::new();
    for worker in 0..8 {
        let store = Arc::clone(&store);
        workers.push(tokio::task::spawn_blocking(move || {
            let mut written = HashSet::new();
            for i in 0..50 {
                let key = format!("w{worker}:k{i}");
                let value = format!("value-{worker}-{i}");
                store.set(&key, value.as_bytes(), Duration::ZERO).unwrap();
                written.insert(key.clone());

                assert_eq!(store.get(&key).unwrap().as_deref(), Some(value.as_bytes()));
                assert_eq!(store.get(&format!("w{worker}:never{i}")).unwrap(), None);

                if i % 3 == 0 {
                    store.delete(&key).unwrap();
                    written.remove(&key);
                    assert_eq!(store.get(&key).unwrap(), None);
                }
            }
            written
        }));
    }

    let mut expected = 0;
    for worker in workers {
        expected += worker.await.unwrap().len() as i64;
    }

    tokio::time::sleep(Duration::from_millis(100)).await;
    assert_eq!(db.raw_count("fiber_storage"), expected);
    store.close().unwrap();
}
