use angles_core::db::migrations::latest_version;
use angles_core::db::{open_db, open_db_in_memory, DbError};
use angles_core::{
    CatalogService, KvStorage, ManualClock, SqliteStorage, StorageError, Store, StoreConfig,
};
use rusqlite::Connection;

#[test]
fn open_db_in_memory_applies_all_migrations() {
    let conn = open_db_in_memory().unwrap();

    assert_eq!(schema_version(&conn), latest_version());
    assert_table_exists(&conn, "kv_entries");
}

#[test]
fn opening_same_database_twice_is_idempotent() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("angles.db");

    let conn_first = open_db(&path).unwrap();
    assert_eq!(schema_version(&conn_first), latest_version());
    drop(conn_first);

    let conn_second = open_db(&path).unwrap();
    assert_eq!(schema_version(&conn_second), latest_version());
    assert_table_exists(&conn_second, "kv_entries");
}

#[test]
fn opening_database_with_newer_schema_version_returns_error() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("future.db");

    let conn = Connection::open(&path).unwrap();
    conn.execute_batch("PRAGMA user_version = 999;").unwrap();
    drop(conn);

    match open_db(&path).unwrap_err() {
        DbError::NewerSchema { found, supported } => {
            assert_eq!(found, 999);
            assert_eq!(supported, latest_version());
        }
        other => panic!("unexpected error: {other}"),
    }

    let Err(err) = SqliteStorage::open(&path) else {
        panic!("storage opened a newer database");
    };
    assert!(matches!(
        err,
        StorageError::Db(DbError::NewerSchema { .. })
    ));
}

#[test]
fn kv_entries_round_trip_and_overwrite() {
    let mut storage = SqliteStorage::open_in_memory().unwrap();

    assert_eq!(storage.get("k").unwrap(), None);
    storage.set("k", "one").unwrap();
    storage.set("k", "two").unwrap();
    assert_eq!(storage.get("k").unwrap().as_deref(), Some("two"));

    let rows: i64 = storage
        .connection()
        .query_row("SELECT COUNT(*) FROM kv_entries;", [], |row| row.get(0))
        .unwrap();
    assert_eq!(rows, 1);
}

#[test]
fn store_survives_reopen_on_disk() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("angles.db");

    {
        let storage = SqliteStorage::open(&path).unwrap();
        let mut store =
            Store::open(storage, ManualClock::new(42), StoreConfig::default()).unwrap();
        CatalogService::new(&mut store).add_hold("Volume").unwrap();
        store.close().unwrap();
    }

    let storage = SqliteStorage::open(&path).unwrap();
    let store = Store::open(storage, ManualClock::new(99), StoreConfig::default()).unwrap();
    assert!(store.snapshot().contains_hold("Volume"));
    assert_eq!(store.last_modified(), Some(42));
}

fn schema_version(conn: &Connection) -> u32 {
    conn.query_row("PRAGMA user_version;", [], |row| row.get(0))
        .unwrap()
}

fn assert_table_exists(conn: &Connection, table_name: &str) {
    let exists: i64 = conn
        .query_row(
            "SELECT EXISTS(
                SELECT 1
                FROM sqlite_master
                WHERE type = 'table' AND name = ?1
            );",
            [table_name],
            |row| row.get(0),
        )
        .unwrap();
    assert_eq!(exists, 1, "table {table_name} does not exist");
}
