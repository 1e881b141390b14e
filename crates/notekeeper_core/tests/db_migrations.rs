use notekeeper_core::db::{apply_migrations, latest_version, open_db, open_db_in_memory};
use notekeeper_core::{
    open_store, reset_store, DbError, JournalMode, NewNote, NoteRepository, SqliteNoteRepository,
    StoreConfig,
};
use rusqlite::Connection;

#[test]
fn open_db_in_memory_applies_all_migrations() {
    let conn = open_db_in_memory().unwrap();

    assert_eq!(schema_version(&conn), latest_version());
    assert_table_exists(&conn, "notes");
    assert_table_exists(&conn, "categories");
    assert_table_exists(&conn, "tasks");
    assert!(columns(&conn, "notes").contains(&"due_date".to_string()));
    assert!(!columns(&conn, "tasks").contains(&"done".to_string()));
}

#[test]
fn foreign_keys_are_enforced_on_returned_connections() {
    let conn = open_db_in_memory().unwrap();
    let enabled: i64 = conn
        .query_row("PRAGMA foreign_keys;", [], |row| row.get(0))
        .unwrap();
    assert_eq!(enabled, 1);
}

#[test]
fn opening_same_database_twice_is_idempotent() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("notekeeper.db");

    let conn_first = open_db(&path).unwrap();
    let schema_first = schema_dump(&conn_first);
    drop(conn_first);

    let conn_second = open_db(&path).unwrap();
    assert_eq!(schema_version(&conn_second), latest_version());
    assert_eq!(schema_dump(&conn_second), schema_first);
}

#[test]
fn applying_migrations_again_is_a_no_op() {
    let conn = open_db_in_memory().unwrap();
    let before = schema_dump(&conn);

    apply_migrations(&conn).unwrap();
    apply_migrations(&conn).unwrap();

    assert_eq!(schema_dump(&conn), before);
    assert_eq!(schema_version(&conn), latest_version());
}

#[test]
fn reopening_keeps_existing_data() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("notekeeper.db");

    {
        let conn = open_db(&path).unwrap();
        let repo = SqliteNoteRepository::try_new(&conn).unwrap();
        repo.create_note(&NewNote::new("kept", "across opens"), &[])
            .unwrap();
    }

    let conn = open_db(&path).unwrap();
    let count: i64 = conn
        .query_row("SELECT COUNT(*) FROM notes;", [], |row| row.get(0))
        .unwrap();
    assert_eq!(count, 1);
}

#[test]
fn unversioned_store_with_due_date_column_upgrades_cleanly() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("legacy.db");

    let conn = Connection::open(&path).unwrap();
    conn.execute_batch(
        "CREATE TABLE notes (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            date TEXT NOT NULL,
            title TEXT NOT NULL,
            note TEXT NOT NULL,
            priority TEXT NOT NULL DEFAULT 'Medium',
            category TEXT,
            completed INTEGER NOT NULL DEFAULT 0,
            image TEXT,
            reminder TEXT,
            due_date TEXT
        );
        INSERT INTO notes (date, title, note, due_date)
        VALUES ('2024-01-02 09:00:00', 'old', 'body', '2024-01-05');",
    )
    .unwrap();
    drop(conn);

    let conn = open_db(&path).unwrap();
    assert_eq!(schema_version(&conn), latest_version());
    let due_date_columns = columns(&conn, "notes")
        .into_iter()
        .filter(|column| column == "due_date")
        .count();
    assert_eq!(due_date_columns, 1);

    let repo = SqliteNoteRepository::try_new(&conn).unwrap();
    let scheduled = repo.list_scheduled_notes().unwrap();
    assert_eq!(scheduled.len(), 1);
    assert_eq!(scheduled[0].due_date.as_deref(), Some("2024-01-05"));
}

#[test]
fn failing_migration_is_surfaced_and_rolled_back() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("broken.db");

    let conn = Connection::open(&path).unwrap();
    conn.execute_batch("CREATE TABLE notes (id INTEGER PRIMARY KEY);")
        .unwrap();
    drop(conn);

    let err = open_db(&path).unwrap_err();
    assert!(
        matches!(err, DbError::Migration { version: 3, .. }),
        "unexpected error: {err}"
    );

    let conn = Connection::open(&path).unwrap();
    assert_eq!(schema_version(&conn), 0);
    assert!(!columns(&conn, "notes").contains(&"due_date".to_string()));
    assert_table_missing(&conn, "categories");
}

#[test]
fn store_written_by_newer_build_is_refused_untouched() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("ahead.db");
    let ahead = latest_version() + 7;
    Connection::open(&path)
        .unwrap()
        .pragma_update(None, "user_version", ahead)
        .unwrap();

    match open_db(&path) {
        Err(DbError::UnsupportedSchemaVersion {
            db_version,
            latest_supported,
        }) => assert_eq!((db_version, latest_supported), (ahead, latest_version())),
        Err(other) => panic!("unexpected error: {other}"),
        Ok(_) => panic!("newer store must not open"),
    }

    let conn = Connection::open(&path).unwrap();
    assert_eq!(schema_version(&conn), ahead);
    assert_table_missing(&conn, "notes");
}

#[test]
fn file_store_uses_configured_journal_mode() {
    let dir = tempfile::tempdir().unwrap();

    let wal = open_db(dir.path().join("wal.db")).unwrap();
    assert_eq!(journal_mode(&wal), "wal");

    let config = StoreConfig {
        journal_mode: JournalMode::Delete,
        ..StoreConfig::file(dir.path().join("delete.db"))
    };
    let delete = open_store(&config).unwrap();
    assert_eq!(journal_mode(&delete), "delete");
}

#[test]
fn reset_store_removes_file_and_companions() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("reset.db");
    let conn = open_db(&path).unwrap();
    drop(conn);
    std::fs::write(dir.path().join("reset.db-wal"), b"").unwrap();

    assert!(reset_store(&path).unwrap());
    assert!(!path.exists());
    assert!(!dir.path().join("reset.db-wal").exists());
    assert!(!dir.path().join("reset.db-shm").exists());

    assert!(!reset_store(&path).unwrap());
}

#[test]
fn reset_store_then_open_starts_empty() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("fresh.db");
    {
        let conn = open_db(&path).unwrap();
        let repo = SqliteNoteRepository::try_new(&conn).unwrap();
        repo.create_note(&NewNote::new("gone", "soon"), &[]).unwrap();
    }

    reset_store(&path).unwrap();

    let conn = open_db(&path).unwrap();
    let count: i64 = conn
        .query_row("SELECT COUNT(*) FROM notes;", [], |row| row.get(0))
        .unwrap();
    assert_eq!(count, 0);
}

fn schema_version(conn: &Connection) -> u32 {
    conn.query_row("PRAGMA user_version;", [], |row| row.get(0))
        .unwrap()
}

fn journal_mode(conn: &Connection) -> String {
    conn.query_row("PRAGMA journal_mode;", [], |row| row.get(0))
        .unwrap()
}

fn schema_dump(conn: &Connection) -> Vec<(String, String)> {
    let mut stmt = conn
        .prepare(
            "SELECT name, COALESCE(sql, '')
             FROM sqlite_master
             WHERE name NOT LIKE 'sqlite_%'
             ORDER BY name;",
        )
        .unwrap();
    let rows = stmt
        .query_map([], |row| Ok((row.get(0)?, row.get(1)?)))
        .unwrap();
    let dump = rows.map(|row| row.unwrap()).collect();
    dump
}

fn columns(conn: &Connection, table: &str) -> Vec<String> {
    let mut stmt = conn.prepare(&format!("PRAGMA table_info({table});")).unwrap();
    let mut rows = stmt.query([]).unwrap();
    let mut columns = Vec::new();
    while let Some(row) = rows.next().unwrap() {
        columns.push(row.get(1).unwrap());
    }
    columns
}

fn table_count(conn: &Connection, table_name: &str) -> i64 {
    conn.query_row(
        "SELECT COUNT(*) FROM sqlite_master WHERE type = 'table' AND name = ?1;",
        [table_name],
        |row| row.get(0),
    )
    .unwrap()
}

fn assert_table_exists(conn: &Connection, table_name: &str) {
    assert_eq!(table_count(conn, table_name), 1, "table {table_name} does not exist");
}

fn assert_table_missing(conn: &Connection, table_name: &str) {
    assert_eq!(table_count(conn, table_name), 0, "table {table_name} should not exist");
}
