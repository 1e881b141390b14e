//! SQLite storage bootstrap, schema migration and unit-of-work scoping.
//!
//! # Responsibility
//! - Open and configure SQLite connections for the notes store.
//! - Apply schema migrations in deterministic order.
//! - Run multi-statement writes inside one scoped transaction.
//!
//! # Invariants
//! - Migration version is tracked via `PRAGMA user_version`.
//! - Repositories must not read/write application data before migrations
//!   succeed.
//! - A scoped transaction either commits every statement or none.

use log::{debug, warn};
use rusqlite::{Connection, Transaction, TransactionBehavior};
use std::path::PathBuf;
use thiserror::Error;

pub mod migrations;
mod open;

pub use migrations::{apply_migrations, latest_version, schema_version};
pub use open::{open_db, open_db_in_memory, open_store, reset_store};

pub type DbResult<T> = Result<T, DbError>;

const SAVEPOINT_NAME: &str = "notekeeper_scope";

/// Storage-level failure raised while opening, migrating or resetting a store.
#[derive(Debug, Error)]
pub enum DbError {
    #[error(transparent)]
    Sqlite(#[from] rusqlite::Error),
    #[error("database schema version {db_version} is newer than supported {latest_supported}")]
    UnsupportedSchemaVersion {
        db_version: u32,
        latest_supported: u32,
    },
    #[error("schema migration {version} failed: {source}")]
    Migration {
        version: u32,
        #[source]
        source: rusqlite::Error,
    },
    #[error("failed to remove store file `{}`: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Runs `work` inside an `IMMEDIATE` transaction.
///
/// Commits when `work` returns `Ok`; rolls back when it returns `Err` or
/// unwinds (the transaction guard rolls back on drop).
///
/// When `conn` already has a transaction open (not in autocommit mode), `work`
/// runs inside a savepoint of that transaction instead: `Ok` releases the
/// savepoint and leaves the commit to the caller, `Err` rolls back only what
/// `work` wrote.
///
/// # Side effects
/// - Emits `event=tx` debug records tagged with `scope`.
pub fn with_transaction<T, E, F>(conn: &Connection, scope: &'static str, work: F) -> Result<T, E>
where
    F: FnOnce(&Connection) -> Result<T, E>,
    E: From<rusqlite::Error>,
{
    run_scoped(conn, TransactionBehavior::Immediate, scope, work)
}

/// Runs read-only `work` inside a `DEFERRED` transaction so that every query
/// observes the same snapshot. Nests like [`with_transaction`].
pub fn with_read_transaction<T, E, F>(
    conn: &Connection,
    scope: &'static str,
    work: F,
) -> Result<T, E>
where
    F: FnOnce(&Connection) -> Result<T, E>,
    E: From<rusqlite::Error>,
{
    run_scoped(conn, TransactionBehavior::Deferred, scope, work)
}

fn run_scoped<T, E, F>(
    conn: &Connection,
    behavior: TransactionBehavior,
    scope: &'static str,
    work: F,
) -> Result<T, E>
where
    F: FnOnce(&Connection) -> Result<T, E>,
    E: From<rusqlite::Error>,
{
    if !conn.is_autocommit() {
        return run_in_savepoint(conn, scope, work);
    }

    let tx = Transaction::new_unchecked(conn, behavior)?;
    debug!("event=tx module=db status=start scope={scope}");

    match work(&*tx) {
        Ok(value) => {
            tx.commit()?;
            debug!("event=tx module=db status=ok scope={scope}");
            Ok(value)
        }
        Err(err) => {
            if let Err(rollback_err) = tx.rollback() {
                warn!(
                    "event=tx module=db status=error scope={scope} error_code=rollback_failed error={rollback_err}"
                );
            } else {
                debug!("event=tx module=db status=rollback scope={scope}");
            }
            Err(err)
        }
    }
}

fn run_in_savepoint<T, E, F>(conn: &Connection, scope: &'static str, work: F) -> Result<T, E>
where
    F: FnOnce(&Connection) -> Result<T, E>,
    E: From<rusqlite::Error>,
{
    conn.execute_batch(&format!("SAVEPOINT {SAVEPOINT_NAME};"))?;
    debug!("event=tx module=db status=start scope={scope} nested=true");

    match work(conn) {
        Ok(value) => {
            conn.execute_batch(&format!("RELEASE {SAVEPOINT_NAME};"))?;
            debug!("event=tx module=db status=ok scope={scope} nested=true");
            Ok(value)
        }
        Err(err) => {
            let undo = format!("ROLLBACK TO {SAVEPOINT_NAME}; RELEASE {SAVEPOINT_NAME};");
            if let Err(rollback_err) = conn.execute_batch(&undo) {
                warn!(
                    "event=tx module=db status=error scope={scope} nested=true error_code=rollback_failed error={rollback_err}"
                );
            } else {
                debug!("event=tx module=db status=rollback scope={scope} nested=true");
            }
            Err(err)
        }
    }
}

pub(crate) fn table_exists(conn: &Connection, table: &str) -> rusqlite::Result<bool> {
    let exists: i64 = conn.query_row(
        "SELECT EXISTS(
            SELECT 1
            FROM sqlite_master
            WHERE type = 'table' AND name = ?1
        );",
        [table],
        |row| row.get(0),
    )?;
    Ok(exists == 1)
}

pub(crate) fn table_has_column(
    conn: &Connection,
    table: &str,
    column: &str,
) -> rusqlite::Result<bool> {
    let mut stmt = conn.prepare(&format!("PRAGMA table_info({table});"))?;
    let mut rows = stmt.query([])?;
    while let Some(row) = rows.next()? {
        let current: String = row.get(1)?;
        if current == column {
            return Ok(true);
        }
    }
    Ok(false)
}
