//! Connection bootstrap and reset utilities for SQLite.
//!
//! # Responsibility
//! - Open file or in-memory SQLite connections from a `StoreConfig`.
//! - Configure connection pragmas required by core behavior.
//! - Trigger schema migrations before returning a usable connection.
//! - Remove a store from disk on explicit developer request.
//!
//! # Invariants
//! - Returned connections have `foreign_keys=ON`.
//! - Returned connections have migrations fully applied.
//! - Opening never deletes or resets existing data.

use super::migrations::apply_migrations;
use super::{DbError, DbResult};
use crate::config::StoreConfig;
use log::{error, info};
use rusqlite::Connection;
use std::ffi::OsString;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

/// Opens the store described by `config` and applies pending migrations.
///
/// # Side effects
/// - Performs connection bootstrap and migration checks.
/// - Emits `db_open` logging events with duration and status.
pub fn open_store(config: &StoreConfig) -> DbResult<Connection> {
    let started_at = Instant::now();
    let mode = if config.path.is_some() { "file" } else { "memory" };
    info!("event=db_open module=db status=start mode={mode}");

    let opened = match config.path.as_deref() {
        Some(path) => Connection::open(path),
        None => Connection::open_in_memory(),
    };
    let conn = match opened {
        Ok(conn) => conn,
        Err(err) => {
            error!(
                "event=db_open module=db status=error mode={mode} duration_ms={} error_code=db_open_failed error={}",
                started_at.elapsed().as_millis(),
                err
            );
            return Err(err.into());
        }
    };

    match bootstrap_connection(&conn, config) {
        Ok(()) => {
            info!(
                "event=db_open module=db status=ok mode={mode} duration_ms={}",
                started_at.elapsed().as_millis()
            );
            Ok(conn)
        }
        Err(err) => {
            error!(
                "event=db_open module=db status=error mode={mode} duration_ms={} error_code=db_bootstrap_failed error={}",
                started_at.elapsed().as_millis(),
                err
            );
            Err(err)
        }
    }
}

/// Opens a SQLite database file with default settings.
pub fn open_db(path: impl AsRef<Path>) -> DbResult<Connection> {
    open_store(&StoreConfig::file(path))
}

/// Opens an in-memory SQLite database with all migrations applied.
pub fn open_db_in_memory() -> DbResult<Connection> {
    open_store(&StoreConfig::in_memory())
}

/// Deletes a store file together with its `-wal`/`-shm` companions.
///
/// Development reset only. Returns whether the main store file existed.
///
/// # Errors
/// - Returns `DbError::Io` when an existing file cannot be removed.
pub fn reset_store(path: impl AsRef<Path>) -> DbResult<bool> {
    let path = path.as_ref();
    let mut removed_main = false;

    for (index, candidate) in store_files(path).into_iter().enumerate() {
        match std::fs::remove_file(&candidate) {
            Ok(()) => removed_main |= index == 0,
            Err(err) if err.kind() == ErrorKind::NotFound => {}
            Err(source) => {
                error!(
                    "event=db_reset module=db status=error error_code=remove_failed error={source}"
                );
                return Err(DbError::Io {
                    path: candidate,
                    source,
                });
            }
        }
    }

    info!("event=db_reset module=db status=ok existed={removed_main}");
    Ok(removed_main)
}

fn bootstrap_connection(conn: &Connection, config: &StoreConfig) -> DbResult<()> {
    conn.execute_batch("PRAGMA foreign_keys = ON;")?;
    conn.busy_timeout(Duration::from_millis(config.busy_timeout_ms))?;
    if config.path.is_some() {
        conn.execute_batch(&format!(
            "PRAGMA journal_mode = {};",
            config.journal_mode.as_pragma()
        ))?;
    }
    apply_migrations(conn)?;
    Ok(())
}

fn store_files(path: &Path) -> [PathBuf; 3] {
    let with_suffix = |suffix: &str| {
        let mut name = OsString::from(path.as_os_str());
        name.push(suffix);
        PathBuf::from(name)
    };
    [path.to_path_buf(), with_suffix("-wal"), with_suffix("-shm")]
}
