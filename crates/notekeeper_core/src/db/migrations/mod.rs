//! SQLite migration registry and executor.
//!
//! # Responsibility
//! - Register schema migrations in strictly increasing order.
//! - Apply pending migrations atomically.
//!
//! # Invariants
//! - `version` values must remain monotonic.
//! - Applied migration version is mirrored to `PRAGMA user_version`.
//! - Additive column steps are no-ops when the column is already present;
//!   every other failure aborts the whole run.

use crate::db::{table_has_column, with_transaction, DbError, DbResult};
use log::{error, info};
use rusqlite::Connection;
use std::time::Instant;

#[derive(Debug, Clone, Copy)]
enum Step {
    /// Batch of statements written to be re-runnable (`IF NOT EXISTS`).
    Sql(&'static str),
    /// `ALTER TABLE .. ADD COLUMN`, skipped when `table_info` already lists it.
    AddColumn {
        table: &'static str,
        column: &'static str,
        definition: &'static str,
    },
}

#[derive(Debug, Clone, Copy)]
struct Migration {
    version: u32,
    step: Step,
}

const MIGRATIONS: &[Migration] = &[
    Migration {
        version: 1,
        step: Step::Sql(include_str!("0001_init.sql")),
    },
    Migration {
        version: 2,
        step: Step::AddColumn {
            table: "notes",
            column: "due_date",
            definition: "TEXT",
        },
    },
    Migration {
        version: 3,
        step: Step::Sql(include_str!("0003_indexes.sql")),
    },
];

/// Returns the latest migration version known by this binary.
pub fn latest_version() -> u32 {
    MIGRATIONS.last().map_or(0, |migration| migration.version)
}

/// Reads the applied schema version of a store.
pub fn schema_version(conn: &Connection) -> DbResult<u32> {
    let version = conn.query_row("PRAGMA user_version;", [], |row| row.get::<_, u32>(0))?;
    Ok(version)
}

/// Applies all pending migrations on the provided connection.
///
/// Safe to call any number of times: an up-to-date store is left untouched.
///
/// # Errors
/// - `UnsupportedSchemaVersion` when the store was written by a newer build.
/// - `Migration` when a step fails; nothing from this run is kept.
pub fn apply_migrations(conn: &Connection) -> DbResult<()> {
    let current_version = schema_version(conn)?;
    let latest = latest_version();

    if current_version > latest {
        return Err(DbError::UnsupportedSchemaVersion {
            db_version: current_version,
            latest_supported: latest,
        });
    }

    if current_version == latest {
        return Ok(());
    }

    let started_at = Instant::now();
    let outcome: DbResult<()> = with_transaction(conn, "migrate", |tx| {
        for migration in MIGRATIONS {
            if migration.version <= current_version {
                continue;
            }

            let fail = |source| DbError::Migration {
                version: migration.version,
                source,
            };
            apply_step(tx, migration.step).map_err(fail)?;
            tx.execute_batch(&format!("PRAGMA user_version = {};", migration.version))
                .map_err(fail)?;
        }
        Ok(())
    });

    match &outcome {
        Ok(()) => info!(
            "event=db_migrate module=db status=ok from_version={} to_version={} duration_ms={}",
            current_version,
            latest,
            started_at.elapsed().as_millis()
        ),
        Err(err) => error!(
            "event=db_migrate module=db status=error from_version={} duration_ms={} error={}",
            current_version,
            started_at.elapsed().as_millis(),
            err
        ),
    }

    outcome
}

fn apply_step(conn: &Connection, step: Step) -> rusqlite::Result<()> {
    match step {
        Step::Sql(sql) => conn.execute_batch(sql),
        Step::AddColumn {
            table,
            column,
            definition,
        } => {
            if table_has_column(conn, table, column)? {
                info!(
                    "event=db_migrate module=db status=noop reason=column_exists table={table} column={column}"
                );
                return Ok(());
            }
            conn.execute_batch(&format!(
                "ALTER TABLE {table} ADD COLUMN {column} {definition};"
            ))
        }
    }
}
