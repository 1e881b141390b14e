//! Repository layer abstractions and persistence implementations.
//!
//! # Responsibility
//! - Define use-case oriented data access contracts.
//! - Isolate SQLite query details from callers.
//! - Translate store failures into a typed error taxonomy.
//!
//! # Invariants
//! - Write paths validate input before any SQL mutation.
//! - Repository APIs return semantic errors (`NotFound`, `InUse`,
//!   `UniqueConstraintViolation`) distinct from transport errors.
//! - No error is swallowed.

pub mod category_repo;
pub mod note_repo;
pub mod task_repo;

use crate::db::{table_exists, table_has_column, DbError};
use crate::model::note::NoteId;
use crate::model::validation::ValidationError;
use rusqlite::{ffi, Connection, ErrorCode};
use std::fmt::{Display, Formatter};
use thiserror::Error;

pub type RepoResult<T> = Result<T, RepoError>;

/// Record kind named by `RepoError::NotFound`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Entity {
    Note,
    Category,
    Task,
}

impl Display for Entity {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            Self::Note => "note",
            Self::Category => "category",
            Self::Task => "task",
        })
    }
}

#[derive(Debug, Error)]
pub enum RepoError {
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error("category name already exists: `{name}`")]
    UniqueConstraintViolation { name: String },
    #[error("category `{category}` is still used by {} note(s)", .note_ids.len())]
    InUse {
        category: String,
        note_ids: Vec<NoteId>,
    },
    #[error("{entity} not found: {id}")]
    NotFound { entity: Entity, id: i64 },
    #[error("unknown category: `{name}`")]
    UnknownCategory { name: String },
    #[error("invalid persisted data: {0}")]
    InvalidData(String),
    #[error("required table `{0}` is missing")]
    MissingRequiredTable(&'static str),
    #[error("required column `{table}.{column}` is missing")]
    MissingRequiredColumn {
        table: &'static str,
        column: &'static str,
    },
    #[error(transparent)]
    Db(#[from] DbError),
}

impl RepoError {
    pub(crate) fn not_found(entity: Entity, id: i64) -> Self {
        Self::NotFound { entity, id }
    }
}

impl From<rusqlite::Error> for RepoError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}

/// Constraint families the repositories translate into semantic errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Constraint {
    Unique,
    ForeignKey,
}

pub(crate) fn violated_constraint(err: &rusqlite::Error) -> Option<Constraint> {
    match err {
        rusqlite::Error::SqliteFailure(failure, _)
            if failure.code == ErrorCode::ConstraintViolation =>
        {
            match failure.extended_code {
                ffi::SQLITE_CONSTRAINT_UNIQUE | ffi::SQLITE_CONSTRAINT_PRIMARYKEY => {
                    Some(Constraint::Unique)
                }
                ffi::SQLITE_CONSTRAINT_FOREIGNKEY => Some(Constraint::ForeignKey),
                _ => None,
            }
        }
        _ => None,
    }
}

pub(crate) fn bool_to_int(value: bool) -> i64 {
    if value {
        1
    } else {
        0
    }
}

pub(crate) fn int_to_bool(value: i64, column: &str) -> RepoResult<bool> {
    match value {
        0 => Ok(false),
        1 => Ok(true),
        other => Err(RepoError::InvalidData(format!(
            "invalid boolean value `{other}` in {column}"
        ))),
    }
}

/// Verifies that migrations produced the tables/columns a repository needs.
pub(crate) fn ensure_schema(
    conn: &Connection,
    table: &'static str,
    columns: &[&'static str],
) -> RepoResult<()> {
    if !table_exists(conn, table)? {
        return Err(RepoError::MissingRequiredTable(table));
    }
    for &column in columns {
        if !table_has_column(conn, table, column)? {
            return Err(RepoError::MissingRequiredColumn { table, column });
        }
    }
    Ok(())
}
