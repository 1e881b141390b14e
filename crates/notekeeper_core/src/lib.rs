//! Local data layer for Notekeeper.
//! This crate is the single source of truth for storage invariants: schema
//! migration, note/category/task persistence and report figures.

pub mod config;
pub mod db;
pub mod logging;
pub mod model;
pub mod repo;
pub mod report;

pub use config::{AppConfig, ConfigError, JournalMode, LogConfig, StoreConfig};
pub use db::{
    apply_migrations, latest_version, open_db, open_db_in_memory, open_store, reset_store,
    schema_version, with_read_transaction, with_transaction, DbError, DbResult,
};
pub use logging::{
    default_log_level, init_logging, init_logging_from_config, logging_status, LoggingError,
};
pub use model::category::{Category, CategoryId, DEFAULT_CATEGORY_COLOR};
pub use model::note::{NewNote, Note, NoteFilter, NoteId, NoteUpdate, Priority};
pub use model::task::{Task, TaskId};
pub use model::validation::ValidationError;
pub use repo::category_repo::{CategoryRepository, SqliteCategoryRepository};
pub use repo::note_repo::{NoteRepository, SqliteNoteRepository};
pub use repo::task_repo::{SqliteTaskRepository, TaskRepository};
pub use repo::{Entity, RepoError, RepoResult};
pub use report::{CategoryCount, DateCount, ReportAggregator, ReportSummary};

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
