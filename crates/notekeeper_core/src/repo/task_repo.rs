//! Task repository contracts and SQLite implementation.
//!
//! # Responsibility
//! - CRUD over checklist tasks attached to a note.
//!
//! # Invariants
//! - Every task references an existing note (`tasks.note_id` foreign key).
//! - Tasks disappear with their note through the store's `ON DELETE CASCADE`;
//!   this repository never deletes tasks on a note's behalf.
//! - Each method is a single statement, so it can run on a caller's
//!   transaction.

use crate::model::note::NoteId;
use crate::model::task::{normalize_task_text, Task, TaskId};
use crate::repo::{
    bool_to_int, ensure_schema, int_to_bool, violated_constraint, Constraint, Entity, RepoError,
    RepoResult,
};
use rusqlite::{params, Connection, Row};

const TASK_SELECT_SQL: &str = "SELECT id, note_id, task, completed FROM tasks";

/// Repository interface for task operations.
pub trait TaskRepository {
    /// Lists a note's tasks in insertion order. Unknown notes yield nothing.
    fn list_tasks_by_note(&self, note_id: NoteId) -> RepoResult<Vec<Task>>;
    fn get_task(&self, id: TaskId) -> RepoResult<Task>;
    /// Adds a task to an existing note; `text` is stored trimmed.
    fn create_task(&self, note_id: NoteId, text: &str) -> RepoResult<TaskId>;
    fn delete_task(&self, id: TaskId) -> RepoResult<()>;
    fn set_task_completed(&self, id: TaskId, completed: bool) -> RepoResult<()>;
}

/// SQLite-backed task repository.
pub struct SqliteTaskRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteTaskRepository<'conn> {
    /// Constructs a repository from a migrated/ready connection.
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        ensure_schema(conn, "tasks", &["id", "note_id", "task", "completed"])?;
        Ok(Self { conn })
    }

    /// Binds to a connection or open transaction already known to be ready.
    pub(crate) fn on(conn: &'conn Connection) -> Self {
        Self { conn }
    }
}

impl TaskRepository for SqliteTaskRepository<'_> {
    fn list_tasks_by_note(&self, note_id: NoteId) -> RepoResult<Vec<Task>> {
        let mut stmt = self
            .conn
            .prepare(&format!("{TASK_SELECT_SQL} WHERE note_id = ?1 ORDER BY id ASC;"))?;
        let mut rows = stmt.query([note_id])?;
        let mut tasks = Vec::new();
        while let Some(row) = rows.next()? {
            tasks.push(parse_task_row(row)?);
        }
        Ok(tasks)
    }

    fn get_task(&self, id: TaskId) -> RepoResult<Task> {
        let mut stmt = self
            .conn
            .prepare(&format!("{TASK_SELECT_SQL} WHERE id = ?1;"))?;
        let mut rows = stmt.query([id])?;
        if let Some(row) = rows.next()? {
            return parse_task_row(row);
        }

        Err(RepoError::not_found(Entity::Task, id))
    }

    fn create_task(&self, note_id: NoteId, text: &str) -> RepoResult<TaskId> {
        let text = normalize_task_text(text)?;

        self.conn
            .execute(
                "INSERT INTO tasks (note_id, task) VALUES (?1, ?2);",
                params![note_id, text],
            )
            .map_err(|err| match violated_constraint(&err) {
                Some(Constraint::ForeignKey) => RepoError::not_found(Entity::Note, note_id),
                _ => err.into(),
            })?;

        Ok(self.conn.last_insert_rowid())
    }

    fn delete_task(&self, id: TaskId) -> RepoResult<()> {
        let changed = self.conn.execute("DELETE FROM tasks WHERE id = ?1;", [id])?;
        if changed == 0 {
            return Err(RepoError::not_found(Entity::Task, id));
        }
        Ok(())
    }

    fn set_task_completed(&self, id: TaskId, completed: bool) -> RepoResult<()> {
        let changed = self.conn.execute(
            "UPDATE tasks SET completed = ?1 WHERE id = ?2;",
            params![bool_to_int(completed), id],
        )?;
        if changed == 0 {
            return Err(RepoError::not_found(Entity::Task, id));
        }
        Ok(())
    }
}

fn parse_task_row(row: &Row<'_>) -> RepoResult<Task> {
    Ok(Task {
        id: row.get("id")?,
        note_id: row.get("note_id")?,
        text: row.get("task")?,
        completed: int_to_bool(row.get("completed")?, "tasks.completed")?,
    })
}
