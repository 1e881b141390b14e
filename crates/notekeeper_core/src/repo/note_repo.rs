//! Note repository contracts and SQLite implementation.
//!
//! # Responsibility
//! - CRUD over notes, including partial updates and completion toggling.
//! - Filtered listing for the open/completed note views.
//! - Create a note together with its initial checklist as one unit of work.
//!
//! # Invariants
//! - Input is validated before any statement reaches the store.
//! - `title` and `note` are stored trimmed.
//! - `create_note` commits the note and all initial tasks, or nothing.
//! - Lists are ordered by `date DESC, id DESC`.
//! - A note's category, when set, names an existing category.
//!
//! # See also
//! - `repo::task_repo` for the checklist rows written by `create_note`.

use crate::db::with_transaction;
use crate::model::note::{NewNote, Note, NoteFilter, NoteId, NoteUpdate, Priority};
use crate::model::task::normalize_task_text;
use crate::model::validation::{validate_due_date, ValidationError};
use crate::repo::category_repo::category_name_exists;
use crate::repo::task_repo::{SqliteTaskRepository, TaskRepository};
use crate::repo::{
    bool_to_int, ensure_schema, int_to_bool, violated_constraint, Constraint, Entity, RepoError,
    RepoResult,
};
use log::{error, info};
use rusqlite::types::Value;
use rusqlite::{params, params_from_iter, Connection, Row};
use std::time::Instant;

const NOTE_SELECT_SQL: &str = "SELECT
    id,
    date,
    title,
    note,
    priority,
    category,
    completed,
    image,
    reminder,
    due_date
FROM notes";

const NOTE_COLUMNS: &[&str] = &[
    "id",
    "date",
    "title",
    "note",
    "priority",
    "category",
    "completed",
    "image",
    "reminder",
    "due_date",
];

/// Repository interface for note operations.
pub trait NoteRepository {
    /// Creates one note and its initial tasks atomically; returns the note id.
    fn create_note(&self, note: &NewNote, initial_tasks: &[String]) -> RepoResult<NoteId>;
    fn get_note(&self, id: NoteId) -> RepoResult<Note>;
    /// Lists notes matching every criterion present in `filter`.
    fn list_notes(&self, filter: &NoteFilter) -> RepoResult<Vec<Note>>;
    /// Applies the fields present in `update`.
    fn update_note(&self, id: NoteId, update: &NoteUpdate) -> RepoResult<()>;
    fn set_note_completed(&self, id: NoteId, completed: bool) -> RepoResult<()>;
    /// Deletes a note; its tasks go with it.
    fn delete_note(&self, id: NoteId) -> RepoResult<()>;
    /// Notes carrying a due date, earliest first.
    fn list_scheduled_notes(&self) -> RepoResult<Vec<Note>>;
    /// Notes due on one `YYYY-MM-DD` day.
    fn list_notes_due_on(&self, day: &str) -> RepoResult<Vec<Note>>;
}

/// SQLite-backed note repository.
pub struct SqliteNoteRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteNoteRepository<'conn> {
    /// Constructs a repository from a migrated/ready connection.
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        ensure_schema(conn, "notes", NOTE_COLUMNS)?;
        ensure_schema(conn, "tasks", &["id", "note_id", "task", "completed"])?;
        ensure_schema(conn, "categories", &["name"])?;
        Ok(Self { conn })
    }

    fn query_notes(&self, sql: &str, bind_values: Vec<Value>) -> RepoResult<Vec<Note>> {
        let mut stmt = self.conn.prepare(sql)?;
        let mut rows = stmt.query(params_from_iter(bind_values))?;
        let mut notes = Vec::new();
        while let Some(row) = rows.next()? {
            notes.push(parse_note_row(row)?);
        }
        Ok(notes)
    }
}

impl NoteRepository for SqliteNoteRepository<'_> {
    fn create_note(&self, note: &NewNote, initial_tasks: &[String]) -> RepoResult<NoteId> {
        note.validate()?;
        let tasks = initial_tasks
            .iter()
            .enumerate()
            .map(|(index, text)| {
                normalize_task_text(text).map_err(|_| ValidationError::EmptyTask { index })
            })
            .collect::<Result<Vec<_>, _>>()?;

        let started_at = Instant::now();
        let outcome: RepoResult<NoteId> = with_transaction(self.conn, "note_create", |tx| {
            if let Some(category) = note.category.as_deref() {
                ensure_category_exists(tx, category)?;
            }

            tx.execute(
                "INSERT INTO notes (
                    title,
                    note,
                    priority,
                    category,
                    image,
                    reminder,
                    due_date
                ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7);",
                params![
                    note.title.trim(),
                    note.body.trim(),
                    note.priority.as_str(),
                    note.category.as_deref(),
                    note.image.as_deref(),
                    note.reminder.as_deref(),
                    note.due_date.as_deref(),
                ],
            )
            .map_err(|err| map_category_link_error(err, note.category.as_deref()))?;
            let note_id = tx.last_insert_rowid();

            let task_repo = SqliteTaskRepository::on(tx);
            for text in &tasks {
                task_repo.create_task(note_id, text)?;
            }
            Ok(note_id)
        });

        match &outcome {
            Ok(note_id) => info!(
                "event=note_create module=repo status=ok note_id={} task_count={} duration_ms={}",
                note_id,
                tasks.len(),
                started_at.elapsed().as_millis()
            ),
            Err(err) => error!(
                "event=note_create module=repo status=error task_count={} duration_ms={} error={}",
                tasks.len(),
                started_at.elapsed().as_millis(),
                err
            ),
        }
        outcome
    }

    fn get_note(&self, id: NoteId) -> RepoResult<Note> {
        let mut stmt = self.conn.prepare(&format!("{NOTE_SELECT_SQL} WHERE id = ?1;"))?;
        let mut rows = stmt.query([id])?;
        if let Some(row) = rows.next()? {
            return parse_note_row(row);
        }

        Err(RepoError::not_found(Entity::Note, id))
    }

    fn list_notes(&self, filter: &NoteFilter) -> RepoResult<Vec<Note>> {
        let mut sql = format!("{NOTE_SELECT_SQL} WHERE completed = ?");
        let mut bind_values = vec![Value::Integer(bool_to_int(filter.completed))];

        if let Some(category) = filter.category.as_ref() {
            sql.push_str(" AND category = ?");
            bind_values.push(Value::Text(category.clone()));
        }

        if let Some(priority) = filter.priority {
            sql.push_str(" AND priority = ?");
            bind_values.push(Value::Text(priority.as_str().to_string()));
        }

        sql.push_str(" ORDER BY date DESC, id DESC;");
        let notes = self.query_notes(&sql, bind_values)?;

        // SQLite's LIKE folds ASCII only, so text matching happens here.
        Ok(match filter.search_needle() {
            Some(needle) => notes
                .into_iter()
                .filter(|note| note.mentions(&needle))
                .collect(),
            None => notes,
        })
    }

    fn update_note(&self, id: NoteId, update: &NoteUpdate) -> RepoResult<()> {
        update.validate()?;

        with_transaction(self.conn, "note_update", |tx| {
            if !note_exists(tx, id)? {
                return Err(RepoError::not_found(Entity::Note, id));
            }
            if update.is_empty() {
                return Ok(());
            }

            if let Some(Some(category)) = update.category.as_ref() {
                ensure_category_exists(tx, category)?;
            }

            let mut assignments: Vec<&'static str> = Vec::new();
            let mut bind_values: Vec<Value> = Vec::new();

            if let Some(title) = update.title.as_ref() {
                assignments.push("title = ?");
                bind_values.push(Value::Text(title.trim().to_string()));
            }
            if let Some(body) = update.body.as_ref() {
                assignments.push("note = ?");
                bind_values.push(Value::Text(body.trim().to_string()));
            }
            if let Some(priority) = update.priority {
                assignments.push("priority = ?");
                bind_values.push(Value::Text(priority.as_str().to_string()));
            }
            for (column, value) in [
                ("category = ?", &update.category),
                ("image = ?", &update.image),
                ("reminder = ?", &update.reminder),
                ("due_date = ?", &update.due_date),
            ] {
                if let Some(value) = value {
                    assignments.push(column);
                    bind_values.push(value.clone().map_or(Value::Null, Value::Text));
                }
            }

            bind_values.push(Value::Integer(id));
            let sql = format!("UPDATE notes SET {} WHERE id = ?;", assignments.join(", "));
            let category = update.category.as_ref().and_then(|value| value.as_deref());
            tx.execute(&sql, params_from_iter(bind_values))
                .map_err(|err| map_category_link_error(err, category))?;

            info!(
                "event=note_update module=repo status=ok note_id={id} field_count={}",
                assignments.len()
            );
            Ok(())
        })
    }

    fn set_note_completed(&self, id: NoteId, completed: bool) -> RepoResult<()> {
        let changed = self.conn.execute(
            "UPDATE notes SET completed = ?1 WHERE id = ?2;",
            params![bool_to_int(completed), id],
        )?;
        if changed == 0 {
            return Err(RepoError::not_found(Entity::Note, id));
        }
        Ok(())
    }

    fn delete_note(&self, id: NoteId) -> RepoResult<()> {
        let changed = self.conn.execute("DELETE FROM notes WHERE id = ?1;", [id])?;
        if changed == 0 {
            return Err(RepoError::not_found(Entity::Note, id));
        }
        info!("event=note_delete module=repo status=ok note_id={id}");
        Ok(())
    }

    fn list_scheduled_notes(&self) -> RepoResult<Vec<Note>> {
        self.query_notes(
            &format!("{NOTE_SELECT_SQL} WHERE due_date IS NOT NULL ORDER BY due_date ASC, id ASC;"),
            Vec::new(),
        )
    }

    fn list_notes_due_on(&self, day: &str) -> RepoResult<Vec<Note>> {
        validate_due_date(day)?;
        self.query_notes(
            &format!("{NOTE_SELECT_SQL} WHERE due_date = ? ORDER BY id ASC;"),
            vec![Value::Text(day.to_string())],
        )
    }
}

fn parse_note_row(row: &Row<'_>) -> RepoResult<Note> {
    let priority_text: String = row.get("priority")?;
    let priority = Priority::parse(&priority_text).ok_or_else(|| {
        RepoError::InvalidData(format!(
            "invalid priority `{priority_text}` in notes.priority"
        ))
    })?;

    Ok(Note {
        id: row.get("id")?,
        date: row.get("date")?,
        title: row.get("title")?,
        body: row.get("note")?,
        priority,
        category: row.get("category")?,
        completed: int_to_bool(row.get("completed")?, "notes.completed")?,
        image: row.get("image")?,
        reminder: row.get("reminder")?,
        due_date: row.get("due_date")?,
    })
}

fn note_exists(conn: &Connection, id: NoteId) -> RepoResult<bool> {
    let exists: i64 = conn.query_row(
        "SELECT EXISTS(SELECT 1 FROM notes WHERE id = ?1);",
        [id],
        |row| row.get(0),
    )?;
    Ok(exists == 1)
}

fn ensure_category_exists(conn: &Connection, name: &str) -> RepoResult<()> {
    if category_name_exists(conn, name)? {
        Ok(())
    } else {
        Err(RepoError::UnknownCategory {
            name: name.to_string(),
        })
    }
}

fn map_category_link_error(err: rusqlite::Error, category: Option<&str>) -> RepoError {
    match (violated_constraint(&err), category) {
        (Some(Constraint::ForeignKey), Some(name)) => RepoError::UnknownCategory {
            name: name.to_string(),
        },
        _ => err.into(),
    }
}
