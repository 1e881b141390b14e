//! Category repository contracts and SQLite implementation.
//!
//! # Responsibility
//! - CRUD over user-defined categories.
//! - Block deletion of categories still referenced by notes.
//!
//! # Invariants
//! - Category names are unique; a duplicate insert or rename fails with
//!   `UniqueConstraintViolation` and changes nothing.
//! - Renames propagate to notes through the store's `ON UPDATE CASCADE`
//!   link on `notes.category`.
//! - The usage check and the delete run in one transaction.

use crate::db::with_transaction;
use crate::model::category::{
    normalize_category_color, normalize_category_name, Category, CategoryId,
    DEFAULT_CATEGORY_COLOR,
};
use crate::model::note::NoteId;
use crate::repo::{ensure_schema, violated_constraint, Constraint, Entity, RepoError, RepoResult};
use log::{info, warn};
use rusqlite::{params, Connection, OptionalExtension};

/// Repository interface for category operations.
pub trait CategoryRepository {
    /// Lists every category ordered by name.
    fn list_categories(&self) -> RepoResult<Vec<Category>>;
    fn get_category(&self, id: CategoryId) -> RepoResult<Category>;
    /// Creates a category with the default accent color.
    fn create_category(&self, name: &str) -> RepoResult<CategoryId>;
    fn create_category_with_color(&self, name: &str, color: &str) -> RepoResult<CategoryId>;
    /// Renames a category.
    fn update_category(&self, id: CategoryId, name: &str) -> RepoResult<()>;
    fn set_category_color(&self, id: CategoryId, color: &str) -> RepoResult<()>;
    /// Deletes a category unless a note still references it.
    fn delete_category(&self, id: CategoryId) -> RepoResult<()>;
}

/// SQLite-backed category repository.
pub struct SqliteCategoryRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteCategoryRepository<'conn> {
    /// Constructs a repository from a migrated/ready connection.
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        ensure_schema(conn, "categories", &["id", "name", "color"])?;
        Ok(Self { conn })
    }
}

impl CategoryRepository for SqliteCategoryRepository<'_> {
    fn list_categories(&self) -> RepoResult<Vec<Category>> {
        let mut stmt = self
            .conn
            .prepare("SELECT id, name, color FROM categories ORDER BY name ASC, id ASC;")?;
        let mut rows = stmt.query([])?;
        let mut categories = Vec::new();
        while let Some(row) = rows.next()? {
            categories.push(Category {
                id: row.get("id")?,
                name: row.get("name")?,
                color: row.get("color")?,
            });
        }
        Ok(categories)
    }

    fn get_category(&self, id: CategoryId) -> RepoResult<Category> {
        self.conn
            .query_row(
                "SELECT id, name, color FROM categories WHERE id = ?1;",
                [id],
                |row| {
                    Ok(Category {
                        id: row.get("id")?,
                        name: row.get("name")?,
                        color: row.get("color")?,
                    })
                },
            )
            .optional()?
            .ok_or_else(|| RepoError::not_found(Entity::Category, id))
    }

    fn create_category(&self, name: &str) -> RepoResult<CategoryId> {
        self.create_category_with_color(name, DEFAULT_CATEGORY_COLOR)
    }

    fn create_category_with_color(&self, name: &str, color: &str) -> RepoResult<CategoryId> {
        let name = normalize_category_name(name)?;
        let color = normalize_category_color(color)?;

        self.conn
            .execute(
                "INSERT INTO categories (name, color) VALUES (?1, ?2);",
                params![name, color],
            )
            .map_err(|err| map_name_conflict(err, &name))?;

        let id = self.conn.last_insert_rowid();
        info!("event=category_create module=repo status=ok category_id={id}");
        Ok(id)
    }

    fn update_category(&self, id: CategoryId, name: &str) -> RepoResult<()> {
        let name = normalize_category_name(name)?;

        let changed = self
            .conn
            .execute(
                "UPDATE categories SET name = ?1 WHERE id = ?2;",
                params![name, id],
            )
            .map_err(|err| map_name_conflict(err, &name))?;

        if changed == 0 {
            return Err(RepoError::not_found(Entity::Category, id));
        }
        info!("event=category_rename module=repo status=ok category_id={id}");
        Ok(())
    }

    fn set_category_color(&self, id: CategoryId, color: &str) -> RepoResult<()> {
        let color = normalize_category_color(color)?;
        let changed = self.conn.execute(
            "UPDATE categories SET color = ?1 WHERE id = ?2;",
            params![color, id],
        )?;

        if changed == 0 {
            return Err(RepoError::not_found(Entity::Category, id));
        }
        Ok(())
    }

    fn delete_category(&self, id: CategoryId) -> RepoResult<()> {
        with_transaction(self.conn, "category_delete", |tx| -> RepoResult<()> {
            let name: String = tx
                .query_row("SELECT name FROM categories WHERE id = ?1;", [id], |row| {
                    row.get(0)
                })
                .optional()?
                .ok_or_else(|| RepoError::not_found(Entity::Category, id))?;

            let note_ids = referencing_note_ids(tx, &name)?;
            if !note_ids.is_empty() {
                warn!(
                    "event=category_delete module=repo status=rejected reason=in_use category_id={id} note_count={}",
                    note_ids.len()
                );
                return Err(RepoError::InUse {
                    category: name,
                    note_ids,
                });
            }

            tx.execute("DELETE FROM categories WHERE id = ?1;", [id])?;
            Ok(())
        })?;

        info!("event=category_delete module=repo status=ok category_id={id}");
        Ok(())
    }
}

/// Returns whether a category with exactly this name exists.
pub(crate) fn category_name_exists(conn: &Connection, name: &str) -> RepoResult<bool> {
    let exists: i64 = conn.query_row(
        "SELECT EXISTS(SELECT 1 FROM categories WHERE name = ?1);",
        [name],
        |row| row.get(0),
    )?;
    Ok(exists == 1)
}

fn referencing_note_ids(conn: &Connection, name: &str) -> RepoResult<Vec<NoteId>> {
    let mut stmt = conn.prepare("SELECT id FROM notes WHERE category = ?1 ORDER BY id ASC;")?;
    let mut rows = stmt.query([name])?;
    let mut ids = Vec::new();
    while let Some(row) = rows.next()? {
        ids.push(row.get(0)?);
    }
    Ok(ids)
}

fn map_name_conflict(err: rusqlite::Error, name: &str) -> RepoError {
    match violated_constraint(&err) {
        Some(Constraint::Unique) => RepoError::UniqueConstraintViolation {
            name: name.to_string(),
        },
        _ => err.into(),
    }
}
