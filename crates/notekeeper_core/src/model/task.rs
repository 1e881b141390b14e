//! Checklist task owned by exactly one note.

use crate::model::note::NoteId;
use crate::model::validation::{require_text, ValidationError};
use serde::{Deserialize, Serialize};

pub type TaskId = i64;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Task {
    pub id: TaskId,
    pub note_id: NoteId,
    /// Serialized as `task` to match the persisted column name.
    #[serde(rename = "task")]
    pub text: String,
    pub completed: bool,
}

/// Trims task text and rejects blank input.
pub fn normalize_task_text(text: &str) -> Result<String, ValidationError> {
    require_text("task", text)?;
    Ok(text.trim().to_string())
}
