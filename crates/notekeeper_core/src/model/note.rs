//! Note domain model, write payloads and list filter.
//!
//! # Responsibility
//! - Define the persisted note record and its priority scale.
//! - Define create/partial-update payloads and their validation.
//! - Define the list filter and its text-matching rule.
//!
//! # Invariants
//! - `title` and `body` are never blank once validated.
//! - `due_date`, when set, is a `YYYY-MM-DD` calendar day.
//! - `image` and `reminder` are opaque strings owned by external
//!   collaborators (attachment storage, notification scheduler).

use crate::model::validation::{require_text, validate_due_date, ValidationError};
use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};

pub type NoteId = i64;

/// Note urgency. Persisted as `Low`, `Medium` or `High`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Priority {
    Low,
    #[default]
    Medium,
    High,
}

impl Priority {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Low => "Low",
            Self::Medium => "Medium",
            Self::High => "High",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "Low" => Some(Self::Low),
            "Medium" => Some(Self::Medium),
            "High" => Some(Self::High),
            _ => None,
        }
    }
}

impl Display for Priority {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Persisted note as read back from the store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Note {
    pub id: NoteId,
    /// Store-generated creation timestamp, `YYYY-MM-DD HH:MM:SS` UTC.
    pub date: String,
    pub title: String,
    /// Serialized as `note` to match the persisted column name.
    #[serde(rename = "note")]
    pub body: String,
    pub priority: Priority,
    /// Category name; `None` means uncategorized.
    pub category: Option<String>,
    pub completed: bool,
    /// Attachment path. The file itself is managed by the caller.
    pub image: Option<String>,
    /// Reminder timestamp. Scheduling is the caller's job.
    pub reminder: Option<String>,
    pub due_date: Option<String>,
}

impl Note {
    /// Whether `title` or `body` contains `needle`, which must already be
    /// lowercased.
    pub fn mentions(&self, needle: &str) -> bool {
        self.title.to_lowercase().contains(needle) || self.body.to_lowercase().contains(needle)
    }
}

/// Payload for creating a note. `title` and `body` are stored trimmed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NewNote {
    pub title: String,
    pub body: String,
    pub priority: Priority,
    pub category: Option<String>,
    pub image: Option<String>,
    pub reminder: Option<String>,
    pub due_date: Option<String>,
}

impl NewNote {
    pub fn new(title: impl Into<String>, body: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            body: body.into(),
            ..Self::default()
        }
    }

    pub fn with_priority(mut self, priority: Priority) -> Self {
        self.priority = priority;
        self
    }

    pub fn with_category(mut self, category: impl Into<String>) -> Self {
        self.category = Some(category.into());
        self
    }

    pub fn with_image(mut self, image: impl Into<String>) -> Self {
        self.image = Some(image.into());
        self
    }

    pub fn with_reminder(mut self, reminder: impl Into<String>) -> Self {
        self.reminder = Some(reminder.into());
        self
    }

    pub fn with_due_date(mut self, due_date: impl Into<String>) -> Self {
        self.due_date = Some(due_date.into());
        self
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        require_text("title", &self.title)?;
        require_text("note", &self.body)?;
        if let Some(due_date) = self.due_date.as_deref() {
            validate_due_date(due_date)?;
        }
        Ok(())
    }
}

/// Partial update. `None` leaves a field untouched; for nullable fields
/// `Some(None)` clears the stored value.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NoteUpdate {
    pub title: Option<String>,
    pub body: Option<String>,
    pub priority: Option<Priority>,
    pub category: Option<Option<String>>,
    pub image: Option<Option<String>>,
    pub reminder: Option<Option<String>>,
    pub due_date: Option<Option<String>>,
}

impl NoteUpdate {
    pub fn is_empty(&self) -> bool {
        self.title.is_none()
            && self.body.is_none()
            && self.priority.is_none()
            && self.category.is_none()
            && self.image.is_none()
            && self.reminder.is_none()
            && self.due_date.is_none()
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        if let Some(title) = self.title.as_deref() {
            require_text("title", title)?;
        }
        if let Some(body) = self.body.as_deref() {
            require_text("note", body)?;
        }
        if let Some(Some(due_date)) = self.due_date.as_ref() {
            validate_due_date(due_date)?;
        }
        Ok(())
    }
}

/// Criteria for listing notes. All present criteria must hold.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NoteFilter {
    pub completed: bool,
    /// Exact category name.
    pub category: Option<String>,
    pub priority: Option<Priority>,
    /// Case-insensitive substring of title or body. Blank counts as absent.
    pub search_text: Option<String>,
}

impl NoteFilter {
    /// Notes not yet completed.
    pub fn open() -> Self {
        Self::default()
    }

    pub fn completed() -> Self {
        Self {
            completed: true,
            ..Self::default()
        }
    }

    pub fn with_category(mut self, category: impl Into<String>) -> Self {
        self.category = Some(category.into());
        self
    }

    pub fn with_priority(mut self, priority: Priority) -> Self {
        self.priority = Some(priority);
        self
    }

    pub fn with_search_text(mut self, text: impl Into<String>) -> Self {
        self.search_text = Some(text.into());
        self
    }

    /// Lowercased, trimmed search text, or `None` when blank or absent.
    pub fn search_needle(&self) -> Option<String> {
        self.search_text
            .as_deref()
            .map(str::trim)
            .filter(|text| !text.is_empty())
            .map(str::to_lowercase)
    }
}
