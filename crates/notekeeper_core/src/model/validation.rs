//! Field validation shared by the model types.
//!
//! # Invariants
//! - Required text fields are non-empty after trimming.
//! - Due dates are real calendar days in `YYYY-MM-DD` form.

use chrono::NaiveDate;
use thiserror::Error;

const DUE_DATE_FORMAT: &str = "%Y-%m-%d";

/// Input rejected before any statement reaches the store.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("`{field}` must not be empty")]
    EmptyField { field: &'static str },
    #[error("initial task #{index} must not be empty")]
    EmptyTask { index: usize },
    #[error("due date `{value}` is not a YYYY-MM-DD calendar day")]
    InvalidDueDate { value: String },
}

/// Rejects values that are empty after trimming.
pub fn require_text(field: &'static str, value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        return Err(ValidationError::EmptyField { field });
    }
    Ok(())
}

/// Accepts `YYYY-MM-DD` strings naming a day that exists.
///
/// Only the zero-padded form is accepted; `2024-1-5` is rejected even though
/// it names a real day.
pub fn validate_due_date(value: &str) -> Result<(), ValidationError> {
    match NaiveDate::parse_from_str(value, DUE_DATE_FORMAT) {
        Ok(day) if day.format(DUE_DATE_FORMAT).to_string() == value => Ok(()),
        _ => Err(ValidationError::InvalidDueDate {
            value: value.to_string(),
        }),
    }
}
