//! Category domain model.

use crate::model::validation::{require_text, ValidationError};
use serde::{Deserialize, Serialize};

pub type CategoryId = i64;

/// Accent color given to categories created without one.
pub const DEFAULT_CATEGORY_COLOR: &str = "#6200ee";

/// User-defined named tag. `name` is unique across the store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Category {
    pub id: CategoryId,
    pub name: String,
    pub color: String,
}

/// Trims a category name and rejects blank input.
pub fn normalize_category_name(name: &str) -> Result<String, ValidationError> {
    require_text("name", name)?;
    Ok(name.trim().to_string())
}

/// Trims a category color and rejects blank input.
pub fn normalize_category_color(color: &str) -> Result<String, ValidationError> {
    require_text("color", color)?;
    Ok(color.trim().to_string())
}

#[cfg(test)]
mod tests {
    use super::{normalize_category_color, normalize_category_name};
    use crate::model::validation::ValidationError;

    #[test]
    fn names_are_trimmed() {
        assert_eq!(normalize_category_name("  Work ").unwrap(), "Work");
    }

    #[test]
    fn blank_name_and_color_are_rejected() {
        assert_eq!(
            normalize_category_name(" \t").unwrap_err(),
            ValidationError::EmptyField { field: "name" }
        );
        assert_eq!(
            normalize_category_color("").unwrap_err(),
            ValidationError::EmptyField { field: "color" }
        );
    }
}
