//! The category data models.

use std::fmt::Display;

use serde::Serialize;
use time::OffsetDateTime;

use crate::{Error, database_id::CategoryId, user::UserID};

/// The name of a category.
///
/// Unique among the owner's categories; must not be empty or only whitespace.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CategoryName(String);

impl CategoryName {
    /// Create and validate a category name.
    ///
    /// # Errors
    /// Returns [Error::EmptyCategoryName] if `name` is empty or contains only whitespace.
    pub fn new(name: &str) -> Result<Self, Error> {
        if name.trim().is_empty() {
            Err(Error::EmptyCategoryName)
        } else {
            Ok(Self(name.to_string()))
        }
    }

    /// Create a category name without any validation.
    ///
    /// The caller should ensure the name is not empty, e.g. because it came
    /// out of the application's database.
    pub fn new_unchecked(name: &str) -> Self {
        Self(name.to_string())
    }
}

impl AsRef<str> for CategoryName {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl Display for CategoryName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A user-defined label for grouping transactions, e.g. "Groceries".
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Category {
    /// The ID of the category.
    pub id: CategoryId,
    /// The display name, unique among the owner's categories.
    pub name: CategoryName,
    /// An optional longer description.
    pub description: Option<String>,
    /// An optional symbolic icon name chosen by the client.
    pub icon: Option<String>,
    /// An optional display color, typically a hex code.
    pub color: Option<String>,
    /// The ID of the owning user.
    pub user_id: UserID,
    /// When the category was created.
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    /// When the category was last modified.
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
}

/// The fields needed to create a category.
#[derive(Debug, Clone)]
pub struct NewCategory {
    /// The display name for the new category.
    pub name: CategoryName,
    /// An optional longer description.
    pub description: Option<String>,
    /// An optional symbolic icon name.
    pub icon: Option<String>,
    /// An optional display color.
    pub color: Option<String>,
    /// The ID of the owning user.
    pub user_id: UserID,
}

/// A partial update to a category.
///
/// Fields set to `None` keep their stored values.
#[derive(Debug, Clone, Default)]
pub struct CategoryUpdate {
    /// The new display name, if it should change.
    pub name: Option<CategoryName>,
    /// The new description, if it should change.
    pub description: Option<String>,
    /// The new icon name, if it should change.
    pub icon: Option<String>,
    /// The new display color, if it should change.
    pub color: Option<String>,
}
