//! Database operations for categories.
//!
//! Every operation is scoped to the owning user: reading, updating, or
//! deleting another user's category is an access-denied error, distinct
//! from not-found.

use rusqlite::{Connection, OptionalExtension, Row};
use time::OffsetDateTime;

use crate::{
    Error,
    category::{Category, CategoryName, CategoryUpdate, NewCategory},
    database_id::CategoryId,
    db,
    user::UserID,
};

/// Create a category and return it with its generated ID.
///
/// # Errors
/// This function will return a:
/// - [Error::DuplicateCategoryName] if the user already has a category named `category.name`,
/// - or [Error::SqlError] if there is some other SQL error.
pub fn create_category(category: NewCategory, connection: &Connection) -> Result<Category, Error> {
    if category_name_exists(&category.name, category.user_id, None, connection)? {
        return Err(Error::DuplicateCategoryName);
    }

    let now = db::format_timestamp(OffsetDateTime::now_utc());

    connection.execute(
        "INSERT INTO category (name, description, icon, color, user_id, created_at, updated_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?6)",
        (
            category.name.as_ref(),
            &category.description,
            &category.icon,
            &category.color,
            category.user_id.as_i64(),
            &now,
        ),
    )?;

    let id = connection.last_insert_rowid();

    get_category(id, category.user_id, connection)
}

/// Retrieve a single category owned by `user_id`.
///
/// # Errors
/// This function will return a:
/// - [Error::CategoryNotFound] if `category_id` does not refer to a real category,
/// - [Error::CategoryAccessDenied] if the category belongs to another user,
/// - or [Error::SqlError] if there is some other SQL error.
pub fn get_category(
    category_id: CategoryId,
    user_id: UserID,
    connection: &Connection,
) -> Result<Category, Error> {
    let category = connection
        .prepare(
            "SELECT id, name, description, icon, color, user_id, created_at, updated_at
             FROM category WHERE id = :id",
        )?
        .query_row(&[(":id", &category_id)], map_category_row)
        .map_err(|error| match error {
            rusqlite::Error::QueryReturnedNoRows => Error::CategoryNotFound,
            error => error.into(),
        })?;

    if category.user_id != user_id {
        return Err(Error::CategoryAccessDenied);
    }

    Ok(category)
}

/// Retrieve all of the user's categories, newest first.
///
/// # Errors
/// This function will return an [Error::SqlError] if there is an SQL error.
pub fn list_categories(user_id: UserID, connection: &Connection) -> Result<Vec<Category>, Error> {
    connection
        .prepare(
            "SELECT id, name, description, icon, color, user_id, created_at, updated_at
             FROM category WHERE user_id = :user_id
             ORDER BY created_at DESC, id DESC",
        )?
        .query_map(&[(":user_id", &user_id.as_i64())], map_category_row)?
        .map(|maybe_category| maybe_category.map_err(Error::from))
        .collect()
}

/// Apply a partial update to a category owned by `user_id`.
///
/// Fields left as `None` in `update` keep their stored values.
///
/// # Errors
/// This function will return a:
/// - [Error::CategoryNotFound] if `category_id` does not refer to a real category,
/// - [Error::CategoryAccessDenied] if the category belongs to another user,
/// - [Error::DuplicateCategoryName] if the new name collides with a different
///   category of the same user,
/// - or [Error::SqlError] if there is some other SQL error.
pub fn update_category(
    category_id: CategoryId,
    user_id: UserID,
    update: CategoryUpdate,
    connection: &Connection,
) -> Result<Category, Error> {
    let existing = get_category(category_id, user_id, connection)?;

    if let Some(ref name) = update.name
        && category_name_exists(name, user_id, Some(category_id), connection)?
    {
        return Err(Error::DuplicateCategoryName);
    }

    let name = update.name.unwrap_or(existing.name);
    let description = update.description.or(existing.description);
    let icon = update.icon.or(existing.icon);
    let color = update.color.or(existing.color);
    let updated_at = db::format_timestamp(OffsetDateTime::now_utc());

    connection.execute(
        "UPDATE category SET name = ?1, description = ?2, icon = ?3, color = ?4, updated_at = ?5
         WHERE id = ?6",
        (
            name.as_ref(),
            &description,
            &icon,
            &color,
            &updated_at,
            category_id,
        ),
    )?;

    get_category(category_id, user_id, connection)
}

/// Delete a category owned by `user_id`.
///
/// Transactions referencing the category are deleted with it.
///
/// # Errors
/// This function will return a:
/// - [Error::CategoryNotFound] if `category_id` does not refer to a real category,
/// - [Error::CategoryAccessDenied] if the category belongs to another user,
/// - or [Error::SqlError] if there is some other SQL error.
pub fn delete_category(
    category_id: CategoryId,
    user_id: UserID,
    connection: &Connection,
) -> Result<(), Error> {
    get_category(category_id, user_id, connection)?;

    connection.execute("DELETE FROM category WHERE id = ?1", [category_id])?;

    Ok(())
}

/// Initialize the category table and indexes.
pub fn create_category_table(connection: &Connection) -> Result<(), rusqlite::Error> {
    connection.execute_batch(
        "CREATE TABLE IF NOT EXISTS category (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            name TEXT NOT NULL,
            description TEXT,
            icon TEXT,
            color TEXT,
            user_id INTEGER NOT NULL,
            created_at TEXT NOT NULL,
            updated_at TEXT NOT NULL,
            FOREIGN KEY(user_id) REFERENCES user(id) ON UPDATE CASCADE ON DELETE CASCADE,
            UNIQUE(user_id, name)
        );

        CREATE INDEX IF NOT EXISTS idx_category_user ON category(user_id);",
    )?;

    Ok(())
}

fn category_name_exists(
    name: &CategoryName,
    user_id: UserID,
    exclude_id: Option<CategoryId>,
    connection: &Connection,
) -> Result<bool, Error> {
    let existing_id = connection
        .prepare("SELECT id FROM category WHERE user_id = ?1 AND name = ?2")?
        .query_row((user_id.as_i64(), name.as_ref()), |row| {
            row.get::<_, CategoryId>(0)
        })
        .optional()?;

    Ok(match existing_id {
        Some(id) => exclude_id != Some(id),
        None => false,
    })
}

fn map_category_row(row: &Row) -> Result<Category, rusqlite::Error> {
    let raw_name: String = row.get(1)?;

    Ok(Category {
        id: row.get(0)?,
        name: CategoryName::new_unchecked(&raw_name),
        description: row.get(2)?,
        icon: row.get(3)?,
        color: row.get(4)?,
        user_id: UserID::new(row.get(5)?),
        created_at: db::timestamp_from_column(row, 6)?,
        updated_at: db::timestamp_from_column(row, 7)?,
    })
}
