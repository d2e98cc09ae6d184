//! User accounts: the model, its table, and the registration endpoint.

use std::fmt::Display;

use axum::{
    Json,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use email_address::EmailAddress;
use rusqlite::Connection;
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use crate::{
    Error,
    app_state::AppState,
    db,
    password::{PasswordHash, ValidatedPassword},
};

/// A newtype wrapper for integer user IDs.
///
/// This helps disambiguate user IDs from other types of IDs, leading to better compile time
/// errors, and more flexible generics that can have distinct implementations for multiple ID types.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize, Hash)]
pub struct UserID(i64);

impl UserID {
    /// Create a new user ID.
    pub fn new(id: i64) -> Self {
        Self(id)
    }

    /// Cast the user ID to a 64 bit integer.
    pub fn as_i64(&self) -> i64 {
        self.0
    }
}

impl Display for UserID {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}

/// A registered user of the application.
#[derive(Debug, Clone, PartialEq)]
pub struct User {
    /// The user's ID in the application database.
    pub id: UserID,
    /// The email address the user registered with.
    pub email: EmailAddress,
    /// The user's password hash.
    pub password_hash: PasswordHash,
}

/// Create the user table.
///
/// # Errors
///
/// This function will return an error if the SQL query failed.
pub fn create_user_table(connection: &Connection) -> Result<(), rusqlite::Error> {
    connection.execute(
        "CREATE TABLE IF NOT EXISTS user (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                email TEXT NOT NULL UNIQUE,
                password TEXT NOT NULL,
                created_at TEXT NOT NULL
                )",
        (),
    )?;

    Ok(())
}

/// Create and insert a new user into the database.
///
/// # Errors
///
/// This function will return a:
/// - [Error::DuplicateEmail] if a user with `email` already exists,
/// - or [Error::SqlError] if an SQL related error occurred.
pub fn create_user(
    email: EmailAddress,
    password_hash: PasswordHash,
    connection: &Connection,
) -> Result<User, Error> {
    let created_at = db::format_timestamp(OffsetDateTime::now_utc());

    connection.execute(
        "INSERT INTO user (email, password, created_at) VALUES (?1, ?2, ?3)",
        (email.to_string(), password_hash.as_ref(), created_at),
    )?;

    let id = UserID::new(connection.last_insert_rowid());

    Ok(User {
        id,
        email,
        password_hash,
    })
}

/// Get the user from the database registered with `email`.
///
/// # Errors
///
/// This function will return a:
/// - [Error::UserNotFound] if no account exists for `email`,
/// - or [Error::SqlError] if an SQL related error occurred.
pub fn get_user_by_email(email: &EmailAddress, connection: &Connection) -> Result<User, Error> {
    connection
        .prepare("SELECT id, email, password FROM user WHERE email = :email")?
        .query_row(&[(":email", &email.to_string())], |row| {
            let id = UserID::new(row.get(0)?);
            let raw_email: String = row.get(1)?;
            let email = raw_email.parse::<EmailAddress>().map_err(|error| {
                rusqlite::Error::FromSqlConversionFailure(
                    1,
                    rusqlite::types::Type::Text,
                    Box::new(error),
                )
            })?;
            let raw_password_hash: String = row.get(2)?;

            Ok(User {
                id,
                email,
                password_hash: PasswordHash::new_unchecked(&raw_password_hash),
            })
        })
        .map_err(|error| match error {
            rusqlite::Error::QueryReturnedNoRows => Error::UserNotFound,
            error => error.into(),
        })
}

/// The payload for registering a new user.
#[derive(Debug, Deserialize)]
pub struct RegisterUserData {
    /// The email address to register.
    pub email: EmailAddress,
    /// The plain-text password to validate and hash.
    pub password: String,
}

#[derive(Debug, Serialize)]
struct UserOutput {
    id: UserID,
    email: EmailAddress,
}

#[derive(Debug, Serialize)]
struct RegisterUserResponse {
    user: UserOutput,
    message: String,
}

/// A route handler for registering a new user.
///
/// The password is checked for strength before it is hashed; the stored hash
/// is never returned to the client.
pub async fn register_user(
    State(state): State<AppState>,
    Json(data): Json<RegisterUserData>,
) -> Result<Response, Error> {
    let password = ValidatedPassword::new(&data.password)?;
    let password_hash = PasswordHash::new(password, PasswordHash::DEFAULT_COST)?;

    let connection = state
        .db_connection
        .lock()
        .inspect_err(|error| tracing::error!("could not acquire database lock: {error}"))
        .map_err(|_| Error::DatabaseLockError)?;

    let user = create_user(data.email, password_hash, &connection)?;

    Ok((
        StatusCode::CREATED,
        Json(RegisterUserResponse {
            user: UserOutput {
                id: user.id,
                email: user.email,
            },
            message: "Usuário criado com sucesso!".to_owned(),
        }),
    )
        .into_response())
}
