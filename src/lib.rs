//! Centavo is a personal finance tracker served as a JSON HTTP API.
//!
//! Users register and sign in, organise their spending into categories, and
//! record income and expense transactions against those categories. The
//! transaction listing supports filtering and pagination, and reports the
//! user's monthly and lifetime totals alongside each page of results.

#![warn(missing_docs)]

use std::{net::SocketAddr, time::Duration};

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use axum_server::Handle;
use serde_json::json;
use tokio::signal;

mod app_state;
mod auth;
mod category;
mod database_id;
mod db;
mod endpoints;
mod pagination;
mod password;
mod routing;
#[cfg(test)]
mod test_utils;
mod transaction;
mod user;

pub use app_state::AppState;
pub use db::initialize as initialize_db;
pub use password::{PasswordHash, ValidatedPassword};
pub use routing::build_router;
pub use user::{User, UserID};

/// An async task that waits for either the ctrl+c or terminate signal, whichever comes first, and
/// then signals the server to shut down gracefully.
///
/// `handle` is a handle to an Axum `Server`.
pub async fn graceful_shutdown(handle: Handle<SocketAddr>) {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::debug!("Received ctrl+c signal.");
            handle.graceful_shutdown(Some(Duration::from_secs(1)));
        },
        _ = terminate => {
            tracing::debug!("Received terminate signal.");
            handle.graceful_shutdown(Some(Duration::from_secs(1)));
        },
    }
}

/// The errors that may occur in the application.
#[derive(Debug, thiserror::Error, PartialEq)]
pub enum Error {
    /// The requested category does not exist.
    #[error("Categoria não encontrada!")]
    CategoryNotFound,

    /// The requested category belongs to another user.
    #[error("Você não tem permissão para acessar esta categoria!")]
    CategoryAccessDenied,

    /// The user already has a category with the requested name.
    #[error("Categoria com este nome já existe!")]
    DuplicateCategoryName,

    /// An empty string was used to create a category name.
    #[error("O nome da categoria não pode ser vazio!")]
    EmptyCategoryName,

    /// The requested transaction does not exist.
    #[error("Transação não encontrada!")]
    TransactionNotFound,

    /// The requested transaction belongs to another user.
    #[error("Você não tem permissão para acessar esta transação!")]
    TransactionAccessDenied,

    /// The email used to register already belongs to an account.
    #[error("Este e-mail já está em uso!")]
    DuplicateEmail,

    /// No account exists for the given email address.
    #[error("Usuário não encontrado!")]
    UserNotFound,

    /// The user provided a password that is too easy to guess.
    ///
    /// The inner string explains why the password is considered weak and
    /// how to improve it.
    #[error("password is too weak: {0}")]
    TooWeak(String),

    /// An unexpected error occurred with the underlying hashing library.
    ///
    /// The error string should only be logged for debugging on the server,
    /// never sent to the client.
    #[error("hashing failed: {0}")]
    HashingError(String),

    /// An unhandled/unexpected SQL error.
    #[error("an unexpected SQL error occurred: {0}")]
    SqlError(rusqlite::Error),

    /// Could not acquire the database lock.
    #[error("could not acquire the database lock")]
    DatabaseLockError,
}

impl From<rusqlite::Error> for Error {
    fn from(error: rusqlite::Error) -> Self {
        match error {
            // Code 2067 occurs when a UNIQUE constraint failed.
            rusqlite::Error::SqliteFailure(sql_error, Some(ref desc))
                if sql_error.extended_code == 2067 && desc.contains("category.name") =>
            {
                Error::DuplicateCategoryName
            }
            rusqlite::Error::SqliteFailure(sql_error, Some(ref desc))
                if sql_error.extended_code == 2067 && desc.contains("user.email") =>
            {
                Error::DuplicateEmail
            }
            error => {
                tracing::error!("an unhandled SQL error occurred: {error}");
                Error::SqlError(error)
            }
        }
    }
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        let status_code = match &self {
            Error::CategoryNotFound | Error::TransactionNotFound | Error::UserNotFound => {
                StatusCode::NOT_FOUND
            }
            Error::CategoryAccessDenied | Error::TransactionAccessDenied => StatusCode::FORBIDDEN,
            Error::DuplicateCategoryName
            | Error::DuplicateEmail
            | Error::EmptyCategoryName
            | Error::TooWeak(_) => StatusCode::BAD_REQUEST,
            // Any errors that are not handled above are not intended to be shown to the client.
            error => {
                tracing::error!("An unexpected error occurred: {error}");
                return (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    Json(json!({ "error": "Erro interno do servidor!" })),
                )
                    .into_response();
            }
        };

        (status_code, Json(json!({ "error": self.to_string() }))).into_response()
    }
}
