//! Database operations for single transactions.

use rusqlite::{Connection, Row};
use time::OffsetDateTime;

use crate::{
    Error,
    category::get_category,
    database_id::{CategoryId, TransactionId},
    db,
    transaction::models::{NewTransaction, Transaction, TransactionKind, TransactionUpdate},
    user::UserID,
};

/// Create a transaction and return it with its generated ID.
///
/// # Errors
/// This function will return a:
/// - [Error::CategoryNotFound] if the referenced category does not exist or
///   belongs to another user,
/// - or [Error::SqlError] if there is some other SQL error.
pub fn create_transaction(
    transaction: NewTransaction,
    connection: &Connection,
) -> Result<Transaction, Error> {
    check_category_ownership(transaction.category_id, transaction.user_id, connection)?;

    let now = db::format_timestamp(OffsetDateTime::now_utc());
    let register_date = db::format_timestamp(transaction.register_date);

    connection.execute(
        "INSERT INTO \"transaction\"
             (title, amount, type, description, register_date, category_id, user_id, created_at, updated_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?8)",
        (
            &transaction.title,
            transaction.amount,
            transaction.kind.as_str(),
            &transaction.description,
            &register_date,
            transaction.category_id,
            transaction.user_id.as_i64(),
            &now,
        ),
    )?;

    let id = connection.last_insert_rowid();

    get_transaction(id, transaction.user_id, connection)
}

/// Retrieve a single transaction owned by `user_id`.
///
/// # Errors
/// This function will return a:
/// - [Error::TransactionNotFound] if `transaction_id` does not refer to a real transaction,
/// - [Error::TransactionAccessDenied] if the transaction belongs to another user,
/// - or [Error::SqlError] if there is some other SQL error.
pub fn get_transaction(
    transaction_id: TransactionId,
    user_id: UserID,
    connection: &Connection,
) -> Result<Transaction, Error> {
    let transaction = connection
        .prepare(
            "SELECT id, title, amount, type, description, register_date, category_id, user_id,
                    created_at, updated_at
             FROM \"transaction\" WHERE id = :id",
        )?
        .query_row(&[(":id", &transaction_id)], map_transaction_row)
        .map_err(|error| match error {
            rusqlite::Error::QueryReturnedNoRows => Error::TransactionNotFound,
            error => error.into(),
        })?;

    if transaction.user_id != user_id {
        return Err(Error::TransactionAccessDenied);
    }

    Ok(transaction)
}

/// Apply a partial update to a transaction owned by `user_id`.
///
/// Fields left as `None` in `update` keep their stored values.
///
/// # Errors
/// This function will return a:
/// - [Error::TransactionNotFound] if `transaction_id` does not refer to a real transaction,
/// - [Error::TransactionAccessDenied] if the transaction belongs to another user,
/// - [Error::CategoryNotFound] if a new category does not exist or belongs to
///   another user,
/// - or [Error::SqlError] if there is some other SQL error.
pub fn update_transaction(
    transaction_id: TransactionId,
    user_id: UserID,
    update: TransactionUpdate,
    connection: &Connection,
) -> Result<Transaction, Error> {
    let existing = get_transaction(transaction_id, user_id, connection)?;

    if let Some(category_id) = update.category_id
        && category_id != existing.category_id
    {
        check_category_ownership(category_id, user_id, connection)?;
    }

    let title = update.title.unwrap_or(existing.title);
    let amount = update.amount.unwrap_or(existing.amount);
    let kind = update.kind.unwrap_or(existing.kind);
    let description = update.description.or(existing.description);
    let register_date = update.register_date.unwrap_or(existing.register_date);
    let category_id = update.category_id.unwrap_or(existing.category_id);
    let updated_at = db::format_timestamp(OffsetDateTime::now_utc());

    connection.execute(
        "UPDATE \"transaction\"
         SET title = ?1, amount = ?2, type = ?3, description = ?4, register_date = ?5,
             category_id = ?6, updated_at = ?7
         WHERE id = ?8",
        (
            &title,
            amount,
            kind.as_str(),
            &description,
            db::format_timestamp(register_date),
            category_id,
            &updated_at,
            transaction_id,
        ),
    )?;

    get_transaction(transaction_id, user_id, connection)
}

/// Delete a transaction owned by `user_id`.
///
/// # Errors
/// This function will return a:
/// - [Error::TransactionNotFound] if `transaction_id` does not refer to a real transaction,
/// - [Error::TransactionAccessDenied] if the transaction belongs to another user,
/// - or [Error::SqlError] if there is some other SQL error.
pub fn delete_transaction(
    transaction_id: TransactionId,
    user_id: UserID,
    connection: &Connection,
) -> Result<(), Error> {
    get_transaction(transaction_id, user_id, connection)?;

    connection.execute("DELETE FROM \"transaction\" WHERE id = ?1", [transaction_id])?;

    Ok(())
}

/// Initialize the transaction table and indexes.
pub fn create_transaction_table(connection: &Connection) -> Result<(), rusqlite::Error> {
    connection.execute_batch(
        "CREATE TABLE IF NOT EXISTS \"transaction\" (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            title TEXT NOT NULL,
            amount REAL NOT NULL,
            type TEXT NOT NULL,
            description TEXT,
            register_date TEXT NOT NULL,
            category_id INTEGER NOT NULL,
            user_id INTEGER NOT NULL,
            created_at TEXT NOT NULL,
            updated_at TEXT NOT NULL,
            FOREIGN KEY(category_id) REFERENCES category(id) ON UPDATE CASCADE ON DELETE CASCADE,
            FOREIGN KEY(user_id) REFERENCES user(id) ON UPDATE CASCADE ON DELETE CASCADE
        );

        CREATE INDEX IF NOT EXISTS idx_transaction_user_date
            ON \"transaction\"(user_id, register_date);
        CREATE INDEX IF NOT EXISTS idx_transaction_user_type
            ON \"transaction\"(user_id, type);",
    )?;

    Ok(())
}

// The referenced category must exist and belong to the same user. Failures
// are reported as not-found so a foreign category cannot be probed for.
fn check_category_ownership(
    category_id: CategoryId,
    user_id: UserID,
    connection: &Connection,
) -> Result<(), Error> {
    get_category(category_id, user_id, connection)
        .map(|_| ())
        .map_err(|error| match error {
            Error::CategoryAccessDenied => Error::CategoryNotFound,
            error => error,
        })
}

/// Map a database row to a [Transaction].
pub(crate) fn map_transaction_row(row: &Row) -> Result<Transaction, rusqlite::Error> {
    let raw_kind: String = row.get(3)?;
    let kind = TransactionKind::from_column(&raw_kind).ok_or_else(|| {
        rusqlite::Error::FromSqlConversionFailure(
            3,
            rusqlite::types::Type::Text,
            format!("unknown transaction type {raw_kind}").into(),
        )
    })?;

    Ok(Transaction {
        id: row.get(0)?,
        title: row.get(1)?,
        amount: row.get(2)?,
        kind,
        description: row.get(4)?,
        register_date: db::timestamp_from_column(row, 5)?,
        category_id: row.get(6)?,
        user_id: UserID::new(row.get(7)?),
        created_at: db::timestamp_from_column(row, 8)?,
        updated_at: db::timestamp_from_column(row, 9)?,
    })
}
