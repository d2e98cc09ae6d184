//! Database schema initialization and shared storage helpers.

use rusqlite::{Connection, Row, Transaction as SqlTransaction};
use time::{
    OffsetDateTime, PrimitiveDateTime, UtcOffset, format_description::BorrowedFormatItem,
    macros::format_description,
};

use crate::{Error, category, transaction, user};

/// The fixed-width format used to store UTC timestamps as TEXT.
///
/// Every field is zero-padded and the subsecond part is always three digits,
/// so lexicographic order on the column agrees with chronological order and
/// SQL range comparisons can be applied to it directly.
const TIMESTAMP_FORMAT: &[BorrowedFormatItem<'static>] =
    format_description!("[year]-[month]-[day] [hour]:[minute]:[second].[subsecond digits:3]");

/// Format a date-time as a UTC timestamp string for storage.
pub(crate) fn format_timestamp(date_time: OffsetDateTime) -> String {
    let utc = date_time.to_offset(UtcOffset::UTC);

    PrimitiveDateTime::new(utc.date(), utc.time())
        .format(TIMESTAMP_FORMAT)
        .expect("formatting with a constant format description should not fail")
}

/// Parse a stored timestamp string back into a UTC date-time.
pub(crate) fn parse_timestamp(text: &str) -> Result<OffsetDateTime, time::error::Parse> {
    PrimitiveDateTime::parse(text, TIMESTAMP_FORMAT).map(PrimitiveDateTime::assume_utc)
}

/// Read the TEXT column at `index` as a UTC timestamp.
pub(crate) fn timestamp_from_column(row: &Row, index: usize) -> Result<OffsetDateTime, rusqlite::Error> {
    let raw: String = row.get(index)?;

    parse_timestamp(&raw).map_err(|error| {
        rusqlite::Error::FromSqlConversionFailure(
            index,
            rusqlite::types::Type::Text,
            Box::new(error),
        )
    })
}

/// Create the tables for the domain models.
///
/// # Errors
/// Returns an error if a table cannot be created or if there is an SQL error.
pub fn initialize(connection: &Connection) -> Result<(), Error> {
    connection.pragma_update(None, "foreign_keys", true)?;

    let sql_transaction =
        SqlTransaction::new_unchecked(connection, rusqlite::TransactionBehavior::Exclusive)?;

    user::create_user_table(&sql_transaction)?;
    category::create_category_table(&sql_transaction)?;
    transaction::create_transaction_table(&sql_transaction)?;

    sql_transaction.commit()?;

    Ok(())
}
