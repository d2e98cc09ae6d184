//! Aggregate queries: the per-user financial summary reported with every
//! transaction listing, and the per-category roll-ups.

use rusqlite::Connection;
use serde::Serialize;
use time::{Date, Month, OffsetDateTime, Time, UtcOffset};

use crate::{
    Error, database_id::CategoryId, db, transaction::models::TransactionKind, user::UserID,
};

/// The user's financial summary.
///
/// The monthly and lifetime figures deliberately ignore the listing filters:
/// they always reflect the user's true totals, independent of whatever
/// subset of transactions is currently being viewed.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FinancialSummary {
    /// The INCOME total within the current calendar month (UTC).
    pub month_income: f64,
    /// The EXPENSE total within the current calendar month (UTC).
    pub month_expense: f64,
    /// The lifetime INCOME total minus the lifetime EXPENSE total.
    pub total_balance: f64,
}

/// Compute the financial summary for `user_id`, taking the current calendar
/// month from `now`.
///
/// Sums over empty sets default to zero.
///
/// # Errors
/// This function will return an [Error::SqlError] if there is an SQL error.
pub fn get_financial_summary(
    user_id: UserID,
    now: OffsetDateTime,
    connection: &Connection,
) -> Result<FinancialSummary, Error> {
    let month_window = current_month_window(now);

    let month_income = sum_amounts(user_id, TransactionKind::Income, Some(month_window), connection)?;
    let month_expense =
        sum_amounts(user_id, TransactionKind::Expense, Some(month_window), connection)?;
    let total_income = sum_amounts(user_id, TransactionKind::Income, None, connection)?;
    let total_expense = sum_amounts(user_id, TransactionKind::Expense, None, connection)?;

    Ok(FinancialSummary {
        month_income,
        month_expense,
        total_balance: total_income - total_expense,
    })
}

/// Sum of the user's transaction amounts referencing `category_id`.
///
/// # Errors
/// This function will return an [Error::SqlError] if there is an SQL error.
pub fn get_category_amount(
    user_id: UserID,
    category_id: CategoryId,
    connection: &Connection,
) -> Result<f64, Error> {
    let total = connection
        .prepare("SELECT SUM(amount) FROM \"transaction\" WHERE user_id = ?1 AND category_id = ?2")?
        .query_row((user_id.as_i64(), category_id), |row| {
            row.get::<_, Option<f64>>(0)
        })?;

    Ok(total.unwrap_or(0.0))
}

/// Number of the user's transactions referencing `category_id`.
///
/// # Errors
/// This function will return an [Error::SqlError] if there is an SQL error.
pub fn get_category_count(
    user_id: UserID,
    category_id: CategoryId,
    connection: &Connection,
) -> Result<u64, Error> {
    connection
        .prepare("SELECT COUNT(id) FROM \"transaction\" WHERE user_id = ?1 AND category_id = ?2")?
        .query_row((user_id.as_i64(), category_id), |row| {
            row.get::<_, i64>(0).map(|count| count as u64)
        })
        .map_err(Error::from)
}

// The current calendar month as `[first instant, first instant of the next
// month)`, UTC-based.
fn current_month_window(now: OffsetDateTime) -> (OffsetDateTime, OffsetDateTime) {
    let today = now.to_offset(UtcOffset::UTC).date();
    let month_start = today
        .replace_day(1)
        .expect("day one is valid in every month");

    let next_month_start = match month_start.month() {
        Month::December => Date::from_calendar_date(month_start.year() + 1, Month::January, 1),
        month => Date::from_calendar_date(month_start.year(), month.next(), 1),
    }
    .expect("day one is valid in every month");

    (
        OffsetDateTime::new_utc(month_start, Time::MIDNIGHT),
        OffsetDateTime::new_utc(next_month_start, Time::MIDNIGHT),
    )
}

fn sum_amounts(
    user_id: UserID,
    kind: TransactionKind,
    window: Option<(OffsetDateTime, OffsetDateTime)>,
    connection: &Connection,
) -> Result<f64, Error> {
    let total = match window {
        Some((start, end)) => connection
            .prepare(
                "SELECT SUM(amount) FROM \"transaction\"
                 WHERE user_id = ?1 AND type = ?2 AND register_date >= ?3 AND register_date < ?4",
            )?
            .query_row(
                (
                    user_id.as_i64(),
                    kind.as_str(),
                    db::format_timestamp(start),
                    db::format_timestamp(end),
                ),
                |row| row.get::<_, Option<f64>>(0),
            )?,
        None => connection
            .prepare("SELECT SUM(amount) FROM \"transaction\" WHERE user_id = ?1 AND type = ?2")?
            .query_row((user_id.as_i64(), kind.as_str()), |row| {
                row.get::<_, Option<f64>>(0)
            })?,
    };

    Ok(total.unwrap_or(0.0))
}


#[cfg(test)]
mod summary_tests {
    use rusqlite::Connection;
    use time::{OffsetDateTime, macros::datetime};

    use crate::{
        category::{Category, CategoryName, NewCategory, create_category},
        db::initialize,
        password::PasswordHash,
        transaction::{NewTransaction, TransactionKind, create_transaction},
        user::{User, create_user},
    };

    use super::{get_category_amount, get_category_count, get_financial_summary};

    const NOW: OffsetDateTime = datetime!(2025-06-15 12:00:00 UTC);

    fn get_test_connection() -> (Connection, User, Category) {
        let connection = Connection::open_in_memory().unwrap();
        initialize(&connection).unwrap();

        let user = create_user(
            "foo@bar.baz".parse().unwrap(),
            PasswordHash::new_unchecked("hunter2"),
            &connection,
        )
        .unwrap();

        let category = create_category(
            NewCategory {
                name: CategoryName::new_unchecked("General"),
                description: None,
                icon: None,
                color: None,
                user_id: user.id,
            },
            &connection,
        )
        .unwrap();

        (connection, user, category)
    }

    fn insert_transaction(
        connection: &Connection,
        user: &User,
        category: &Category,
        amount: f64,
        kind: TransactionKind,
        register_date: OffsetDateTime,
    ) {
        create_transaction(
            NewTransaction {
                title: "test".to_owned(),
                amount,
                kind,
                description: None,
                register_date,
                category_id: category.id,
                user_id: user.id,
            },
            connection,
        )
        .expect("Could not create transaction");
    }

    #[test]
    fn summary_is_zero_with_no_transactions() {
        let (connection, user, _) = get_test_connection();

        let summary = get_financial_summary(user.id, NOW, &connection).unwrap();

        assert_eq!(summary.month_income, 0.0);
        assert_eq!(summary.month_expense, 0.0);
        assert_eq!(summary.total_balance, 0.0);
    }

    #[test]
    fn monthly_totals_only_count_the_current_month() {
        let (connection, user, category) = get_test_connection();
        insert_transaction(
            &connection,
            &user,
            &category,
            1000.0,
            TransactionKind::Income,
            datetime!(2025-06-01 00:00:00 UTC),
        );
        insert_transaction(
            &connection,
            &user,
            &category,
            300.0,
            TransactionKind::Expense,
            datetime!(2025-06-30 23:59:59 UTC),
        );
        // Both fall outside the June window.
        insert_transaction(
            &connection,
            &user,
            &category,
            500.0,
            TransactionKind::Income,
            datetime!(2025-05-31 23:59:59 UTC),
        );
        insert_transaction(
            &connection,
            &user,
            &category,
            700.0,
            TransactionKind::Expense,
            datetime!(2025-07-01 00:00:00 UTC),
        );

        let summary = get_financial_summary(user.id, NOW, &connection).unwrap();

        assert_eq!(summary.month_income, 1000.0);
        assert_eq!(summary.month_expense, 300.0);
    }

    #[test]
    fn balance_spans_all_time() {
        let (connection, user, category) = get_test_connection();
        insert_transaction(
            &connection,
            &user,
            &category,
            500.0,
            TransactionKind::Income,
            datetime!(2024-01-01 00:00:00 UTC),
        );
        insert_transaction(
            &connection,
            &user,
            &category,
            1000.0,
            TransactionKind::Income,
            datetime!(2025-06-10 00:00:00 UTC),
        );
        insert_transaction(
            &connection,
            &user,
            &category,
            700.0,
            TransactionKind::Expense,
            datetime!(2025-07-04 00:00:00 UTC),
        );

        let summary = get_financial_summary(user.id, NOW, &connection).unwrap();

        assert_eq!(summary.total_balance, 800.0);
    }

    #[test]
    fn balance_can_be_negative() {
        let (connection, user, category) = get_test_connection();
        insert_transaction(
            &connection,
            &user,
            &category,
            100.0,
            TransactionKind::Income,
            NOW,
        );
        insert_transaction(
            &connection,
            &user,
            &category,
            250.0,
            TransactionKind::Expense,
            NOW,
        );

        let summary = get_financial_summary(user.id, NOW, &connection).unwrap();

        assert_eq!(summary.total_balance, -150.0);
    }

    #[test]
    fn summary_excludes_other_users() {
        let (connection, user, category) = get_test_connection();
        let other_user = create_user(
            "qux@bar.baz".parse().unwrap(),
            PasswordHash::new_unchecked("hunter3"),
            &connection,
        )
        .unwrap();
        let other_category = create_category(
            NewCategory {
                name: CategoryName::new_unchecked("General"),
                description: None,
                icon: None,
                color: None,
                user_id: other_user.id,
            },
            &connection,
        )
        .unwrap();
        insert_transaction(
            &connection,
            &user,
            &category,
            100.0,
            TransactionKind::Income,
            NOW,
        );
        insert_transaction(
            &connection,
            &other_user,
            &other_category,
            9000.0,
            TransactionKind::Income,
            NOW,
        );

        let summary = get_financial_summary(user.id, NOW, &connection).unwrap();

        assert_eq!(summary.month_income, 100.0);
        assert_eq!(summary.total_balance, 100.0);
    }

    #[test]
    fn category_totals_sum_and_count() {
        let (connection, user, category) = get_test_connection();
        insert_transaction(
            &connection,
            &user,
            &category,
            25.0,
            TransactionKind::Expense,
            NOW,
        );
        insert_transaction(
            &connection,
            &user,
            &category,
            17.5,
            TransactionKind::Expense,
            NOW,
        );

        let amount = get_category_amount(user.id, category.id, &connection).unwrap();
        let count = get_category_count(user.id, category.id, &connection).unwrap();

        assert_eq!(amount, 42.5);
        assert_eq!(count, 2);
    }

    #[test]
    fn category_totals_default_to_zero() {
        let (connection, user, category) = get_test_connection();

        let amount = get_category_amount(user.id, category.id, &connection).unwrap();
        let count = get_category_count(user.id, category.id, &connection).unwrap();

        assert_eq!(amount, 0.0);
        assert_eq!(count, 0);
    }
}
