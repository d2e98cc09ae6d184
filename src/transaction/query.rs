//! The filtered, paginated transaction listing query.

use rusqlite::{Connection, ToSql};
use time::{Date, OffsetDateTime, Time, macros::time};

use crate::{
    Error,
    database_id::CategoryId,
    db,
    pagination::PageQuery,
    transaction::{
        db::map_transaction_row,
        models::{Transaction, TransactionKind},
    },
    user::UserID,
};

/// The filter criteria for listing transactions.
///
/// Every clause is optional. Present clauses are AND-combined, and the whole
/// query is always scoped to the requesting user.
#[derive(Debug, Clone, Default)]
pub struct TransactionFilter {
    /// Case-insensitive substring to match against the title or description.
    pub search: Option<String>,
    /// Keep only transactions of this kind.
    pub kind: Option<TransactionKind>,
    /// Keep only transactions in this category.
    pub category_id: Option<CategoryId>,
    /// Keep only transactions registered on or after this date.
    pub start_date: Option<Date>,
    /// Keep only transactions registered on or before this date, inclusive
    /// through 23:59:59.999 of that calendar day.
    pub end_date: Option<Date>,
}

impl TransactionFilter {
    // Builds the WHERE clause and its parameters, scoped to `user_id`.
    // Parameters are positional and must stay in clause order.
    fn where_clause(&self, user_id: UserID) -> (String, Vec<Box<dyn ToSql>>) {
        let mut conditions = vec!["user_id = ?".to_owned()];
        let mut parameters: Vec<Box<dyn ToSql>> = vec![Box::new(user_id.as_i64())];

        if let Some(kind) = self.kind {
            conditions.push("type = ?".to_owned());
            parameters.push(Box::new(kind.as_str()));
        }

        if let Some(category_id) = self.category_id {
            conditions.push("category_id = ?".to_owned());
            parameters.push(Box::new(category_id));
        }

        if let Some(start_date) = self.start_date {
            conditions.push("register_date >= ?".to_owned());
            parameters.push(Box::new(db::format_timestamp(start_of_day(start_date))));
        }

        if let Some(end_date) = self.end_date {
            conditions.push("register_date <= ?".to_owned());
            parameters.push(Box::new(db::format_timestamp(end_of_day(end_date))));
        }

        if let Some(ref search) = self.search {
            conditions.push(
                "(title LIKE '%' || ? || '%' OR IFNULL(description, '') LIKE '%' || ? || '%')"
                    .to_owned(),
            );
            parameters.push(Box::new(search.clone()));
            parameters.push(Box::new(search.clone()));
        }

        (conditions.join(" AND "), parameters)
    }
}

fn start_of_day(date: Date) -> OffsetDateTime {
    OffsetDateTime::new_utc(date, Time::MIDNIGHT)
}

fn end_of_day(date: Date) -> OffsetDateTime {
    OffsetDateTime::new_utc(date, time!(23:59:59.999))
}

/// Get one page of the transactions matching `filter`, newest first.
///
/// # Errors
/// This function will return an [Error::SqlError] if there is an SQL error.
pub fn get_transaction_page(
    filter: &TransactionFilter,
    page_query: PageQuery,
    user_id: UserID,
    connection: &Connection,
) -> Result<Vec<Transaction>, Error> {
    let (where_clause, mut parameters) = filter.where_clause(user_id);

    // Sort by register date, and then ID, to keep the order stable after updates.
    let query = format!(
        "SELECT id, title, amount, type, description, register_date, category_id, user_id,
                created_at, updated_at
         FROM \"transaction\"
         WHERE {where_clause}
         ORDER BY register_date DESC, id DESC
         LIMIT ? OFFSET ?"
    );
    parameters.push(Box::new(page_query.limit as i64));
    parameters.push(Box::new(page_query.offset() as i64));

    let parameter_refs: Vec<&dyn ToSql> = parameters.iter().map(|p| p.as_ref()).collect();

    connection
        .prepare(&query)?
        .query_map(&parameter_refs[..], map_transaction_row)?
        .map(|maybe_transaction| maybe_transaction.map_err(Error::from))
        .collect()
}

/// Count all the transactions matching `filter`, ignoring pagination.
///
/// # Errors
/// This function will return an [Error::SqlError] if there is an SQL error.
pub fn count_transactions(
    filter: &TransactionFilter,
    user_id: UserID,
    connection: &Connection,
) -> Result<u64, Error> {
    let (where_clause, parameters) = filter.where_clause(user_id);
    let query = format!("SELECT COUNT(id) FROM \"transaction\" WHERE {where_clause}");

    let parameter_refs: Vec<&dyn ToSql> = parameters.iter().map(|p| p.as_ref()).collect();

    connection
        .prepare(&query)?
        .query_row(&parameter_refs[..], |row| {
            row.get::<_, i64>(0).map(|count| count as u64)
        })
        .map_err(Error::from)
}

#[cfg(test)]
mod listing_tests {
    use rusqlite::Connection;
    use time::{OffsetDateTime, macros::date, macros::datetime};

    use crate::{
        category::{Category, CategoryName, NewCategory, create_category},
        db::initialize,
        pagination::PageQuery,
        password::PasswordHash,
        transaction::{NewTransaction, TransactionKind, create_transaction},
        user::{User, create_user},
    };

    use super::{TransactionFilter, count_transactions, get_transaction_page};

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
                name: CategoryName::new_unchecked("Groceries"),
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
        title: &str,
        kind: TransactionKind,
        register_date: OffsetDateTime,
    ) {
        create_transaction(
            NewTransaction {
                title: title.to_owned(),
                amount: 10.0,
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
    fn lists_newest_first() {
        let (connection, user, category) = get_test_connection();
        insert_transaction(
            &connection,
            &user,
            &category,
            "older",
            TransactionKind::Expense,
            datetime!(2025-06-01 12:00:00 UTC),
        );
        insert_transaction(
            &connection,
            &user,
            &category,
            "newer",
            TransactionKind::Expense,
            datetime!(2025-06-20 12:00:00 UTC),
        );

        let page = get_transaction_page(
            &TransactionFilter::default(),
            PageQuery::default(),
            user.id,
            &connection,
        )
        .unwrap();

        let titles: Vec<&str> = page.iter().map(|t| t.title.as_str()).collect();
        assert_eq!(titles, ["newer", "older"]);
    }

    #[test]
    fn excludes_other_users() {
        let (connection, user, category) = get_test_connection();
        let other_user = create_user(
            "qux@bar.baz".parse().unwrap(),
            PasswordHash::new_unchecked("hunter3"),
            &connection,
        )
        .unwrap();
        let other_category = create_category(
            NewCategory {
                name: CategoryName::new_unchecked("Groceries"),
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
            "mine",
            TransactionKind::Expense,
            datetime!(2025-06-01 12:00:00 UTC),
        );
        insert_transaction(
            &connection,
            &other_user,
            &other_category,
            "theirs",
            TransactionKind::Expense,
            datetime!(2025-06-01 12:00:00 UTC),
        );

        let page = get_transaction_page(
            &TransactionFilter::default(),
            PageQuery::default(),
            user.id,
            &connection,
        )
        .unwrap();

        assert_eq!(page.len(), 1);
        assert_eq!(page[0].title, "mine");
    }

    #[test]
    fn filters_by_kind() {
        let (connection, user, category) = get_test_connection();
        insert_transaction(
            &connection,
            &user,
            &category,
            "salary",
            TransactionKind::Income,
            datetime!(2025-06-01 12:00:00 UTC),
        );
        insert_transaction(
            &connection,
            &user,
            &category,
            "rent",
            TransactionKind::Expense,
            datetime!(2025-06-02 12:00:00 UTC),
        );

        let filter = TransactionFilter {
            kind: Some(TransactionKind::Income),
            ..Default::default()
        };
        let page =
            get_transaction_page(&filter, PageQuery::default(), user.id, &connection).unwrap();

        assert_eq!(page.len(), 1);
        assert_eq!(page[0].title, "salary");
        assert_eq!(count_transactions(&filter, user.id, &connection).unwrap(), 1);
    }

    #[test]
    fn filters_by_category() {
        let (connection, user, category) = get_test_connection();
        let other_category = create_category(
            NewCategory {
                name: CategoryName::new_unchecked("Transport"),
                description: None,
                icon: None,
                color: None,
                user_id: user.id,
            },
            &connection,
        )
        .unwrap();
        insert_transaction(
            &connection,
            &user,
            &category,
            "groceries",
            TransactionKind::Expense,
            datetime!(2025-06-01 12:00:00 UTC),
        );
        insert_transaction(
            &connection,
            &user,
            &other_category,
            "bus fare",
            TransactionKind::Expense,
            datetime!(2025-06-02 12:00:00 UTC),
        );

        let filter = TransactionFilter {
            category_id: Some(other_category.id),
            ..Default::default()
        };
        let page =
            get_transaction_page(&filter, PageQuery::default(), user.id, &connection).unwrap();

        assert_eq!(page.len(), 1);
        assert_eq!(page[0].title, "bus fare");
    }

    #[test]
    fn date_range_includes_the_whole_end_day() {
        let (connection, user, category) = get_test_connection();
        insert_transaction(
            &connection,
            &user,
            &category,
            "just inside",
            TransactionKind::Expense,
            datetime!(2025-06-30 23:59:59 UTC),
        );
        insert_transaction(
            &connection,
            &user,
            &category,
            "just outside",
            TransactionKind::Expense,
            datetime!(2025-07-01 00:00:00 UTC),
        );

        let filter = TransactionFilter {
            start_date: Some(date!(2025 - 06 - 01)),
            end_date: Some(date!(2025 - 06 - 30)),
            ..Default::default()
        };
        let page =
            get_transaction_page(&filter, PageQuery::default(), user.id, &connection).unwrap();

        assert_eq!(page.len(), 1);
        assert_eq!(page[0].title, "just inside");
    }

    #[test]
    fn date_range_excludes_before_the_start_day() {
        let (connection, user, category) = get_test_connection();
        insert_transaction(
            &connection,
            &user,
            &category,
            "too early",
            TransactionKind::Expense,
            datetime!(2025-05-31 23:59:59 UTC),
        );
        insert_transaction(
            &connection,
            &user,
            &category,
            "on the start day",
            TransactionKind::Expense,
            datetime!(2025-06-01 00:00:00 UTC),
        );

        let filter = TransactionFilter {
            start_date: Some(date!(2025 - 06 - 01)),
            ..Default::default()
        };
        let page =
            get_transaction_page(&filter, PageQuery::default(), user.id, &connection).unwrap();

        assert_eq!(page.len(), 1);
        assert_eq!(page[0].title, "on the start day");
    }

    #[test]
    fn search_matches_title_and_description_case_insensitively() {
        let (connection, user, category) = get_test_connection();
        insert_transaction(
            &connection,
            &user,
            &category,
            "Supermarket",
            TransactionKind::Expense,
            datetime!(2025-06-01 12:00:00 UTC),
        );
        create_transaction(
            NewTransaction {
                title: "Card payment".to_owned(),
                amount: 10.0,
                kind: TransactionKind::Expense,
                description: Some("the SUPERMARKET down the road".to_owned()),
                register_date: datetime!(2025-06-02 12:00:00 UTC),
                category_id: category.id,
                user_id: user.id,
            },
            &connection,
        )
        .unwrap();
        insert_transaction(
            &connection,
            &user,
            &category,
            "Rent",
            TransactionKind::Expense,
            datetime!(2025-06-03 12:00:00 UTC),
        );

        let filter = TransactionFilter {
            search: Some("superMARKET".to_owned()),
            ..Default::default()
        };
        let page =
            get_transaction_page(&filter, PageQuery::default(), user.id, &connection).unwrap();

        assert_eq!(page.len(), 2, "want title and description matches");
    }

    #[test]
    fn combines_all_filters() {
        let (connection, user, category) = get_test_connection();
        insert_transaction(
            &connection,
            &user,
            &category,
            "groceries run",
            TransactionKind::Expense,
            datetime!(2025-06-10 12:00:00 UTC),
        );
        insert_transaction(
            &connection,
            &user,
            &category,
            "groceries refund",
            TransactionKind::Income,
            datetime!(2025-06-10 13:00:00 UTC),
        );

        let filter = TransactionFilter {
            search: Some("groceries".to_owned()),
            kind: Some(TransactionKind::Expense),
            category_id: Some(category.id),
            start_date: Some(date!(2025 - 06 - 01)),
            end_date: Some(date!(2025 - 06 - 30)),
        };
        let page =
            get_transaction_page(&filter, PageQuery::default(), user.id, &connection).unwrap();

        assert_eq!(page.len(), 1);
        assert_eq!(page[0].title, "groceries run");
    }

    #[test]
    fn paginates_25_rows_into_three_pages() {
        let (connection, user, category) = get_test_connection();
        for i in 0..25 {
            insert_transaction(
                &connection,
                &user,
                &category,
                &format!("transaction #{i}"),
                TransactionKind::Expense,
                datetime!(2025-06-01 00:00:00 UTC) + time::Duration::hours(i),
            );
        }

        let filter = TransactionFilter::default();
        let first_page = get_transaction_page(
            &filter,
            PageQuery::new(Some(1), Some(10)),
            user.id,
            &connection,
        )
        .unwrap();
        let last_page = get_transaction_page(
            &filter,
            PageQuery::new(Some(3), Some(10)),
            user.id,
            &connection,
        )
        .unwrap();

        assert_eq!(first_page.len(), 10);
        assert_eq!(last_page.len(), 5);
        assert_eq!(count_transactions(&filter, user.id, &connection).unwrap(), 25);

        // Newest first: the last page holds the five oldest rows.
        assert_eq!(first_page[0].title, "transaction #24");
        assert_eq!(last_page.last().unwrap().title, "transaction #0");
    }
}
