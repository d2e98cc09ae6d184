//! The transaction data models.

use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use crate::{
    database_id::{CategoryId, TransactionId},
    user::UserID,
};

/// Whether a transaction moves money in or out.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TransactionKind {
    /// Money earned.
    Income,
    /// Money spent.
    Expense,
}

impl TransactionKind {
    /// The representation of the kind stored in the database.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Income => "INCOME",
            Self::Expense => "EXPENSE",
        }
    }

    pub(crate) fn from_column(raw: &str) -> Option<Self> {
        match raw {
            "INCOME" => Some(Self::Income),
            "EXPENSE" => Some(Self::Expense),
            _ => None,
        }
    }
}

/// A single dated income or expense record tied to one category.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Transaction {
    /// The ID of the transaction.
    pub id: TransactionId,
    /// A short label for the transaction, e.g. "Salary".
    pub title: String,
    /// The amount of money moved. The sign is not validated against the
    /// kind; a negative amount on an income is stored as given.
    pub amount: f64,
    /// Whether the transaction is an income or an expense.
    #[serde(rename = "type")]
    pub kind: TransactionKind,
    /// An optional longer description.
    pub description: Option<String>,
    /// The user-assigned effective date of the transaction. All filtering
    /// and aggregation uses this date, not the bookkeeping timestamps.
    #[serde(with = "time::serde::rfc3339")]
    pub register_date: OffsetDateTime,
    /// The ID of the owning user.
    pub user_id: UserID,
    /// The ID of the category the transaction belongs to.
    pub category_id: CategoryId,
    /// When the record was created.
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    /// When the record was last modified.
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
}

/// The fields needed to create a transaction.
#[derive(Debug, Clone)]
pub struct NewTransaction {
    /// A short label for the transaction.
    pub title: String,
    /// The amount of money moved.
    pub amount: f64,
    /// Whether the transaction is an income or an expense.
    pub kind: TransactionKind,
    /// An optional longer description.
    pub description: Option<String>,
    /// The user-assigned effective date.
    pub register_date: OffsetDateTime,
    /// The category the transaction belongs to. Must be owned by `user_id`.
    pub category_id: CategoryId,
    /// The ID of the owning user.
    pub user_id: UserID,
}

/// A partial update to a transaction.
///
/// Fields set to `None` keep their stored values.
#[derive(Debug, Clone, Default)]
pub struct TransactionUpdate {
    /// The new title, if it should change.
    pub title: Option<String>,
    /// The new amount, if it should change.
    pub amount: Option<f64>,
    /// The new kind, if it should change.
    pub kind: Option<TransactionKind>,
    /// The new description, if it should change.
    pub description: Option<String>,
    /// The new effective date, if it should change.
    pub register_date: Option<OffsetDateTime>,
    /// The new category, if it should change. Must be owned by the user.
    pub category_id: Option<CategoryId>,
}
