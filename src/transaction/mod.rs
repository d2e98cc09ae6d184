//! Transactions record a dated income or expense against a category.
//!
//! The listing operation is the heart of the application: it combines a
//! filtered, paginated page of transactions with the user's monthly and
//! lifetime financial summary.

mod db;
mod endpoints;
mod models;
mod query;
mod summary;

pub use db::{
    create_transaction, create_transaction_table, delete_transaction, get_transaction,
    update_transaction,
};
pub use endpoints::{
    create_transaction_endpoint, delete_transaction_endpoint, list_transactions_endpoint,
    update_transaction_endpoint,
};
pub use models::{NewTransaction, Transaction, TransactionKind, TransactionUpdate};
pub use query::{TransactionFilter, count_transactions, get_transaction_page};
pub use summary::{
    FinancialSummary, get_category_amount, get_category_count, get_financial_summary,
};
