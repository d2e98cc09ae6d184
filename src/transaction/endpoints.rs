//! Route handlers for the transaction API.
//!
//! The listing handler is the structurally central piece: it runs the
//! filtered page query, the matching count, and the user's financial
//! summary against the same database snapshot and joins them into one
//! response. If any of those reads fails the whole request fails; no
//! partial results are returned.

use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::{Deserialize, Serialize};
use time::{Date, OffsetDateTime};

use crate::{
    Error,
    app_state::AppState,
    auth::Claims,
    database_id::{CategoryId, TransactionId},
    pagination::{PageInfo, PageQuery},
    transaction::{
        FinancialSummary, NewTransaction, Transaction, TransactionFilter, TransactionKind,
        TransactionUpdate,
        db::{create_transaction, delete_transaction, update_transaction},
        query::{count_transactions, get_transaction_page},
        summary::get_financial_summary,
    },
};

/// The query parameters accepted by the transaction listing.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListTransactionsQuery {
    /// Case-insensitive substring to match against the title or description.
    pub search: Option<String>,
    /// Keep only transactions of this kind.
    #[serde(rename = "type")]
    pub kind: Option<TransactionKind>,
    /// Keep only transactions in this category.
    pub category_id: Option<CategoryId>,
    /// Keep only transactions registered on or after this date.
    pub start_date: Option<Date>,
    /// Keep only transactions registered on or before this date.
    pub end_date: Option<Date>,
    /// The 1-based page number, defaulting to 1.
    pub page: Option<i64>,
    /// The page size, defaulting to 10.
    pub limit: Option<i64>,
}

/// The payload for creating a transaction.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateTransactionData {
    /// A short label for the transaction.
    pub title: String,
    /// The amount of money moved.
    pub amount: f64,
    /// Whether the transaction is an income or an expense.
    #[serde(rename = "type")]
    pub kind: TransactionKind,
    /// An optional longer description.
    pub description: Option<String>,
    /// The user-assigned effective date.
    #[serde(with = "time::serde::rfc3339")]
    pub register_date: OffsetDateTime,
    /// The category the transaction belongs to.
    pub category_id: CategoryId,
}

/// The payload for updating a transaction. Absent fields keep their values.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateTransactionData {
    /// The new title, if it should change.
    pub title: Option<String>,
    /// The new amount, if it should change.
    pub amount: Option<f64>,
    /// The new kind, if it should change.
    #[serde(rename = "type")]
    pub kind: Option<TransactionKind>,
    /// The new description, if it should change.
    pub description: Option<String>,
    /// The new effective date, if it should change.
    #[serde(default, with = "time::serde::rfc3339::option")]
    pub register_date: Option<OffsetDateTime>,
    /// The new category, if it should change.
    pub category_id: Option<CategoryId>,
}

#[derive(Debug, Serialize)]
struct TransactionResponse {
    transaction: Transaction,
    message: String,
}

#[derive(Debug, Serialize)]
struct TransactionsListResponse {
    transactions: Vec<Transaction>,
    pagination: PageInfo,
    #[serde(flatten)]
    summary: FinancialSummary,
    message: String,
}

#[derive(Debug, Serialize)]
struct DeleteTransactionResponse {
    message: String,
}

/// A route handler for listing the user's transactions.
///
/// Returns one page of transactions matching the filters, the pagination
/// block for the full result set, and the user's financial summary. The
/// summary is scoped to the user only and ignores the listing filters, so
/// it does not fluctuate as the user searches.
pub async fn list_transactions_endpoint(
    State(state): State<AppState>,
    claims: Claims,
    Query(query): Query<ListTransactionsQuery>,
) -> Result<Response, Error> {
    let filter = TransactionFilter {
        search: query.search,
        kind: query.kind,
        category_id: query.category_id,
        start_date: query.start_date,
        end_date: query.end_date,
    };
    let page_query = PageQuery::new(query.page, query.limit);

    let connection = state
        .db_connection
        .lock()
        .inspect_err(|error| tracing::error!("could not acquire database lock: {error}"))
        .map_err(|_| Error::DatabaseLockError)?;

    let transactions = get_transaction_page(&filter, page_query, claims.user_id, &connection)?;
    let total = count_transactions(&filter, claims.user_id, &connection)?;
    let summary = get_financial_summary(claims.user_id, OffsetDateTime::now_utc(), &connection)?;

    Ok(Json(TransactionsListResponse {
        transactions,
        pagination: PageInfo::new(page_query, total),
        summary,
        message: "Transações listadas com sucesso!".to_owned(),
    })
    .into_response())
}

/// A route handler for creating a new transaction.
pub async fn create_transaction_endpoint(
    State(state): State<AppState>,
    claims: Claims,
    Json(data): Json<CreateTransactionData>,
) -> Result<Response, Error> {
    let connection = state
        .db_connection
        .lock()
        .inspect_err(|error| tracing::error!("could not acquire database lock: {error}"))
        .map_err(|_| Error::DatabaseLockError)?;

    let transaction = create_transaction(
        NewTransaction {
            title: data.title,
            amount: data.amount,
            kind: data.kind,
            description: data.description,
            register_date: data.register_date,
            category_id: data.category_id,
            user_id: claims.user_id,
        },
        &connection,
    )?;

    Ok((
        StatusCode::CREATED,
        Json(TransactionResponse {
            transaction,
            message: "Transação criada com sucesso!".to_owned(),
        }),
    )
        .into_response())
}

/// A route handler for updating a transaction.
pub async fn update_transaction_endpoint(
    State(state): State<AppState>,
    claims: Claims,
    Path(transaction_id): Path<TransactionId>,
    Json(data): Json<UpdateTransactionData>,
) -> Result<Response, Error> {
    let connection = state
        .db_connection
        .lock()
        .inspect_err(|error| tracing::error!("could not acquire database lock: {error}"))
        .map_err(|_| Error::DatabaseLockError)?;

    let transaction = update_transaction(
        transaction_id,
        claims.user_id,
        TransactionUpdate {
            title: data.title,
            amount: data.amount,
            kind: data.kind,
            description: data.description,
            register_date: data.register_date,
            category_id: data.category_id,
        },
        &connection,
    )?;

    Ok(Json(TransactionResponse {
        transaction,
        message: "Transação atualizada com sucesso!".to_owned(),
    })
    .into_response())
}

/// A route handler for deleting a transaction.
pub async fn delete_transaction_endpoint(
    State(state): State<AppState>,
    claims: Claims,
    Path(transaction_id): Path<TransactionId>,
) -> Result<Response, Error> {
    let connection = state
        .db_connection
        .lock()
        .inspect_err(|error| tracing::error!("could not acquire database lock: {error}"))
        .map_err(|_| Error::DatabaseLockError)?;

    delete_transaction(transaction_id, claims.user_id, &connection)?;

    Ok(Json(DeleteTransactionResponse {
        message: "Transação deletada com sucesso!".to_owned(),
    })
    .into_response())
}
