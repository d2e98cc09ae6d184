//! Route handlers for the category API.
//!
//! Handlers are a thin mapping layer: they extract the authenticated user,
//! call the database operations, and wrap the results in the response
//! envelopes expected by the client.

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::{Deserialize, Serialize};

use crate::{
    Error,
    app_state::AppState,
    auth::Claims,
    category::{
        Category, CategoryName, CategoryUpdate, NewCategory,
        db::{create_category, delete_category, get_category, list_categories, update_category},
    },
    database_id::CategoryId,
    transaction::{get_category_amount, get_category_count},
};

/// The payload for creating a category.
#[derive(Debug, Deserialize)]
pub struct CreateCategoryData {
    /// The display name for the new category.
    pub name: String,
    /// An optional longer description.
    pub description: Option<String>,
    /// An optional symbolic icon name.
    pub icon: Option<String>,
    /// An optional display color.
    pub color: Option<String>,
}

/// The payload for updating a category. Absent fields keep their values.
#[derive(Debug, Deserialize)]
pub struct UpdateCategoryData {
    /// The new display name, if it should change.
    pub name: Option<String>,
    /// The new description, if it should change.
    pub description: Option<String>,
    /// The new icon name, if it should change.
    pub icon: Option<String>,
    /// The new display color, if it should change.
    pub color: Option<String>,
}

#[derive(Debug, Serialize)]
struct CategoryResponse {
    category: Category,
    message: String,
}

/// A category enriched with its read-through transaction aggregates.
#[derive(Debug, Serialize)]
struct CategoryWithTotals {
    #[serde(flatten)]
    category: Category,
    amount: f64,
    count: u64,
}

#[derive(Debug, Serialize)]
struct CategoriesListResponse {
    categories: Vec<CategoryWithTotals>,
    message: String,
}

#[derive(Debug, Serialize)]
struct DeleteCategoryResponse {
    message: String,
}

/// A route handler for creating a new category.
pub async fn create_category_endpoint(
    State(state): State<AppState>,
    claims: Claims,
    Json(data): Json<CreateCategoryData>,
) -> Result<Response, Error> {
    let name = CategoryName::new(&data.name)?;

    let connection = state
        .db_connection
        .lock()
        .inspect_err(|error| tracing::error!("could not acquire database lock: {error}"))
        .map_err(|_| Error::DatabaseLockError)?;

    let category = create_category(
        NewCategory {
            name,
            description: data.description,
            icon: data.icon,
            color: data.color,
            user_id: claims.user_id,
        },
        &connection,
    )?;

    Ok((
        StatusCode::CREATED,
        Json(CategoryResponse {
            category,
            message: "Categoria criada com sucesso!".to_owned(),
        }),
    )
        .into_response())
}

/// A route handler for listing the user's categories, newest first.
///
/// Each category carries the sum and count of the user's transactions that
/// reference it. These are computed on demand, not stored.
pub async fn list_categories_endpoint(
    State(state): State<AppState>,
    claims: Claims,
) -> Result<Response, Error> {
    let connection = state
        .db_connection
        .lock()
        .inspect_err(|error| tracing::error!("could not acquire database lock: {error}"))
        .map_err(|_| Error::DatabaseLockError)?;

    let categories = list_categories(claims.user_id, &connection)?
        .into_iter()
        .map(|category| {
            let amount = get_category_amount(claims.user_id, category.id, &connection)?;
            let count = get_category_count(claims.user_id, category.id, &connection)?;

            Ok(CategoryWithTotals {
                category,
                amount,
                count,
            })
        })
        .collect::<Result<Vec<_>, Error>>()?;

    Ok(Json(CategoriesListResponse {
        categories,
        message: "Categorias listadas com sucesso!".to_owned(),
    })
    .into_response())
}

/// A route handler for fetching a single category, e.g. to resolve the
/// category a transaction belongs to.
pub async fn get_category_endpoint(
    State(state): State<AppState>,
    claims: Claims,
    Path(category_id): Path<CategoryId>,
) -> Result<Response, Error> {
    let connection = state
        .db_connection
        .lock()
        .inspect_err(|error| tracing::error!("could not acquire database lock: {error}"))
        .map_err(|_| Error::DatabaseLockError)?;

    let category = get_category(category_id, claims.user_id, &connection)?;

    Ok(Json(CategoryResponse {
        category,
        message: "Categoria encontrada com sucesso!".to_owned(),
    })
    .into_response())
}

/// A route handler for updating a category.
pub async fn update_category_endpoint(
    State(state): State<AppState>,
    claims: Claims,
    Path(category_id): Path<CategoryId>,
    Json(data): Json<UpdateCategoryData>,
) -> Result<Response, Error> {
    let name = match data.name {
        Some(ref name) => Some(CategoryName::new(name)?),
        None => None,
    };

    let connection = state
        .db_connection
        .lock()
        .inspect_err(|error| tracing::error!("could not acquire database lock: {error}"))
        .map_err(|_| Error::DatabaseLockError)?;

    let category = update_category(
        category_id,
        claims.user_id,
        CategoryUpdate {
            name,
            description: data.description,
            icon: data.icon,
            color: data.color,
        },
        &connection,
    )?;

    Ok(Json(CategoryResponse {
        category,
        message: "Categoria atualizada com sucesso!".to_owned(),
    })
    .into_response())
}

/// A route handler for deleting a category and the transactions that
/// reference it.
pub async fn delete_category_endpoint(
    State(state): State<AppState>,
    claims: Claims,
    Path(category_id): Path<CategoryId>,
) -> Result<Response, Error> {
    let connection = state
        .db_connection
        .lock()
        .inspect_err(|error| tracing::error!("could not acquire database lock: {error}"))
        .map_err(|_| Error::DatabaseLockError)?;

    delete_category(category_id, claims.user_id, &connection)?;

    Ok(Json(DeleteCategoryResponse {
        message: "Categoria deletada com sucesso!".to_owned(),
    })
    .into_response())
}
