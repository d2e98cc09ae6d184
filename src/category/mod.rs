//! Categories group transactions and are scoped to their owning user.

mod db;
mod endpoints;
mod models;

pub use db::{
    create_category, create_category_table, delete_category, get_category, list_categories,
    update_category,
};
pub use endpoints::{
    create_category_endpoint, delete_category_endpoint, get_category_endpoint,
    list_categories_endpoint, update_category_endpoint,
};
pub use models::{Category, CategoryName, CategoryUpdate, NewCategory};
