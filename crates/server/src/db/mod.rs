//! Database operations for the shopdesk `PostgreSQL` store.
//!
//! ## Tables
//!
//! - `users` - Accounts with argon2 password hashes and a role
//! - `products` - Catalog; owns `stock_quantity`
//! - `product_images` - Image metadata per product
//! - `orders` - Order headers
//! - `order_items` - Order lines with the price snapshot
//!
//! # Migrations
//!
//! Migrations are stored in `crates/server/migrations/` and run via:
//! ```bash
//! cargo run -p shopdesk-cli -- migrate
//! ```

pub mod dashboard;
pub mod orders;
pub mod product_images;
pub mod products;
pub mod users;

use std::time::Duration;

use secrecy::ExposeSecret;
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;
use thiserror::Error;

pub use dashboard::{DashboardCounts, DashboardRepository};
pub use orders::{OrderError, OrderRepository};
pub use product_images::ProductImageRepository;
pub use products::{
    AdminProductQuery, AdminProductSummary, ProductPage, ProductRepository, ProductSort, StockStatus,
};
pub use users::UserRepository;

/// Embedded migrations, shared by the CLI and the database tests.
pub static MIGRATOR: sqlx::migrate::Migrator = sqlx::migrate!("./migrations");

/// Errors that can occur during repository operations.
#[derive(Debug, Error)]
pub enum RepositoryError {
    /// Database error from sqlx.
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Data in the database is corrupted or invalid.
    #[error("data corruption: {0}")]
    DataCorruption(String),

    /// Requested entity was not found.
    #[error("not found")]
    NotFound,

    /// Constraint violation (e.g., unique email).
    #[error("constraint violation: {0}")]
    Conflict(String),
}

/// Map unique and foreign-key violations to `Conflict`, everything else to
/// `Database`.
pub(crate) fn map_constraint(err: sqlx::Error, conflict: &str) -> RepositoryError {
    if let sqlx::Error::Database(ref db_err) = err
        && (db_err.is_unique_violation() || db_err.is_foreign_key_violation())
    {
        return RepositoryError::Conflict(conflict.to_owned());
    }
    RepositoryError::Database(err)
}

/// Parse a `TEXT` column holding one of the core enums.
pub(crate) fn parse_column<T>(value: &str, column: &str) -> Result<T, RepositoryError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    value
        .parse()
        .map_err(|e| RepositoryError::DataCorruption(format!("invalid {column} in database: {e}")))
}

/// Create a `PostgreSQL` connection pool with sensible defaults.
///
/// # Errors
///
/// Returns `sqlx::Error` if the connection cannot be established.
pub async fn create_pool(database_url: &secrecy::SecretString) -> Result<PgPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(10)
        .min_connections(2)
        .acquire_timeout(Duration::from_secs(10))
        .connect(database_url.expose_secret())
        .await
}
