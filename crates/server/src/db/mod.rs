//! Database operations for the Seagrape `PostgreSQL` database.
//!
//! # Tables
//!
//! - `users` - authentication boundary (bearer tokens issued externally)
//! - `products` - catalog with `stock_quantity` (never negative)
//! - `cart_items` - one row per `(user, product)`, consumed by order commit
//! - `orders` / `order_items` - immutable order records with snapshot prices
//! - `reviews` - product reviews with the verified-purchase flag
//!
//! # Migrations
//!
//! Migrations are stored in `crates/server/migrations/` and run via:
//! ```bash
//! cargo run -p seagrape-cli -- migrate
//! ```

use std::time::Duration;

use secrecy::ExposeSecret;
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;
use thiserror::Error;

pub mod cart;
pub mod orders;
pub mod products;
pub mod reviews;
pub mod users;

pub use cart::{CartError, CartRepository};
pub use orders::{OrderError, OrderRepository};
pub use products::ProductRepository;
pub use reviews::{ReviewError, ReviewRepository};
pub use users::UserRepository;

/// Error from a repository operation.
#[derive(Debug, Error)]
pub enum RepositoryError {
    /// Database operation failed.
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// A stored value violates an invariant the code relies on.
    #[error("data corruption: {0}")]
    DataCorruption(String),
}

/// Create a `PostgreSQL` connection pool with sensible defaults.
///
/// # Arguments
///
/// * `database_url` - `PostgreSQL` connection string (wrapped in `SecretString`)
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
