//! Database operations for the bookstore `PostgreSQL` schema.
//!
//! # Schema: `bookstore`
//!
//! ## Tables
//!
//! - `user` - Customers (seeded by the CLI)
//! - `book` - Catalog (seeded by the CLI, read-only here)
//! - `address` / `user_address` - Shared addresses and per-user links
//! - `payment` - Stored payment cards
//! - `cart` / `cart_line` - One open cart per user
//! - `order` / `order_line` - Placed orders and their line snapshots
//!
//! Every repository borrows a `&mut PgConnection` so the same query can run
//! on a pooled connection or inside a transaction (`&mut *tx`).
//!
//! # Migrations
//!
//! Migrations are stored in `crates/api/migrations/` and run via:
//! ```bash
//! cargo run -p bookstore-cli -- migrate
//! ```

pub mod addresses;
pub mod books;
pub mod carts;
pub mod orders;
pub mod payments;
pub mod users;

pub use addresses::AddressRepository;
pub use books::BookRepository;
pub use carts::CartRepository;
pub use orders::OrderRepository;
pub use payments::PaymentRepository;
pub use users::UserRepository;

use std::time::Duration;

use secrecy::ExposeSecret;
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;
use thiserror::Error;

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

    /// Constraint violation (e.g., duplicate card).
    #[error("constraint violation: {0}")]
    Conflict(String),
}

impl RepositoryError {
    /// Map unique violations to `Conflict` and foreign key violations to
    /// `NotFound`, leaving every other error as `Database`.
    pub(crate) fn from_constraint(e: sqlx::Error, conflict: &str) -> Self {
        if let sqlx::Error::Database(ref db_err) = e {
            if db_err.is_unique_violation() {
                return Self::Conflict(conflict.to_string());
            }
            if db_err.is_foreign_key_violation() {
                return Self::NotFound;
            }
        }
        Self::Database(e)
    }
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
