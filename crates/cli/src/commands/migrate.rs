//! Database migration command.
//!
//! # Usage
//!
//! ```bash
//! bookstore migrate
//! ```
//!
//! # Environment Variables
//!
//! - `BOOKSTORE_DATABASE_URL` (or `DATABASE_URL`) - `PostgreSQL` connection string
//!
//! Migrations live in `crates/api/migrations/` and are embedded at compile
//! time.

use thiserror::Error;

use bookstore_api::db;

/// Errors that can occur while migrating.
#[derive(Debug, Error)]
pub enum MigrationError {
    /// Required environment variable is missing.
    #[error("Missing environment variable: BOOKSTORE_DATABASE_URL (or DATABASE_URL)")]
    MissingDatabaseUrl,

    /// Database connection error.
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// A migration failed to apply.
    #[error("Migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),
}

/// Apply all pending migrations.
///
/// # Errors
///
/// Returns an error if the database URL is missing, the connection fails or
/// a migration fails.
pub async fn run() -> Result<(), MigrationError> {
    let database_url = super::database_url().ok_or(MigrationError::MissingDatabaseUrl)?;

    tracing::info!("Connecting to bookstore database...");
    let pool = db::create_pool(&database_url).await?;

    tracing::info!("Running bookstore migrations...");
    sqlx::migrate!("../api/migrations").run(&pool).await?;

    tracing::info!("Bookstore migrations complete!");
    Ok(())
}
