//! Seed the catalog and customer tables from a YAML file.
//!
//! Users are matched on email and books on ISBN, so running the same file
//! twice updates rows instead of duplicating them.
//!
//! ```yaml
//! users:
//!   - first_name: Ada
//!     last_name: Lovelace
//!     email: ada@example.com
//! books:
//!   - title: The Analytical Engine
//!     author: Ada Lovelace
//!     isbn: "9780000000001"
//!     price: "10.00"
//!     stock_quantity: 5
//! ```

use std::path::Path;

use serde::Deserialize;
use thiserror::Error;
use tracing::info;

use bookstore_api::db::{self, BookRepository, RepositoryError, UserRepository};
use bookstore_api::models::{NewBook, NewUser};

/// Errors that can occur while seeding.
#[derive(Debug, Error)]
pub enum SeedError {
    /// Required environment variable is missing.
    #[error("Missing environment variable: BOOKSTORE_DATABASE_URL (or DATABASE_URL)")]
    MissingDatabaseUrl,

    /// The seed file could not be read.
    #[error("Failed to read {path}: {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },

    /// The seed file is not valid YAML for this format.
    #[error("Invalid seed file: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// The seed file parsed but contains unusable entries.
    #[error("{0} validation errors found")]
    Invalid(usize),

    /// Database connection error.
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// A row could not be written.
    #[error("Repository error: {0}")]
    Repository(#[from] RepositoryError),
}

/// Contents of a seed file.
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SeedFile {
    #[serde(default)]
    pub users: Vec<NewUser>,
    #[serde(default)]
    pub books: Vec<NewBook>,
}

/// Rows written by a seed run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SeedSummary {
    pub users: usize,
    pub books: usize,
}

impl SeedFile {
    /// Parse a seed file from YAML.
    ///
    /// # Errors
    ///
    /// Returns an error if the YAML does not match the seed format.
    pub fn from_yaml(content: &str) -> Result<Self, serde_yaml::Error> {
        serde_yaml::from_str(content)
    }

    /// Problems that would make the upserts fail or store junk.
    #[must_use]
    pub fn validate(&self) -> Vec<String> {
        let mut errors = Vec::new();

        for (i, user) in self.users.iter().enumerate() {
            if !user.email.contains('@') {
                errors.push(format!("users[{i}]: invalid email {:?}", user.email));
            }
        }

        for (i, book) in self.books.iter().enumerate() {
            if book.isbn.trim().is_empty() {
                errors.push(format!("books[{i}]: isbn cannot be empty"));
            }
            if book.stock_quantity < 0 {
                errors.push(format!("books[{i}]: stock_quantity cannot be negative"));
            }
        }

        errors
    }
}

/// Upsert every user and book in `path` in a single transaction.
///
/// # Errors
///
/// Returns an error if the file is unreadable or invalid, or if any write
/// fails. Nothing is written in that case.
pub async fn run(path: &Path) -> Result<SeedSummary, SeedError> {
    info!(path = %path.display(), "Loading seed file");

    // Read and validate before connecting to the database
    let content = tokio::fs::read_to_string(path)
        .await
        .map_err(|source| SeedError::Io {
            path: path.display().to_string(),
            source,
        })?;
    let seed = SeedFile::from_yaml(&content)?;

    let errors = seed.validate();
    if !errors.is_empty() {
        for err in &errors {
            tracing::error!("  - {err}");
        }
        return Err(SeedError::Invalid(errors.len()));
    }

    let database_url = super::database_url().ok_or(SeedError::MissingDatabaseUrl)?;
    let pool = db::create_pool(&database_url).await?;
    info!("Connected to database");

    let mut tx = pool.begin().await?;
    for user in &seed.users {
        let stored = UserRepository::new(&mut tx).upsert(user).await?;
        info!(user_id = %stored.id, email = %stored.email, "User seeded");
    }
    for book in &seed.books {
        let stored = BookRepository::new(&mut tx).upsert(book).await?;
        info!(book_id = %stored.id, isbn = %stored.isbn, "Book seeded");
    }
    tx.commit().await?;

    Ok(SeedSummary {
        users: seed.users.len(),
        books: seed.books.len(),
    })
}
