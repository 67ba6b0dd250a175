//! Book catalog types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use bookstore_core::{Amount, BookId};

/// A catalog book.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Book {
    pub id: BookId,
    pub title: String,
    pub subtitle: Option<String>,
    pub author: String,
    pub publisher: Option<String>,
    /// Unique ISBN.
    pub isbn: String,
    pub language: Option<String>,
    /// Unit price.
    pub price: Amount,
    pub stock_quantity: i32,
    pub created_at: DateTime<Utc>,
}

/// Book fields accepted by the seed command.
#[derive(Debug, Clone, Deserialize)]
pub struct NewBook {
    pub title: String,
    #[serde(default)]
    pub subtitle: Option<String>,
    pub author: String,
    #[serde(default)]
    pub publisher: Option<String>,
    pub isbn: String,
    #[serde(default)]
    pub language: Option<String>,
    pub price: Amount,
    #[serde(default)]
    pub stock_quantity: i32,
}

/// A book together with how many copies a cart or order holds.
///
/// Serialized as `{"book": {...}, "quantity": n}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BookLine {
    pub book: Book,
    pub quantity: i32,
}
