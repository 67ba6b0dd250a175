//! Book catalog queries.

use chrono::{DateTime, Utc};
use sqlx::PgConnection;

use bookstore_core::{Amount, BookId};

use super::RepositoryError;
use crate::models::{Book, NewBook};

/// Internal row type for database queries.
#[derive(Debug, sqlx::FromRow)]
struct BookRow {
    id: BookId,
    title: String,
    subtitle: Option<String>,
    author: String,
    publisher: Option<String>,
    isbn: String,
    language: Option<String>,
    price: Amount,
    stock_quantity: i32,
    created_at: DateTime<Utc>,
}

impl From<BookRow> for Book {
    fn from(row: BookRow) -> Self {
        Self {
            id: row.id,
            title: row.title,
            subtitle: row.subtitle,
            author: row.author,
            publisher: row.publisher,
            isbn: row.isbn,
            language: row.language,
            price: row.price,
            stock_quantity: row.stock_quantity,
            created_at: row.created_at,
        }
    }
}

/// Repository for book catalog queries.
pub struct BookRepository<'c> {
    conn: &'c mut PgConnection,
}

impl<'c> BookRepository<'c> {
    /// Create a new book catalog repository.
    #[must_use]
    pub const fn new(conn: &'c mut PgConnection) -> Self {
        Self { conn }
    }

    /// Get a book by ID.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn find(&mut self, id: BookId) -> Result<Option<Book>, RepositoryError> {
        let row = sqlx::query_as::<_, BookRow>(
            r"
            SELECT id, title, subtitle, author, publisher, isbn, language,
                   price, stock_quantity, created_at
            FROM bookstore.book
            WHERE id = $1
            ",
        )
        .bind(id)
        .fetch_optional(&mut *self.conn)
        .await?;

        Ok(row.map(Into::into))
    }

    /// Get every book whose ID is in `ids`. Missing IDs are skipped.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn find_many(&mut self, ids: &[BookId]) -> Result<Vec<Book>, RepositoryError> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }

        let rows = sqlx::query_as::<_, BookRow>(
            r"
            SELECT id, title, subtitle, author, publisher, isbn, language,
                   price, stock_quantity, created_at
            FROM bookstore.book
            WHERE id = ANY($1)
            ",
        )
        .bind(ids)
        .fetch_all(&mut *self.conn)
        .await?;

        Ok(rows.into_iter().map(Into::into).collect())
    }

    /// Insert a book, or refresh the catalog fields of the book with the same
    /// ISBN.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn upsert(&mut self, book: &NewBook) -> Result<Book, RepositoryError> {
        let row = sqlx::query_as::<_, BookRow>(
            r"
            INSERT INTO bookstore.book
                (title, subtitle, author, publisher, isbn, language, price, stock_quantity)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            ON CONFLICT (isbn) DO UPDATE
                SET title = EXCLUDED.title,
                    subtitle = EXCLUDED.subtitle,
                    author = EXCLUDED.author,
                    publisher = EXCLUDED.publisher,
                    language = EXCLUDED.language,
                    price = EXCLUDED.price,
                    stock_quantity = EXCLUDED.stock_quantity
            RETURNING id, title, subtitle, author, publisher, isbn, language,
                      price, stock_quantity, created_at
            ",
        )
        .bind(&book.title)
        .bind(&book.subtitle)
        .bind(&book.author)
        .bind(&book.publisher)
        .bind(&book.isbn)
        .bind(&book.language)
        .bind(book.price)
        .bind(book.stock_quantity)
        .fetch_one(&mut *self.conn)
        .await?;

        Ok(row.into())
    }
}
