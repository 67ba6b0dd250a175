//! Cart and cart line queries.

use chrono::{DateTime, Utc};
use sqlx::PgConnection;

use bookstore_core::{BookId, CartId, CartLineId, UserId};

use super::RepositoryError;
use crate::models::{Cart, CartLine};

/// Internal row type for database queries.
#[derive(Debug, sqlx::FromRow)]
struct CartRow {
    id: CartId,
    user_id: UserId,
    created_at: DateTime<Utc>,
}

impl From<CartRow> for Cart {
    fn from(row: CartRow) -> Self {
        Self {
            id: row.id,
            user_id: row.user_id,
            created_at: row.created_at,
        }
    }
}

/// Internal row type for database queries.
#[derive(Debug, sqlx::FromRow)]
struct CartLineRow {
    id: CartLineId,
    cart_id: CartId,
    book_id: BookId,
    quantity: i32,
}

impl From<CartLineRow> for CartLine {
    fn from(row: CartLineRow) -> Self {
        Self {
            id: row.id,
            cart_id: row.cart_id,
            book_id: row.book_id,
            quantity: row.quantity,
        }
    }
}

/// Whether adding a book created a new line or bumped an existing one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AddOutcome {
    /// A new line with quantity 1.
    Added,
    /// An existing line's quantity was incremented.
    Incremented,
}

/// Repository for cart and cart line queries.
pub struct CartRepository<'c> {
    conn: &'c mut PgConnection,
}

impl<'c> CartRepository<'c> {
    /// Create a new cart and cart line repository.
    #[must_use]
    pub const fn new(conn: &'c mut PgConnection) -> Self {
        Self { conn }
    }

    /// Get a cart by ID and lock it until the transaction ends.
    ///
    /// A concurrent checkout of the same cart blocks here and then sees the cart
    /// as gone.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn find_for_update(&mut self, id: CartId) -> Result<Option<Cart>, RepositoryError> {
        let row = sqlx::query_as::<_, CartRow>(
            "SELECT id, user_id, created_at FROM bookstore.cart WHERE id = $1 FOR UPDATE",
        )
        .bind(id)
        .fetch_optional(&mut *self.conn)
        .await?;

        Ok(row.map(Into::into))
    }

    /// Get the user's cart, if they have one.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn find_by_user(&mut self, user_id: UserId) -> Result<Option<Cart>, RepositoryError> {
        let row = sqlx::query_as::<_, CartRow>(
            "SELECT id, user_id, created_at FROM bookstore.cart WHERE user_id = $1",
        )
        .bind(user_id)
        .fetch_optional(&mut *self.conn)
        .await?;

        Ok(row.map(Into::into))
    }

    /// Get the user's cart, creating an empty one if they have none.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get_or_create(&mut self, user_id: UserId) -> Result<Cart, RepositoryError> {
        // The no-op update makes RETURNING yield the existing row on conflict.
        let row = sqlx::query_as::<_, CartRow>(
            r"
            INSERT INTO bookstore.cart (user_id)
            VALUES ($1)
            ON CONFLICT (user_id) DO UPDATE SET user_id = EXCLUDED.user_id
            RETURNING id, user_id, created_at
            ",
        )
        .bind(user_id)
        .fetch_one(&mut *self.conn)
        .await?;

        Ok(row.into())
    }

    /// List the cart's lines in insertion order.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn lines(&mut self, cart_id: CartId) -> Result<Vec<CartLine>, RepositoryError> {
        let rows = sqlx::query_as::<_, CartLineRow>(
            r"
            SELECT id, cart_id, book_id, quantity
            FROM bookstore.cart_line
            WHERE cart_id = $1
            ORDER BY id
            ",
        )
        .bind(cart_id)
        .fetch_all(&mut *self.conn)
        .await?;

        Ok(rows.into_iter().map(Into::into).collect())
    }

    /// List the cart's lines and lock them until the transaction ends.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn lines_for_update(
        &mut self,
        cart_id: CartId,
    ) -> Result<Vec<CartLine>, RepositoryError> {
        let rows = sqlx::query_as::<_, CartLineRow>(
            r"
            SELECT id, cart_id, book_id, quantity
            FROM bookstore.cart_line
            WHERE cart_id = $1
            ORDER BY id
            FOR UPDATE
            ",
        )
        .bind(cart_id)
        .fetch_all(&mut *self.conn)
        .await?;

        Ok(rows.into_iter().map(Into::into).collect())
    }

    /// Get the line for a book in a cart.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn find_line(
        &mut self,
        cart_id: CartId,
        book_id: BookId,
    ) -> Result<Option<CartLine>, RepositoryError> {
        let row = sqlx::query_as::<_, CartLineRow>(
            r"
            SELECT id, cart_id, book_id, quantity
            FROM bookstore.cart_line
            WHERE cart_id = $1 AND book_id = $2
            FOR UPDATE
            ",
        )
        .bind(cart_id)
        .bind(book_id)
        .fetch_optional(&mut *self.conn)
        .await?;

        Ok(row.map(Into::into))
    }

    /// Add one copy of a book to the cart.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the book or cart disappeared.
    /// Returns `RepositoryError::Database` for other database errors.
    pub async fn add_book(
        &mut self,
        cart_id: CartId,
        book_id: BookId,
    ) -> Result<AddOutcome, RepositoryError> {
        let quantity = sqlx::query_scalar::<_, i32>(
            r"
            INSERT INTO bookstore.cart_line AS cl (cart_id, book_id, quantity)
            VALUES ($1, $2, 1)
            ON CONFLICT (cart_id, book_id) DO UPDATE
                SET quantity = cl.quantity + 1
            RETURNING quantity
            ",
        )
        .bind(cart_id)
        .bind(book_id)
        .fetch_one(&mut *self.conn)
        .await
        .map_err(|e| RepositoryError::from_constraint(e, "cart line already exists"))?;

        Ok(if quantity == 1 {
            AddOutcome::Added
        } else {
            AddOutcome::Incremented
        })
    }

    /// Decrease a line's quantity by one.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails, including when the
    /// quantity would drop below 1.
    pub async fn decrement_line(&mut self, line_id: CartLineId) -> Result<(), RepositoryError> {
        sqlx::query("UPDATE bookstore.cart_line SET quantity = quantity - 1 WHERE id = $1")
            .bind(line_id)
            .execute(&mut *self.conn)
            .await?;

        Ok(())
    }

    /// Delete a single cart line.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn delete_line(&mut self, line_id: CartLineId) -> Result<(), RepositoryError> {
        sqlx::query("DELETE FROM bookstore.cart_line WHERE id = $1")
            .bind(line_id)
            .execute(&mut *self.conn)
            .await?;

        Ok(())
    }

    /// Delete every line in the cart. Returns the number of lines removed.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn delete_lines(&mut self, cart_id: CartId) -> Result<u64, RepositoryError> {
        let result = sqlx::query("DELETE FROM bookstore.cart_line WHERE cart_id = $1")
            .bind(cart_id)
            .execute(&mut *self.conn)
            .await?;

        Ok(result.rows_affected())
    }

    /// Delete the cart itself.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the cart no longer exists.
    /// Returns `RepositoryError::Database` for other database errors.
    pub async fn delete(&mut self, cart_id: CartId) -> Result<(), RepositoryError> {
        let result = sqlx::query("DELETE FROM bookstore.cart WHERE id = $1")
            .bind(cart_id)
            .execute(&mut *self.conn)
            .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }

        Ok(())
    }
}
