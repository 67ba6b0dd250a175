//! Cart management for the authenticated user.

use sqlx::PgConnection;
use tracing::instrument;

use bookstore_core::{BookId, UserId};

use crate::db::{
    BookRepository, CartRepository, RepositoryError, UserRepository, carts::AddOutcome,
};
use crate::models::{BookLine, CartView};
use crate::services::error::ServiceError;
use crate::services::orders::{attach_books, snapshot_lines};

/// What `GET /carts` found.
#[derive(Debug, Clone)]
pub enum CartContents {
    /// The user has never added a book, or their cart became an order.
    NoCart,
    /// The cart exists but holds no books.
    Empty,
    /// The cart and its books.
    Items(CartView),
}

/// Result of removing one copy of a book.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RemoveOutcome {
    /// The line's quantity went down by one.
    Decremented,
    /// The last copy was removed, and the line with it.
    Removed,
}

impl RemoveOutcome {
    /// Message returned to the client.
    #[must_use]
    pub const fn message(self) -> &'static str {
        match self {
            Self::Decremented => "The book quantity decreased",
            Self::Removed => "The book removed from your cart",
        }
    }
}

/// Message returned to the client after adding a book.
#[must_use]
pub const fn add_message(outcome: AddOutcome) -> &'static str {
    match outcome {
        AddOutcome::Added => "The book added to your cart",
        AddOutcome::Incremented => "The book quantity added",
    }
}

/// Load the user's cart with its books.
///
/// # Errors
///
/// Returns `ServiceError::NotFound` if the user is missing and
/// `ServiceError::Repository` for database errors.
#[instrument(skip(conn))]
pub async fn view_cart(
    conn: &mut PgConnection,
    user_id: UserId,
) -> Result<CartContents, ServiceError> {
    UserRepository::new(conn)
        .find(user_id)
        .await?
        .ok_or_else(|| ServiceError::not_found("User"))?;

    let Some(cart) = CartRepository::new(conn).find_by_user(user_id).await? else {
        return Ok(CartContents::NoCart);
    };

    let lines = CartRepository::new(conn).lines(cart.id).await?;
    if lines.is_empty() {
        return Ok(CartContents::Empty);
    }

    let snapshot = snapshot_lines(&lines);
    let book_ids: Vec<BookId> = snapshot.iter().map(|line| line.book_id).collect();
    let books = BookRepository::new(conn).find_many(&book_ids).await?;
    let cart_books: Vec<BookLine> = attach_books(&snapshot, &books)?;

    Ok(CartContents::Items(CartView {
        cart_info: cart,
        cart_books,
    }))
}

/// Add one copy of a book, creating the cart if the user has none.
///
/// # Errors
///
/// Returns `ServiceError::NotFound` if the user or book is missing and
/// `ServiceError::Repository` for database errors.
#[instrument(skip(conn))]
pub async fn add_book(
    conn: &mut PgConnection,
    user_id: UserId,
    book_id: BookId,
) -> Result<AddOutcome, ServiceError> {
    UserRepository::new(conn)
        .find(user_id)
        .await?
        .ok_or_else(|| ServiceError::not_found("User"))?;
    BookRepository::new(conn)
        .find(book_id)
        .await?
        .ok_or_else(|| ServiceError::not_found("Book"))?;

    let cart = CartRepository::new(conn).get_or_create(user_id).await?;
    let outcome = CartRepository::new(conn)
        .add_book(cart.id, book_id)
        .await
        .map_err(|e| match e {
            RepositoryError::NotFound => ServiceError::not_found("Book"),
            other => other.into(),
        })?;

    tracing::debug!(cart_id = %cart.id, ?outcome, "Book added to cart");
    Ok(outcome)
}

/// Remove one copy of a book from the user's cart.
///
/// # Errors
///
/// Returns `ServiceError::NotFound` if the user, book or cart is missing or
/// the book is not in the cart, and `ServiceError::Repository` for database
/// errors.
#[instrument(skip(conn))]
pub async fn remove_book(
    conn: &mut PgConnection,
    user_id: UserId,
    book_id: BookId,
) -> Result<RemoveOutcome, ServiceError> {
    UserRepository::new(conn)
        .find(user_id)
        .await?
        .ok_or_else(|| ServiceError::not_found("User"))?;
    BookRepository::new(conn)
        .find(book_id)
        .await?
        .ok_or_else(|| ServiceError::not_found("Book"))?;
    let cart = CartRepository::new(conn)
        .find_by_user(user_id)
        .await?
        .ok_or_else(|| ServiceError::not_found("Cart"))?;
    let line = CartRepository::new(conn)
        .find_line(cart.id, book_id)
        .await?
        .ok_or_else(|| ServiceError::NotFound("Book is not in your cart.".to_string()))?;

    if line.quantity > 1 {
        CartRepository::new(conn).decrement_line(line.id).await?;
        Ok(RemoveOutcome::Decremented)
    } else {
        CartRepository::new(conn).delete_line(line.id).await?;
        Ok(RemoveOutcome::Removed)
    }
}
