//! Shopping cart types.

use chrono::{DateTime, Utc};
use serde::Serialize;

use bookstore_core::{BookId, CartId, CartLineId, UserId};

use super::BookLine;

/// A user's open cart. Each user has at most one.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Cart {
    pub id: CartId,
    pub user_id: UserId,
    pub created_at: DateTime<Utc>,
}

/// One book in a cart. `quantity` is always at least 1.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CartLine {
    pub id: CartLineId,
    pub cart_id: CartId,
    pub book_id: BookId,
    pub quantity: i32,
}

/// A cart with its books, as returned by `GET /carts`.
#[derive(Debug, Clone, Serialize)]
pub struct CartView {
    pub cart_info: Cart,
    pub cart_books: Vec<BookLine>,
}
