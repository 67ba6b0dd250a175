//! Cart handlers.

use axum::{
    Json, Router,
    extract::State,
    routing::{get, put},
};
use serde::Serialize;

use bookstore_core::BookId;

use super::MessageResponse;
use super::extract::Path;
use crate::error::Result;
use crate::middleware::RequireUser;
use crate::models::CartView;
use crate::services::carts::{self, CartContents};
use crate::state::AppState;

/// Build the carts router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/carts", get(show_cart))
        .route("/carts/add_book/{book_id}", put(add_book))
        .route("/carts/remove_book/{book_id}", put(remove_book))
}

/// Either the cart with its books or a message explaining why there is none.
#[derive(Debug, Serialize)]
#[serde(untagged)]
pub enum CartResponse {
    Message(MessageResponse),
    Cart(CartView),
}

impl From<CartContents> for CartResponse {
    fn from(contents: CartContents) -> Self {
        match contents {
            CartContents::NoCart => Self::Message(MessageResponse::new("There is no cart for you")),
            CartContents::Empty => Self::Message(MessageResponse::new("Your cart is empty")),
            CartContents::Items(view) => Self::Cart(view),
        }
    }
}

/// Show the user's cart.
///
/// # Errors
///
/// 404 if the user is missing.
pub async fn show_cart(
    RequireUser(user_id): RequireUser,
    State(state): State<AppState>,
) -> Result<Json<CartResponse>> {
    let mut conn = state.pool().acquire().await?;
    let contents = carts::view_cart(&mut conn, user_id).await?;
    Ok(Json(contents.into()))
}

/// Add one copy of a book to the user's cart.
///
/// # Errors
///
/// 404 if the user or book is missing.
pub async fn add_book(
    RequireUser(user_id): RequireUser,
    State(state): State<AppState>,
    Path(book_id): Path<BookId>,
) -> Result<Json<MessageResponse>> {
    let mut tx = state.pool().begin().await?;
    let outcome = carts::add_book(&mut tx, user_id, book_id).await?;
    tx.commit().await?;

    Ok(Json(MessageResponse::new(carts::add_message(outcome))))
}

/// Remove one copy of a book from the user's cart.
///
/// # Errors
///
/// 404 if the user, book or cart is missing or the book is not in the cart.
pub async fn remove_book(
    RequireUser(user_id): RequireUser,
    State(state): State<AppState>,
    Path(book_id): Path<BookId>,
) -> Result<Json<MessageResponse>> {
    let mut tx = state.pool().begin().await?;
    let outcome = carts::remove_book(&mut tx, user_id, book_id).await?;
    tx.commit().await?;

    Ok(Json(MessageResponse::new(outcome.message())))
}
