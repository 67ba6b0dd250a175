//! Order placement, cancellation and listing.

use axum::{
    Json, Router,
    extract::State,
    http::StatusCode,
    routing::{delete, get, post},
};

use bookstore_core::{AddressId, CartId, OrderId, PaymentId};

use super::MessageResponse;
use super::extract::{JsonBody, Path};
use crate::error::{Result, add_breadcrumb};
use crate::middleware::RequireUser;
use crate::models::OrderView;
use crate::services::orders::{self, CreateOrderRequest};
use crate::state::AppState;

/// Build the orders router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/orders", get(list_orders))
        .route(
            "/orders/{cart_id}/address/{address_id}/payment/{payment_id}",
            post(create_order),
        )
        .route("/orders/{order_id}", delete(cancel_order))
}

/// Place an order from the user's cart.
///
/// The body is validated before a transaction is opened. The cart is
/// consumed in the same transaction that writes the order.
///
/// # Errors
///
/// 400 for validation or ownership failures, 404 when a referenced entity is
/// missing.
pub async fn create_order(
    RequireUser(user_id): RequireUser,
    State(state): State<AppState>,
    Path((cart_id, address_id, payment_id)): Path<(CartId, AddressId, PaymentId)>,
    JsonBody(request): JsonBody<CreateOrderRequest>,
) -> Result<(StatusCode, Json<OrderView>)> {
    let new_order = request.validate()?;

    let mut tx = state.pool().begin().await?;
    let view = orders::place_order(
        &mut tx,
        user_id,
        cart_id,
        address_id,
        payment_id,
        &new_order,
    )
    .await?;
    tx.commit().await?;

    let order_id = view.order_info.id.to_string();
    add_breadcrumb("orders", "Order placed", Some(&[("order_id", order_id.as_str())]));

    Ok((StatusCode::CREATED, Json(view)))
}

/// Cancel one of the user's orders.
///
/// # Errors
///
/// 404 when the user or order is missing, 400 when the order belongs to
/// someone else or can no longer be cancelled.
pub async fn cancel_order(
    RequireUser(user_id): RequireUser,
    State(state): State<AppState>,
    Path(order_id): Path<OrderId>,
) -> Result<Json<MessageResponse>> {
    let mut tx = state.pool().begin().await?;
    let outcome = orders::cancel_order(&mut tx, user_id, order_id).await?;
    tx.commit().await?;

    add_breadcrumb("orders", outcome.message(), None);
    Ok(Json(MessageResponse::new(outcome.message())))
}

/// List every order with its books.
///
/// # Errors
///
/// 500 on database failure.
pub async fn list_orders(State(state): State<AppState>) -> Result<Json<Vec<OrderView>>> {
    let mut conn = state.pool().acquire().await?;
    let views = orders::list_orders(&mut conn).await?;
    Ok(Json(views))
}
