//! Payment wallet handlers.

use axum::{
    Json, Router,
    extract::State,
    http::StatusCode,
    routing::{delete, get},
};
use chrono::Utc;

use bookstore_core::PaymentId;

use super::MessageResponse;
use super::extract::{JsonBody, Path};
use crate::error::Result;
use crate::middleware::RequireUser;
use crate::models::{PaymentInput, PaymentSummary};
use crate::services::payments;
use crate::state::AppState;

/// Build the payments router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/payments", get(list_payments).post(add_payment))
        .route("/payments/{payment_id}", delete(remove_payment))
}

/// Add a card to the user's wallet. The response masks the card number.
///
/// # Errors
///
/// 400 for invalid card details or a card already in the wallet, 404 if the
/// user is missing.
pub async fn add_payment(
    RequireUser(user_id): RequireUser,
    State(state): State<AppState>,
    JsonBody(input): JsonBody<PaymentInput>,
) -> Result<(StatusCode, Json<PaymentSummary>)> {
    let payment = payments::validate_payment(&input, Utc::now().date_naive())?;

    let mut tx = state.pool().begin().await?;
    let stored = payments::add_payment(&mut tx, user_id, &payment).await?;
    tx.commit().await?;

    Ok((StatusCode::CREATED, Json(PaymentSummary::from(&stored))))
}

/// List the cards in the user's wallet.
///
/// # Errors
///
/// 404 if the user is missing.
pub async fn list_payments(
    RequireUser(user_id): RequireUser,
    State(state): State<AppState>,
) -> Result<Json<Vec<PaymentSummary>>> {
    let mut conn = state.pool().acquire().await?;
    let wallet = payments::list_payments(&mut conn, user_id).await?;
    Ok(Json(wallet.iter().map(PaymentSummary::from).collect()))
}

/// Remove a card from the user's wallet.
///
/// # Errors
///
/// 404 if the payment or user is missing.
pub async fn remove_payment(
    RequireUser(user_id): RequireUser,
    State(state): State<AppState>,
    Path(payment_id): Path<PaymentId>,
) -> Result<Json<MessageResponse>> {
    let mut tx = state.pool().begin().await?;
    let outcome = payments::remove_payment(&mut tx, user_id, payment_id).await?;
    tx.commit().await?;

    Ok(Json(MessageResponse::new(outcome.message())))
}
