//! The authenticated user's payment wallet.

use chrono::NaiveDate;
use sqlx::PgConnection;
use tracing::instrument;

use bookstore_core::{CardError, CardExpiry, CardNumber, PaymentId, UserId};

use crate::db::{PaymentRepository, RepositoryError, UserRepository};
use crate::models::{NewPayment, Payment, PaymentInput};
use crate::services::error::{FieldErrors, ServiceError};

/// Result of removing a card from the wallet.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RemovePaymentOutcome {
    /// The card belongs to someone else or was already removed.
    NotOwned,
    /// The card was deleted.
    Deleted,
    /// Orders reference the card, so it was only detached from the wallet.
    Detached,
}

impl RemovePaymentOutcome {
    /// Message returned to the client.
    #[must_use]
    pub const fn message(self) -> &'static str {
        match self {
            Self::NotOwned => "This payment is not in your payment methods",
            Self::Deleted | Self::Detached => {
                "Your card information successfully deleted from payment methods"
            }
        }
    }
}

/// Validate client card fields against `today`.
///
/// # Errors
///
/// Returns every missing or invalid field.
pub fn validate_payment(input: &PaymentInput, today: NaiveDate) -> Result<NewPayment, FieldErrors> {
    let mut errors = FieldErrors::new();

    let card_number = errors
        .require("card_number", input.card_number.as_deref())
        .and_then(|raw| {
            CardNumber::parse(raw)
                .map_err(|e| errors.add("card_number", e.to_string()))
                .ok()
        });

    let month = errors.require("expiry_month", input.expiry_month);
    let year = errors.require("expiry_year", input.expiry_year);
    let expiry = match (month, year) {
        (Some(month), Some(year)) => match CardExpiry::parse(month, year, today) {
            Ok(expiry) => Some(expiry),
            Err(e @ CardError::InvalidMonth) => {
                errors.add("expiry_month", e.to_string());
                None
            }
            Err(e) => {
                errors.add("expiry_year", e.to_string());
                None
            }
        },
        _ => None,
    };

    match (card_number, expiry) {
        (Some(card_number), Some(expiry)) => Ok(NewPayment {
            card_number,
            expiry,
        }),
        _ => Err(errors),
    }
}

/// Attach a card to the user's wallet.
///
/// # Errors
///
/// - `ServiceError::NotFound` if the user is missing.
/// - `ServiceError::Conflict` if the card is already in the wallet.
/// - `ServiceError::Repository` for database errors.
#[instrument(skip(conn, payment))]
pub async fn add_payment(
    conn: &mut PgConnection,
    user_id: UserId,
    payment: &NewPayment,
) -> Result<Payment, ServiceError> {
    UserRepository::new(conn)
        .find(user_id)
        .await?
        .ok_or_else(|| ServiceError::not_found("User"))?;

    PaymentRepository::new(conn)
        .insert(user_id, payment)
        .await
        .map_err(|e| match e {
            RepositoryError::Conflict(_) => ServiceError::Conflict(format!(
                "Card ending in {} is already in your payment methods.",
                payment.card_number.last_four()
            )),
            other => other.into(),
        })
}

/// List the cards in the user's wallet.
///
/// # Errors
///
/// Returns `ServiceError::NotFound` if the user is missing and
/// `ServiceError::Repository` for database errors.
#[instrument(skip(conn))]
pub async fn list_payments(
    conn: &mut PgConnection,
    user_id: UserId,
) -> Result<Vec<Payment>, ServiceError> {
    UserRepository::new(conn)
        .find(user_id)
        .await?
        .ok_or_else(|| ServiceError::not_found("User"))?;

    Ok(PaymentRepository::new(conn).list_for_user(user_id).await?)
}

/// Remove a card from the user's wallet.
///
/// Cards referenced by orders are detached rather than deleted so the orders
/// keep their payment. The card is locked first, so an order placed with it
/// concurrently is either committed before the reference check or sees the
/// removal.
///
/// # Errors
///
/// Returns `ServiceError::NotFound` if the payment or user is missing and
/// `ServiceError::Repository` for database errors.
#[instrument(skip(conn))]
pub async fn remove_payment(
    conn: &mut PgConnection,
    user_id: UserId,
    payment_id: PaymentId,
) -> Result<RemovePaymentOutcome, ServiceError> {
    let payment = PaymentRepository::new(conn)
        .find_for_update(payment_id)
        .await?
        .ok_or_else(|| ServiceError::not_found("Payment"))?;
    UserRepository::new(conn)
        .find(user_id)
        .await?
        .ok_or_else(|| ServiceError::not_found("User"))?;

    if !payment.belongs_to(user_id) {
        return Ok(RemovePaymentOutcome::NotOwned);
    }

    if PaymentRepository::new(conn).is_referenced(payment.id).await? {
        PaymentRepository::new(conn).detach(payment.id).await?;
        Ok(RemovePaymentOutcome::Detached)
    } else {
        PaymentRepository::new(conn).delete(payment.id).await?;
        Ok(RemovePaymentOutcome::Deleted)
    }
}
