//! Ownership checks for order placement.

use sqlx::PgConnection;

use bookstore_core::{AddressId, CartId, PaymentId, UserId};

use crate::db::{AddressRepository, CartRepository, PaymentRepository, UserRepository};
use crate::models::{Address, Cart, Payment, User};
use crate::services::error::ServiceError;

/// Everything an order references, loaded and checked against its owner.
#[derive(Debug, Clone)]
pub struct Verified {
    pub user: User,
    pub cart: Cart,
    pub address: Address,
    pub payment: Payment,
}

/// Check that `user_id` owns the cart and payment and has the address in
/// their list. Cart is checked first, then payment, then address.
///
/// # Errors
///
/// Returns `ServiceError::Forbidden` naming the first resource that does not
/// belong to the user.
pub fn check_ownership(
    user_id: UserId,
    cart: &Cart,
    payment: &Payment,
    address_linked: bool,
) -> Result<(), ServiceError> {
    if cart.user_id != user_id {
        return Err(ServiceError::Forbidden(
            "Cart does not belong to you.".to_string(),
        ));
    }
    if !payment.belongs_to(user_id) {
        return Err(ServiceError::Forbidden(
            "Payment method does not belong to you.".to_string(),
        ));
    }
    if !address_linked {
        return Err(ServiceError::Forbidden(
            "Address does not belong to you.".to_string(),
        ));
    }
    Ok(())
}

/// Load the user, cart, address and payment and check ownership.
///
/// The cart row is locked for update. The user, address, address link and
/// payment rows are share-locked, so a concurrent removal either finishes
/// first and is reported as missing here, or waits until the placement
/// transaction ends. This must run inside that transaction.
///
/// # Errors
///
/// Returns `ServiceError::NotFound` for the first missing entity, in the
/// order user, cart, address, payment, then the errors of
/// [`check_ownership`].
pub async fn verify(
    conn: &mut PgConnection,
    user_id: UserId,
    cart_id: CartId,
    address_id: AddressId,
    payment_id: PaymentId,
) -> Result<Verified, ServiceError> {
    let user = UserRepository::new(conn)
        .find_for_share(user_id)
        .await?
        .ok_or_else(|| ServiceError::not_found("User"))?;
    let cart = CartRepository::new(conn)
        .find_for_update(cart_id)
        .await?
        .ok_or_else(|| ServiceError::not_found("Cart"))?;
    let address = AddressRepository::new(conn)
        .find_for_share(address_id)
        .await?
        .ok_or_else(|| ServiceError::not_found("Address"))?;
    let address_linked = AddressRepository::new(conn)
        .is_linked_for_share(user.id, address.id)
        .await?;
    let payment = PaymentRepository::new(conn)
        .find_for_share(payment_id)
        .await?
        .ok_or_else(|| ServiceError::not_found("Payment method"))?;

    check_ownership(user.id, &cart, &payment, address_linked)?;

    Ok(Verified {
        user,
        cart,
        address,
        payment,
    })
}
