//! Order placement, cancellation and listing.
//!
//! Placement turns a cart into an order in four steps, all on the caller's
//! transaction:
//!
//! 1. [`ownership::verify`] loads the cart, address and payment method,
//!    locks them, and checks that the user owns all three.
//! 2. The order row is inserted.
//! 3. Every cart line is copied to an order line.
//! 4. The cart lines and the cart are deleted.
//!
//! The caller commits. Any error drops the transaction and rolls all of it
//! back.

mod input;
mod ownership;

pub use input::CreateOrderRequest;
pub use ownership::{Verified, check_ownership, verify};

use std::collections::HashMap;

use sqlx::PgConnection;
use tracing::instrument;

use bookstore_core::{
    AddressId, BookId, Cancellation, CartId, OrderId, OrderStatus, PaymentId, UserId,
};

use crate::db::{
    BookRepository, CartRepository, OrderRepository, RepositoryError, UserRepository,
    orders::OrderParties,
};
use crate::models::{Book, BookLine, CartLine, NewOrder, Order, OrderLine, OrderView};
use crate::services::error::ServiceError;

/// A book and quantity copied from a cart line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LineSnapshot {
    pub book_id: BookId,
    pub quantity: i32,
}

impl From<&OrderLine> for LineSnapshot {
    fn from(line: &OrderLine) -> Self {
        Self {
            book_id: line.book_id,
            quantity: line.quantity,
        }
    }
}

/// Copy every cart line, in order, into a line snapshot.
#[must_use]
pub fn snapshot_lines(cart_lines: &[CartLine]) -> Vec<LineSnapshot> {
    cart_lines
        .iter()
        .map(|line| LineSnapshot {
            book_id: line.book_id,
            quantity: line.quantity,
        })
        .collect()
}

/// Pair each snapshot with its book.
///
/// # Errors
///
/// Returns `RepositoryError::DataCorruption` if a line's book is missing.
pub fn attach_books(
    lines: &[LineSnapshot],
    books: &[Book],
) -> Result<Vec<BookLine>, RepositoryError> {
    let by_id: HashMap<BookId, &Book> = books.iter().map(|book| (book.id, book)).collect();

    lines
        .iter()
        .map(|line| {
            let book = by_id.get(&line.book_id).ok_or_else(|| {
                RepositoryError::DataCorruption(format!(
                    "order line references missing book {}",
                    line.book_id
                ))
            })?;
            Ok(BookLine {
                book: (*book).clone(),
                quantity: line.quantity,
            })
        })
        .collect()
}

/// Result of a customer cancellation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CancelOutcome {
    /// A pending order was removed with its lines.
    Deleted,
    /// A processing order is now `Cancelled`.
    Cancelled(Order),
}

impl CancelOutcome {
    /// Message returned to the client.
    #[must_use]
    pub const fn message(&self) -> &'static str {
        match self {
            Self::Deleted => "Your order has been deleted",
            Self::Cancelled(_) => "Your order status changed to Cancelled",
        }
    }
}

/// Place an order from a cart.
///
/// # Errors
///
/// - `ServiceError::NotFound` if the user, cart, address, payment method or a
///   cart line's book is missing, including when a concurrent placement
///   already consumed the cart.
/// - `ServiceError::Forbidden` if the user does not own the cart or payment
///   method, or does not have the address.
/// - `ServiceError::Repository` for database errors.
#[instrument(skip(conn, order), fields(user_id = %user_id, cart_id = %cart_id))]
pub async fn place_order(
    conn: &mut PgConnection,
    user_id: UserId,
    cart_id: CartId,
    address_id: AddressId,
    payment_id: PaymentId,
    order: &NewOrder,
) -> Result<OrderView, ServiceError> {
    let verified = verify(conn, user_id, cart_id, address_id, payment_id).await?;

    let parties = OrderParties {
        user_id: verified.user.id,
        payment_id: verified.payment.id,
        address_id: verified.address.id,
    };
    let placed = OrderRepository::new(conn).insert(parties, order).await?;

    let cart_lines = CartRepository::new(conn).lines_for_update(verified.cart.id).await?;
    let snapshot = snapshot_lines(&cart_lines);
    for line in &snapshot {
        OrderRepository::new(conn)
            .insert_line(placed.id, line.book_id, line.quantity)
            .await
            .map_err(|e| match e {
                RepositoryError::NotFound => ServiceError::not_found("Book"),
                other => other.into(),
            })?;
    }

    CartRepository::new(conn).delete_lines(verified.cart.id).await?;
    CartRepository::new(conn)
        .delete(verified.cart.id)
        .await
        .map_err(|e| match e {
            RepositoryError::NotFound => ServiceError::not_found("Cart"),
            other => other.into(),
        })?;

    let book_ids: Vec<BookId> = snapshot.iter().map(|line| line.book_id).collect();
    let books = BookRepository::new(conn).find_many(&book_ids).await?;
    let order_books = attach_books(&snapshot, &books)?;

    tracing::info!(
        order_id = %placed.id,
        lines = order_books.len(),
        total = %placed.total,
        "Order placed"
    );

    Ok(OrderView {
        order_info: placed,
        order_books,
    })
}

/// Cancel an order on behalf of its owner.
///
/// A `Pending` order is deleted with its lines, a `Processing` order is
/// marked `Cancelled`, and any later status is refused.
///
/// # Errors
///
/// - `ServiceError::NotFound` if the user or order is missing.
/// - `ServiceError::Forbidden` if the order belongs to someone else.
/// - `ServiceError::InvalidState` if the order can no longer be cancelled.
/// - `ServiceError::Repository` for database errors.
#[instrument(skip(conn), fields(user_id = %user_id, order_id = %order_id))]
pub async fn cancel_order(
    conn: &mut PgConnection,
    user_id: UserId,
    order_id: OrderId,
) -> Result<CancelOutcome, ServiceError> {
    let user = UserRepository::new(conn)
        .find(user_id)
        .await?
        .ok_or_else(|| ServiceError::not_found("User"))?;
    let order = OrderRepository::new(conn)
        .find_for_update(order_id)
        .await?
        .ok_or_else(|| ServiceError::not_found("Order"))?;

    if order.user_id != user.id {
        return Err(ServiceError::Forbidden(
            "You can not cancel this order, because it does not belong to you.".to_string(),
        ));
    }

    let outcome = match order.status.cancellation() {
        Cancellation::Delete => {
            let lines = OrderRepository::new(conn).delete(order.id).await?;
            tracing::info!(lines, "Pending order deleted");
            CancelOutcome::Deleted
        }
        Cancellation::MarkCancelled => {
            let cancelled = OrderRepository::new(conn)
                .set_status(order.id, OrderStatus::Cancelled)
                .await?;
            tracing::info!("Processing order cancelled");
            CancelOutcome::Cancelled(cancelled)
        }
        Cancellation::Refuse => return Err(refusal(order.status)),
    };

    Ok(outcome)
}

fn refusal(status: OrderStatus) -> ServiceError {
    let message = if status == OrderStatus::Cancelled {
        "This order is already cancelled."
    } else {
        "You can not cancel this order, because it has already been shipped."
    };
    ServiceError::InvalidState(message.to_string())
}

/// List every order with its books, oldest first.
///
/// # Errors
///
/// Returns `ServiceError::Repository` for database errors.
#[instrument(skip(conn))]
pub async fn list_orders(conn: &mut PgConnection) -> Result<Vec<OrderView>, ServiceError> {
    let orders = OrderRepository::new(conn).list_all().await?;
    let order_ids: Vec<OrderId> = orders.iter().map(|order| order.id).collect();
    let lines = OrderRepository::new(conn).lines_for(&order_ids).await?;

    let mut book_ids: Vec<BookId> = lines.iter().map(|line| line.book_id).collect();
    book_ids.sort_unstable();
    book_ids.dedup();
    let books = BookRepository::new(conn).find_many(&book_ids).await?;

    let mut lines_by_order: HashMap<OrderId, Vec<LineSnapshot>> = HashMap::new();
    for line in &lines {
        lines_by_order
            .entry(line.order_id)
            .or_default()
            .push(line.into());
    }

    orders
        .into_iter()
        .map(|order| -> Result<OrderView, ServiceError> {
            let snapshot = lines_by_order.remove(&order.id).unwrap_or_default();
            Ok(OrderView {
                order_books: attach_books(&snapshot, &books)?,
                order_info: order,
            })
        })
        .collect()
}
