//! Order domain types.

use chrono::{DateTime, Utc};
use serde::Serialize;

use bookstore_core::{
    AddressId, Amount, BookId, OrderId, OrderLineId, OrderStatus, PaymentId, ShippingMethod,
    UserId,
};

use super::BookLine;

/// A placed order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Order {
    pub id: OrderId,
    pub user_id: UserId,
    pub payment_id: PaymentId,
    pub address_id: AddressId,
    pub status: OrderStatus,
    pub shipping_method: ShippingMethod,
    pub subtotal: Amount,
    pub tax: Amount,
    pub shipping_cost: Amount,
    pub total: Amount,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A book snapshot copied from a cart line at checkout.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OrderLine {
    pub id: OrderLineId,
    pub order_id: OrderId,
    pub book_id: BookId,
    pub quantity: i32,
}

/// Validated order fields supplied by the client.
///
/// The owning user, payment and address come from the request path and the
/// bearer token, not from here.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewOrder {
    pub shipping_method: ShippingMethod,
    pub subtotal: Amount,
    pub tax: Amount,
    pub shipping_cost: Amount,
    pub total: Amount,
    pub status: OrderStatus,
}

/// An order with its books, serialized as `{"order_info", "order_books"}`.
#[derive(Debug, Clone, Serialize)]
pub struct OrderView {
    pub order_info: Order,
    pub order_books: Vec<BookLine>,
}
