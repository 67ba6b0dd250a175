//! Order request validation.
//!
//! Every field is checked before any database access so a bad payload never
//! opens a transaction.

use rust_decimal::Decimal;
use serde::Deserialize;

use bookstore_core::{Amount, OrderStatus, ShippingMethod};

use crate::models::NewOrder;
use crate::services::error::FieldErrors;

/// Body of `POST /orders/{cart_id}/address/{address_id}/payment/{payment_id}`.
///
/// Amounts accept JSON numbers or decimal strings.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CreateOrderRequest {
    pub shipping_method: Option<String>,
    pub subtotal: Option<Decimal>,
    pub tax: Option<Decimal>,
    pub shipping_cost: Option<Decimal>,
    pub total: Option<Decimal>,
    pub status: Option<String>,
}

impl CreateOrderRequest {
    /// Validate the request into a [`NewOrder`].
    ///
    /// All four amounts and the shipping method are required; `status`
    /// defaults to `Pending`.
    ///
    /// # Errors
    ///
    /// Returns every field problem found, not just the first.
    pub fn validate(&self) -> Result<NewOrder, FieldErrors> {
        let mut errors = FieldErrors::new();

        let shipping_method = errors
            .require("shipping_method", self.shipping_method.as_deref())
            .and_then(|raw| {
                parse_choice(&mut errors, "shipping_method", raw, &ShippingMethod::ALL)
            });
        let subtotal = amount(&mut errors, "subtotal", self.subtotal);
        let tax = amount(&mut errors, "tax", self.tax);
        let shipping_cost = amount(&mut errors, "shipping_cost", self.shipping_cost);
        let total = amount(&mut errors, "total", self.total);
        let status = match self.status.as_deref() {
            None => Some(OrderStatus::default()),
            Some(raw) => parse_choice(&mut errors, "status", raw, &OrderStatus::ALL),
        };

        match (shipping_method, subtotal, tax, shipping_cost, total, status) {
            (
                Some(shipping_method),
                Some(subtotal),
                Some(tax),
                Some(shipping_cost),
                Some(total),
                Some(status),
            ) if errors.is_empty() => Ok(NewOrder {
                shipping_method,
                subtotal,
                tax,
                shipping_cost,
                total,
                status,
            }),
            _ => Err(errors),
        }
    }
}

fn amount(errors: &mut FieldErrors, field: &'static str, value: Option<Decimal>) -> Option<Amount> {
    let value = errors.require(field, value)?;
    Amount::parse(value)
        .map_err(|e| errors.add(field, e.to_string()))
        .ok()
}

fn parse_choice<T>(
    errors: &mut FieldErrors,
    field: &'static str,
    raw: &str,
    choices: &[T],
) -> Option<T>
where
    T: Copy + std::str::FromStr + std::fmt::Display,
{
    if let Ok(value) = raw.parse() {
        return Some(value);
    }

    let allowed: Vec<String> = choices.iter().map(ToString::to_string).collect();
    errors.add(field, format!("Must be one of: {}.", allowed.join(", ")));
    None
}
