//! Order status and shipping enums.
//!
//! The order lifecycle is a small state machine:
//!
//! ```text
//! Pending ──► Processing ──► Shipped ──► Delivered
//!    │            │
//!    ▼            ▼
//! (deleted)   Cancelled
//! ```
//!
//! A customer cancellation of a `Pending` order removes it outright; a
//! `Processing` order is kept and marked `Cancelled`. Anything further along
//! can no longer be cancelled.

use serde::{Deserialize, Serialize};

/// Order status.
///
/// Serialized with the variant name (`"Pending"`, `"Processing"`, ...), stored
/// as the `bookstore.order_status` enum.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[cfg_attr(feature = "postgres", derive(sqlx::Type))]
#[cfg_attr(
    feature = "postgres",
    sqlx(type_name = "bookstore.order_status", rename_all = "snake_case")
)]
pub enum OrderStatus {
    #[default]
    Pending,
    Processing,
    Shipped,
    Delivered,
    Cancelled,
}

/// What a customer cancellation request does to an order in a given status.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Cancellation {
    /// Remove the order and its lines entirely.
    Delete,
    /// Keep the order and its lines, set the status to `Cancelled`.
    MarkCancelled,
    /// The order can no longer be cancelled.
    Refuse,
}

impl OrderStatus {
    /// All statuses, in lifecycle order.
    pub const ALL: [Self; 5] = [
        Self::Pending,
        Self::Processing,
        Self::Shipped,
        Self::Delivered,
        Self::Cancelled,
    ];

    /// Decide how a customer cancellation applies to this status.
    #[must_use]
    pub const fn cancellation(self) -> Cancellation {
        match self {
            Self::Pending => Cancellation::Delete,
            Self::Processing => Cancellation::MarkCancelled,
            Self::Shipped | Self::Delivered | Self::Cancelled => Cancellation::Refuse,
        }
    }

    /// The wire name of this status.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "Pending",
            Self::Processing => "Processing",
            Self::Shipped => "Shipped",
            Self::Delivered => "Delivered",
            Self::Cancelled => "Cancelled",
        }
    }
}

impl std::fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for OrderStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|status| status.as_str() == s)
            .ok_or_else(|| format!("invalid order status: {s}"))
    }
}

/// How an order reaches the customer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "postgres", derive(sqlx::Type))]
#[cfg_attr(
    feature = "postgres",
    sqlx(type_name = "bookstore.shipping_method", rename_all = "snake_case")
)]
pub enum ShippingMethod {
    /// Collected by the customer at the store.
    InStore,
    Standard,
    Express,
}

impl ShippingMethod {
    /// All shipping methods.
    pub const ALL: [Self; 3] = [Self::InStore, Self::Standard, Self::Express];

    /// The wire name of this shipping method.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::InStore => "InStore",
            Self::Standard => "Standard",
            Self::Express => "Express",
        }
    }
}

impl std::fmt::Display for ShippingMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for ShippingMethod {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|method| method.as_str() == s)
            .ok_or_else(|| format!("invalid shipping method: {s}"))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_pending_cancellation_deletes() {
        assert_eq!(OrderStatus::Pending.cancellation(), Cancellation::Delete);
    }

    #[test]
    fn test_processing_cancellation_marks_cancelled() {
        assert_eq!(
            OrderStatus::Processing.cancellation(),
            Cancellation::MarkCancelled
        );
    }

    #[test]
    fn test_later_statuses_refuse_cancellation() {
        for status in [
            OrderStatus::Shipped,
            OrderStatus::Delivered,
            OrderStatus::Cancelled,
        ] {
            assert_eq!(status.cancellation(), Cancellation::Refuse, "{status}");
        }
    }

    #[test]
    fn test_default_status_is_pending() {
        assert_eq!(OrderStatus::default(), OrderStatus::Pending);
    }

    #[test]
    fn test_status_wire_names() {
        assert_eq!(
            serde_json::to_string(&OrderStatus::Processing).unwrap(),
            "\"Processing\""
        );
        assert_eq!("Shipped".parse::<OrderStatus>(), Ok(OrderStatus::Shipped));
        assert!("shipped".parse::<OrderStatus>().is_err());
    }

    #[test]
    fn test_shipping_method_parse() {
        assert_eq!("InStore".parse::<ShippingMethod>(), Ok(ShippingMethod::InStore));
        assert!("Teleport".parse::<ShippingMethod>().is_err());
    }
}
