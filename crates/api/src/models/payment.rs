//! Payment card domain types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use bookstore_core::{CardExpiry, CardNumber, PaymentId, UserId};

/// A stored payment card.
///
/// `user_id` is `None` once the card was removed from its owner's wallet but
/// is still referenced by an order.
#[derive(Debug, Clone)]
pub struct Payment {
    pub id: PaymentId,
    pub user_id: Option<UserId>,
    pub card_number: CardNumber,
    pub expiry: CardExpiry,
    pub created_at: DateTime<Utc>,
}

impl Payment {
    /// Returns true if the card is attached to the given user's wallet.
    #[must_use]
    pub fn belongs_to(&self, user_id: UserId) -> bool {
        self.user_id == Some(user_id)
    }
}

/// Validated card details for insertion.
#[derive(Debug, Clone)]
pub struct NewPayment {
    pub card_number: CardNumber,
    pub expiry: CardExpiry,
}

/// Card details as received from a client, before validation.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PaymentInput {
    pub card_number: Option<String>,
    pub expiry_month: Option<u32>,
    pub expiry_year: Option<i32>,
}

/// Client-facing view of a payment card. Never includes the full number.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PaymentSummary {
    pub id: PaymentId,
    /// Card number with all but the last four digits masked.
    pub card_number: String,
    pub last_four: String,
    pub expiry_month: u32,
    pub expiry_year: i32,
    pub created_at: DateTime<Utc>,
}

impl From<&Payment> for PaymentSummary {
    fn from(payment: &Payment) -> Self {
        Self {
            id: payment.id,
            card_number: payment.card_number.masked(),
            last_four: payment.card_number.last_four().to_string(),
            expiry_month: payment.expiry.month,
            expiry_year: payment.expiry.year,
            created_at: payment.created_at,
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_summary_masks_card_number() {
        let payment = Payment {
            id: PaymentId::new(1),
            user_id: Some(UserId::new(7)),
            card_number: CardNumber::parse("4111111111111111").unwrap(),
            expiry: CardExpiry {
                month: 12,
                year: 2030,
            },
            created_at: Utc::now(),
        };

        let summary = PaymentSummary::from(&payment);
        let json = serde_json::to_string(&summary).unwrap();

        assert_eq!(summary.card_number, "************1111");
        assert!(!json.contains("4111111111111111"));
        assert!(payment.belongs_to(UserId::new(7)));
        assert!(!payment.belongs_to(UserId::new(8)));
    }
}
