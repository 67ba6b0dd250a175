//! Address domain types.
//!
//! Addresses are shared: identical addresses are stored once and linked to
//! every user who added them through `user_address`.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use bookstore_core::AddressId;

/// A mailing address.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Address {
    pub id: AddressId,
    pub line1: String,
    pub line2: Option<String>,
    /// House or apartment number.
    pub number: Option<String>,
    pub city: String,
    pub state: String,
    pub country: String,
    pub zipcode: String,
    pub created_at: DateTime<Utc>,
}

/// An address as it appears in one user's address list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UserAddress {
    #[serde(flatten)]
    pub address: Address,
    /// Whether this is the user's default address.
    pub is_default: bool,
}

/// Validated address fields, used both for lookup and insert.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewAddress {
    pub line1: String,
    pub line2: Option<String>,
    pub number: Option<String>,
    pub city: String,
    pub state: String,
    pub country: String,
    pub zipcode: String,
}

/// Address fields as received from a client, before validation.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AddressInput {
    pub line1: Option<String>,
    pub line2: Option<String>,
    pub number: Option<String>,
    pub city: Option<String>,
    pub state: Option<String>,
    pub country: Option<String>,
    pub zipcode: Option<String>,
}
