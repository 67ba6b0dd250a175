//! User domain types.

use chrono::{DateTime, Utc};
use serde::Deserialize;

use bookstore_core::UserId;

/// A bookstore customer.
#[derive(Debug, Clone)]
pub struct User {
    /// Unique user ID.
    pub id: UserId,
    pub first_name: String,
    pub last_name: String,
    /// Unique email address.
    pub email: String,
    pub phone: Option<String>,
    /// When the user was created.
    pub created_at: DateTime<Utc>,
}

/// User fields accepted by the seed command.
#[derive(Debug, Clone, Deserialize)]
pub struct NewUser {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    #[serde(default)]
    pub phone: Option<String>,
}
