//! Business logic services for the bookstore API.
//!
//! # Services
//!
//! - `auth` - Bearer token signing and verification
//! - `orders` - Order placement, cancellation and listing
//! - `carts` - The user's cart
//! - `addresses` - The user's address book
//! - `payments` - The user's payment wallet
//!
//! Workflow functions take `&mut PgConnection`. Handlers that change data
//! open a transaction, pass `&mut tx`, and commit once the service returns.

pub mod addresses;
pub mod auth;
pub mod carts;
pub mod error;
pub mod orders;
pub mod payments;

pub use error::{FieldErrors, ServiceError};
