//! Core types for the bookstore.
//!
//! This module provides type-safe wrappers for common domain concepts.

pub mod card;
pub mod id;
pub mod money;
pub mod status;

pub use card::{CardError, CardExpiry, CardNumber};
pub use id::*;
pub use money::{Amount, AmountError};
pub use status::*;
