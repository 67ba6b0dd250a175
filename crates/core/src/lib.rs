//! Bookstore Core - Shared types library.
//!
//! This crate provides common types used across all bookstore components:
//! - `api` - JSON REST service (carts, addresses, payments, orders)
//! - `cli` - Command-line tools for migrations, seeding and dev tokens
//!
//! # Architecture
//!
//! The core crate contains only types and pure domain rules - no I/O, no
//! database access, no HTTP. The order status machine lives here so every
//! consumer agrees on which transitions are legal.
//!
//! # Modules
//!
//! - [`types`] - Typed IDs, money amounts, payment cards and order statuses

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod types;

pub use types::*;
