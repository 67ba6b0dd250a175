//! Bookstore API library.
//!
//! JSON REST service for carts, addresses, payment cards and orders. The
//! binary in `main.rs` only wires configuration, telemetry and the listener;
//! everything else lives here so the CLI and integration tests can reuse it.

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod config;
pub mod db;
pub mod error;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod services;
pub mod state;
