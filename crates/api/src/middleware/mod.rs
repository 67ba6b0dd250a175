//! HTTP middleware stack for the API.
//!
//! # Middleware Order (bottom to top in Router)
//!
//! 1. Sentry layers (hub per request, HTTP transaction)
//! 2. `TraceLayer` (request span with method, uri, `request_id`, `user_id`)
//! 3. Request ID (add unique ID to each request)
//!
//! Authentication is the [`RequireUser`] extractor. Routes that do not take
//! it, such as `GET /orders` and the health checks, are public.

pub mod auth;
pub mod request_id;

pub use auth::RequireUser;
pub use request_id::request_id_middleware;
