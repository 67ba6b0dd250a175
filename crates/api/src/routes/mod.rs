//! HTTP route handlers.
//!
//! # Route Structure
//!
//! ```text
//! GET    /health                                                     - Liveness
//! GET    /health/ready                                               - Readiness (database)
//!
//! # Orders
//! POST   /orders/{cart_id}/address/{address_id}/payment/{payment_id} - Place order (auth)
//! DELETE /orders/{order_id}                                          - Cancel order (auth)
//! GET    /orders                                                     - List all orders
//!
//! # Carts (auth)
//! GET    /carts                                                      - Current cart
//! PUT    /carts/add_book/{book_id}                                   - Add one copy
//! PUT    /carts/remove_book/{book_id}                                - Remove one copy
//!
//! # Addresses (auth)
//! POST   /addresses                                                  - Add address
//! GET    /addresses                                                  - List addresses
//! PUT    /addresses/{address_id}/default                             - Set default
//! DELETE /addresses/{address_id}                                     - Remove address
//!
//! # Payments (auth)
//! POST   /payments                                                   - Add card
//! GET    /payments                                                   - List cards
//! DELETE /payments/{payment_id}                                      - Remove card
//! ```

pub mod addresses;
pub mod carts;
pub mod extract;
pub mod orders;
pub mod payments;

use std::time::Duration;

use axum::{
    Router,
    extract::State,
    http::{Request, Response},
    middleware::from_fn,
    routing::get,
};
use serde::Serialize;
use tower_http::trace::{DefaultOnResponse, OnResponse, TraceLayer};
use tracing::Span;

use crate::error::{AppError, Result};
use crate::middleware::request_id_middleware;
use crate::state::AppState;

/// `{"message": "..."}` response body.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct MessageResponse {
    pub message: &'static str,
}

impl MessageResponse {
    #[must_use]
    pub const fn new(message: &'static str) -> Self {
        Self { message }
    }
}

/// Build the complete route table.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/health", get(health))
        .route("/health/ready", get(readiness))
        .merge(orders::router())
        .merge(carts::router())
        .merge(addresses::router())
        .merge(payments::router())
}

/// Build the application with request tracing, ready to serve.
///
/// Sentry layers are added by the binary so tests can run without a client.
pub fn app(state: AppState) -> Router {
    routes()
        .layer(from_fn(request_id_middleware))
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(|request: &Request<_>| {
                    tracing::info_span!(
                        "http_request",
                        method = %request.method(),
                        uri = %request.uri(),
                        request_id = tracing::field::Empty,
                        user_id = tracing::field::Empty,
                        status = tracing::field::Empty,
                        latency_ms = tracing::field::Empty,
                    )
                })
                .on_response(|response: &Response<_>, latency: Duration, span: &Span| {
                    span.record("status", response.status().as_u16());
                    span.record(
                        "latency_ms",
                        u64::try_from(latency.as_millis()).unwrap_or(u64::MAX),
                    );
                    DefaultOnResponse::default().on_response(response, latency, span);
                }),
        )
        .with_state(state)
}

/// Liveness health check endpoint.
///
/// Returns "ok" if the server is running. Does not check dependencies.
async fn health() -> &'static str {
    "ok"
}

/// Readiness health check endpoint.
///
/// Returns 503 Service Unavailable if the database is not reachable.
async fn readiness(State(state): State<AppState>) -> Result<&'static str> {
    sqlx::query("SELECT 1")
        .fetch_one(state.pool())
        .await
        .map_err(|e| {
            tracing::warn!(error = %e, "Readiness check failed");
            AppError::Unavailable(e.to_string())
        })?;
    Ok("ok")
}


#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use axum::http::StatusCode;

    use super::test_support::send;

    #[tokio::test]
    async fn test_health_is_ok() {
        let (status, body) = send("GET", "/health", None, None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, "ok");
    }

    #[tokio::test]
    async fn test_readiness_without_database() {
        let (status, body) = send("GET", "/health/ready", None, None).await;
        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(body["error"], "Service unavailable");
    }

    #[tokio::test]
    async fn test_unknown_route_is_not_found() {
        let (status, _) = send("GET", "/books", None, None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }
}
