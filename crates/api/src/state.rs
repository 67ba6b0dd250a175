//! Application state shared across handlers.

use std::sync::Arc;

use sqlx::PgPool;

use crate::config::ApiConfig;
use crate::services::auth::TokenSigner;

/// Application state shared across all handlers.
///
/// This struct is cheaply cloneable via `Arc` and provides access to
/// the database pool and the bearer token verifier.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    pool: PgPool,
    tokens: TokenSigner,
}

impl AppState {
    /// Create a new application state.
    ///
    /// # Arguments
    ///
    /// * `pool` - `PostgreSQL` connection pool
    /// * `tokens` - Bearer token signer/verifier
    #[must_use]
    pub fn new(pool: PgPool, tokens: TokenSigner) -> Self {
        Self {
            inner: Arc::new(AppStateInner { pool, tokens }),
        }
    }

    /// Create the state from loaded configuration.
    #[must_use]
    pub fn from_config(config: &ApiConfig, pool: PgPool) -> Self {
        Self::new(pool, TokenSigner::from_config(&config.token))
    }

    /// Get a reference to the database connection pool.
    #[must_use]
    pub fn pool(&self) -> &PgPool {
        &self.inner.pool
    }

    /// Get a reference to the bearer token signer.
    #[must_use]
    pub fn tokens(&self) -> &TokenSigner {
        &self.inner.tokens
    }
}
