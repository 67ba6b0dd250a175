//! Development token command.
//!
//! # Environment Variables
//!
//! - `BOOKSTORE_TOKEN_SECRET` - Signing secret shared with the API
//! - `BOOKSTORE_TOKEN_TTL_MINUTES` - Token lifetime (default 60)

use thiserror::Error;

use bookstore_api::config::{ConfigError, TokenConfig};
use bookstore_api::services::auth::{AuthError, TokenSigner};
use bookstore_core::UserId;

/// Errors that can occur while issuing a token.
#[derive(Debug, Error)]
pub enum TokenError {
    /// Token settings are missing or invalid.
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Signing failed.
    #[error("Signing error: {0}")]
    Auth(#[from] AuthError),
}

/// Issue a bearer token for `user_id`.
///
/// The user is not looked up; the API rejects tokens for unknown users when
/// they are used.
///
/// # Errors
///
/// Returns an error if the token settings are invalid.
pub fn issue(user_id: UserId) -> Result<String, TokenError> {
    let config = TokenConfig::from_env()?;
    let signer = TokenSigner::from_config(&config);

    let token = signer.issue(user_id)?;
    tracing::info!(%user_id, ttl_minutes = config.ttl_minutes, "Token issued");
    Ok(token)
}
