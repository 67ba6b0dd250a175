//! Authentication error types.

use thiserror::Error;

/// Errors that can occur while checking a bearer token.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AuthError {
    /// No `Authorization: Bearer` header, or an empty token.
    #[error("token missing from authorization headers")]
    MissingToken,

    /// Malformed token, wrong algorithm, or bad signature.
    #[error("invalid token")]
    Invalid,

    /// Well-formed and correctly signed, but past its `exp`.
    #[error("token is expired")]
    Expired,

    /// The signing key was rejected by HMAC.
    #[error("invalid signing key")]
    Key,
}
