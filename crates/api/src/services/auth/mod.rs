//! Bearer token signing and verification.
//!
//! Tokens are compact HS256 JWS values: `header.claims.signature`, each part
//! base64url without padding. Claims carry the user id as a string `sub`,
//! plus `iat` and `exp` as Unix seconds.
//!
//! Only verification is needed to serve requests. [`TokenSigner::issue`]
//! exists for the CLI and for tests.

mod error;

pub use error::AuthError;

use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use chrono::{DateTime, Duration, Utc};
use hmac::{Hmac, Mac};
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use sha2::Sha256;

use bookstore_core::UserId;

use crate::config::TokenConfig;

type HmacSha256 = Hmac<Sha256>;

/// JOSE header for every issued token.
const HEADER: &str = r#"{"alg":"HS256","typ":"JWT"}"#;

#[derive(Debug, Deserialize)]
struct Header {
    alg: String,
}

#[derive(Debug, Serialize, Deserialize)]
struct Claims {
    sub: String,
    iat: i64,
    exp: i64,
}

/// Issues and verifies bearer tokens with a shared secret.
#[derive(Clone)]
pub struct TokenSigner {
    secret: SecretString,
    ttl: Duration,
}

impl std::fmt::Debug for TokenSigner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenSigner")
            .field("secret", &"[REDACTED]")
            .field("ttl", &self.ttl)
            .finish()
    }
}

impl TokenSigner {
    /// Create a signer from a secret and a token lifetime.
    #[must_use]
    pub const fn new(secret: SecretString, ttl: Duration) -> Self {
        Self { secret, ttl }
    }

    /// Create a signer from the token configuration.
    #[must_use]
    pub fn from_config(config: &TokenConfig) -> Self {
        Self::new(config.secret.clone(), Duration::minutes(config.ttl_minutes))
    }

    /// Issue a token for `user_id`, valid from now for the configured TTL.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::Key` if the secret cannot key HMAC.
    pub fn issue(&self, user_id: UserId) -> Result<String, AuthError> {
        self.issue_at(user_id, Utc::now())
    }

    /// Issue a token as if the current time were `now`.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::Key` if the secret cannot key HMAC.
    pub fn issue_at(&self, user_id: UserId, now: DateTime<Utc>) -> Result<String, AuthError> {
        let claims = Claims {
            sub: user_id.to_string(),
            iat: now.timestamp(),
            exp: (now + self.ttl).timestamp(),
        };
        let claims = serde_json::to_vec(&claims).map_err(|_| AuthError::Invalid)?;

        let signing_input = format!(
            "{}.{}",
            URL_SAFE_NO_PAD.encode(HEADER),
            URL_SAFE_NO_PAD.encode(claims)
        );
        let signature = self.mac(&signing_input)?.finalize().into_bytes();

        Ok(format!(
            "{signing_input}.{}",
            URL_SAFE_NO_PAD.encode(signature)
        ))
    }

    /// Verify a token and return the user it was issued for.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::Invalid` for malformed or badly signed tokens and
    /// `AuthError::Expired` for correctly signed tokens past their expiry.
    pub fn verify(&self, token: &str) -> Result<UserId, AuthError> {
        self.verify_at(token, Utc::now())
    }

    /// Verify a token as if the current time were `now`.
    ///
    /// # Errors
    ///
    /// See [`TokenSigner::verify`].
    pub fn verify_at(&self, token: &str, now: DateTime<Utc>) -> Result<UserId, AuthError> {
        let (signing_input, signature) = token.rsplit_once('.').ok_or(AuthError::Invalid)?;
        let (header, claims) = signing_input
            .split_once('.')
            .ok_or(AuthError::Invalid)?;
        if claims.contains('.') {
            return Err(AuthError::Invalid);
        }

        let header: Header = decode_part(header)?;
        if header.alg != "HS256" {
            return Err(AuthError::Invalid);
        }

        let signature = URL_SAFE_NO_PAD
            .decode(signature)
            .map_err(|_| AuthError::Invalid)?;
        self.mac(signing_input)?
            .verify_slice(&signature)
            .map_err(|_| AuthError::Invalid)?;

        let claims: Claims = decode_part(claims)?;
        if claims.exp <= now.timestamp() {
            return Err(AuthError::Expired);
        }

        claims.sub.parse().map_err(|_| AuthError::Invalid)
    }

    fn mac(&self, signing_input: &str) -> Result<HmacSha256, AuthError> {
        let mut mac = HmacSha256::new_from_slice(self.secret.expose_secret().as_bytes())
            .map_err(|_| AuthError::Key)?;
        mac.update(signing_input.as_bytes());
        Ok(mac)
    }
}

fn decode_part<T: serde::de::DeserializeOwned>(part: &str) -> Result<T, AuthError> {
    let bytes = URL_SAFE_NO_PAD.decode(part).map_err(|_| AuthError::Invalid)?;
    serde_json::from_slice(&bytes).map_err(|_| AuthError::Invalid)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn signer() -> TokenSigner {
        TokenSigner::new(
            SecretString::from("kP9#vX2$mQ7!wR4@zL8&nT1*bY6^cF3%"),
            Duration::minutes(60),
        )
    }

    #[test]
    fn test_issue_then_verify() {
        let signer = signer();
        let token = signer.issue(UserId::new(42)).unwrap();
        assert_eq!(signer.verify(&token), Ok(UserId::new(42)));
    }

    #[test]
    fn test_token_has_three_parts() {
        let token = signer().issue(UserId::new(1)).unwrap();
        assert_eq!(token.split('.').count(), 3);
    }

    #[test]
    fn test_expired_token() {
        let signer = signer();
        let issued = Utc::now() - Duration::minutes(61);
        let token = signer.issue_at(UserId::new(1), issued).unwrap();
        assert_eq!(signer.verify(&token), Err(AuthError::Expired));
    }

    #[test]
    fn test_wrong_secret_is_invalid() {
        let token = signer().issue(UserId::new(1)).unwrap();
        let other = TokenSigner::new(
            SecretString::from("Zq8!Lm3@Wx5#Rt7$Yp2%Hv9^Kd4&Bn6*"),
            Duration::minutes(60),
        );
        assert_eq!(other.verify(&token), Err(AuthError::Invalid));
    }

    #[test]
    fn test_tampered_claims_are_invalid() {
        let signer = signer();
        let token = signer.issue(UserId::new(1)).unwrap();
        let forged_claims = URL_SAFE_NO_PAD.encode(br#"{"sub":"2","iat":0,"exp":9999999999}"#);

        let mut parts: Vec<&str> = token.split('.').collect();
        parts[1] = &forged_claims;
        let forged = parts.join(".");

        assert_eq!(signer.verify(&forged), Err(AuthError::Invalid));
    }

    #[test]
    fn test_expired_but_forged_is_invalid_not_expired() {
        let signer = signer();
        let token = signer
            .issue_at(UserId::new(1), Utc::now() - Duration::days(1))
            .unwrap();
        let broken = format!("{token}x");
        assert_eq!(signer.verify(&broken), Err(AuthError::Invalid));
    }

    #[test]
    fn test_garbage_is_invalid() {
        let signer = signer();
        assert_eq!(signer.verify("not-a-token"), Err(AuthError::Invalid));
        assert_eq!(signer.verify("a.b.c"), Err(AuthError::Invalid));
        assert_eq!(signer.verify("a.b.c.d"), Err(AuthError::Invalid));
    }

    #[test]
    fn test_debug_redacts_secret() {
        let debug = format!("{:?}", signer());
        assert!(debug.contains("[REDACTED]"));
        assert!(!debug.contains("kP9#vX2"));
    }
}
