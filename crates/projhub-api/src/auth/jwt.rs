//! JWT token generation and validation
//!
//! Bearer tokens are HS256-signed and carry only the user id plus issue and
//! expiry timestamps. They are never stored server-side: a token stays valid
//! until `exp` passes or the signing secret changes.

use chrono::Utc;
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use projhub_core::AuthConfig;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Lifetime of every issued token (24 hours)
pub const TOKEN_LIFETIME_SECS: i64 = 24 * 60 * 60;

/// JWT claims
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    /// Id of the authenticated user
    pub user_id: i64,
    /// Issued at (Unix epoch seconds)
    pub iat: i64,
    /// Expiration (Unix epoch seconds)
    pub exp: i64,
}

/// JWT token generation and validation errors
#[derive(Debug, Error)]
pub enum JwtError {
    #[error("Failed to encode JWT: {0}")]
    EncodingError(#[from] jsonwebtoken::errors::Error),

    #[error("Invalid token format")]
    InvalidToken,

    #[error("Token has expired")]
    ExpiredToken,

    #[error("Invalid token signature")]
    InvalidSignature,
}

/// Signing configuration, built once from [`AuthConfig`]
#[derive(Clone)]
pub struct JwtConfig {
    secret: String,
}

impl JwtConfig {
    pub fn new(secret: impl Into<String>) -> Self {
        Self {
            secret: secret.into(),
        }
    }

    pub fn from_auth_config(config: &AuthConfig) -> Self {
        Self::new(config.jwt_secret.clone())
    }
}

impl std::fmt::Debug for JwtConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JwtConfig")
            .field("secret", &"<redacted>")
            .finish()
    }
}

/// Issue a token for `user_id`, valid for [`TOKEN_LIFETIME_SECS`]
pub fn issue_token(config: &JwtConfig, user_id: i64) -> Result<String, JwtError> {
    let now = Utc::now().timestamp();
    encode_token(
        config,
        &Claims {
            user_id,
            iat: now,
            exp: now + TOKEN_LIFETIME_SECS,
        },
    )
}

/// Sign arbitrary claims
pub fn encode_token(config: &JwtConfig, claims: &Claims) -> Result<String, JwtError> {
    let token = encode(
        &Header::new(Algorithm::HS256),
        claims,
        &EncodingKey::from_secret(config.secret.as_bytes()),
    )?;

    Ok(token)
}

/// Validate a token and return its claims.
///
/// Expiry is checked with zero leeway: a token is rejected once
/// `exp <= now`.
pub fn validate_token(config: &JwtConfig, token: &str) -> Result<Claims, JwtError> {
    let mut validation = Validation::new(Algorithm::HS256);
    validation.leeway = 0;
    validation.set_required_spec_claims(&["exp"]);

    let token_data = decode::<Claims>(
        token,
        &DecodingKey::from_secret(config.secret.as_bytes()),
        &validation,
    )
    .map_err(|e| match e.kind() {
        jsonwebtoken::errors::ErrorKind::ExpiredSignature => JwtError::ExpiredToken,
        jsonwebtoken::errors::ErrorKind::InvalidSignature => JwtError::InvalidSignature,
        _ => JwtError::InvalidToken,
    })?;

    // the library only rejects exp < now
    if token_data.claims.exp <= Utc::now().timestamp() {
        return Err(JwtError::ExpiredToken);
    }

    Ok(token_data.claims)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> JwtConfig {
        JwtConfig::new("test-secret")
    }

    #[test]
    fn test_issue_and_validate_token() {
        let token = issue_token(&config(), 42).expect("Failed to issue token");
        let claims = validate_token(&config(), &token).expect("Failed to validate token");

        assert_eq!(claims.user_id, 42);
        assert_eq!(claims.exp - claims.iat, TOKEN_LIFETIME_SECS);
    }

    #[test]
    fn test_invalid_token() {
        let result = validate_token(&config(), "invalid.token.here");
        assert!(matches!(result, Err(JwtError::InvalidToken)));
    }

    #[test]
    fn test_wrong_secret() {
        let token = issue_token(&JwtConfig::new("secret1"), 1).unwrap();
        let result = validate_token(&JwtConfig::new("secret2"), &token);
        assert!(matches!(result, Err(JwtError::InvalidSignature)));
    }

    #[test]
    fn test_expired_token() {
        let now = Utc::now().timestamp();
        let token = encode_token(
            &config(),
            &Claims {
                user_id: 1,
                iat: now - 7200,
                exp: now - 1,
            },
        )
        .unwrap();

        let result = validate_token(&config(), &token);
        assert!(matches!(result, Err(JwtError::ExpiredToken)));
    }

    #[test]
    fn test_token_expiring_now_is_rejected() {
        let now = Utc::now().timestamp();
        let token = encode_token(
            &config(),
            &Claims {
                user_id: 1,
                iat: now - 60,
                exp: now,
            },
        )
        .unwrap();

        assert!(matches!(
            validate_token(&config(), &token),
            Err(JwtError::ExpiredToken)
        ));
    }

    #[test]
    fn test_debug_hides_secret() {
        assert!(!format!("{:?}", JwtConfig::new("hunter2")).contains("hunter2"));
    }
}
