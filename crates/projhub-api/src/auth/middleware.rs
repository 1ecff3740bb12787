//! Authentication middleware for protecting routes
//!
//! Runs the auth guard on every request to the protected router:
//!
//! 1. **Extract** the token from `Authorization: <scheme> <token>`. A missing
//!    or non-UTF-8 header, or one that does not split into exactly two parts,
//!    is `MissingToken`.
//! 2. **Verify** signature and expiry. Any failure is `InvalidToken`; the
//!    precise reason only goes to the audit log.
//! 3. **Resolve** the user id against the credential store. A deleted user is
//!    `InvalidToken` as well.
//! 4. **Admit** the request with a [`CurrentUser`] extension.

use super::jwt::{validate_token, JwtError};
use super::password::PasswordError;
use crate::audit::{audit_log, AuditContext, AuditEvent};
use crate::error::ApiError;
use crate::state::AppState;
use axum::{
    extract::{Request, State},
    http::{header, HeaderMap, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};
use chrono::{DateTime, Utc};
use projhub_core::{ProjhubError, User};
use serde::Serialize;
use std::sync::Arc;
use thiserror::Error;

/// Identity admitted by the auth guard.
///
/// Handlers receive it as `Extension<CurrentUser>`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CurrentUser {
    pub id: i64,
    pub username: String,
    pub created_at: DateTime<Utc>,
}

impl From<User> for CurrentUser {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            username: user.username,
            created_at: user.created_at,
        }
    }
}

/// Authentication errors
#[derive(Debug, Error)]
pub enum AuthError {
    #[error("Token is missing")]
    MissingToken,

    #[error("Token is invalid: {0}")]
    InvalidToken(String),

    #[error("Invalid username or password")]
    BadCredentials,

    #[error("User already exists: {0}")]
    DuplicateIdentity(String),

    #[error(transparent)]
    Password(#[from] PasswordError),

    #[error(transparent)]
    Signing(#[from] JwtError),

    #[error(transparent)]
    Store(#[from] ProjhubError),
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        let (status, body) = match &self {
            AuthError::MissingToken => (
                StatusCode::UNAUTHORIZED,
                ApiError::new("MISSING_TOKEN", "Token is missing"),
            ),
            // expired, tampered and orphaned tokens look the same to the caller
            AuthError::InvalidToken(_) => (
                StatusCode::UNAUTHORIZED,
                ApiError::new("INVALID_TOKEN", "Token is invalid"),
            ),
            AuthError::BadCredentials => (
                StatusCode::UNAUTHORIZED,
                ApiError::new("INVALID_CREDENTIALS", "Invalid username or password"),
            ),
            AuthError::DuplicateIdentity(_) => (
                StatusCode::BAD_REQUEST,
                ApiError::new("ALREADY_EXISTS", "User already exists"),
            ),
            AuthError::Password(_) | AuthError::Signing(_) | AuthError::Store(_) => {
                tracing::error!(error = %self, "authentication backend failure");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    ApiError::internal_error(),
                )
            }
        };

        (status, Json(body)).into_response()
    }
}

/// Split an `Authorization` value into `scheme token` and return the token.
///
/// The scheme itself is not checked.
pub fn parse_authorization(value: &str) -> Option<&str> {
    let mut parts = value.split_whitespace();
    let _scheme = parts.next()?;
    let token = parts.next()?;
    if parts.next().is_some() {
        return None;
    }
    Some(token)
}

/// Pull the bearer token out of the request headers
pub fn extract_token(headers: &HeaderMap) -> Result<&str, AuthError> {
    let value = headers
        .get(header::AUTHORIZATION)
        .ok_or(AuthError::MissingToken)?
        .to_str()
        .map_err(|_| AuthError::MissingToken)?;

    parse_authorization(value).ok_or(AuthError::MissingToken)
}

/// Run the auth guard against a set of request headers
pub async fn authenticate(state: &AppState, headers: &HeaderMap) -> Result<CurrentUser, AuthError> {
    let token = extract_token(headers)?;

    let claims =
        validate_token(&state.jwt, token).map_err(|e| AuthError::InvalidToken(e.to_string()))?;

    let user = state
        .credentials
        .find_by_id(claims.user_id)
        .await?
        .ok_or_else(|| AuthError::InvalidToken("user no longer exists".to_string()))?;

    Ok(CurrentUser::from(user))
}

/// Authentication middleware that requires a valid bearer token
///
/// # Usage
///
/// ```ignore
/// use axum::{middleware, routing::get, Router};
/// use projhub_api::auth::auth_middleware;
///
/// let protected = Router::new()
///     .route("/api/projects", get(list_projects))
///     .layer(middleware::from_fn_with_state(state.clone(), auth_middleware));
/// ```
pub async fn auth_middleware(
    State(state): State<Arc<AppState>>,
    mut request: Request,
    next: Next,
) -> Result<Response, AuthError> {
    match authenticate(&state, request.headers()).await {
        Ok(user) => {
            tracing::debug!(user_id = user.id, "request authenticated");
            request.extensions_mut().insert(user);
            Ok(next.run(request).await)
        }
        Err(err) => {
            if matches!(err, AuthError::MissingToken | AuthError::InvalidToken(_)) {
                let context = AuditContext::from_headers(request.headers());
                audit_log(&AuditEvent::InvalidToken {
                    reason: err.to_string(),
                    ip_address: context.ip_address,
                    user_agent: context.user_agent,
                });
            }
            Err(err)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;
    use proptest::prelude::*;

    #[test]
    fn test_parse_authorization() {
        assert_eq!(parse_authorization("Bearer abc.def.ghi"), Some("abc.def.ghi"));
        assert_eq!(parse_authorization("Token abc"), Some("abc"));
        assert_eq!(parse_authorization("Bearer"), None);
        assert_eq!(parse_authorization("Bearer a b"), None);
        assert_eq!(parse_authorization(""), None);
    }

    #[test]
    fn test_extract_token_missing_header() {
        let headers = HeaderMap::new();
        assert!(matches!(extract_token(&headers), Err(AuthError::MissingToken)));
    }

    #[test]
    fn test_extract_token_non_utf8_header() {
        let mut headers = HeaderMap::new();
        headers.insert(
            header::AUTHORIZATION,
            HeaderValue::from_bytes(b"Bearer \xff\xfe").unwrap(),
        );
        assert!(matches!(extract_token(&headers), Err(AuthError::MissingToken)));
    }

    #[test]
    fn test_error_statuses() {
        assert_eq!(
            AuthError::MissingToken.into_response().status(),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            AuthError::InvalidToken("expired".into())
                .into_response()
                .status(),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            AuthError::BadCredentials.into_response().status(),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            AuthError::DuplicateIdentity("alice".into())
                .into_response()
                .status(),
            StatusCode::BAD_REQUEST
        );
    }

    proptest! {
        #[test]
        fn prop_two_part_header_yields_token(scheme in "[A-Za-z]{1,10}", token in "[A-Za-z0-9._-]{1,64}") {
            let value = format!("{scheme} {token}");
            prop_assert_eq!(parse_authorization(&value), Some(token.as_str()));
        }

        #[test]
        fn prop_extra_parts_are_rejected(a in "[a-z]{1,8}", b in "[a-z]{1,8}", c in "[a-z]{1,8}") {
            let value = format!("{a} {b} {c}");
            prop_assert_eq!(parse_authorization(&value), None);
        }
    }
}
