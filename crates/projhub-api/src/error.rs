//! API error handling
//!
//! Every failure a handler can produce is funnelled through [`AppError`] and
//! rendered as a status code plus an [`ApiError`] JSON body.

use crate::auth::AuthError;
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use projhub_core::ProjhubError;
use projhub_github::GithubError;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// API error response
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ApiError {
    /// Error code
    pub code: String,
    /// Human-readable message
    pub message: String,
    /// Additional details
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

impl ApiError {
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
            details: None,
        }
    }

    pub fn with_details(mut self, details: impl Into<String>) -> Self {
        self.details = Some(details.into());
        self
    }

    pub fn not_found(resource: &str) -> Self {
        Self::new("NOT_FOUND", format!("{resource} not found"))
    }

    pub fn validation(message: impl Into<String>) -> Self {
        Self::new("VALIDATION_ERROR", message)
    }

    pub fn forbidden(message: impl Into<String>) -> Self {
        Self::new("FORBIDDEN", message)
    }

    pub fn internal_error() -> Self {
        Self::new("INTERNAL_ERROR", "Internal server error")
    }
}

/// Application error type
#[derive(Debug)]
pub enum AppError {
    NotFound(String),
    Validation(String),
    Forbidden(String),
    Auth(AuthError),
    Upstream(GithubError),
    Internal(String),
    Database(String),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error) = match self {
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, ApiError::not_found(&msg)),
            AppError::Validation(msg) => (StatusCode::BAD_REQUEST, ApiError::validation(msg)),
            AppError::Forbidden(msg) => (StatusCode::FORBIDDEN, ApiError::forbidden(msg)),
            AppError::Auth(err) => return err.into_response(),
            AppError::Upstream(err) => upstream_response(err),
            AppError::Internal(msg) => {
                tracing::error!(error = %msg, "internal error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    ApiError::internal_error(),
                )
            }
            AppError::Database(msg) => {
                tracing::error!(error = %msg, "database error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    ApiError::new("DATABASE_ERROR", "Database operation failed"),
                )
            }
        };

        (status, Json(error)).into_response()
    }
}

fn upstream_response(err: GithubError) -> (StatusCode, ApiError) {
    match err {
        GithubError::Status { status } => (
            // out-of-range codes fall back to 502
            StatusCode::from_u16(status).unwrap_or(StatusCode::BAD_GATEWAY),
            ApiError::new("UPSTREAM_ERROR", "Failed to fetch data from GitHub API")
                .with_details(format!("GitHub responded with status {status}")),
        ),
        GithubError::Timeout => (
            StatusCode::GATEWAY_TIMEOUT,
            ApiError::new("UPSTREAM_TIMEOUT", "GitHub API did not respond in time"),
        ),
        GithubError::Transport(msg) | GithubError::Decode(msg) => (
            StatusCode::BAD_GATEWAY,
            ApiError::new("UPSTREAM_ERROR", "Failed to fetch data from GitHub API")
                .with_details(msg),
        ),
        GithubError::InvalidRepository(repo) => (
            StatusCode::BAD_REQUEST,
            ApiError::validation(format!("Invalid repository path: {repo}")),
        ),
        GithubError::InvalidUsername(name) => (
            StatusCode::BAD_REQUEST,
            ApiError::validation(format!("Invalid GitHub username: {name}")),
        ),
        GithubError::Client(msg) => {
            tracing::error!(error = %msg, "GitHub client misconfigured");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                ApiError::internal_error(),
            )
        }
    }
}

impl From<anyhow::Error> for AppError {
    fn from(err: anyhow::Error) -> Self {
        AppError::Internal(err.to_string())
    }
}

impl From<ProjhubError> for AppError {
    fn from(err: ProjhubError) -> Self {
        match err {
            ProjhubError::NotFound(msg) => AppError::NotFound(msg),
            ProjhubError::AlreadyExists(msg) => AppError::Validation(format!("{msg} already exists")),
            ProjhubError::ValidationError(msg) => AppError::Validation(msg),
            ProjhubError::DatabaseError(msg) => AppError::Database(msg),
            ProjhubError::ConfigError(msg) => {
                AppError::Internal(format!("Configuration error: {msg}"))
            }
            ProjhubError::Other(err) => AppError::Internal(err.to_string()),
        }
    }
}

impl From<GithubError> for AppError {
    fn from(err: GithubError) -> Self {
        AppError::Upstream(err)
    }
}

impl From<AuthError> for AppError {
    fn from(err: AuthError) -> Self {
        AppError::Auth(err)
    }
}
