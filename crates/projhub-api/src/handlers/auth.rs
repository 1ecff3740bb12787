//! Authentication API handlers

use super::MessageResponse;
use crate::audit::AuditContext;
use crate::auth::{CurrentUser, LoginRequest, LoginResponse, RegisterRequest};
use crate::error::AppError;
use crate::extract::ValidatedJson;
use crate::state::AppState;
use axum::{extract::State, http::HeaderMap, Extension, Json};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use utoipa::ToSchema;

/// Profile of the authenticated user
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct MeResponse {
    pub user_id: i64,
    pub username: String,
    pub created_at: DateTime<Utc>,
}

/// Register a new user account
#[utoipa::path(
    post,
    path = "/api/auth/register",
    tag = "auth",
    request_body = RegisterRequest,
    responses(
        (status = 200, description = "User registered", body = MessageResponse),
        (status = 400, description = "Invalid body or username taken", body = crate::error::ApiError),
    )
)]
pub async fn register_handler(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    ValidatedJson(request): ValidatedJson<RegisterRequest>,
) -> Result<Json<MessageResponse>, AppError> {
    state
        .auth_service()
        .register(request, AuditContext::from_headers(&headers))
        .await?;

    Ok(Json(MessageResponse::new("Registered successfully")))
}

/// Exchange username and password for a bearer token
#[utoipa::path(
    post,
    path = "/api/auth/login",
    tag = "auth",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Login successful", body = LoginResponse),
        (status = 400, description = "Invalid body", body = crate::error::ApiError),
        (status = 401, description = "Invalid credentials", body = crate::error::ApiError),
    )
)]
pub async fn login_handler(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    ValidatedJson(request): ValidatedJson<LoginRequest>,
) -> Result<Json<LoginResponse>, AppError> {
    let response = state
        .auth_service()
        .login(request, AuditContext::from_headers(&headers))
        .await?;

    Ok(Json(response))
}

/// Current user profile
#[utoipa::path(
    get,
    path = "/api/auth/me",
    tag = "auth",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Authenticated user", body = MeResponse),
        (status = 401, description = "Missing or invalid token", body = crate::error::ApiError),
    )
)]
pub async fn me_handler(Extension(user): Extension<CurrentUser>) -> Json<MeResponse> {
    Json(MeResponse {
        user_id: user.id,
        username: user.username,
        created_at: user.created_at,
    })
}
