//! GitHub pass-through handlers
//!
//! Repository routes take the rest of the path as the repository, so a pasted
//! URL such as `/api/github/commits/https://github.com/owner/repo.git` works.

use crate::auth::CurrentUser;
use crate::error::AppError;
use crate::extract::ValidatedPath;
use crate::state::AppState;
use axum::{
    extract::State,
    Extension, Json,
};
use projhub_github::{CommitSummary, IssueDigest, RepoSummary, UserProfile};
use std::sync::Arc;

/// Latest commits of a repository
#[utoipa::path(
    get,
    path = "/api/github/commits/{repo}",
    tag = "github",
    security(("bearer_auth" = [])),
    params(("repo" = String, Path, description = "`owner/repo` or a GitHub URL")),
    responses(
        (status = 200, description = "Up to 10 commits"),
        (status = 401, description = "Missing or invalid token", body = crate::error::ApiError),
        (status = 502, description = "GitHub unreachable", body = crate::error::ApiError),
        (status = 504, description = "GitHub timed out", body = crate::error::ApiError),
    )
)]
pub async fn recent_commits(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<CurrentUser>,
    ValidatedPath(repo): ValidatedPath<String>,
) -> Result<Json<Vec<CommitSummary>>, AppError> {
    tracing::debug!(user_id = user.id, repo = %repo, "fetching commits");
    Ok(Json(state.github.recent_commits(&repo).await?))
}

/// Open issues and pull requests of a repository
#[utoipa::path(
    get,
    path = "/api/github/issues/{repo}",
    tag = "github",
    security(("bearer_auth" = [])),
    params(("repo" = String, Path, description = "`owner/repo` or a GitHub URL")),
    responses(
        (status = 200, description = "Up to 5 issues and 5 pull requests"),
        (status = 401, description = "Missing or invalid token", body = crate::error::ApiError),
        (status = 502, description = "GitHub unreachable", body = crate::error::ApiError),
        (status = 504, description = "GitHub timed out", body = crate::error::ApiError),
    )
)]
pub async fn open_issues(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<CurrentUser>,
    ValidatedPath(repo): ValidatedPath<String>,
) -> Result<Json<IssueDigest>, AppError> {
    tracing::debug!(user_id = user.id, repo = %repo, "fetching issues");
    Ok(Json(state.github.open_issues(&repo).await?))
}

/// Public profile of a GitHub user
#[utoipa::path(
    get,
    path = "/api/github/users/{username}",
    tag = "github",
    security(("bearer_auth" = [])),
    params(("username" = String, Path, description = "GitHub login")),
    responses(
        (status = 200, description = "Profile summary"),
        (status = 401, description = "Missing or invalid token", body = crate::error::ApiError),
    )
)]
pub async fn user_profile(
    State(state): State<Arc<AppState>>,
    Extension(_user): Extension<CurrentUser>,
    ValidatedPath(username): ValidatedPath<String>,
) -> Result<Json<UserProfile>, AppError> {
    Ok(Json(state.github.user_profile(&username).await?))
}

/// Public repositories of a GitHub user
#[utoipa::path(
    get,
    path = "/api/github/users/{username}/repos",
    tag = "github",
    security(("bearer_auth" = [])),
    params(("username" = String, Path, description = "GitHub login")),
    responses(
        (status = 200, description = "Repository summaries"),
        (status = 401, description = "Missing or invalid token", body = crate::error::ApiError),
    )
)]
pub async fn user_repos(
    State(state): State<Arc<AppState>>,
    Extension(_user): Extension<CurrentUser>,
    ValidatedPath(username): ValidatedPath<String>,
) -> Result<Json<Vec<RepoSummary>>, AppError> {
    Ok(Json(state.github.user_repos(&username).await?))
}
