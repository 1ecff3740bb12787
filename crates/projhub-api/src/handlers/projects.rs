//! Project handlers
//!
//! Any authenticated user may create projects and sees the ones they own or
//! are a member of. Only the owner may modify or delete a project.

use super::{present, MessageResponse};
use crate::audit::{audit_log, AuditContext, AuditEvent};
use crate::auth::CurrentUser;
use crate::error::AppError;
use crate::extract::{ValidatedJson, ValidatedPath};
use crate::state::AppState;
use axum::{
    extract::State,
    http::HeaderMap,
    Extension, Json,
};
use chrono::{DateTime, Utc};
use projhub_core::{NewProject, Project, ProjectChanges};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use utoipa::ToSchema;
use validator::{Validate, ValidationError};

/// Project as returned by the API
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ProjectResponse {
    pub id: i64,
    pub name: String,
    pub description: Option<String>,
    /// Linked repository in `owner/repo` form
    pub github_repo: Option<String>,
    pub owner_id: i64,
    pub created_at: DateTime<Utc>,
}

impl From<Project> for ProjectResponse {
    fn from(project: Project) -> Self {
        Self {
            id: project.id,
            name: project.name,
            description: project.description,
            github_repo: project.github_repo,
            owner_id: project.owner_id,
            created_at: project.created_at,
        }
    }
}

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
#[serde(deny_unknown_fields)]
pub struct CreateProjectRequest {
    #[validate(length(min = 1, max = 120, message = "name must be 1-120 characters"))]
    pub name: String,
    pub description: Option<String>,
    #[validate(length(max = 255, message = "github_repo must be at most 255 characters"))]
    pub github_repo: Option<String>,
}

/// Partial project update; absent fields are left unchanged.
///
/// `null` or a blank string clears `description` / `github_repo`.
#[derive(Debug, Clone, Default, Deserialize, Validate, ToSchema)]
#[serde(deny_unknown_fields)]
#[validate(schema(function = "validate_repo_length"))]
pub struct UpdateProjectRequest {
    #[validate(length(min = 1, max = 120, message = "name must be 1-120 characters"))]
    pub name: Option<String>,
    #[serde(default, deserialize_with = "present")]
    #[schema(value_type = Option<String>)]
    pub description: Option<Option<String>>,
    #[serde(default, deserialize_with = "present")]
    #[schema(value_type = Option<String>)]
    pub github_repo: Option<Option<String>>,
}

fn validate_repo_length(request: &UpdateProjectRequest) -> Result<(), ValidationError> {
    match &request.github_repo {
        Some(Some(repo)) if repo.len() > 255 => {
            let mut error = ValidationError::new("length");
            error.message = Some("github_repo must be at most 255 characters".into());
            Err(error)
        }
        _ => Ok(()),
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct CreateProjectResponse {
    pub message: String,
    pub id: i64,
}

fn non_blank(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

/// Load a project and require the caller to own it
async fn owned_project(
    state: &AppState,
    user: &CurrentUser,
    headers: &HeaderMap,
    id: i64,
) -> Result<Project, AppError> {
    let project = state
        .store
        .get_project(id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Project {id}")))?;

    if project.owner_id != user.id {
        let context = AuditContext::from_headers(headers);
        audit_log(&AuditEvent::AccessDenied {
            user_id: user.id,
            resource: format!("project:{id}"),
            ip_address: context.ip_address,
            user_agent: context.user_agent,
        });
        return Err(AppError::Forbidden(
            "Only the project owner can modify this project".to_string(),
        ));
    }

    Ok(project)
}

/// Projects owned by or shared with the caller
#[utoipa::path(
    get,
    path = "/api/projects",
    tag = "projects",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Visible projects", body = [ProjectResponse]),
        (status = 401, description = "Missing or invalid token", body = crate::error::ApiError),
    )
)]
pub async fn list_projects(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<CurrentUser>,
) -> Result<Json<Vec<ProjectResponse>>, AppError> {
    let projects = state.store.list_projects_for_user(user.id).await?;
    Ok(Json(projects.into_iter().map(ProjectResponse::from).collect()))
}

/// Create a project; the caller becomes its owner and an admin member
#[utoipa::path(
    post,
    path = "/api/projects",
    tag = "projects",
    security(("bearer_auth" = [])),
    request_body = CreateProjectRequest,
    responses(
        (status = 200, description = "Project created", body = CreateProjectResponse),
        (status = 400, description = "Invalid body", body = crate::error::ApiError),
        (status = 401, description = "Missing or invalid token", body = crate::error::ApiError),
    )
)]
pub async fn create_project(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<CurrentUser>,
    ValidatedJson(request): ValidatedJson<CreateProjectRequest>,
) -> Result<Json<CreateProjectResponse>, AppError> {
    let project = state
        .store
        .create_project(
            user.id,
            &NewProject {
                name: request.name,
                description: non_blank(request.description),
                github_repo: non_blank(request.github_repo),
            },
        )
        .await?;

    tracing::info!(project_id = project.id, owner_id = user.id, "project created");

    Ok(Json(CreateProjectResponse {
        message: "Project created!".to_string(),
        id: project.id,
    }))
}

/// Update a project (owner only)
#[utoipa::path(
    put,
    path = "/api/projects/{id}",
    tag = "projects",
    security(("bearer_auth" = [])),
    params(("id" = i64, Path, description = "Project id")),
    request_body = UpdateProjectRequest,
    responses(
        (status = 200, description = "Project updated", body = MessageResponse),
        (status = 401, description = "Missing or invalid token", body = crate::error::ApiError),
        (status = 403, description = "Caller is not the owner", body = crate::error::ApiError),
        (status = 404, description = "Project not found", body = crate::error::ApiError),
    )
)]
pub async fn update_project(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<CurrentUser>,
    ValidatedPath(id): ValidatedPath<i64>,
    headers: HeaderMap,
    ValidatedJson(request): ValidatedJson<UpdateProjectRequest>,
) -> Result<Json<MessageResponse>, AppError> {
    owned_project(&state, &user, &headers, id).await?;

    let changes = ProjectChanges {
        name: request.name,
        description: request.description.map(non_blank),
        github_repo: request.github_repo.map(non_blank),
    };
    state
        .store
        .update_project(id, &changes)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Project {id}")))?;

    Ok(Json(MessageResponse::new("Project updated!")))
}

/// Delete a project with its tasks and memberships (owner only)
#[utoipa::path(
    delete,
    path = "/api/projects/{id}",
    tag = "projects",
    security(("bearer_auth" = [])),
    params(("id" = i64, Path, description = "Project id")),
    responses(
        (status = 200, description = "Project deleted", body = MessageResponse),
        (status = 401, description = "Missing or invalid token", body = crate::error::ApiError),
        (status = 403, description = "Caller is not the owner", body = crate::error::ApiError),
        (status = 404, description = "Project not found", body = crate::error::ApiError),
    )
)]
pub async fn delete_project(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<CurrentUser>,
    ValidatedPath(id): ValidatedPath<i64>,
    headers: HeaderMap,
) -> Result<Json<MessageResponse>, AppError> {
    owned_project(&state, &user, &headers, id).await?;

    if !state.store.delete_project(id).await? {
        return Err(AppError::NotFound(format!("Project {id}")));
    }

    tracing::info!(project_id = id, owner_id = user.id, "project deleted");
    Ok(Json(MessageResponse::new("Project deleted!")))
}
