//! Task handlers

use super::{present, MessageResponse};
use crate::auth::CurrentUser;
use crate::error::AppError;
use crate::extract::{ValidatedJson, ValidatedPath};
use crate::state::AppState;
use axum::{
    extract::State,
    Extension, Json,
};
use chrono::{DateTime, Utc};
use projhub_core::{NewTask, Task, TaskChanges, TaskPriority, TaskStatus};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use utoipa::ToSchema;
use validator::Validate;

/// Task as returned by the API
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct TaskResponse {
    pub id: i64,
    pub title: String,
    pub description: Option<String>,
    /// One of `todo`, `in_progress`, `done`
    #[schema(value_type = String, example = "todo")]
    pub status: TaskStatus,
    /// One of `low`, `medium`, `high`
    #[schema(value_type = String, example = "medium")]
    pub priority: TaskPriority,
    pub project_id: i64,
    pub assignee_id: Option<i64>,
    pub created_at: DateTime<Utc>,
}

impl From<Task> for TaskResponse {
    fn from(task: Task) -> Self {
        Self {
            id: task.id,
            title: task.title,
            description: task.description,
            status: task.status,
            priority: task.priority,
            project_id: task.project_id,
            assignee_id: task.assignee_id,
            created_at: task.created_at,
        }
    }
}

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
#[serde(deny_unknown_fields)]
pub struct CreateTaskRequest {
    #[validate(length(min = 1, max = 200, message = "title must be 1-200 characters"))]
    pub title: String,
    pub description: Option<String>,
    /// Defaults to `todo`
    #[schema(value_type = Option<String>)]
    pub status: Option<TaskStatus>,
    /// Defaults to `medium`
    #[schema(value_type = Option<String>)]
    pub priority: Option<TaskPriority>,
    pub assignee_id: Option<i64>,
}

/// Partial task update; absent fields are left unchanged.
///
/// `"assignee_id": null` unassigns the task.
#[derive(Debug, Clone, Default, Deserialize, Validate, ToSchema)]
#[serde(deny_unknown_fields)]
pub struct UpdateTaskRequest {
    #[validate(length(min = 1, max = 200, message = "title must be 1-200 characters"))]
    pub title: Option<String>,
    pub description: Option<String>,
    #[schema(value_type = Option<String>)]
    pub status: Option<TaskStatus>,
    #[schema(value_type = Option<String>)]
    pub priority: Option<TaskPriority>,
    #[serde(default, deserialize_with = "present")]
    #[schema(value_type = Option<i64>)]
    pub assignee_id: Option<Option<i64>>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct CreateTaskResponse {
    pub message: String,
    pub id: i64,
    #[schema(value_type = String, example = "medium")]
    pub priority: TaskPriority,
}

/// Tasks of a project
#[utoipa::path(
    get,
    path = "/api/tasks/project/{id}",
    tag = "tasks",
    security(("bearer_auth" = [])),
    params(("id" = i64, Path, description = "Project id")),
    responses(
        (status = 200, description = "Tasks of the project", body = [TaskResponse]),
        (status = 401, description = "Missing or invalid token", body = crate::error::ApiError),
    )
)]
pub async fn list_tasks(
    State(state): State<Arc<AppState>>,
    Extension(_user): Extension<CurrentUser>,
    ValidatedPath(project_id): ValidatedPath<i64>,
) -> Result<Json<Vec<TaskResponse>>, AppError> {
    let tasks = state.store.list_tasks_for_project(project_id).await?;
    Ok(Json(tasks.into_iter().map(TaskResponse::from).collect()))
}

/// Create a task in a project
#[utoipa::path(
    post,
    path = "/api/tasks/project/{id}",
    tag = "tasks",
    security(("bearer_auth" = [])),
    params(("id" = i64, Path, description = "Project id")),
    request_body = CreateTaskRequest,
    responses(
        (status = 200, description = "Task created", body = CreateTaskResponse),
        (status = 400, description = "Invalid body or unknown assignee", body = crate::error::ApiError),
        (status = 401, description = "Missing or invalid token", body = crate::error::ApiError),
        (status = 404, description = "Project not found", body = crate::error::ApiError),
    )
)]
pub async fn create_task(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<CurrentUser>,
    ValidatedPath(project_id): ValidatedPath<i64>,
    ValidatedJson(request): ValidatedJson<CreateTaskRequest>,
) -> Result<Json<CreateTaskResponse>, AppError> {
    let new_task = NewTask {
        title: request.title,
        description: request.description,
        status: request.status.unwrap_or_default(),
        priority: request.priority.unwrap_or_default(),
        assignee_id: request.assignee_id,
    };
    let task = state.store.create_task(project_id, &new_task).await?;

    tracing::info!(task_id = task.id, project_id, user_id = user.id, "task created");

    Ok(Json(CreateTaskResponse {
        message: "Task created!".to_string(),
        id: task.id,
        priority: task.priority,
    }))
}

/// Update fields of a task
#[utoipa::path(
    put,
    path = "/api/tasks/{id}",
    tag = "tasks",
    security(("bearer_auth" = [])),
    params(("id" = i64, Path, description = "Task id")),
    request_body = UpdateTaskRequest,
    responses(
        (status = 200, description = "Task updated", body = MessageResponse),
        (status = 400, description = "Invalid body", body = crate::error::ApiError),
        (status = 401, description = "Missing or invalid token", body = crate::error::ApiError),
        (status = 404, description = "Task not found", body = crate::error::ApiError),
    )
)]
pub async fn update_task(
    State(state): State<Arc<AppState>>,
    Extension(_user): Extension<CurrentUser>,
    ValidatedPath(id): ValidatedPath<i64>,
    ValidatedJson(request): ValidatedJson<UpdateTaskRequest>,
) -> Result<Json<MessageResponse>, AppError> {
    let changes = TaskChanges {
        title: request.title,
        description: request.description,
        status: request.status,
        priority: request.priority,
        assignee_id: request.assignee_id,
    };

    state
        .store
        .update_task(id, &changes)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Task {id}")))?;

    Ok(Json(MessageResponse::new("Task updated!")))
}

/// Delete a task
#[utoipa::path(
    delete,
    path = "/api/tasks/{id}",
    tag = "tasks",
    security(("bearer_auth" = [])),
    params(("id" = i64, Path, description = "Task id")),
    responses(
        (status = 200, description = "Task deleted", body = MessageResponse),
        (status = 401, description = "Missing or invalid token", body = crate::error::ApiError),
        (status = 404, description = "Task not found", body = crate::error::ApiError),
    )
)]
pub async fn delete_task(
    State(state): State<Arc<AppState>>,
    Extension(_user): Extension<CurrentUser>,
    ValidatedPath(id): ValidatedPath<i64>,
) -> Result<Json<MessageResponse>, AppError> {
    if !state.store.delete_task(id).await? {
        return Err(AppError::NotFound(format!("Task {id}")));
    }
    Ok(Json(MessageResponse::new("Task deleted!")))
}
