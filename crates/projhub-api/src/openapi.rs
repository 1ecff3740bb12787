//! OpenAPI document served at `/api-docs/openapi.json`

use crate::auth::{LoginRequest, LoginResponse, RegisterRequest};
use crate::error::ApiError;
use crate::handlers::{self, auth, health, projects, tasks, MessageResponse};
use axum::Json;
use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{Modify, OpenApi};

#[derive(OpenApi)]
#[openapi(
    paths(
        handlers::auth::register_handler,
        handlers::auth::login_handler,
        handlers::auth::me_handler,
        handlers::projects::list_projects,
        handlers::projects::create_project,
        handlers::projects::update_project,
        handlers::projects::delete_project,
        handlers::tasks::list_tasks,
        handlers::tasks::create_task,
        handlers::tasks::update_task,
        handlers::tasks::delete_task,
        handlers::github::recent_commits,
        handlers::github::open_issues,
        handlers::github::user_profile,
        handlers::github::user_repos,
        handlers::health::health_check,
        handlers::health::readiness_check,
        handlers::health::metrics,
    ),
    components(schemas(
        ApiError,
        MessageResponse,
        RegisterRequest,
        LoginRequest,
        LoginResponse,
        auth::MeResponse,
        projects::ProjectResponse,
        projects::CreateProjectRequest,
        projects::UpdateProjectRequest,
        projects::CreateProjectResponse,
        tasks::TaskResponse,
        tasks::CreateTaskRequest,
        tasks::UpdateTaskRequest,
        tasks::CreateTaskResponse,
        health::HealthResponse,
        health::BuildInfo,
        health::ReadinessResponse,
        health::ReadinessChecks,
        health::MetricsResponse,
    )),
    modifiers(&BearerAuth),
    tags(
        (name = "auth", description = "Registration, login and current user"),
        (name = "projects", description = "Project workspaces"),
        (name = "tasks", description = "Tasks inside projects"),
        (name = "github", description = "Read-only GitHub metadata"),
        (name = "health", description = "Probes and counters"),
    )
)]
pub struct ApiDoc;

struct BearerAuth;

impl Modify for BearerAuth {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer_auth",
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .build(),
                ),
            );
        }
    }
}

pub async fn openapi_json() -> Json<utoipa::openapi::OpenApi> {
    Json(ApiDoc::openapi())
}
