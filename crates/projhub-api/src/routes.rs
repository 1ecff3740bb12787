//! API route definitions

use crate::auth::auth_middleware;
use crate::handlers::{auth, github, projects, tasks};
use crate::state::AppState;
use axum::{
    middleware,
    routing::{get, post, put},
    Router,
};
use std::sync::Arc;

/// Routes under `/api`
pub fn api_routes(state: Arc<AppState>) -> Router<Arc<AppState>> {
    // Public routes (no authentication required)
    let public_routes = Router::new()
        .route("/api/auth/register", post(auth::register_handler))
        .route("/api/auth/login", post(auth::login_handler));

    // Protected routes; route_layer keeps unknown paths at 404 instead of 401
    let protected_routes = Router::new()
        .route("/api/auth/me", get(auth::me_handler))
        // Projects
        .route(
            "/api/projects",
            get(projects::list_projects).post(projects::create_project),
        )
        .route(
            "/api/projects/:id",
            put(projects::update_project).delete(projects::delete_project),
        )
        // Tasks
        .route(
            "/api/tasks/project/:id",
            get(tasks::list_tasks).post(tasks::create_task),
        )
        .route(
            "/api/tasks/:id",
            put(tasks::update_task).delete(tasks::delete_task),
        )
        // GitHub pass-through
        .route("/api/github/commits/*repo", get(github::recent_commits))
        .route("/api/github/issues/*repo", get(github::open_issues))
        .route("/api/github/users/:username", get(github::user_profile))
        .route("/api/github/users/:username/repos", get(github::user_repos))
        .route_layer(middleware::from_fn_with_state(state, auth_middleware));

    Router::new().merge(public_routes).merge(protected_routes)
}
