//! Request metrics middleware
//!
//! Counts every request for `/metrics` and logs its latency and status
//! against a normalized endpoint label.

use crate::state::AppState;
use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};
use std::sync::Arc;
use std::time::Instant;

pub async fn metrics_middleware(
    State(state): State<Arc<AppState>>,
    request: Request,
    next: Next,
) -> Response {
    let start = Instant::now();
    let method = request.method().clone();
    let endpoint = normalize_endpoint(request.uri().path());

    state.increment_requests();
    let response = next.run(request).await;

    tracing::debug!(
        method = %method,
        endpoint = %endpoint,
        status = response.status().as_u16(),
        latency_us = start.elapsed().as_micros() as u64,
        "request completed"
    );

    response
}

/// Replace numeric id segments with `:id` so similar requests share a label
fn normalize_endpoint(path: &str) -> String {
    path.split('/')
        .map(|seg| if is_numeric(seg) { ":id" } else { seg })
        .collect::<Vec<_>>()
        .join("/")
}

fn is_numeric(s: &str) -> bool {
    !s.is_empty() && s.chars().all(|c| c.is_ascii_digit())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_endpoint() {
        assert_eq!(normalize_endpoint("/api/projects/123"), "/api/projects/:id");
        assert_eq!(
            normalize_endpoint("/api/tasks/project/7"),
            "/api/tasks/project/:id"
        );
        assert_eq!(normalize_endpoint("/api/projects"), "/api/projects");
        assert_eq!(normalize_endpoint("/health"), "/health");
    }

    #[test]
    fn test_is_numeric() {
        assert!(is_numeric("42"));
        assert!(!is_numeric("4a"));
        assert!(!is_numeric(""));
    }
}
