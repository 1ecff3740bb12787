//! Security audit logging for authentication events
//!
//! Registrations, logins, rejected tokens and denied project mutations are
//! logged at INFO level with the "audit" target, so they can be filtered and
//! routed separately from application logs (`RUST_LOG=audit=info`).
//!
//! ```ignore
//! use projhub_api::audit::{audit_log, AuditEvent};
//!
//! audit_log(&AuditEvent::LoginSuccess {
//!     user_id: user.id,
//!     username: user.username.clone(),
//!     ip_address: Some("192.168.1.1".to_string()),
//!     user_agent: None,
//! });
//! ```

use axum::http::HeaderMap;
use serde::{Deserialize, Serialize};
use tracing::info;

/// Security audit events
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "event_type", rename_all = "snake_case")]
pub enum AuditEvent {
    /// Successful user registration
    RegistrationSuccess {
        user_id: i64,
        username: String,
        ip_address: Option<String>,
        user_agent: Option<String>,
    },

    /// Failed registration attempt
    RegistrationFailure {
        username: String,
        reason: String,
        ip_address: Option<String>,
        user_agent: Option<String>,
    },

    /// Successful user login
    LoginSuccess {
        user_id: i64,
        username: String,
        ip_address: Option<String>,
        user_agent: Option<String>,
    },

    /// Failed login attempt
    LoginFailure {
        username: String,
        reason: String,
        ip_address: Option<String>,
        user_agent: Option<String>,
    },

    /// Missing, invalid or expired token on a protected route
    InvalidToken {
        reason: String,
        ip_address: Option<String>,
        user_agent: Option<String>,
    },

    /// Authenticated user tried to modify a resource they do not own
    AccessDenied {
        user_id: i64,
        resource: String,
        ip_address: Option<String>,
        user_agent: Option<String>,
    },
}

impl AuditEvent {
    /// Short name used as the log message
    pub fn kind(&self) -> &'static str {
        match self {
            AuditEvent::RegistrationSuccess { .. } => "registration_success",
            AuditEvent::RegistrationFailure { .. } => "registration_failure",
            AuditEvent::LoginSuccess { .. } => "login_success",
            AuditEvent::LoginFailure { .. } => "login_failure",
            AuditEvent::InvalidToken { .. } => "invalid_token",
            AuditEvent::AccessDenied { .. } => "access_denied",
        }
    }
}

/// Client metadata attached to audit events
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AuditContext {
    pub ip_address: Option<String>,
    pub user_agent: Option<String>,
}

impl AuditContext {
    pub fn from_headers(headers: &HeaderMap) -> Self {
        Self {
            ip_address: extract_ip_address(headers),
            user_agent: extract_user_agent(headers),
        }
    }
}

/// Log a security audit event with structured fields.
///
/// The event is also serialized to JSON in the `event` field, e.g.
///
/// ```json
/// {"event_type":"login_failure","username":"alice","reason":"invalid credentials","ip_address":"10.0.0.7","user_agent":null}
/// ```
pub fn audit_log(event: &AuditEvent) {
    let event_json = serde_json::to_string(event)
        .unwrap_or_else(|e| format!("{{\"error\":\"Failed to serialize audit event: {e}\"}}"));

    match event {
        AuditEvent::RegistrationSuccess {
            user_id,
            username,
            ip_address,
            ..
        }
        | AuditEvent::LoginSuccess {
            user_id,
            username,
            ip_address,
            ..
        } => {
            info!(
                target: "audit",
                event = %event_json,
                user_id = %user_id,
                username = %username,
                ip_address = ?ip_address,
                "{}",
                event.kind()
            );
        }
        AuditEvent::RegistrationFailure {
            username,
            reason,
            ip_address,
            ..
        }
        | AuditEvent::LoginFailure {
            username,
            reason,
            ip_address,
            ..
        } => {
            info!(
                target: "audit",
                event = %event_json,
                username = %username,
                reason = %reason,
                ip_address = ?ip_address,
                "{}",
                event.kind()
            );
        }
        AuditEvent::InvalidToken {
            reason, ip_address, ..
        } => {
            info!(
                target: "audit",
                event = %event_json,
                reason = %reason,
                ip_address = ?ip_address,
                "Rejected bearer token"
            );
        }
        AuditEvent::AccessDenied {
            user_id,
            resource,
            ip_address,
            ..
        } => {
            info!(
                target: "audit",
                event = %event_json,
                user_id = %user_id,
                resource = %resource,
                ip_address = ?ip_address,
                "Access denied"
            );
        }
    }
}

/// Client IP from proxy headers (`X-Forwarded-For` first hop, then `X-Real-IP`)
pub fn extract_ip_address(headers: &HeaderMap) -> Option<String> {
    if let Some(forwarded) = headers.get("x-forwarded-for") {
        if let Ok(value) = forwarded.to_str() {
            if let Some(first) = value.split(',').next() {
                let first = first.trim();
                if !first.is_empty() {
                    return Some(first.to_string());
                }
            }
        }
    }

    headers
        .get("x-real-ip")
        .and_then(|v| v.to_str().ok())
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
}

pub fn extract_user_agent(headers: &HeaderMap) -> Option<String> {
    headers
        .get(axum::http::header::USER_AGENT)
        .and_then(|v| v.to_str().ok())
        .map(String::from)
}
