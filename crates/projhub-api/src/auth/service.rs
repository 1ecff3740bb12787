//! Authentication service
//!
//! Registration and login on top of the credential store and token issuer.
//! Every outcome is written to the audit log.

use super::credentials::CredentialStore;
use super::jwt::{issue_token, JwtConfig};
use super::middleware::AuthError;
use crate::audit::{audit_log, AuditContext, AuditEvent};
use projhub_core::User;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::Validate;

/// Registration request
#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
#[serde(deny_unknown_fields)]
pub struct RegisterRequest {
    /// Unique, case-sensitive handle
    #[validate(length(min = 1, max = 80, message = "username must be 1-80 characters"))]
    pub username: String,
    #[validate(length(min = 1, max = 1024, message = "password must be 1-1024 characters"))]
    pub password: String,
}

/// Login request
#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
#[serde(deny_unknown_fields)]
pub struct LoginRequest {
    #[validate(length(min = 1, max = 80, message = "username must be 1-80 characters"))]
    pub username: String,
    #[validate(length(min = 1, max = 1024, message = "password must be 1-1024 characters"))]
    pub password: String,
}

/// Successful login
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct LoginResponse {
    /// Bearer token, valid for 24 hours
    pub token: String,
    pub username: String,
    pub user_id: i64,
}

pub struct AuthService {
    credentials: CredentialStore,
    jwt: JwtConfig,
}

impl AuthService {
    pub fn new(credentials: CredentialStore, jwt: JwtConfig) -> Self {
        Self { credentials, jwt }
    }

    pub async fn register(
        &self,
        request: RegisterRequest,
        context: AuditContext,
    ) -> Result<User, AuthError> {
        match self
            .credentials
            .register(&request.username, &request.password)
            .await
        {
            Ok(user) => {
                audit_log(&AuditEvent::RegistrationSuccess {
                    user_id: user.id,
                    username: user.username.clone(),
                    ip_address: context.ip_address,
                    user_agent: context.user_agent,
                });
                Ok(user)
            }
            Err(err) => {
                audit_log(&AuditEvent::RegistrationFailure {
                    username: request.username,
                    reason: err.to_string(),
                    ip_address: context.ip_address,
                    user_agent: context.user_agent,
                });
                Err(err)
            }
        }
    }

    pub async fn login(
        &self,
        request: LoginRequest,
        context: AuditContext,
    ) -> Result<LoginResponse, AuthError> {
        let user = match self
            .credentials
            .verify_credentials(&request.username, &request.password)
            .await
        {
            Ok(user) => user,
            Err(err) => {
                audit_log(&AuditEvent::LoginFailure {
                    username: request.username,
                    reason: err.to_string(),
                    ip_address: context.ip_address,
                    user_agent: context.user_agent,
                });
                return Err(err);
            }
        };

        let token = issue_token(&self.jwt, user.id)?;

        audit_log(&AuditEvent::LoginSuccess {
            user_id: user.id,
            username: user.username.clone(),
            ip_address: context.ip_address,
            user_agent: context.user_agent,
        });

        Ok(LoginResponse {
            token,
            username: user.username,
            user_id: user.id,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::jwt::validate_token;
    use crate::auth::password::PasswordConfig;
    use projhub_core::SqliteStore;
    use std::sync::Arc;

    async fn service() -> AuthService {
        let store = SqliteStore::in_memory().await.unwrap();
        let credentials = CredentialStore::new(
            Arc::new(store),
            PasswordConfig {
                memory_cost: 1024,
                time_cost: 1,
                parallelism: 1,
                output_len: Some(32),
            },
        );
        AuthService::new(credentials, JwtConfig::new("service-test-secret"))
    }

    fn register_request(username: &str, password: &str) -> RegisterRequest {
        RegisterRequest {
            username: username.to_string(),
            password: password.to_string(),
        }
    }

    #[tokio::test]
    async fn test_login_token_resolves_to_registered_user() {
        let service = service().await;
        let user = service
            .register(register_request("alice", "secret123"), AuditContext::default())
            .await
            .unwrap();

        let response = service
            .login(
                LoginRequest {
                    username: "alice".to_string(),
                    password: "secret123".to_string(),
                },
                AuditContext::default(),
            )
            .await
            .unwrap();

        assert_eq!(response.user_id, user.id);
        assert_eq!(response.username, "alice");

        let claims = validate_token(&JwtConfig::new("service-test-secret"), &response.token).unwrap();
        assert_eq!(claims.user_id, user.id);
    }

    #[tokio::test]
    async fn test_wrong_password_is_rejected() {
        let service = service().await;
        service
            .register(register_request("alice", "secret123"), AuditContext::default())
            .await
            .unwrap();

        let result = service
            .login(
                LoginRequest {
                    username: "alice".to_string(),
                    password: "wrongpass".to_string(),
                },
                AuditContext::default(),
            )
            .await;

        assert!(matches!(result, Err(AuthError::BadCredentials)));
    }

    #[test]
    fn test_request_validation() {
        assert!(register_request("alice", "secret123").validate().is_ok());
        assert!(register_request("", "secret123").validate().is_err());
        assert!(register_request("alice", "").validate().is_err());
        assert!(register_request(&"a".repeat(81), "secret123").validate().is_err());
    }

    #[test]
    fn test_unknown_fields_are_rejected() {
        let result: Result<RegisterRequest, _> = serde_json::from_str(
            r#"{"username": "alice", "password": "secret123", "is_admin": true}"#,
        );
        assert!(result.is_err());
    }
}
