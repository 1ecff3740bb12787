//! Authentication and authorization module
//!
//! - Password hashing with Argon2id
//! - Credential store over the user repository
//! - HS256 bearer token issuance and validation
//! - Auth guard middleware for protected routes
//! - Registration/login service

pub mod credentials;
pub mod jwt;
pub mod middleware;
pub mod password;
pub mod service;

pub use credentials::CredentialStore;
pub use jwt::{encode_token, issue_token, validate_token, Claims, JwtConfig, JwtError, TOKEN_LIFETIME_SECS};
pub use middleware::{auth_middleware, authenticate, extract_token, AuthError, CurrentUser};
pub use password::{hash_password, verify_password, PasswordConfig, PasswordError};
pub use service::{AuthService, LoginRequest, LoginResponse, RegisterRequest};
