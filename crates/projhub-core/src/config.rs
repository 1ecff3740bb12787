//! projhub configuration management
//!
//! Handles configuration from environment variables and TOML files with
//! sensible defaults for development. The resulting [`AppConfig`] is built
//! once at startup and handed to every component that needs it.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::str::FromStr;

/// Signing secret used when none is configured. Only suitable for development.
pub const DEVELOPMENT_JWT_SECRET: &str = "development-secret-key-change-in-production";

/// Main application configuration
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct AppConfig {
    /// Server configuration
    pub server: ServerConfig,

    /// Database connection
    pub database: DatabaseConfig,

    /// Token signing and password hashing
    pub auth: AuthConfig,

    /// GitHub pass-through
    pub github: GithubConfig,

    /// Logging configuration
    pub logging: LoggingConfig,
}

impl AppConfig {
    /// Load configuration from environment variables on top of the defaults
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::default().with_env_override()
    }

    /// Load from a TOML file
    pub fn from_file(path: impl Into<PathBuf>) -> Result<Self, ConfigError> {
        let path = path.into();
        let content = std::fs::read_to_string(&path).map_err(|e| ConfigError::FileReadError {
            path: path.clone(),
            source: e,
        })?;

        let config = Self::from_toml_str(&content)
            .map_err(|message| ConfigError::ParseError { path, message })?;
        config.validate()?;
        Ok(config)
    }

    /// Parse a TOML document; missing sections fall back to defaults
    pub fn from_toml_str(content: &str) -> Result<Self, String> {
        toml::from_str(content).map_err(|e| e.to_string())
    }

    /// Merge with environment variables (env takes precedence)
    pub fn with_env_override(mut self) -> Result<Self, ConfigError> {
        // Server
        if let Ok(host) = std::env::var("API_HOST") {
            self.server.host = host;
        }
        if let Some(port) = env_parse("API_PORT")? {
            self.server.port = port;
        }
        if let Ok(origins) = std::env::var("CORS_ORIGINS") {
            self.server.cors_origins = parse_origins(&origins);
        }

        // Database
        if let Ok(url) = std::env::var("DATABASE_URL") {
            self.database.url = url;
        }
        if let Some(max) = env_parse("DATABASE_MAX_CONNECTIONS")? {
            self.database.max_connections = max;
        }

        // Auth
        if let Ok(secret) = std::env::var("JWT_SECRET") {
            self.auth.jwt_secret = secret;
        }
        if let Some(memory) = env_parse("PASSWORD_MEMORY_KIB")? {
            self.auth.password_memory_kib = memory;
        }
        if let Some(iterations) = env_parse("PASSWORD_ITERATIONS")? {
            self.auth.password_iterations = iterations;
        }
        if let Some(parallelism) = env_parse("PASSWORD_PARALLELISM")? {
            self.auth.password_parallelism = parallelism;
        }

        // GitHub
        if let Ok(url) = std::env::var("GITHUB_API_URL") {
            self.github.api_url = url;
        }
        if let Ok(token) = std::env::var("GITHUB_TOKEN") {
            if !token.is_empty() {
                self.github.token = Some(token);
            }
        }
        if let Some(timeout) = env_parse("GITHUB_TIMEOUT_SECS")? {
            self.github.timeout_secs = timeout;
        }

        // Logging
        if let Ok(level) = std::env::var("LOG_LEVEL") {
            self.logging.level = level;
        }
        if let Ok(format) = std::env::var("LOG_FORMAT") {
            self.logging.json_format = format.eq_ignore_ascii_case("json");
        }

        self.validate()?;
        Ok(self)
    }

    /// Reject settings the server must not start with.
    ///
    /// A blank signing secret would let anyone mint valid tokens.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.auth.jwt_secret.trim().is_empty() {
            return Err(ConfigError::InvalidValue {
                key: "JWT_SECRET".to_string(),
                value: self.auth.jwt_secret.clone(),
            });
        }
        Ok(())
    }

    /// Socket address string the server binds to
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }
}

fn env_parse<T: FromStr>(key: &str) -> Result<Option<T>, ConfigError> {
    match std::env::var(key) {
        Ok(value) => value
            .trim()
            .parse()
            .map(Some)
            .map_err(|_| ConfigError::InvalidValue {
                key: key.to_string(),
                value,
            }),
        Err(_) => Ok(None),
    }
}

/// Split a comma-separated origin list, dropping blanks
pub fn parse_origins(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect()
}

/// Server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Host to bind to
    pub host: String,

    /// Port to listen on
    pub port: u16,

    /// Allowed origins for CORS; empty means any origin
    pub cors_origins: Vec<String>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 5001,
            cors_origins: vec![],
        }
    }
}

/// Database connection configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DatabaseConfig {
    /// SQLite connection URL
    pub url: String,

    /// Connection pool size
    pub max_connections: u32,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: "sqlite://project_manager.db?mode=rwc".to_string(),
            max_connections: 5,
        }
    }
}

/// Token signing and password hashing settings
#[derive(Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AuthConfig {
    /// HMAC-SHA256 secret for bearer tokens
    pub jwt_secret: String,

    /// Argon2 memory cost in KiB
    pub password_memory_kib: u32,

    /// Argon2 iterations
    pub password_iterations: u32,

    /// Argon2 lanes
    pub password_parallelism: u32,
}

impl AuthConfig {
    /// True while the built-in development secret is in use
    pub fn uses_development_secret(&self) -> bool {
        self.jwt_secret == DEVELOPMENT_JWT_SECRET
    }
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            jwt_secret: DEVELOPMENT_JWT_SECRET.to_string(),
            password_memory_kib: 65536, // 64 MB
            password_iterations: 3,
            password_parallelism: 4,
        }
    }
}

impl std::fmt::Debug for AuthConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthConfig")
            .field("jwt_secret", &"<redacted>")
            .field("password_memory_kib", &self.password_memory_kib)
            .field("password_iterations", &self.password_iterations)
            .field("password_parallelism", &self.password_parallelism)
            .finish()
    }
}

/// GitHub REST API settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GithubConfig {
    /// Base URL of the REST API
    pub api_url: String,

    /// Optional personal access token for higher rate limits
    pub token: Option<String>,

    /// Outbound request timeout in seconds
    pub timeout_secs: u64,

    /// User-Agent sent upstream (GitHub rejects requests without one)
    pub user_agent: String,
}

impl Default for GithubConfig {
    fn default() -> Self {
        Self {
            api_url: "https://api.github.com".to_string(),
            token: None,
            timeout_secs: 10,
            user_agent: concat!("projhub/", env!("CARGO_PKG_VERSION")).to_string(),
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    pub level: String,

    /// JSON format for logs
    pub json_format: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json_format: false,
        }
    }
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file {path}: {source}")]
    FileReadError {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config file {path}: {message}")]
    ParseError { path: PathBuf, message: String },

    #[error("Invalid value for {key}: {value}")]
    InvalidValue { key: String, value: String },
}
