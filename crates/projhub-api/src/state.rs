//! Application state management

use crate::auth::{AuthService, CredentialStore, JwtConfig, PasswordConfig};
use projhub_core::config::AppConfig;
use projhub_core::{SqliteStore, Store};
use projhub_github::{GithubClient, GithubError};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Instant;

/// Application state shared across handlers
pub struct AppState {
    /// Application configuration
    pub config: AppConfig,
    /// Persistence layer
    pub store: Arc<dyn Store>,
    /// Identities and password digests
    pub credentials: CredentialStore,
    /// Token signing secret
    pub jwt: JwtConfig,
    /// GitHub REST client
    pub github: GithubClient,
    /// Server start time
    pub start_time: Instant,
    /// Request counter
    pub request_count: AtomicU64,
}

impl AppState {
    /// Wire the state together from configuration and an open store
    pub fn new(config: AppConfig, store: Arc<dyn Store>) -> Result<Self, GithubError> {
        let github = GithubClient::from_config(&config.github)?;
        let credentials =
            CredentialStore::new(store.clone(), PasswordConfig::from_auth_config(&config.auth));
        let jwt = JwtConfig::from_auth_config(&config.auth);

        Ok(Self {
            config,
            store,
            credentials,
            jwt,
            github,
            start_time: Instant::now(),
            request_count: AtomicU64::new(0),
        })
    }

    /// State backed by a private in-memory database
    pub async fn in_memory(config: AppConfig) -> anyhow::Result<Self> {
        let store = SqliteStore::in_memory().await?;
        Ok(Self::new(config, Arc::new(store))?)
    }

    pub fn auth_service(&self) -> AuthService {
        AuthService::new(self.credentials.clone(), self.jwt.clone())
    }

    /// Increment request counter
    pub fn increment_requests(&self) -> u64 {
        self.request_count.fetch_add(1, Ordering::SeqCst)
    }

    /// Get total request count
    pub fn get_request_count(&self) -> u64 {
        self.request_count.load(Ordering::SeqCst)
    }

    /// Get uptime in seconds
    pub fn uptime_secs(&self) -> u64 {
        self.start_time.elapsed().as_secs()
    }

    /// True when the database answers
    pub async fn database_ready(&self) -> bool {
        match self.store.ping().await {
            Ok(()) => true,
            Err(e) => {
                tracing::warn!(error = %e, "database ping failed");
                false
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_request_counter() {
        let state = AppState::in_memory(AppConfig::default()).await.unwrap();
        assert_eq!(state.get_request_count(), 0);
        state.increment_requests();
        state.increment_requests();
        assert_eq!(state.get_request_count(), 2);
    }

    #[tokio::test]
    async fn test_in_memory_database_is_ready() {
        let state = AppState::in_memory(AppConfig::default()).await.unwrap();
        assert!(state.database_ready().await);
    }
}
