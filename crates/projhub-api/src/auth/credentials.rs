//! Credential store: user identities plus their password digests

use super::middleware::AuthError;
use super::password::{hash_password, verify_password, PasswordConfig, PasswordError};
use projhub_core::{ProjhubError, Store, User};
use std::sync::Arc;
use tokio::sync::OnceCell;

/// Plaintext behind the digest checked when a handle is unknown
const DUMMY_PASSWORD: &str = "projhub-dummy-password";

/// Registration and credential checks on top of the user repository.
///
/// Hashing and verification run on the blocking thread pool.
#[derive(Clone)]
pub struct CredentialStore {
    store: Arc<dyn Store>,
    passwords: PasswordConfig,
    dummy_digest: Arc<OnceCell<String>>,
}

impl CredentialStore {
    pub fn new(store: Arc<dyn Store>, passwords: PasswordConfig) -> Self {
        Self {
            store,
            passwords,
            dummy_digest: Arc::new(OnceCell::new()),
        }
    }

    /// Digest verified against for unknown handles, hashed once with the
    /// configured cost so a miss costs as much as a wrong password
    async fn dummy_digest(&self) -> Result<&str, AuthError> {
        let digest = self
            .dummy_digest
            .get_or_try_init(|| async {
                let config = self.passwords.clone();
                match tokio::task::spawn_blocking(move || hash_password(DUMMY_PASSWORD, &config))
                    .await
                {
                    Ok(result) => result,
                    Err(e) => Err(PasswordError::HashingFailed(e.to_string())),
                }
            })
            .await?;
        Ok(digest.as_str())
    }

    /// Create a new identity. Handles are matched exactly (case-sensitive).
    pub async fn register(&self, handle: &str, plaintext: &str) -> Result<User, AuthError> {
        if self.find_by_handle(handle).await?.is_some() {
            return Err(AuthError::DuplicateIdentity(handle.to_string()));
        }

        let config = self.passwords.clone();
        let password = plaintext.to_string();
        let digest = tokio::task::spawn_blocking(move || hash_password(&password, &config))
            .await
            .map_err(|e| PasswordError::HashingFailed(e.to_string()))??;

        // a concurrent registration can still win the unique constraint
        match self.store.create_user(handle, &digest).await {
            Ok(user) => Ok(user),
            Err(ProjhubError::AlreadyExists(_)) => {
                Err(AuthError::DuplicateIdentity(handle.to_string()))
            }
            Err(e) => Err(e.into()),
        }
    }

    pub async fn find_by_handle(&self, handle: &str) -> Result<Option<User>, AuthError> {
        Ok(self.store.find_user_by_username(handle).await?)
    }

    pub async fn find_by_id(&self, id: i64) -> Result<Option<User>, AuthError> {
        Ok(self.store.find_user_by_id(id).await?)
    }

    /// Resolve a handle/password pair to its identity.
    ///
    /// Unknown handles and wrong passwords both yield
    /// [`AuthError::BadCredentials`].
    pub async fn verify_credentials(&self, handle: &str, plaintext: &str) -> Result<User, AuthError> {
        let user = self.find_by_handle(handle).await?;
        let digest = match &user {
            Some(user) => user.password_hash.clone(),
            None => self.dummy_digest().await?.to_string(),
        };

        let password = plaintext.to_string();
        let matches = tokio::task::spawn_blocking(move || verify_password(&password, &digest))
            .await
            .map_err(|e| PasswordError::VerificationFailed(e.to_string()))??;

        match user {
            Some(user) if matches => Ok(user),
            _ => Err(AuthError::BadCredentials),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use projhub_core::SqliteStore;

    async fn credentials() -> CredentialStore {
        let store = SqliteStore::in_memory().await.unwrap();
        CredentialStore::new(
            Arc::new(store),
            PasswordConfig {
                memory_cost: 1024,
                time_cost: 1,
                parallelism: 1,
                output_len: Some(32),
            },
        )
    }

    #[tokio::test]
    async fn test_register_then_verify() {
        let credentials = credentials().await;
        let user = credentials.register("alice", "secret123").await.unwrap();

        assert_eq!(user.username, "alice");
        assert_ne!(user.password_hash, "secret123");

        let verified = credentials
            .verify_credentials("alice", "secret123")
            .await
            .unwrap();
        assert_eq!(verified.id, user.id);
    }

    #[tokio::test]
    async fn test_duplicate_registration() {
        let credentials = credentials().await;
        credentials.register("alice", "secret123").await.unwrap();

        let result = credentials.register("alice", "other").await;
        assert!(matches!(result, Err(AuthError::DuplicateIdentity(_))));
    }

    #[tokio::test]
    async fn test_bad_credentials_are_indistinguishable() {
        let credentials = credentials().await;
        credentials.register("alice", "secret123").await.unwrap();

        let wrong_password = credentials.verify_credentials("alice", "wrongpass").await;
        let unknown_user = credentials.verify_credentials("bob", "secret123").await;

        assert!(matches!(wrong_password, Err(AuthError::BadCredentials)));
        assert!(matches!(unknown_user, Err(AuthError::BadCredentials)));
    }

    #[tokio::test]
    async fn test_unknown_handle_still_verifies_a_digest() {
        let credentials = credentials().await;
        assert!(credentials.dummy_digest.get().is_none());

        let result = credentials.verify_credentials("ghost", "secret123").await;
        assert!(matches!(result, Err(AuthError::BadCredentials)));

        let digest = credentials.dummy_digest.get().unwrap();
        assert!(digest.starts_with("$argon2id$"));

        // the dummy plaintext must not log anyone in either
        let result = credentials.verify_credentials("ghost", DUMMY_PASSWORD).await;
        assert!(matches!(result, Err(AuthError::BadCredentials)));
    }

    #[tokio::test]
    async fn test_lookup_by_handle_and_id() {
        let credentials = credentials().await;
        let user = credentials.register("alice", "secret123").await.unwrap();

        assert!(credentials.find_by_handle("Alice").await.unwrap().is_none());
        assert_eq!(
            credentials.find_by_id(user.id).await.unwrap().map(|u| u.username),
            Some("alice".to_string())
        );
        assert!(credentials.find_by_id(user.id + 100).await.unwrap().is_none());
    }
}
