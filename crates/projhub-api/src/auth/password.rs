//! Password hashing and verification using Argon2id
//!
//! Digests are PHC strings, so algorithm, parameters and the random 16-byte
//! salt travel with the hash and no separate storage is needed. Cost
//! parameters come from [`AuthConfig`]; verification reads them back from the
//! digest itself.
use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2, Params,
};
use projhub_core::AuthConfig;
use thiserror::Error;

/// Password hashing and verification errors
#[derive(Debug, Error)]
pub enum PasswordError {
    #[error("Failed to hash password: {0}")]
    HashingFailed(String),

    #[error("Failed to verify password: {0}")]
    VerificationFailed(String),

    #[error("Invalid password hash format")]
    InvalidHashFormat,
}

/// Argon2 cost parameters
#[derive(Debug, Clone)]
pub struct PasswordConfig {
    /// Memory cost in KiB (default: 65536 = 64 MiB)
    pub memory_cost: u32,
    /// Iterations (default: 3)
    pub time_cost: u32,
    /// Lanes (default: 4)
    pub parallelism: u32,
    /// Output length in bytes (default: 32)
    pub output_len: Option<usize>,
}

impl Default for PasswordConfig {
    fn default() -> Self {
        Self::from_auth_config(&AuthConfig::default())
    }
}

impl PasswordConfig {
    pub fn from_auth_config(config: &AuthConfig) -> Self {
        Self {
            memory_cost: config.password_memory_kib,
            time_cost: config.password_iterations,
            parallelism: config.password_parallelism,
            output_len: Some(32),
        }
    }

    fn to_params(&self) -> Result<Params, PasswordError> {
        Params::new(
            self.memory_cost,
            self.time_cost,
            self.parallelism,
            self.output_len,
        )
        .map_err(|e| PasswordError::HashingFailed(e.to_string()))
    }
}

/// Hash a plaintext password into a PHC string
pub fn hash_password(password: &str, config: &PasswordConfig) -> Result<String, PasswordError> {
    let salt = SaltString::generate(&mut OsRng);

    let params = config.to_params()?;
    let argon2 = Argon2::new(argon2::Algorithm::Argon2id, argon2::Version::V0x13, params);

    let password_hash = argon2
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| PasswordError::HashingFailed(e.to_string()))?;

    Ok(password_hash.to_string())
}

/// Verify a plaintext password against a stored digest
///
/// # Returns
///
/// * `Ok(true)` - Password matches
/// * `Ok(false)` - Password does not match
/// * `Err(PasswordError)` - The digest is not a valid PHC string
pub fn verify_password(password: &str, hash: &str) -> Result<bool, PasswordError> {
    let parsed_hash = PasswordHash::new(hash).map_err(|_| PasswordError::InvalidHashFormat)?;

    match Argon2::default().verify_password(password.as_bytes(), &parsed_hash) {
        Ok(()) => Ok(true),
        Err(argon2::password_hash::Error::Password) => Ok(false),
        Err(e) => Err(PasswordError::VerificationFailed(e.to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn light_config() -> PasswordConfig {
        PasswordConfig {
            memory_cost: 1024,
            time_cost: 1,
            parallelism: 1,
            output_len: Some(32),
        }
    }

    #[test]
    fn test_hash_and_verify_password() {
        let hash = hash_password("secret123", &light_config()).unwrap();

        assert!(verify_password("secret123", &hash).unwrap());
        assert!(!verify_password("wrongpass", &hash).unwrap());
    }

    #[test]
    fn test_same_password_produces_different_hashes() {
        let config = light_config();
        let hash1 = hash_password("secret123", &config).unwrap();
        let hash2 = hash_password("secret123", &config).unwrap();

        assert_ne!(hash1, hash2);
        assert!(verify_password("secret123", &hash1).unwrap());
        assert!(verify_password("secret123", &hash2).unwrap());
    }

    #[test]
    fn test_invalid_hash_format() {
        let result = verify_password("password", "invalid-hash-format");
        assert!(matches!(result, Err(PasswordError::InvalidHashFormat)));
    }

    #[test]
    fn test_parameters_are_embedded() {
        let config = PasswordConfig {
            memory_cost: 2048,
            time_cost: 2,
            parallelism: 2,
            output_len: Some(32),
        };
        let hash = hash_password("secret123", &config).unwrap();

        assert!(hash.starts_with("$argon2id$"));
        assert!(hash.contains("m=2048"));
        assert!(hash.contains("t=2"));
        assert!(hash.contains("p=2"));
        assert!(verify_password("secret123", &hash).unwrap());
    }

    #[test]
    fn test_defaults_follow_auth_config() {
        let config = PasswordConfig::default();
        assert_eq!(config.memory_cost, 65536);
        assert_eq!(config.time_cost, 3);
        assert_eq!(config.parallelism, 4);
    }

    #[test]
    fn test_invalid_params_are_reported() {
        let config = PasswordConfig {
            memory_cost: 1,
            time_cost: 0,
            parallelism: 1,
            output_len: Some(32),
        };
        assert!(matches!(
            hash_password("secret123", &config),
            Err(PasswordError::HashingFailed(_))
        ));
    }
}
