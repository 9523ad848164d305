//! Secret handling for login passwords.
//!
//! Passwords are held in `Zeroizing` buffers so they are wiped from memory on
//! drop. Stored credentials are Argon2id hashes in PHC string format.

use argon2::{
    password_hash::{
        rand_core::OsRng, Error as PasswordHashError, PasswordHash, PasswordHasher,
        PasswordVerifier, SaltString,
    },
    Argon2,
};
use std::env;
use tracing::warn;
use zeroize::Zeroizing;

/// Error type for secret loading operations
#[derive(Debug, thiserror::Error)]
pub enum SecretError {
    #[error("Environment variable not set: {0}")]
    EnvVarNotSet(String),

    #[error("Secret validation failed: {0}")]
    ValidationFailed(String),

    #[error("Malformed password hash")]
    MalformedHash,

    #[error("Password hashing failed: {0}")]
    HashingFailed(String),
}

/// Load a password from `env_var_name`, falling back to `fallback`.
///
/// The fallback exists for local development only and is logged loudly.
pub fn load_password(env_var_name: &str, fallback: &str) -> Zeroizing<String> {
    match load_from_env(env_var_name) {
        Ok(secret) if !secret.trim().is_empty() => secret,
        _ => {
            warn!(
                "⚠️  {} not set, using the built-in development password (INSECURE for production)",
                env_var_name
            );
            Zeroizing::new(fallback.to_string())
        }
    }
}

/// Load a secret from environment variable (wrapped in Zeroizing)
fn load_from_env(env_var_name: &str) -> Result<Zeroizing<String>, SecretError> {
    env::var(env_var_name)
        .map(|value| Zeroizing::new(value.trim().to_string()))
        .map_err(|_| SecretError::EnvVarNotSet(env_var_name.to_string()))
}

/// Validate that a secret meets minimum security requirements
pub fn validate_secret_strength(secret: &str, min_length: usize) -> Result<(), SecretError> {
    if secret.len() < min_length {
        return Err(SecretError::ValidationFailed(format!(
            "Secret too short: {} characters (minimum: {})",
            secret.len(),
            min_length
        )));
    }

    let weak_patterns = ["password", "changeme", "000000", "123456", "qwerty"];
    let secret_lower = secret.to_lowercase();

    for pattern in &weak_patterns {
        if secret_lower.contains(pattern) {
            return Err(SecretError::ValidationFailed(format!(
                "Secret contains weak pattern: {}",
                pattern
            )));
        }
    }

    Ok(())
}

/// Hash `password` with Argon2id and a fresh random salt.
pub fn hash_password(password: &str) -> Result<String, SecretError> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| SecretError::HashingFailed(e.to_string()))
}

/// Check `password` against a PHC hash produced by [`hash_password`].
pub fn verify_password(password: &str, stored: &str) -> Result<bool, SecretError> {
    let parsed = PasswordHash::new(stored).map_err(|_| SecretError::MalformedHash)?;
    match Argon2::default().verify_password(password.as_bytes(), &parsed) {
        Ok(()) => Ok(true),
        Err(PasswordHashError::Password) => Ok(false),
        Err(e) => Err(SecretError::HashingFailed(e.to_string())),
    }
}
