//! Runtime configuration, read from the environment.

use rand::RngCore;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;
use zeroize::Zeroizing;

use crate::auth::Credentials;
use crate::rate_limit::RateLimiterConfig;
use crate::secrets::load_password;

/// Development passwords used when none are configured.
pub const DEFAULT_ADMIN_PASSWORD: &str = "000000";
pub const DEFAULT_GUEST_PASSWORD: &str = "123456";

pub const DEFAULT_CONSORTIUM_ADMIN: &str = "admin";

pub const DEFAULT_SESSION_TTL: Duration = Duration::from_secs(12 * 60 * 60);

/// Random per-process signing key; sessions do not survive a restart.
fn ephemeral_session_secret() -> Zeroizing<Vec<u8>> {
    let mut secret = Zeroizing::new(vec![0u8; 32]);
    rand::thread_rng().fill_bytes(&mut secret);
    secret
}

/// Journal server configuration
#[derive(Clone)]
pub struct JournalConfig {
    /// Directory holding the journal JSON files
    pub data_dir: PathBuf,
    pub bind_addr: SocketAddr,
    pub credentials: Credentials,
    /// Largest accepted request body, in bytes
    pub max_body_bytes: usize,
    pub login_rate_limit: RateLimiterConfig,
    /// First consortium admin, created at startup when a password is given
    pub consortium_admin_username: String,
    pub consortium_admin_password: Option<Zeroizing<String>>,
    /// HS256 key for consortium admin session tokens
    pub session_secret: Zeroizing<Vec<u8>>,
    pub session_ttl: Duration,
}

impl std::fmt::Debug for JournalConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JournalConfig")
            .field("data_dir", &self.data_dir)
            .field("bind_addr", &self.bind_addr)
            .field("max_body_bytes", &self.max_body_bytes)
            .field("login_rate_limit", &self.login_rate_limit)
            .field("consortium_admin_username", &self.consortium_admin_username)
            .field("session_ttl", &self.session_ttl)
            .finish_non_exhaustive()
    }
}

impl Default for JournalConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("data"),
            bind_addr: SocketAddr::from(([127, 0, 0, 1], 3000)),
            credentials: Credentials::new(
                Zeroizing::new(DEFAULT_ADMIN_PASSWORD.to_string()),
                Zeroizing::new(DEFAULT_GUEST_PASSWORD.to_string()),
            ),
            max_body_bytes: 64 * 1024,
            login_rate_limit: RateLimiterConfig::default(),
            consortium_admin_username: DEFAULT_CONSORTIUM_ADMIN.to_string(),
            consortium_admin_password: None,
            session_secret: ephemeral_session_secret(),
            session_ttl: DEFAULT_SESSION_TTL,
        }
    }
}

impl JournalConfig {
    /// Load configuration from environment variables, keeping defaults for
    /// anything missing or invalid.
    pub fn from_env() -> JournalConfig {
        let mut config = JournalConfig::default();

        if let Ok(dir) = std::env::var("TRADEBOOK_DATA_DIR") {
            if dir.trim().is_empty() {
                tracing::warn!(
                    "Empty TRADEBOOK_DATA_DIR, using default: {}",
                    config.data_dir.display()
                );
            } else {
                config.data_dir = PathBuf::from(dir);
            }
        }

        if let Ok(addr) = std::env::var("TRADEBOOK_BIND_ADDR") {
            match addr.parse::<SocketAddr>() {
                Ok(value) => config.bind_addr = value,
                Err(e) => {
                    tracing::warn!(
                        "Failed to parse TRADEBOOK_BIND_ADDR '{}': {}, using default: {}",
                        addr,
                        e,
                        config.bind_addr
                    );
                }
            }
        }

        config.credentials = Credentials::new(
            load_password("TRADEBOOK_ADMIN_PASSWORD", DEFAULT_ADMIN_PASSWORD),
            load_password("TRADEBOOK_GUEST_PASSWORD", DEFAULT_GUEST_PASSWORD),
        );

        if let Ok(limit) = std::env::var("TRADEBOOK_MAX_BODY_BYTES") {
            match limit.parse::<usize>() {
                Ok(value) if value > 0 => config.max_body_bytes = value,
                _ => {
                    tracing::warn!(
                        "Invalid TRADEBOOK_MAX_BODY_BYTES '{}', using default: {}",
                        limit,
                        config.max_body_bytes
                    );
                }
            }
        }

        if let Ok(rate) = std::env::var("TRADEBOOK_LOGIN_RATE_PER_MINUTE") {
            match rate.parse::<u32>() {
                Ok(value) if value > 0 => config.login_rate_limit.requests_per_minute = value,
                _ => {
                    tracing::warn!(
                        "Invalid TRADEBOOK_LOGIN_RATE_PER_MINUTE '{}', using default: {}",
                        rate,
                        config.login_rate_limit.requests_per_minute
                    );
                }
            }
        }

        if let Ok(username) = std::env::var("CONSORTIUM_ADMIN_USERNAME") {
            if !username.trim().is_empty() {
                config.consortium_admin_username = username.trim().to_string();
            }
        }

        config.consortium_admin_password = std::env::var("CONSORTIUM_ADMIN_PASSWORD")
            .ok()
            .filter(|p| !p.is_empty())
            .map(Zeroizing::new);

        match std::env::var("TRADEBOOK_SESSION_SECRET") {
            Ok(secret) if secret.trim().len() >= 32 => {
                config.session_secret = Zeroizing::new(secret.trim().as_bytes().to_vec());
            }
            Ok(_) => tracing::warn!(
                "TRADEBOOK_SESSION_SECRET shorter than 32 bytes, using a random per-process key"
            ),
            Err(_) => tracing::warn!(
                "TRADEBOOK_SESSION_SECRET not set, consortium sessions end when the server restarts"
            ),
        }

        if let Ok(hours) = std::env::var("TRADEBOOK_SESSION_TTL_HOURS") {
            match hours.parse::<u64>() {
                Ok(value) if value > 0 => config.session_ttl = Duration::from_secs(value * 60 * 60),
                _ => {
                    tracing::warn!(
                        "Invalid TRADEBOOK_SESSION_TTL_HOURS '{}', using default: {}h",
                        hours,
                        config.session_ttl.as_secs() / 3600
                    );
                }
            }
        }

        config
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::Role;

    #[test]
    fn test_default_config() {
        let config = JournalConfig::default();
        assert_eq!(config.data_dir, PathBuf::from("data"));
        assert_eq!(config.bind_addr.to_string(), "127.0.0.1:3000");
        assert_eq!(config.credentials.role_for("000000"), Some(Role::Admin));
        assert_eq!(config.credentials.role_for("123456"), Some(Role::Guest));
        assert!(config.consortium_admin_password.is_none());
        assert_eq!(config.session_secret.len(), 32);
        assert_eq!(config.session_ttl, DEFAULT_SESSION_TTL);
    }

    // Env-var names are unique to this test to avoid racing other tests.
    #[test]
    fn test_from_env_overrides_and_rejects() {
        std::env::set_var("TRADEBOOK_BIND_ADDR", "not-an-addr");
        std::env::set_var("TRADEBOOK_MAX_BODY_BYTES", "2048");
        std::env::set_var("TRADEBOOK_LOGIN_RATE_PER_MINUTE", "0");
        std::env::set_var("CONSORTIUM_ADMIN_USERNAME", " boss ");
        std::env::set_var("TRADEBOOK_SESSION_SECRET", "too-short");
        std::env::set_var("TRADEBOOK_SESSION_TTL_HOURS", "2");

        let config = JournalConfig::from_env();
        assert_eq!(config.bind_addr.to_string(), "127.0.0.1:3000");
        assert_eq!(config.max_body_bytes, 2048);
        assert_eq!(config.login_rate_limit.requests_per_minute, 30);
        assert_eq!(config.consortium_admin_username, "boss");
        assert_eq!(config.session_secret.len(), 32);
        assert_ne!(config.session_secret.as_slice(), b"too-short");
        assert_eq!(config.session_ttl, Duration::from_secs(2 * 60 * 60));

        std::env::remove_var("TRADEBOOK_BIND_ADDR");
        std::env::remove_var("TRADEBOOK_MAX_BODY_BYTES");
        std::env::remove_var("TRADEBOOK_LOGIN_RATE_PER_MINUTE");
        std::env::remove_var("CONSORTIUM_ADMIN_USERNAME");
        std::env::remove_var("TRADEBOOK_SESSION_SECRET");
        std::env::remove_var("TRADEBOOK_SESSION_TTL_HOURS");
    }
}
