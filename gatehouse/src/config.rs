//! Service configuration management.
//!
//! Configuration is loaded from a YAML file with environment variable
//! overrides. Variables prefixed with `GATEHOUSE_` override YAML values; for
//! nested values use double underscores, e.g. `GATEHOUSE_AUTH__LOCKOUT__MAX_FAILURES=10`.
//!
//! All fields have production-safe defaults except `secret_key`, which must be
//! provided before any token can be issued or verified.

use figment::{
    Figment,
    providers::{Env, Format, Yaml},
};
use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::errors::{Error, Result};

/// Root configuration for the access-control core.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    /// Secret key for signing session tokens (required before issuing tokens)
    pub secret_key: Option<String>,
    /// Username for the default administrative account provisioned at first
    /// startup when no admin-role account exists
    pub admin_username: String,
    /// Password for the default administrative account. A well-known bootstrap
    /// credential: rotate it on deployment.
    pub admin_password: String,
    /// Authentication and brute-force defense settings
    pub auth: AuthConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            secret_key: None,
            admin_username: "admin".to_string(),
            admin_password: "admin123".to_string(),
            auth: AuthConfig::default(),
        }
    }
}

impl Config {
    /// Load configuration from a YAML file merged with `GATEHOUSE_`-prefixed
    /// environment variables (environment wins).
    pub fn load(path: &str) -> Result<Self> {
        Figment::new()
            .merge(Yaml::file(path))
            .merge(Env::prefixed("GATEHOUSE_").split("__"))
            .extract()
            .map_err(|e| Error::Internal {
                operation: format!("load configuration: {e}"),
            })
    }
}

/// Authentication configuration.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct AuthConfig {
    /// Password validation and hashing rules
    pub password: PasswordConfig,
    /// Session token settings
    pub security: SecurityConfig,
    /// Brute-force defense policy
    pub lockout: LockoutConfig,
}

/// Password validation rules and hashing work factor.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct PasswordConfig {
    /// Minimum password length
    pub min_length: usize,
    /// Maximum password length
    pub max_length: usize,
    /// Argon2 memory cost in KiB (default: 19456 KiB = 19 MB)
    pub argon2_memory_kib: u32,
    /// Argon2 iterations
    pub argon2_iterations: u32,
    /// Argon2 parallelism
    pub argon2_parallelism: u32,
}

impl Default for PasswordConfig {
    fn default() -> Self {
        Self {
            min_length: 6,
            max_length: 128,
            argon2_memory_kib: 19456,
            argon2_iterations: 2,
            argon2_parallelism: 1,
        }
    }
}

/// Session token settings.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct SecurityConfig {
    /// How long issued session tokens remain valid
    #[serde(with = "humantime_serde")]
    pub token_expiry: Duration,
}

impl Default for SecurityConfig {
    fn default() -> Self {
        Self {
            token_expiry: Duration::from_secs(24 * 60 * 60),
        }
    }
}

/// Brute-force defense policy.
///
/// Fixed policy values (5 failures / 1 hour window / 24 hour block) are the
/// defaults; each knob stays independently configurable.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct LockoutConfig {
    /// Failed attempts within the window that trigger a block
    pub max_failures: u32,
    /// Trailing window over which failures are counted
    #[serde(with = "humantime_serde")]
    pub failure_window: Duration,
    /// How long a promoted address stays blocked
    #[serde(with = "humantime_serde")]
    pub block_duration: Duration,
}

impl Default for LockoutConfig {
    fn default() -> Self {
        Self {
            max_failures: 5,
            failure_window: Duration::from_secs(60 * 60),
            block_duration: Duration::from_secs(24 * 60 * 60),
        }
    }
}
