//! Shared helpers for the in-module test suites.

use sqlx::SqlitePool;

use crate::auth::current_user::CurrentUser;
use crate::config::Config;
use crate::db::models::users::{PublicUser, Role};
use crate::Gatehouse;

/// A config with a fixed signing secret and an Argon2 work factor small
/// enough to keep the suite fast. Everything else is defaults.
pub fn test_config() -> Config {
    let mut config = Config::default();
    config.secret_key = Some("test-secret-key".to_string());
    config.auth.password.argon2_memory_kib = 1024;
    config.auth.password.argon2_iterations = 1;
    config
}

pub fn gatehouse(pool: SqlitePool) -> Gatehouse {
    Gatehouse::new(pool, test_config())
}

/// Acting identity as it would arrive from a decoded token.
pub fn actor(user: &PublicUser) -> CurrentUser {
    CurrentUser {
        id: user.id,
        username: user.username.clone(),
        role: user.role,
    }
}

/// An admin identity that does not correspond to any stored row. Fine for
/// authorization checks, which trust the token contents.
pub fn phantom_admin() -> CurrentUser {
    CurrentUser {
        id: uuid::Uuid::new_v4(),
        username: "phantom-admin".to_string(),
        role: Role::Admin,
    }
}
