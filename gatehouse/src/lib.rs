//! # gatehouse: credential and access-control core
//!
//! `gatehouse` is the account subsystem for a single-instance application: it
//! owns user registration, password verification, session-token issuance,
//! brute-force defense, role-based authorization, and an immutable audit trail
//! of administrative actions. It is a library, not a server: the enclosing
//! HTTP layer handles routing, request shaping, and pulling the raw token out
//! of headers or cookies, then calls the typed operations exposed here.
//!
//! ## Overview
//!
//! All state lives in an embedded SQLite store accessed through
//! [sqlx](https://github.com/launchbadge/sqlx); the [`db`] module follows the
//! repository pattern with one repository per table. Passwords are hashed
//! with Argon2id at a configurable work factor. Session tokens are stateless
//! signed JWTs carrying `{id, username, role}` and an expiry. Verification
//! needs no store lookup, which also means a token cannot be revoked before
//! it expires (a deliberate trade-off; rotating the signing secret is the
//! only kill switch).
//!
//! ### Login flow
//!
//! A login first consults the blacklist for the caller's source address and
//! refuses blocked addresses before touching credentials (no oracle, no
//! wasted hash work). A failed credential check records a login attempt;
//! when an address accumulates enough failures inside the trailing window it
//! is promoted onto the blacklist. Both the window count and blacklist
//! expiry are evaluated at query time; there is no sweeper task. Successful
//! logins update `last_login`, append a best-effort activity event, and mint
//! a token.
//!
//! ### Administrative flow
//!
//! Administrative operations take the acting identity as a decoded
//! [`CurrentUser`] (the verified token contents). The authorization guards
//! in [`auth::current_user`] run before any mutation, and every privileged
//! mutation writes exactly one audit entry in the same transaction; if the
//! audit write fails, the mutation rolls back with it.
//!
//! ## Quick start
//!
//! ```no_run
//! use gatehouse::{Config, Gatehouse};
//! use sqlx::sqlite::SqlitePoolOptions;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = Config::load("gatehouse.yaml")?;
//!     let pool = SqlitePoolOptions::new().connect("sqlite://gatehouse.db").await?;
//!     gatehouse::migrator().run(&pool).await?;
//!
//!     let gatehouse = Gatehouse::new(pool, config);
//!     gatehouse.ensure_default_admin().await?;
//!
//!     let session = gatehouse.login("admin", "admin123", "127.0.0.1", None).await?;
//!     let identity = gatehouse.verify_token(Some(&session.token))?;
//!     println!("logged in as {}", identity.username);
//!     Ok(())
//! }
//! ```

pub mod auth;
pub mod config;
pub mod db;
pub mod errors;
pub mod ops;
pub mod types;

#[cfg(test)]
pub(crate) mod test_utils;

use sqlx::SqlitePool;
use tracing::{instrument, warn};

use crate::auth::lockout::LockoutPolicy;
use crate::db::handlers::Users;
use crate::db::models::users::UserCreateDBRequest;
use crate::types::UserId;

pub use crate::auth::current_user::CurrentUser;
pub use crate::config::Config;
pub use crate::db::handlers::Repository;
pub use crate::db::models::users::{PublicUser, Role, UserStatus};
pub use crate::errors::{Error, Result};
pub use crate::ops::accounts::LoginSuccess;
pub use crate::ops::admin::UserPage;
pub use crate::ops::pagination::Pagination;
pub use crate::ops::reports::{AuditLogPage, UserStats};

/// Get the gatehouse database migrator
pub fn migrator() -> sqlx::migrate::Migrator {
    sqlx::migrate!("./migrations")
}

/// The access-control service. Cheap to clone-by-reference across request
/// handlers: all methods take `&self`, and the only in-process state beyond
/// the pool is read-only configuration.
pub struct Gatehouse {
    pub(crate) db: SqlitePool,
    pub(crate) config: Config,
    pub(crate) lockout: LockoutPolicy,
}

impl Gatehouse {
    pub fn new(db: SqlitePool, config: Config) -> Self {
        let lockout = LockoutPolicy::new(&config.auth.lockout);
        Self { db, config, lockout }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Provision the default administrative account, exactly once.
    ///
    /// Creates the configured admin user only when no admin-role account
    /// exists; an existing admin (whatever its name) means this does nothing.
    /// Returns the new user's id when an account was created.
    ///
    /// The default credential is a well-known operational bootstrap, not a
    /// security recommendation. Rotate it on deployment.
    #[instrument(skip_all)]
    pub async fn ensure_default_admin(&self) -> Result<Option<UserId>> {
        let mut conn = self.db.acquire().await.map_err(|e| Error::Database(e.into()))?;

        if Users::new(&mut conn).admin_exists().await? {
            return Ok(None);
        }

        let password_hash = self.hash_password(self.config.admin_password.clone()).await?;

        let created = Users::new(&mut conn)
            .create(&UserCreateDBRequest {
                username: self.config.admin_username.clone(),
                password_hash,
                email: None,
                role: Role::Admin,
            })
            .await?;

        warn!(
            username = %created.username,
            "provisioned default administrative account with the configured bootstrap password; rotate it"
        );

        Ok(Some(created.id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::{gatehouse, test_config};
    use sqlx::SqlitePool;

    #[sqlx::test]
    #[test_log::test]
    async fn test_default_admin_provisioned_once(pool: SqlitePool) {
        let gh = gatehouse(pool);

        let first = gh.ensure_default_admin().await.unwrap();
        assert!(first.is_some());

        // Second startup finds an admin and leaves the store alone
        let second = gh.ensure_default_admin().await.unwrap();
        assert!(second.is_none());

        // The bootstrap credential actually works
        let config = test_config();
        let session = gh
            .login(&config.admin_username, &config.admin_password, "127.0.0.1", None)
            .await
            .unwrap();
        assert_eq!(session.user.role, Role::Admin);
    }

    #[sqlx::test]
    async fn test_existing_admin_suppresses_bootstrap(pool: SqlitePool) {
        let gh = gatehouse(pool);

        // Manually promoted account counts as "an admin exists"
        let alice = gh.register("alice", "password1", None).await.unwrap();
        {
            let mut conn = gh.db.acquire().await.unwrap();
            Users::new(&mut conn).update_role(alice.id, Role::Admin).await.unwrap();
        }

        assert!(gh.ensure_default_admin().await.unwrap().is_none());
    }
}
