//! Self-service account operations: registration, login, token verification,
//! password changes, and profile viewing.

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{instrument, warn};

use crate::auth::{current_user, session};
use crate::db::errors::DbError;
use crate::db::handlers::{ActivityEvents, Blacklist, LoginAttempts, Repository, Users};
use crate::db::models::activity::{ActivityEventCreateDBRequest, ActivityType};
use crate::db::models::users::{PublicUser, Role, User, UserCreateDBRequest, UserStatus};
use crate::errors::{Error, Result};
use crate::ops::{validate_email, validate_username};
use crate::types::UserId;
use crate::{CurrentUser, Gatehouse};

/// Outcome of a successful login: a signed session token plus the public view
/// of the account it identifies.
#[derive(Debug, Clone, Serialize)]
pub struct LoginSuccess {
    pub token: String,
    pub user: PublicUser,
}

impl Gatehouse {
    /// Register a new account with the `user` role.
    ///
    /// Admin accounts are never created here; an existing admin promotes a
    /// user with [`Gatehouse::update_role`].
    #[instrument(skip(self, password), err)]
    pub async fn register(&self, username: &str, password: &str, email: Option<&str>) -> Result<PublicUser> {
        validate_username(username)?;
        self.validate_password(password)?;
        if let Some(email) = email {
            validate_email(email)?;
        }

        let password_hash = self.hash_password(password.to_string()).await?;

        let mut conn = self.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
        let created = Users::new(&mut conn)
            .create(&UserCreateDBRequest {
                username: username.to_string(),
                password_hash,
                email: email.map(str::to_string),
                role: Role::User,
            })
            .await
            .map_err(map_user_unique_violation)?;

        Ok(created.into())
    }

    /// Authenticate a username/password pair from a source address and mint a
    /// session token.
    ///
    /// The blacklist is consulted before credentials are touched, so a blocked
    /// address learns nothing about account existence and costs no hash work.
    /// A credential failure (unknown username included) is recorded against
    /// the source address; the failure that crosses the attempt threshold
    /// promotes the address onto the blacklist in the same transaction.
    #[instrument(skip(self, password), err)]
    pub async fn login(
        &self,
        username: &str,
        password: &str,
        source_address: &str,
        client_agent: Option<&str>,
    ) -> Result<LoginSuccess> {
        let now = Utc::now();

        let mut conn = self.db.acquire().await.map_err(|e| Error::Database(e.into()))?;

        if let Some(entry) = Blacklist::new(&mut conn).active_block(source_address, now).await? {
            return Err(Error::AddressBlocked {
                until: entry.blocked_until,
            });
        }

        let user = Users::new(&mut conn).get_by_username(username).await?;
        drop(conn);

        // An unknown username takes the same failure path as a wrong password.
        let credentials_ok = match &user {
            Some(user) => self.verify_password(password.to_string(), user.password_hash.clone()).await?,
            None => false,
        };

        if !credentials_ok {
            let failure = self.note_failed_attempt(source_address, username, now).await?;
            return Err(failure);
        }

        let mut user = user.ok_or_else(Error::user_not_found)?;
        if user.status == UserStatus::Disabled {
            return Err(Error::AccountDisabled);
        }

        let mut conn = self.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
        Users::new(&mut conn).touch_last_login(user.id, now).await?;
        user.last_login = Some(now);

        // Activity recording is best-effort: a full analytics table must never
        // cost a user their login.
        let event = ActivityEventCreateDBRequest {
            user_id: user.id,
            activity_type: ActivityType::Login,
            source_address: Some(source_address.to_string()),
            client_agent: client_agent.map(str::to_string),
        };
        if let Err(error) = ActivityEvents::new(&mut conn).record(&event).await {
            warn!(%error, user_id = %user.id, "failed to record login activity");
        }

        let identity = CurrentUser {
            id: user.id,
            username: user.username.clone(),
            role: user.role,
        };
        let token = session::create_session_token(&identity, &self.config)?;

        Ok(LoginSuccess {
            token,
            user: user.into(),
        })
    }

    /// Record a failed attempt and decide what the caller is told.
    ///
    /// Returns the error to surface: the attempt that crosses the threshold
    /// blacklists the address and reports [`Error::TooManyAttempts`]; every
    /// other failure reports [`Error::InvalidCredentials`].
    async fn note_failed_attempt(&self, source_address: &str, attempted_username: &str, now: DateTime<Utc>) -> Result<Error> {
        let mut tx = self.db.begin().await.map_err(|e| Error::Database(e.into()))?;

        LoginAttempts::new(&mut tx).record(source_address, attempted_username, now).await?;
        let failures = LoginAttempts::new(&mut tx)
            .count_since(source_address, self.lockout.window_start(now))
            .await?;

        let outcome = if self.lockout.should_block(failures) {
            let retry_at = self.lockout.block_until(now);
            Blacklist::new(&mut tx).upsert(source_address, retry_at).await?;
            warn!(source_address, failures, "address blacklisted after repeated login failures");
            Error::TooManyAttempts { retry_at }
        } else {
            Error::InvalidCredentials
        };

        tx.commit().await.map_err(|e| Error::Database(e.into()))?;
        Ok(outcome)
    }

    /// Decode and verify a presented session token into the acting identity.
    ///
    /// Pure token work: no store access, no liveness check against the user
    /// row. A token stays valid until it expires.
    pub fn verify_token(&self, token: Option<&str>) -> Result<CurrentUser> {
        current_user::authenticate(token, &self.config)
    }

    /// Change a user's own password, verifying the current one first.
    #[instrument(skip(self, current_password, new_password), err)]
    pub async fn change_password(&self, user_id: UserId, current_password: &str, new_password: &str) -> Result<()> {
        let mut conn = self.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
        let user: User = Users::new(&mut conn)
            .get_by_id(user_id)
            .await?
            .ok_or_else(Error::user_not_found)?;
        drop(conn);

        if !self
            .verify_password(current_password.to_string(), user.password_hash.clone())
            .await?
        {
            return Err(Error::InvalidCredentials);
        }

        self.validate_password(new_password)?;
        let password_hash = self.hash_password(new_password.to_string()).await?;

        let mut conn = self.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
        Users::new(&mut conn).update_password_hash(user_id, &password_hash).await?;
        Ok(())
    }

    /// Fetch the public profile of a user. A user may view themselves; admins
    /// may view anyone.
    #[instrument(skip(self), err)]
    pub async fn get_user(&self, actor: &CurrentUser, user_id: UserId) -> Result<PublicUser> {
        current_user::require_self_or_admin(actor, user_id, "view", "user profile")?;

        let mut conn = self.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
        let user = Users::new(&mut conn)
            .get_by_id(user_id)
            .await?
            .ok_or_else(Error::user_not_found)?;
        Ok(user.into())
    }
}

/// Map a unique violation from the users table to the caller-facing error.
fn map_user_unique_violation(err: DbError) -> Error {
    match &err {
        DbError::UniqueViolation { constraint, .. } => match constraint.as_deref() {
            Some("users.username") => Error::DuplicateUsername,
            Some("users.email") => Error::Validation {
                message: "Email address is already in use".to_string(),
            },
            _ => Error::Database(err),
        },
        _ => Error::Database(err),
    }
}
