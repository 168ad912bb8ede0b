//! Administrative operations over user accounts.
//!
//! Every privileged mutation here appends one audit entry in the same
//! transaction as the mutation itself: if the audit write fails, the mutation
//! rolls back. An unauditable change never lands.

use serde::Serialize;
use tracing::instrument;

use crate::auth::current_user;
use crate::db::errors::DbError;
use crate::db::handlers::{AuditLogs, Repository, UserFilter, Users};
use crate::db::models::audit::AuditLogCreateDBRequest;
use crate::db::models::users::{PublicUser, Role, User, UserStatus};
use crate::errors::{Error, Result};
use crate::ops::pagination::Pagination;
use crate::ops::validate_email;
use crate::types::UserId;
use crate::{CurrentUser, Gatehouse};

/// One page of user listings plus the unpaginated total.
#[derive(Debug, Clone, Serialize)]
pub struct UserPage {
    pub users: Vec<PublicUser>,
    pub total: i64,
}

impl Gatehouse {
    /// Set a user's password without knowing the current one. Admin only.
    #[instrument(skip(self, new_password), err)]
    pub async fn reset_password(
        &self,
        actor: &CurrentUser,
        target_id: UserId,
        new_password: &str,
        source_address: &str,
    ) -> Result<()> {
        current_user::require_admin(actor, "reset password for", "user")?;
        self.validate_password(new_password)?;

        let password_hash = self.hash_password(new_password.to_string()).await?;

        let mut tx = self.db.begin().await.map_err(|e| Error::Database(e.into()))?;

        let target = Users::new(&mut tx)
            .get_by_id(target_id)
            .await?
            .ok_or_else(Error::user_not_found)?;
        Users::new(&mut tx).update_password_hash(target_id, &password_hash).await?;

        AuditLogs::new(&mut tx)
            .create(&audit_entry(
                actor,
                "password_reset",
                &target,
                "Password reset by administrator".to_string(),
                source_address,
            ))
            .await?;

        tx.commit().await.map_err(|e| Error::Database(e.into()))?;
        Ok(())
    }

    /// Enable or disable an account. Admin only; admins cannot change their
    /// own status.
    #[instrument(skip(self), err)]
    pub async fn update_status(
        &self,
        actor: &CurrentUser,
        target_id: UserId,
        status: UserStatus,
        source_address: &str,
    ) -> Result<PublicUser> {
        current_user::require_admin(actor, "change status of", "user")?;
        current_user::forbid_self_mutation(actor, target_id, "status")?;

        let mut tx = self.db.begin().await.map_err(|e| Error::Database(e.into()))?;

        let updated = Users::new(&mut tx)
            .update_status(target_id, status)
            .await
            .map_err(map_missing_user)?;

        AuditLogs::new(&mut tx)
            .create(&audit_entry(
                actor,
                "status_change",
                &updated,
                format!("Status changed to {status}"),
                source_address,
            ))
            .await?;

        tx.commit().await.map_err(|e| Error::Database(e.into()))?;
        Ok(updated.into())
    }

    /// Change an account's role. Admin only; admins cannot change their own
    /// role, so the last admin can never demote themselves.
    #[instrument(skip(self), err)]
    pub async fn update_role(
        &self,
        actor: &CurrentUser,
        target_id: UserId,
        role: Role,
        source_address: &str,
    ) -> Result<PublicUser> {
        current_user::require_admin(actor, "change role of", "user")?;
        current_user::forbid_self_mutation(actor, target_id, "role")?;

        let mut tx = self.db.begin().await.map_err(|e| Error::Database(e.into()))?;

        let updated = Users::new(&mut tx)
            .update_role(target_id, role)
            .await
            .map_err(map_missing_user)?;

        AuditLogs::new(&mut tx)
            .create(&audit_entry(
                actor,
                "role_change",
                &updated,
                format!("Role changed to {role}"),
                source_address,
            ))
            .await?;

        tx.commit().await.map_err(|e| Error::Database(e.into()))?;
        Ok(updated.into())
    }

    /// Update a user's profile fields (currently the email address). A user
    /// may update their own profile; admins may update anyone's.
    ///
    /// Profile edits are routine self-service, not privileged administration,
    /// so no audit entry is written.
    #[instrument(skip(self), err)]
    pub async fn update_profile(&self, actor: &CurrentUser, target_id: UserId, email: Option<&str>) -> Result<PublicUser> {
        current_user::require_self_or_admin(actor, target_id, "update", "user profile")?;
        if let Some(email) = email {
            validate_email(email)?;
        }

        let mut conn = self.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
        let updated = Users::new(&mut conn)
            .update_email(target_id, email)
            .await
            .map_err(|err| match &err {
                DbError::NotFound => Error::user_not_found(),
                DbError::UniqueViolation { .. } => Error::Validation {
                    message: "Email address is already in use".to_string(),
                },
                _ => Error::Database(err),
            })?;
        Ok(updated.into())
    }

    /// List all users, newest first. Admin only.
    #[instrument(skip(self), err)]
    pub async fn list_users(&self, actor: &CurrentUser, page: Pagination) -> Result<UserPage> {
        self.fetch_users(actor, None, page).await
    }

    /// List users whose username or email contains `term`, newest first.
    /// Admin only.
    #[instrument(skip(self), err)]
    pub async fn search_users(&self, actor: &CurrentUser, term: &str, page: Pagination) -> Result<UserPage> {
        self.fetch_users(actor, Some(term.to_string()), page).await
    }

    async fn fetch_users(&self, actor: &CurrentUser, search: Option<String>, page: Pagination) -> Result<UserPage> {
        current_user::require_admin(actor, "list", "users")?;

        let filter = UserFilter::new(search, page.offset(), page.limit());

        let mut conn = self.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
        let mut repo = Users::new(&mut conn);
        let users = repo.list(&filter).await?;
        let total = repo.count(&filter).await?;

        Ok(UserPage {
            users: users.into_iter().map(PublicUser::from).collect(),
            total,
        })
    }
}

fn audit_entry(actor: &CurrentUser, action: &str, target: &User, details: String, source_address: &str) -> AuditLogCreateDBRequest {
    AuditLogCreateDBRequest {
        actor_id: actor.id,
        actor_username: actor.username.clone(),
        action: action.to_string(),
        target_user_id: Some(target.id),
        target_username: Some(target.username.clone()),
        details,
        source_address: source_address.to_string(),
    }
}

fn map_missing_user(err: DbError) -> Error {
    match err {
        DbError::NotFound => Error::user_not_found(),
        other => Error::Database(other),
    }
}
