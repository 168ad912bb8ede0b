//! Database repository for users.

use crate::types::{UserId, abbrev_uuid};
use crate::db::{
    errors::{DbError, Result},
    handlers::repository::Repository,
    models::users::{Role, User, UserCreateDBRequest, UserStatus},
};
use chrono::{DateTime, Utc};
use sqlx::SqliteConnection;
use tracing::instrument;
use uuid::Uuid;

/// Filter for listing users
#[derive(Debug, Clone, Default)]
pub struct UserFilter {
    /// Substring match against username or email
    pub search: Option<String>,
    pub skip: i64,
    pub limit: i64,
}

impl UserFilter {
    pub fn new(search: Option<String>, skip: i64, limit: i64) -> Self {
        Self { search, skip, limit }
    }

    fn like_pattern(&self) -> Option<String> {
        self.search.as_ref().map(|s| format!("%{s}%"))
    }
}

pub struct Users<'c> {
    db: &'c mut SqliteConnection,
}

#[async_trait::async_trait]
impl<'c> Repository for Users<'c> {
    type CreateRequest = UserCreateDBRequest;
    type Response = User;
    type Id = UserId;
    type Filter = UserFilter;

    #[instrument(skip(self, request), fields(username = %request.username), err)]
    async fn create(&mut self, request: &Self::CreateRequest) -> Result<Self::Response> {
        // Always generate a new ID for users
        let user_id = Uuid::new_v4();

        let user = sqlx::query_as::<_, User>(
            r#"
            INSERT INTO users (id, username, password_hash, email, role, status, created_at)
            VALUES (?, ?, ?, ?, ?, 'active', ?)
            RETURNING *
            "#,
        )
        .bind(user_id)
        .bind(&request.username)
        .bind(&request.password_hash)
        .bind(&request.email)
        .bind(request.role)
        .bind(Utc::now())
        .fetch_one(&mut *self.db)
        .await?;

        Ok(user)
    }

    #[instrument(skip(self), fields(user_id = %abbrev_uuid(&id)), err)]
    async fn get_by_id(&mut self, id: Self::Id) -> Result<Option<Self::Response>> {
        let user = sqlx::query_as::<_, User>("SELECT * FROM users WHERE id = ?")
            .bind(id)
            .fetch_optional(&mut *self.db)
            .await?;

        Ok(user)
    }

    #[instrument(skip(self, filter), fields(limit = filter.limit, skip = filter.skip), err)]
    async fn list(&mut self, filter: &Self::Filter) -> Result<Vec<Self::Response>> {
        let users = match filter.like_pattern() {
            Some(pattern) => {
                sqlx::query_as::<_, User>(
                    r#"
                    SELECT * FROM users
                    WHERE username LIKE ? OR email LIKE ?
                    ORDER BY created_at DESC, id
                    LIMIT ? OFFSET ?
                    "#,
                )
                .bind(&pattern)
                .bind(&pattern)
                .bind(filter.limit)
                .bind(filter.skip)
                .fetch_all(&mut *self.db)
                .await?
            }
            None => {
                sqlx::query_as::<_, User>("SELECT * FROM users ORDER BY created_at DESC, id LIMIT ? OFFSET ?")
                    .bind(filter.limit)
                    .bind(filter.skip)
                    .fetch_all(&mut *self.db)
                    .await?
            }
        };

        Ok(users)
    }

    #[instrument(skip(self, filter), err)]
    async fn count(&mut self, filter: &Self::Filter) -> Result<i64> {
        let total = match filter.like_pattern() {
            Some(pattern) => {
                sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM users WHERE username LIKE ? OR email LIKE ?")
                    .bind(&pattern)
                    .bind(&pattern)
                    .fetch_one(&mut *self.db)
                    .await?
            }
            None => {
                sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM users")
                    .fetch_one(&mut *self.db)
                    .await?
            }
        };

        Ok(total)
    }
}

impl<'c> Users<'c> {
    pub fn new(db: &'c mut SqliteConnection) -> Self {
        Self { db }
    }

    #[instrument(skip(self, username), err)]
    pub async fn get_by_username(&mut self, username: &str) -> Result<Option<User>> {
        let user = sqlx::query_as::<_, User>("SELECT * FROM users WHERE username = ?")
            .bind(username)
            .fetch_optional(&mut *self.db)
            .await?;

        Ok(user)
    }

    #[instrument(skip(self), fields(user_id = %abbrev_uuid(&id)), err)]
    pub async fn update_status(&mut self, id: UserId, status: UserStatus) -> Result<User> {
        sqlx::query_as::<_, User>("UPDATE users SET status = ? WHERE id = ? RETURNING *")
            .bind(status)
            .bind(id)
            .fetch_optional(&mut *self.db)
            .await?
            .ok_or(DbError::NotFound)
    }

    #[instrument(skip(self), fields(user_id = %abbrev_uuid(&id)), err)]
    pub async fn update_role(&mut self, id: UserId, role: Role) -> Result<User> {
        sqlx::query_as::<_, User>("UPDATE users SET role = ? WHERE id = ? RETURNING *")
            .bind(role)
            .bind(id)
            .fetch_optional(&mut *self.db)
            .await?
            .ok_or(DbError::NotFound)
    }

    #[instrument(skip(self, email), fields(user_id = %abbrev_uuid(&id)), err)]
    pub async fn update_email(&mut self, id: UserId, email: Option<&str>) -> Result<User> {
        sqlx::query_as::<_, User>("UPDATE users SET email = ? WHERE id = ? RETURNING *")
            .bind(email)
            .bind(id)
            .fetch_optional(&mut *self.db)
            .await?
            .ok_or(DbError::NotFound)
    }

    #[instrument(skip(self, password_hash), fields(user_id = %abbrev_uuid(&id)), err)]
    pub async fn update_password_hash(&mut self, id: UserId, password_hash: &str) -> Result<()> {
        let result = sqlx::query("UPDATE users SET password_hash = ? WHERE id = ?")
            .bind(password_hash)
            .bind(id)
            .execute(&mut *self.db)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::NotFound);
        }
        Ok(())
    }

    #[instrument(skip(self), fields(user_id = %abbrev_uuid(&id)), err)]
    pub async fn touch_last_login(&mut self, id: UserId, at: DateTime<Utc>) -> Result<()> {
        sqlx::query("UPDATE users SET last_login = ? WHERE id = ?")
            .bind(at)
            .bind(id)
            .execute(&mut *self.db)
            .await?;

        Ok(())
    }

    #[instrument(skip(self), err)]
    pub async fn admin_exists(&mut self) -> Result<bool> {
        let count = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM users WHERE role = 'admin'")
            .fetch_one(&mut *self.db)
            .await?;

        Ok(count > 0)
    }

    #[instrument(skip(self), err)]
    pub async fn count_active(&mut self) -> Result<i64> {
        let count = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM users WHERE status = 'active'")
            .fetch_one(&mut *self.db)
            .await?;

        Ok(count)
    }

    #[instrument(skip(self), err)]
    pub async fn count_admins(&mut self) -> Result<i64> {
        let count = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM users WHERE role = 'admin'")
            .fetch_one(&mut *self.db)
            .await?;

        Ok(count)
    }

    #[instrument(skip(self), err)]
    pub async fn count_registered_since(&mut self, since: DateTime<Utc>) -> Result<i64> {
        let count = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM users WHERE created_at >= ?")
            .bind(since)
            .fetch_one(&mut *self.db)
            .await?;

        Ok(count)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sqlx::SqlitePool;

    fn create_request(username: &str, role: Role) -> UserCreateDBRequest {
        UserCreateDBRequest {
            username: username.to_string(),
            password_hash: "$argon2id$fake".to_string(),
            email: Some(format!("{username}@example.com")),
            role,
        }
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_create_and_lookup(pool: SqlitePool) {
        let mut conn = pool.acquire().await.unwrap();
        let mut repo = Users::new(&mut conn);

        let created = repo.create(&create_request("testuser", Role::User)).await.unwrap();
        assert_eq!(created.username, "testuser");
        assert_eq!(created.role, Role::User);
        assert_eq!(created.status, UserStatus::Active);
        assert!(created.last_login.is_none());

        let by_name = repo.get_by_username("testuser").await.unwrap().unwrap();
        assert_eq!(by_name.id, created.id);

        let by_id = repo.get_by_id(created.id).await.unwrap().unwrap();
        assert_eq!(by_id.username, "testuser");

        assert!(repo.get_by_username("nobody").await.unwrap().is_none());
    }

    #[sqlx::test]
    async fn test_duplicate_username_is_unique_violation(pool: SqlitePool) {
        let mut conn = pool.acquire().await.unwrap();
        let mut repo = Users::new(&mut conn);

        repo.create(&create_request("dupe", Role::User)).await.unwrap();

        let mut second = create_request("dupe", Role::User);
        second.email = Some("other@example.com".to_string());
        let err = repo.create(&second).await.unwrap_err();

        match err {
            DbError::UniqueViolation { constraint, .. } => {
                assert_eq!(constraint.as_deref(), Some("users.username"));
            }
            other => panic!("expected unique violation, got {other:?}"),
        }

        // No partial row was created
        assert_eq!(repo.count(&UserFilter::new(None, 0, 10)).await.unwrap(), 1);
    }

    #[sqlx::test]
    async fn test_username_is_case_sensitive(pool: SqlitePool) {
        let mut conn = pool.acquire().await.unwrap();
        let mut repo = Users::new(&mut conn);

        repo.create(&create_request("Alice", Role::User)).await.unwrap();
        assert!(repo.get_by_username("alice").await.unwrap().is_none());
        assert!(repo.get_by_username("Alice").await.unwrap().is_some());
    }

    #[sqlx::test]
    async fn test_updates(pool: SqlitePool) {
        let mut conn = pool.acquire().await.unwrap();
        let mut repo = Users::new(&mut conn);

        let user = repo.create(&create_request("mutable", Role::User)).await.unwrap();

        let disabled = repo.update_status(user.id, UserStatus::Disabled).await.unwrap();
        assert_eq!(disabled.status, UserStatus::Disabled);

        let promoted = repo.update_role(user.id, Role::Admin).await.unwrap();
        assert_eq!(promoted.role, Role::Admin);

        let readdressed = repo.update_email(user.id, Some("new@example.com")).await.unwrap();
        assert_eq!(readdressed.email.as_deref(), Some("new@example.com"));

        repo.update_password_hash(user.id, "$argon2id$other").await.unwrap();
        let reloaded = repo.get_by_id(user.id).await.unwrap().unwrap();
        assert_eq!(reloaded.password_hash, "$argon2id$other");

        // Missing target is NotFound, not a silent no-op
        let err = repo.update_status(Uuid::new_v4(), UserStatus::Active).await.unwrap_err();
        assert!(matches!(err, DbError::NotFound));
    }

    #[sqlx::test]
    async fn test_list_and_search(pool: SqlitePool) {
        let mut conn = pool.acquire().await.unwrap();
        let mut repo = Users::new(&mut conn);

        for name in ["carol", "carlos", "dave"] {
            repo.create(&create_request(name, Role::User)).await.unwrap();
        }

        let all = repo.list(&UserFilter::new(None, 0, 10)).await.unwrap();
        assert_eq!(all.len(), 3);

        let filter = UserFilter::new(Some("car".to_string()), 0, 10);
        let matched = repo.list(&filter).await.unwrap();
        assert_eq!(matched.len(), 2);
        assert_eq!(repo.count(&filter).await.unwrap(), 2);

        // Search also matches email
        let by_email = UserFilter::new(Some("dave@example".to_string()), 0, 10);
        assert_eq!(repo.count(&by_email).await.unwrap(), 1);

        // Pagination
        let page = repo.list(&UserFilter::new(None, 1, 1)).await.unwrap();
        assert_eq!(page.len(), 1);
    }

    #[sqlx::test]
    async fn test_counters(pool: SqlitePool) {
        let mut conn = pool.acquire().await.unwrap();
        let mut repo = Users::new(&mut conn);

        assert!(!repo.admin_exists().await.unwrap());

        repo.create(&create_request("root", Role::Admin)).await.unwrap();
        let plain = repo.create(&create_request("plain", Role::User)).await.unwrap();
        repo.update_status(plain.id, UserStatus::Disabled).await.unwrap();

        assert!(repo.admin_exists().await.unwrap());
        assert_eq!(repo.count_admins().await.unwrap(), 1);
        assert_eq!(repo.count_active().await.unwrap(), 1);
        assert_eq!(repo.count_registered_since(Utc::now() - chrono::Duration::minutes(5)).await.unwrap(), 2);
        assert_eq!(repo.count_registered_since(Utc::now() + chrono::Duration::minutes(5)).await.unwrap(), 0);
    }
}
