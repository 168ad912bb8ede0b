//! Database repository for the administrative audit trail.
//!
//! Append and read only. The absence of any update or delete here is the
//! immutability guarantee.

use crate::db::{
    errors::Result,
    handlers::repository::Repository,
    models::audit::{AuditLogCreateDBRequest, AuditLogEntry},
};
use crate::types::AuditLogId;
use chrono::Utc;
use sqlx::SqliteConnection;
use tracing::instrument;

/// Filter for listing audit entries
#[derive(Debug, Clone, Default)]
pub struct AuditLogFilter {
    pub skip: i64,
    pub limit: i64,
}

impl AuditLogFilter {
    pub fn new(skip: i64, limit: i64) -> Self {
        Self { skip, limit }
    }
}

pub struct AuditLogs<'c> {
    db: &'c mut SqliteConnection,
}

#[async_trait::async_trait]
impl<'c> Repository for AuditLogs<'c> {
    type CreateRequest = AuditLogCreateDBRequest;
    type Response = AuditLogEntry;
    type Id = AuditLogId;
    type Filter = AuditLogFilter;

    #[instrument(skip(self, request), fields(action = %request.action, actor = %request.actor_username), err)]
    async fn create(&mut self, request: &Self::CreateRequest) -> Result<Self::Response> {
        let entry = sqlx::query_as::<_, AuditLogEntry>(
            r#"
            INSERT INTO audit_logs
                (actor_id, actor_username, action, target_user_id, target_username, details, source_address, created_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?)
            RETURNING *
            "#,
        )
        .bind(request.actor_id)
        .bind(&request.actor_username)
        .bind(&request.action)
        .bind(request.target_user_id)
        .bind(&request.target_username)
        .bind(&request.details)
        .bind(&request.source_address)
        .bind(Utc::now())
        .fetch_one(&mut *self.db)
        .await?;

        Ok(entry)
    }

    #[instrument(skip(self), err)]
    async fn get_by_id(&mut self, id: Self::Id) -> Result<Option<Self::Response>> {
        let entry = sqlx::query_as::<_, AuditLogEntry>("SELECT * FROM audit_logs WHERE id = ?")
            .bind(id)
            .fetch_optional(&mut *self.db)
            .await?;

        Ok(entry)
    }

    /// Newest entries first.
    #[instrument(skip(self, filter), fields(limit = filter.limit, skip = filter.skip), err)]
    async fn list(&mut self, filter: &Self::Filter) -> Result<Vec<Self::Response>> {
        let entries = sqlx::query_as::<_, AuditLogEntry>(
            "SELECT * FROM audit_logs ORDER BY created_at DESC, id DESC LIMIT ? OFFSET ?",
        )
        .bind(filter.limit)
        .bind(filter.skip)
        .fetch_all(&mut *self.db)
        .await?;

        Ok(entries)
    }

    #[instrument(skip(self, _filter), err)]
    async fn count(&mut self, _filter: &Self::Filter) -> Result<i64> {
        let total = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM audit_logs")
            .fetch_one(&mut *self.db)
            .await?;

        Ok(total)
    }
}

impl<'c> AuditLogs<'c> {
    pub fn new(db: &'c mut SqliteConnection) -> Self {
        Self { db }
    }
}
