//! Database repositories for failed login attempts and the address blacklist.
//!
//! Both sides of the brute-force defense are computed at query time: the
//! attempt window is a trailing count, and a blacklist entry is live iff its
//! expiry compares in the future. Nothing here is swept by a background task.

use crate::db::{
    errors::Result,
    models::attempts::{BlacklistEntry, LoginAttempt},
};
use chrono::{DateTime, Utc};
use sqlx::SqliteConnection;
use tracing::instrument;

pub struct LoginAttempts<'c> {
    db: &'c mut SqliteConnection,
}

impl<'c> LoginAttempts<'c> {
    pub fn new(db: &'c mut SqliteConnection) -> Self {
        Self { db }
    }

    /// Record one failed credential check.
    #[instrument(skip(self, attempted_username), fields(source = %source_address), err)]
    pub async fn record(&mut self, source_address: &str, attempted_username: &str, at: DateTime<Utc>) -> Result<LoginAttempt> {
        let attempt = sqlx::query_as::<_, LoginAttempt>(
            r#"
            INSERT INTO login_attempts (source_address, attempted_username, attempted_at)
            VALUES (?, ?, ?)
            RETURNING *
            "#,
        )
        .bind(source_address)
        .bind(attempted_username)
        .bind(at)
        .fetch_one(&mut *self.db)
        .await?;

        Ok(attempt)
    }

    /// Failures from this address since `cutoff` (the trailing-window count).
    #[instrument(skip(self), fields(source = %source_address), err)]
    pub async fn count_since(&mut self, source_address: &str, cutoff: DateTime<Utc>) -> Result<i64> {
        let count =
            sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM login_attempts WHERE source_address = ? AND attempted_at > ?")
                .bind(source_address)
                .bind(cutoff)
                .fetch_one(&mut *self.db)
                .await?;

        Ok(count)
    }
}

pub struct Blacklist<'c> {
    db: &'c mut SqliteConnection,
}

impl<'c> Blacklist<'c> {
    pub fn new(db: &'c mut SqliteConnection) -> Self {
        Self { db }
    }

    /// Promote an address, replacing any prior entry (upsert, not append).
    #[instrument(skip(self), fields(source = %source_address, until = %blocked_until), err)]
    pub async fn upsert(&mut self, source_address: &str, blocked_until: DateTime<Utc>) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO blacklist (source_address, blocked_until)
            VALUES (?, ?)
            ON CONFLICT (source_address) DO UPDATE SET blocked_until = excluded.blocked_until
            "#,
        )
        .bind(source_address)
        .bind(blocked_until)
        .execute(&mut *self.db)
        .await?;

        Ok(())
    }

    /// The live block for an address, if any: a row whose `blocked_until` is
    /// strictly in the future of `now`. Expired rows are simply ignored.
    #[instrument(skip(self), fields(source = %source_address), err)]
    pub async fn active_block(&mut self, source_address: &str, now: DateTime<Utc>) -> Result<Option<BlacklistEntry>> {
        let entry =
            sqlx::query_as::<_, BlacklistEntry>("SELECT * FROM blacklist WHERE source_address = ? AND blocked_until > ?")
                .bind(source_address)
                .bind(now)
                .fetch_optional(&mut *self.db)
                .await?;

        Ok(entry)
    }
}
