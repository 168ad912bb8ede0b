//! Database repository for activity events and usage aggregation.

use crate::db::{
    errors::Result,
    models::activity::{ActivityEvent, ActivityEventCreateDBRequest, DailyActiveCount},
};
use crate::types::abbrev_uuid;
use chrono::{DateTime, Utc};
use sqlx::SqliteConnection;
use tracing::instrument;

pub struct ActivityEvents<'c> {
    db: &'c mut SqliteConnection,
}

impl<'c> ActivityEvents<'c> {
    pub fn new(db: &'c mut SqliteConnection) -> Self {
        Self { db }
    }

    /// Append one activity event. Callers on the login path treat a failure
    /// here as non-fatal; this method itself reports errors normally.
    #[instrument(skip(self, request), fields(user_id = %abbrev_uuid(&request.user_id)), err)]
    pub async fn record(&mut self, request: &ActivityEventCreateDBRequest) -> Result<ActivityEvent> {
        let event = sqlx::query_as::<_, ActivityEvent>(
            r#"
            INSERT INTO activity_events (user_id, activity_type, occurred_at, source_address, client_agent)
            VALUES (?, ?, ?, ?, ?)
            RETURNING *
            "#,
        )
        .bind(request.user_id)
        .bind(request.activity_type)
        .bind(Utc::now())
        .bind(&request.source_address)
        .bind(&request.client_agent)
        .fetch_one(&mut *self.db)
        .await?;

        Ok(event)
    }

    /// Distinct active users per day since `cutoff`, oldest day first.
    /// Days with no activity produce no point; an empty store yields an
    /// empty series.
    #[instrument(skip(self), err)]
    pub async fn daily_active_users(&mut self, cutoff: DateTime<Utc>) -> Result<Vec<DailyActiveCount>> {
        let series = sqlx::query_as::<_, DailyActiveCount>(
            r#"
            SELECT date(occurred_at) AS day, COUNT(DISTINCT user_id) AS count
            FROM activity_events
            WHERE occurred_at >= ?
            GROUP BY day
            ORDER BY day ASC
            "#,
        )
        .bind(cutoff)
        .fetch_all(&mut *self.db)
        .await?;

        Ok(series)
    }

    /// Distinct users with any activity since `cutoff`.
    #[instrument(skip(self), err)]
    pub async fn distinct_active_since(&mut self, cutoff: DateTime<Utc>) -> Result<i64> {
        let count = sqlx::query_scalar::<_, i64>("SELECT COUNT(DISTINCT user_id) FROM activity_events WHERE occurred_at >= ?")
            .bind(cutoff)
            .fetch_one(&mut *self.db)
            .await?;

        Ok(count)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::models::activity::ActivityType;
    use sqlx::SqlitePool;
    use uuid::Uuid;

    fn login_event(user_id: Uuid) -> ActivityEventCreateDBRequest {
        ActivityEventCreateDBRequest {
            user_id,
            activity_type: ActivityType::Login,
            source_address: Some("10.0.0.1".to_string()),
            client_agent: Some("tests".to_string()),
        }
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_record(pool: SqlitePool) {
        let mut conn = pool.acquire().await.unwrap();
        let mut repo = ActivityEvents::new(&mut conn);

        let user_id = Uuid::new_v4();
        let event = repo.record(&login_event(user_id)).await.unwrap();

        assert_eq!(event.user_id, user_id);
        assert_eq!(event.activity_type, ActivityType::Login);
        assert_eq!(event.source_address.as_deref(), Some("10.0.0.1"));
    }

    #[sqlx::test]
    async fn test_empty_store_yields_empty_series(pool: SqlitePool) {
        let mut conn = pool.acquire().await.unwrap();
        let mut repo = ActivityEvents::new(&mut conn);

        let cutoff = Utc::now() - chrono::Duration::days(7);
        let series = repo.daily_active_users(cutoff).await.unwrap();
        assert!(series.is_empty());
        assert_eq!(repo.distinct_active_since(cutoff).await.unwrap(), 0);
    }

    #[sqlx::test]
    async fn test_daily_series_counts_distinct_users(pool: SqlitePool) {
        let mut conn = pool.acquire().await.unwrap();
        let mut repo = ActivityEvents::new(&mut conn);

        let alice = Uuid::new_v4();
        let bob = Uuid::new_v4();

        // Three events today, but only two distinct users
        repo.record(&login_event(alice)).await.unwrap();
        repo.record(&login_event(alice)).await.unwrap();
        repo.record(&login_event(bob)).await.unwrap();

        let cutoff = Utc::now() - chrono::Duration::days(7);
        let series = repo.daily_active_users(cutoff).await.unwrap();

        assert_eq!(series.len(), 1);
        assert_eq!(series[0].day, Utc::now().date_naive());
        assert_eq!(series[0].count, 2);

        assert_eq!(repo.distinct_active_since(cutoff).await.unwrap(), 2);
    }
}
