//! Administrative reporting: account statistics, daily-active-user series,
//! and the audit trail.

use chrono::{DateTime, Duration, NaiveTime, Utc};
use serde::Serialize;
use tracing::{instrument, warn};

use crate::auth::current_user;
use crate::db::handlers::{ActivityEvents, AuditLogFilter, AuditLogs, Repository, UserFilter, Users};
use crate::db::models::activity::DailyActiveCount;
use crate::db::models::audit::AuditLogEntry;
use crate::errors::{Error, Result};
use crate::ops::pagination::Pagination;
use crate::{CurrentUser, Gatehouse};

/// Default length of the daily-active-users series, in days.
pub const DEFAULT_DAU_DAYS: u32 = 7;

/// Longest daily-active-users series a caller may request.
pub const MAX_DAU_DAYS: u32 = 90;

/// Aggregate account statistics for the admin dashboard.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UserStats {
    pub total_users: i64,
    pub active_users: i64,
    pub admin_users: i64,
    pub registered_today: i64,
    pub active_today: i64,
}

/// One page of the audit trail plus the unpaginated total.
#[derive(Debug, Clone, Serialize)]
pub struct AuditLogPage {
    pub entries: Vec<AuditLogEntry>,
    pub total: i64,
}

/// Start of the UTC day containing `now`.
fn start_of_day(now: DateTime<Utc>) -> DateTime<Utc> {
    now.date_naive().and_time(NaiveTime::MIN).and_utc()
}

impl Gatehouse {
    /// Aggregate account statistics. Admin only.
    ///
    /// Each counter degrades independently: a failing sub-query is logged and
    /// reported as zero rather than failing the whole dashboard.
    #[instrument(skip(self), err)]
    pub async fn user_stats(&self, actor: &CurrentUser) -> Result<UserStats> {
        current_user::require_admin(actor, "view", "user statistics")?;

        let today = start_of_day(Utc::now());

        let mut conn = self.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
        let mut users = Users::new(&mut conn);

        let everyone = UserFilter::new(None, 0, 1);
        let total_users = users.count(&everyone).await.unwrap_or_else(|error| {
            warn!(%error, "failed to count users");
            0
        });
        let active_users = users.count_active().await.unwrap_or_else(|error| {
            warn!(%error, "failed to count active users");
            0
        });
        let admin_users = users.count_admins().await.unwrap_or_else(|error| {
            warn!(%error, "failed to count admin users");
            0
        });
        let registered_today = users.count_registered_since(today).await.unwrap_or_else(|error| {
            warn!(%error, "failed to count registrations");
            0
        });
        drop(users);
        let active_today = ActivityEvents::new(&mut conn)
            .distinct_active_since(today)
            .await
            .unwrap_or_else(|error| {
                warn!(%error, "failed to count active users today");
                0
            });

        Ok(UserStats {
            total_users,
            active_users,
            admin_users,
            registered_today,
            active_today,
        })
    }

    /// Distinct users with recorded activity per UTC day over the trailing
    /// `days` days (today included). Admin only.
    ///
    /// Days with no activity are simply absent from the series. `days`
    /// defaults to [`DEFAULT_DAU_DAYS`] and is clamped to 1..=[`MAX_DAU_DAYS`].
    #[instrument(skip(self), err)]
    pub async fn daily_active_users(&self, actor: &CurrentUser, days: Option<u32>) -> Result<Vec<DailyActiveCount>> {
        current_user::require_admin(actor, "view", "activity statistics")?;

        let days = days.unwrap_or(DEFAULT_DAU_DAYS).clamp(1, MAX_DAU_DAYS);
        let cutoff = start_of_day(Utc::now()) - Duration::days(i64::from(days) - 1);

        let mut conn = self.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
        let series = ActivityEvents::new(&mut conn).daily_active_users(cutoff).await?;
        Ok(series)
    }

    /// Read the audit trail, newest first. Admin only.
    #[instrument(skip(self), err)]
    pub async fn list_audit_logs(&self, actor: &CurrentUser, page: Pagination) -> Result<AuditLogPage> {
        current_user::require_admin(actor, "read", "audit logs")?;

        let filter = AuditLogFilter::new(page.offset(), page.limit());

        let mut conn = self.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
        let mut logs = AuditLogs::new(&mut conn);
        let entries = logs.list(&filter).await?;
        let total = logs.count(&filter).await?;

        Ok(AuditLogPage { entries, total })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::models::users::{Role, UserStatus};
    use crate::test_utils::{actor, gatehouse, phantom_admin};
    use sqlx::SqlitePool;

    #[sqlx::test]
    #[test_log::test]
    async fn test_user_stats(pool: SqlitePool) {
        let gh = gatehouse(pool);
        let admin = phantom_admin();

        // Empty store: all zeroes
        let stats = gh.user_stats(&admin).await.unwrap();
        assert_eq!(
            stats,
            UserStats {
                total_users: 0,
                active_users: 0,
                admin_users: 0,
                registered_today: 0,
                active_today: 0,
            }
        );

        let alice = gh.register("alice", "password1", None).await.unwrap();
        let bob = gh.register("bob", "password1", None).await.unwrap();
        gh.register("carol", "password1", None).await.unwrap();

        gh.update_role(&admin, alice.id, Role::Admin, "10.0.0.1").await.unwrap();
        gh.update_status(&admin, bob.id, UserStatus::Disabled, "10.0.0.1").await.unwrap();
        gh.login("alice", "password1", "10.0.0.1", None).await.unwrap();

        let stats = gh.user_stats(&admin).await.unwrap();
        assert_eq!(stats.total_users, 3);
        assert_eq!(stats.active_users, 2);
        assert_eq!(stats.admin_users, 1);
        assert_eq!(stats.registered_today, 3);
        assert_eq!(stats.active_today, 1);
    }

    #[sqlx::test]
    async fn test_daily_active_users(pool: SqlitePool) {
        let gh = gatehouse(pool);
        let admin = phantom_admin();

        // No activity yet: empty series, not zero-filled days
        let series = gh.daily_active_users(&admin, None).await.unwrap();
        assert!(series.is_empty());

        gh.register("alice", "password1", None).await.unwrap();
        gh.register("bob", "password1", None).await.unwrap();

        // Two logins by alice count once; bob counts separately
        gh.login("alice", "password1", "10.0.0.1", None).await.unwrap();
        gh.login("alice", "password1", "10.0.0.2", None).await.unwrap();
        gh.login("bob", "password1", "10.0.0.1", None).await.unwrap();

        let series = gh.daily_active_users(&admin, Some(7)).await.unwrap();
        assert_eq!(series.len(), 1);
        assert_eq!(series[0].day, Utc::now().date_naive());
        assert_eq!(series[0].count, 2);
    }

    #[sqlx::test]
    async fn test_audit_log_paging(pool: SqlitePool) {
        let gh = gatehouse(pool);
        let admin = phantom_admin();
        let alice = gh.register("alice", "password1", None).await.unwrap();

        for _ in 0..3 {
            gh.update_status(&admin, alice.id, UserStatus::Disabled, "10.0.0.1").await.unwrap();
            gh.update_status(&admin, alice.id, UserStatus::Active, "10.0.0.1").await.unwrap();
        }

        let page = gh
            .list_audit_logs(&admin, Pagination { page: Some(1), limit: Some(4) })
            .await
            .unwrap();
        assert_eq!(page.total, 6);
        assert_eq!(page.entries.len(), 4);
        // Newest first: the last change re-enabled the account
        assert_eq!(page.entries[0].details, "Status changed to active");

        let rest = gh
            .list_audit_logs(&admin, Pagination { page: Some(2), limit: Some(4) })
            .await
            .unwrap();
        assert_eq!(rest.entries.len(), 2);
    }

    #[sqlx::test]
    async fn test_reports_require_admin(pool: SqlitePool) {
        let gh = gatehouse(pool);
        let alice = gh.register("alice", "password1", None).await.unwrap();
        let alice_actor = actor(&alice);

        assert!(matches!(gh.user_stats(&alice_actor).await.unwrap_err(), Error::Forbidden { .. }));
        assert!(matches!(
            gh.daily_active_users(&alice_actor, None).await.unwrap_err(),
            Error::Forbidden { .. }
        ));
        assert!(matches!(
            gh.list_audit_logs(&alice_actor, Pagination::default()).await.unwrap_err(),
            Error::Forbidden { .. }
        ));
    }
}
