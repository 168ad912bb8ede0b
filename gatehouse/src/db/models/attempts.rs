//! Database models for failed login attempts and the address blacklist.

use chrono::{DateTime, Utc};
use sqlx::FromRow;

/// One failed credential check. The attempted username may reference a user
/// that does not exist; rows are never updated or deleted.
#[derive(Debug, Clone, FromRow)]
pub struct LoginAttempt {
    pub id: i64,
    pub source_address: String,
    pub attempted_username: String,
    pub attempted_at: DateTime<Utc>,
}

/// A temporarily denied source address. At most one row per address; a new
/// promotion replaces the prior one.
#[derive(Debug, Clone, FromRow)]
pub struct BlacklistEntry {
    pub source_address: String,
    pub blocked_until: DateTime<Utc>,
}
