//! Database models for the administrative audit trail.

use crate::types::{AuditLogId, UserId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// Database request for appending an audit entry.
///
/// Usernames are denormalized at write time so entries stay meaningful after
/// the referenced accounts are renamed or removed.
#[derive(Debug, Clone)]
pub struct AuditLogCreateDBRequest {
    pub actor_id: UserId,
    pub actor_username: String,
    pub action: String,
    pub target_user_id: Option<UserId>,
    pub target_username: Option<String>,
    pub details: String,
    pub source_address: String,
}

/// An immutable audit entry. No update or delete path exists anywhere in the
/// crate.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct AuditLogEntry {
    pub id: AuditLogId,
    pub actor_id: UserId,
    pub actor_username: String,
    pub action: String,
    pub target_user_id: Option<UserId>,
    pub target_username: Option<String>,
    pub details: String,
    pub source_address: String,
    pub created_at: DateTime<Utc>,
}
