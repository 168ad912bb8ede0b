//! Database models for user activity analytics.

use crate::types::UserId;
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use std::fmt;

/// Kind of recorded activity. Currently only logins are recorded; the column
/// is free-form text so new kinds can be added without a migration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum ActivityType {
    Login,
}

impl fmt::Display for ActivityType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ActivityType::Login => write!(f, "login"),
        }
    }
}

/// Database request for recording an activity event
#[derive(Debug, Clone)]
pub struct ActivityEventCreateDBRequest {
    pub user_id: UserId,
    pub activity_type: ActivityType,
    pub source_address: Option<String>,
    pub client_agent: Option<String>,
}

/// A recorded activity event
#[derive(Debug, Clone, FromRow)]
pub struct ActivityEvent {
    pub id: i64,
    pub user_id: UserId,
    pub activity_type: ActivityType,
    pub occurred_at: DateTime<Utc>,
    pub source_address: Option<String>,
    pub client_agent: Option<String>,
}

/// One point of the daily-active-users series: distinct users seen on a day.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct DailyActiveCount {
    pub day: NaiveDate,
    pub count: i64,
}
