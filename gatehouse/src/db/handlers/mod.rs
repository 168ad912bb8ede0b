//! Repository implementations for database access.
//!
//! Each repository wraps a SQLx connection or transaction, provides
//! strongly-typed operations for one table, and returns domain models from
//! [`crate::db::models`]. Create repositories from a transaction when a
//! mutation must land atomically with its audit entry:
//!
//! ```ignore
//! let mut tx = pool.begin().await?;
//! let user = Users::new(&mut tx).update_status(id, UserStatus::Disabled).await?;
//! AuditLogs::new(&mut tx).create(&audit_request).await?;
//! tx.commit().await?;
//! ```

pub mod activity;
pub mod attempts;
pub mod audit;
pub mod repository;
pub mod users;

pub use activity::ActivityEvents;
pub use attempts::{Blacklist, LoginAttempts};
pub use audit::{AuditLogFilter, AuditLogs};
pub use repository::Repository;
pub use users::{UserFilter, Users};
