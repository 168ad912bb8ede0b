//! Service operations.
//!
//! Each operation is a method on [`Gatehouse`](crate::Gatehouse): it
//! validates input, runs the authorization guards, and drives the repository
//! layer, mapping [`DbError`](crate::db::errors::DbError) values into the
//! service error taxonomy. Operations that pair a mutation with an audit
//! entry run both inside one transaction.

pub mod accounts;
pub mod admin;
pub mod pagination;
pub mod reports;

use tracing::instrument;

use crate::auth::password;
use crate::errors::{Error, Result};
use crate::Gatehouse;

impl Gatehouse {
    /// Hash a password on the blocking pool at the configured work factor.
    /// Argon2 at production cost takes tens of milliseconds; never run it on
    /// an async worker thread.
    #[instrument(skip_all, err)]
    pub(crate) async fn hash_password(&self, password: String) -> Result<String> {
        let params = (&self.config.auth.password).into();
        tokio::task::spawn_blocking(move || password::hash_string_with_params(&password, Some(params)))
            .await
            .map_err(|e| Error::Internal {
                operation: format!("join password hashing task: {e}"),
            })?
    }

    /// Compare a candidate password against a stored hash on the blocking pool.
    pub(crate) async fn verify_password(&self, password: String, hash: String) -> Result<bool> {
        tokio::task::spawn_blocking(move || password::verify_string(&password, &hash))
            .await
            .map_err(|e| Error::Internal {
                operation: format!("join password verification task: {e}"),
            })?
    }

    pub(crate) fn validate_password(&self, password: &str) -> Result<()> {
        let rules = &self.config.auth.password;
        if password.len() < rules.min_length {
            return Err(Error::Validation {
                message: format!("Password must be at least {} characters", rules.min_length),
            });
        }
        if password.len() > rules.max_length {
            return Err(Error::Validation {
                message: format!("Password must be at most {} characters", rules.max_length),
            });
        }
        Ok(())
    }
}

pub(crate) fn validate_username(username: &str) -> Result<()> {
    if username.trim().is_empty() {
        return Err(Error::Validation {
            message: "Username must not be empty".to_string(),
        });
    }
    Ok(())
}

pub(crate) fn validate_email(email: &str) -> Result<()> {
    // Deliverability is the mail system's problem; we only reject values
    // that cannot possibly be an address.
    if !email.contains('@') || email.trim().is_empty() {
        return Err(Error::Validation {
            message: "Email address is not valid".to_string(),
        });
    }
    Ok(())
}
