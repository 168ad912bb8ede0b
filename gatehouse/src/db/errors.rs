use thiserror::Error;

/// Unified error type for database operations that application code can handle
#[derive(Error, Debug)]
pub enum DbError {
    /// Entity not found by the given identifier
    #[error("Entity not found")]
    NotFound,

    /// Unique constraint violation
    #[error("Unique constraint violation")]
    UniqueViolation {
        /// The violated column in `table.column` form, when extractable
        constraint: Option<String>,
        message: String,
    },

    /// Check constraint violation
    #[error("Check constraint violation")]
    CheckViolation { message: String },

    /// Catch-all for non-recoverable errors
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

/// Convert from sqlx::Error using proper sqlx error categorization
impl From<sqlx::Error> for DbError {
    fn from(err: sqlx::Error) -> Self {
        match &err {
            sqlx::Error::RowNotFound => DbError::NotFound,
            sqlx::Error::Database(db_err) => {
                if db_err.is_unique_violation() {
                    let message = db_err.message().to_string();
                    DbError::UniqueViolation {
                        constraint: extract_unique_target(&message),
                        message,
                    }
                } else if db_err.is_check_violation() {
                    DbError::CheckViolation {
                        message: db_err.message().to_string(),
                    }
                } else {
                    // All other database errors are non-recoverable - convert to anyhow
                    DbError::Other(anyhow::Error::from(err))
                }
            }
            // All other sqlx errors are non-recoverable - convert to anyhow with context
            _ => DbError::Other(anyhow::Error::from(err)),
        }
    }
}

/// Extract the violated `table.column` from a SQLite unique violation message.
///
/// SQLite does not report constraint names through the driver, but its message
/// has a stable shape: "UNIQUE constraint failed: users.username".
fn extract_unique_target(message: &str) -> Option<String> {
    message
        .strip_prefix("UNIQUE constraint failed: ")
        .map(|rest| rest.split(',').next().unwrap_or(rest).trim().to_string())
}

/// Type alias for database operation results
pub type Result<T> = std::result::Result<T, DbError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_unique_target() {
        assert_eq!(
            extract_unique_target("UNIQUE constraint failed: users.username"),
            Some("users.username".to_string())
        );
        assert_eq!(
            extract_unique_target("UNIQUE constraint failed: users.email, users.username"),
            Some("users.email".to_string())
        );
        assert_eq!(extract_unique_target("NOT NULL constraint failed: users.username"), None);
    }
}
