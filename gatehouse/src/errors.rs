use crate::db::errors::DbError;
use chrono::{DateTime, Utc};
use thiserror::Error as ThisError;

#[derive(ThisError, Debug)]
pub enum Error {
    /// Malformed input, recoverable client-side
    #[error("{message}")]
    Validation { message: String },

    /// The requested username is already registered
    #[error("Username is already taken")]
    DuplicateUsername,

    /// Requested resource not found
    #[error("{resource} not found")]
    NotFound { resource: String },

    /// Unknown username or wrong password
    #[error("Invalid username or password")]
    InvalidCredentials,

    /// Account exists and credentials matched, but the account is disabled
    #[error("Account is disabled")]
    AccountDisabled,

    /// Source address has a live blacklist entry
    #[error("Address is blocked until {until}")]
    AddressBlocked { until: DateTime<Utc> },

    /// This failure pushed the address over the attempt threshold.
    /// Returned only on the triggering call; later calls within the block
    /// window uniformly get [`Error::AddressBlocked`].
    #[error("Too many failed login attempts; blocked until {retry_at}")]
    TooManyAttempts { retry_at: DateTime<Utc> },

    /// No token was presented
    #[error("No authentication token provided")]
    MissingToken,

    /// Token signature did not validate, or the token has expired
    #[error("Invalid or expired token")]
    InvalidToken,

    /// Actor lacks the required role for the operation
    #[error("Insufficient permissions to {action} {resource}")]
    Forbidden { action: &'static str, resource: String },

    /// An admin may not change their own status or role
    #[error("Administrators cannot change their own {field}")]
    SelfMutationForbidden { field: &'static str },

    /// Database operation error
    #[error(transparent)]
    Database(#[from] DbError),

    /// Generic internal service error
    #[error("Failed to {operation}")]
    Internal { operation: String },

    /// Unexpected error with full context chain
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl Error {
    /// Shorthand for a missing user row.
    pub fn user_not_found() -> Self {
        Error::NotFound {
            resource: "User".to_string(),
        }
    }

    /// Returns a caller-safe message, without leaking internal detail.
    ///
    /// Authentication-path failures are collapsed so that an external caller
    /// cannot tell whether the username existed or the account was disabled.
    pub fn user_message(&self) -> String {
        match self {
            Error::InvalidCredentials | Error::AccountDisabled => "Invalid username or password".to_string(),
            Error::Validation { message } => message.clone(),
            Error::DuplicateUsername => "Username is already taken".to_string(),
            Error::NotFound { resource } => format!("{resource} not found"),
            Error::AddressBlocked { .. } => "Too many failed attempts from this address; try again later".to_string(),
            Error::TooManyAttempts { .. } => "Too many failed attempts from this address; try again later".to_string(),
            Error::MissingToken | Error::InvalidToken => "Authentication required".to_string(),
            Error::Forbidden { action, resource } => format!("Insufficient permissions to {action} {resource}"),
            Error::SelfMutationForbidden { field } => format!("Administrators cannot change their own {field}"),
            Error::Database(db_err) => match db_err {
                DbError::NotFound => "Resource not found".to_string(),
                DbError::UniqueViolation { .. } => "Resource already exists".to_string(),
                DbError::CheckViolation { .. } => "Invalid data provided".to_string(),
                DbError::Other(_) => "Internal error".to_string(),
            },
            Error::Internal { .. } | Error::Other(_) => "Internal error".to_string(),
        }
    }
}

/// Type alias for service operation results
pub type Result<T> = std::result::Result<T, Error>;
