//! The acting identity and the authorization guards applied before
//! administrative operations.
//!
//! A [`CurrentUser`] is the decoded content of a verified session token. The
//! role is read from the token, not re-fetched from the store: a role revoked
//! mid-request may still complete one stale operation, which is an accepted
//! trade-off at this scale.

use serde::{Deserialize, Serialize};

use crate::{
    auth::session,
    config::Config,
    db::models::users::Role,
    errors::{Error, Result},
    types::UserId,
};

/// The authenticated identity acting on a request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CurrentUser {
    pub id: UserId,
    pub username: String,
    pub role: Role,
}

impl CurrentUser {
    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }
}

/// Authenticate a presented token, if any.
///
/// Absence and invalidity are distinct failures; both are checked strictly
/// before any role evaluation.
pub fn authenticate(token: Option<&str>, config: &Config) -> Result<CurrentUser> {
    let token = match token {
        Some(t) if !t.is_empty() => t,
        _ => return Err(Error::MissingToken),
    };
    session::verify_session_token(token, config)
}

/// Require the actor's role to be `admin`.
pub fn require_admin(actor: &CurrentUser, action: &'static str, resource: &str) -> Result<()> {
    if actor.is_admin() {
        Ok(())
    } else {
        Err(Error::Forbidden {
            action,
            resource: resource.to_string(),
        })
    }
}

/// Require the actor to be the target user, or an admin.
pub fn require_self_or_admin(actor: &CurrentUser, target: UserId, action: &'static str, resource: &str) -> Result<()> {
    if actor.id == target || actor.is_admin() {
        Ok(())
    } else {
        Err(Error::Forbidden {
            action,
            resource: resource.to_string(),
        })
    }
}

/// Reject operations an admin attempts against their own account.
///
/// Guards against irrecoverable lockout (the last admin disabling themselves)
/// and accidental self-demotion.
pub fn forbid_self_mutation(actor: &CurrentUser, target: UserId, field: &'static str) -> Result<()> {
    if actor.id == target {
        Err(Error::SelfMutationForbidden { field })
    } else {
        Ok(())
    }
}
