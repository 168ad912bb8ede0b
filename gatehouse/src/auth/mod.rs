//! Authentication and authorization primitives.
//!
//! - [`password`]: password hashing and verification using Argon2id
//! - [`session`]: stateless signed session tokens
//! - [`current_user`]: the decoded acting identity and authorization guards
//! - [`lockout`]: brute-force defense policy arithmetic
//!
//! The HTTP layer is an external collaborator: it extracts the raw token from
//! wherever it travels (header, cookie) and hands it to
//! [`crate::Gatehouse::verify_token`]; everything below that point lives here.

pub mod current_user;
pub mod lockout;
pub mod password;
pub mod session;
