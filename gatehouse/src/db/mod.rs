//! Database layer for data persistence and access.
//!
//! SQLx over an embedded SQLite store, organized with the repository pattern:
//!
//! - [`handlers`]: repository implementations, one per table
//! - [`models`]: database record structures matching table schemas
//! - [`errors`]: translation of sqlx errors into a typed [`errors::DbError`]
//!
//! Every mutation in this core targets a single row identified by a unique
//! key; the store serializes writes internally, so no application-level
//! locking is layered on top. Multi-statement sequences that must land
//! together (a mutation plus its audit entry) use a transaction.

pub mod errors;
pub mod handlers;
pub mod models;
