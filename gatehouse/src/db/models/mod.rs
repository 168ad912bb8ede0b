//! Database record structures matching table schemas.

pub mod activity;
pub mod attempts;
pub mod audit;
pub mod users;
