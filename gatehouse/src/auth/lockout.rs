//! Brute-force lockout policy.
//!
//! Pure window/threshold arithmetic over [`LockoutConfig`]; the attempt counts
//! themselves come from the store at query time. There is no sweeper: a block
//! "expires" simply by no longer comparing in the future.

use chrono::{DateTime, Utc};
use std::time::Duration;

use crate::config::LockoutConfig;

/// Per-address state machine, transitions driven by login outcomes:
/// clean → (failure) → risky → (threshold within window) → blocked → (expiry) → clean.
#[derive(Debug, Clone, Copy)]
pub struct LockoutPolicy {
    max_failures: u32,
    failure_window: Duration,
    block_duration: Duration,
}

impl LockoutPolicy {
    pub fn new(config: &LockoutConfig) -> Self {
        Self {
            max_failures: config.max_failures,
            failure_window: config.failure_window,
            block_duration: config.block_duration,
        }
    }

    /// Start of the trailing window ending at `now`. Failures before this
    /// instant have aged out.
    pub fn window_start(&self, now: DateTime<Utc>) -> DateTime<Utc> {
        now - self.failure_window
    }

    /// Whether a failure count inside the window promotes the address to the
    /// blacklist. The count includes the failure that was just recorded.
    pub fn should_block(&self, failures_in_window: i64) -> bool {
        failures_in_window >= i64::from(self.max_failures)
    }

    /// Expiry instant for a block promoted at `now`.
    pub fn block_until(&self, now: DateTime<Utc>) -> DateTime<Utc> {
        now + self.block_duration
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn policy() -> LockoutPolicy {
        LockoutPolicy::new(&LockoutConfig::default())
    }

    #[test]
    fn test_threshold_boundary() {
        let policy = policy();

        assert!(!policy.should_block(0));
        assert!(!policy.should_block(4));
        // Exactly the fifth failure triggers the block
        assert!(policy.should_block(5));
        assert!(policy.should_block(6));
    }

    #[test]
    fn test_window_and_block_arithmetic() {
        let policy = policy();
        let now = Utc::now();

        assert_eq!(policy.window_start(now), now - chrono::Duration::hours(1));
        assert_eq!(policy.block_until(now), now + chrono::Duration::hours(24));
    }

    #[test]
    fn test_knobs_are_independent() {
        let config = LockoutConfig {
            max_failures: 3,
            failure_window: Duration::from_secs(60),
            block_duration: Duration::from_secs(120),
        };
        let policy = LockoutPolicy::new(&config);
        let now = Utc::now();

        assert!(policy.should_block(3));
        assert_eq!(policy.window_start(now), now - chrono::Duration::seconds(60));
        assert_eq!(policy.block_until(now), now + chrono::Duration::seconds(120));
    }
}
