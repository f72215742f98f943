//! Reconnection policy: fixed delay, bounded attempts.
//!
//! The driver counts consecutive failed opens since the last successful one
//! and asks the policy what to do after every close. A link that was open
//! when it dropped has a count of zero, so it always gets a retry unless the
//! bound itself is zero.

use std::time::Duration;

/// Default delay between reconnect attempts in milliseconds.
pub const DEFAULT_RECONNECT_INTERVAL_MS: u64 = 3000;
/// Default bound on consecutive failed attempts.
pub const DEFAULT_MAX_RECONNECT_ATTEMPTS: u32 = 5;

/// What to do after a close.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ReconnectDecision {
    /// Wait `delay`, then open again.
    Retry {
        /// Fixed wait before the next attempt.
        delay: Duration,
    },
    /// Stop; the caller must `connect()` explicitly.
    GiveUp {
        /// Consecutive failed attempts observed.
        attempts: u32,
    },
}

/// Fixed-delay, bounded retry.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ReconnectPolicy {
    /// Constant wait between attempts.
    pub interval: Duration,
    /// Consecutive failed attempts tolerated.
    pub max_attempts: u32,
}

impl Default for ReconnectPolicy {
    fn default() -> Self {
        Self {
            interval: Duration::from_millis(DEFAULT_RECONNECT_INTERVAL_MS),
            max_attempts: DEFAULT_MAX_RECONNECT_ATTEMPTS,
        }
    }
}

impl ReconnectPolicy {
    /// Decide given the current count of consecutive failed attempts.
    pub fn decide(&self, failed_attempts: u32) -> ReconnectDecision {
        if failed_attempts >= self.max_attempts {
            ReconnectDecision::GiveUp {
                attempts: failed_attempts,
            }
        } else {
            ReconnectDecision::Retry {
                delay: self.interval,
            }
        }
    }
}
