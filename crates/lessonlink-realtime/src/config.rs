//! Connection configuration.

use std::time::Duration;

use lessonlink_core::SubjectId;
use lessonlink_settings::RealtimeSettings;

use crate::policy::{DEFAULT_MAX_RECONNECT_ATTEMPTS, DEFAULT_RECONNECT_INTERVAL_MS, ReconnectPolicy};

/// Default keepalive period in milliseconds.
pub const DEFAULT_PING_INTERVAL_MS: u64 = 30_000;
/// Default outbound queue capacity per open link.
pub const DEFAULT_OUTBOUND_BUFFER: usize = 64;

/// Everything a [`RealtimeConnection`](crate::RealtimeConnection) needs besides
/// its subject and transport.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ConnectionConfig {
    /// Base endpoint; the subject id is appended as a path segment.
    pub base_url: String,
    /// Fixed delay between reconnect attempts.
    pub reconnect_interval: Duration,
    /// Consecutive failed attempts tolerated.
    pub max_reconnect_attempts: u32,
    /// Keepalive ping period.
    pub ping_interval: Duration,
    /// Force a reconnect after this long without a pong.
    pub pong_timeout: Option<Duration>,
    /// Outbound queue capacity per open link.
    pub outbound_buffer: usize,
}

impl ConnectionConfig {
    /// Defaults with the given base URL.
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            reconnect_interval: Duration::from_millis(DEFAULT_RECONNECT_INTERVAL_MS),
            max_reconnect_attempts: DEFAULT_MAX_RECONNECT_ATTEMPTS,
            ping_interval: Duration::from_millis(DEFAULT_PING_INTERVAL_MS),
            pong_timeout: None,
            outbound_buffer: DEFAULT_OUTBOUND_BUFFER,
        }
    }

    /// Full endpoint for a subject: `{base_url}/{subject_id}`.
    pub fn endpoint(&self, subject_id: &SubjectId) -> String {
        format!("{}/{}", self.base_url.trim_end_matches('/'), subject_id)
    }

    /// Reconnection policy derived from this config.
    pub fn policy(&self) -> ReconnectPolicy {
        ReconnectPolicy {
            interval: self.reconnect_interval,
            max_attempts: self.max_reconnect_attempts,
        }
    }
}

impl From<&RealtimeSettings> for ConnectionConfig {
    fn from(settings: &RealtimeSettings) -> Self {
        Self {
            base_url: settings.url.clone(),
            reconnect_interval: settings.reconnect_interval(),
            max_reconnect_attempts: settings.max_reconnect_attempts,
            ping_interval: settings.ping_interval(),
            pong_timeout: settings.pong_timeout(),
            outbound_buffer: settings.outbound_buffer.max(1),
        }
    }
}
