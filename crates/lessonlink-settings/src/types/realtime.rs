//! Realtime connection settings.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Push-update connection settings.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RealtimeSettings {
    /// Base endpoint; the subject id is appended as a path segment.
    pub url: String,
    /// Fixed delay between reconnect attempts in milliseconds.
    pub reconnect_interval_ms: u64,
    /// Consecutive failed attempts tolerated before giving up.
    pub max_reconnect_attempts: u32,
    /// Keepalive ping period in milliseconds.
    pub ping_interval_ms: u64,
    /// Force a reconnect after this long without a pong. Disabled when unset.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pong_timeout_ms: Option<u64>,
    /// Capacity of the per-link outbound queue.
    pub outbound_buffer: usize,
}

impl Default for RealtimeSettings {
    fn default() -> Self {
        Self {
            url: "ws://localhost:8000/ws/progress".to_string(),
            reconnect_interval_ms: 3000,
            max_reconnect_attempts: 5,
            ping_interval_ms: 30_000,
            pong_timeout_ms: None,
            outbound_buffer: 64,
        }
    }
}

impl RealtimeSettings {
    /// Reconnect delay as a [`Duration`].
    pub fn reconnect_interval(&self) -> Duration {
        Duration::from_millis(self.reconnect_interval_ms)
    }

    /// Ping period as a [`Duration`].
    pub fn ping_interval(&self) -> Duration {
        Duration::from_millis(self.ping_interval_ms)
    }

    /// Pong timeout as a [`Duration`], if enabled.
    pub fn pong_timeout(&self) -> Option<Duration> {
        self.pong_timeout_ms.map(Duration::from_millis)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_json_fills_defaults() {
        let s: RealtimeSettings =
            serde_json::from_str(r#"{"maxReconnectAttempts": 2}"#).unwrap();
        assert_eq!(s.max_reconnect_attempts, 2);
        assert_eq!(s.reconnect_interval_ms, 3000);
        assert_eq!(s.pong_timeout_ms, None);
    }

    #[test]
    fn pong_timeout_omitted_when_unset() {
        let json = serde_json::to_value(RealtimeSettings::default()).unwrap();
        assert!(json.get("pongTimeoutMs").is_none());
        assert_eq!(json["pingIntervalMs"], 30_000);
    }

    #[test]
    fn duration_helpers() {
        let s = RealtimeSettings {
            pong_timeout_ms: Some(90_000),
            ..RealtimeSettings::default()
        };
        assert_eq!(s.reconnect_interval(), Duration::from_secs(3));
        assert_eq!(s.ping_interval(), Duration::from_secs(30));
        assert_eq!(s.pong_timeout(), Some(Duration::from_secs(90)));
    }
}
