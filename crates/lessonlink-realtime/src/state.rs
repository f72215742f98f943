//! Connection lifecycle states.

use std::fmt;

use serde::Serialize;

/// Lifecycle of a [`RealtimeConnection`](crate::RealtimeConnection).
///
/// `Disconnected → Connecting → Connected → (Disconnected | Closing) → Closed`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ConnectionState {
    /// No link; a reconnect may be pending.
    #[default]
    Disconnected,
    /// Opening the transport.
    Connecting,
    /// Link open; keepalive running.
    Connected,
    /// Explicit close in progress.
    Closing,
    /// Torn down by `close()`.
    Closed,
}

impl ConnectionState {
    /// Whether `connect()` may start from this state.
    pub fn can_connect(self) -> bool {
        matches!(self, Self::Disconnected | Self::Closed)
    }

    /// Wire/log name.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Disconnected => "disconnected",
            Self::Connecting => "connecting",
            Self::Connected => "connected",
            Self::Closing => "closing",
            Self::Closed => "closed",
        }
    }
}

impl fmt::Display for ConnectionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
