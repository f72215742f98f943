//! Realtime error types.

use thiserror::Error;

/// Failures reported by a [`Transport`](crate::transport::Transport) or its links.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransportError {
    /// The endpoint could not be opened.
    #[error("failed to connect to {url}: {message}")]
    Connect {
        /// Endpoint that was dialled.
        url: String,
        /// Underlying failure.
        message: String,
    },
    /// A frame could not be written.
    #[error("failed to send frame: {0}")]
    Send(String),
    /// The link has already been closed.
    #[error("link is closed")]
    Closed,
}

/// Reasons an inbound frame is rejected.
#[derive(Debug, Error)]
pub enum EnvelopeError {
    /// The frame is not valid JSON.
    #[error("invalid JSON: {0}")]
    InvalidJson(#[from] serde_json::Error),
    /// The frame is JSON but not an object.
    #[error("frame is not a JSON object")]
    NotAnObject,
    /// The object has no string `type` field.
    #[error("frame has no string `type` field")]
    MissingType,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn connect_error_display() {
        let err = TransportError::Connect {
            url: "ws://localhost/ws/s1".into(),
            message: "connection refused".into(),
        };
        assert_eq!(
            err.to_string(),
            "failed to connect to ws://localhost/ws/s1: connection refused"
        );
    }

    #[test]
    fn envelope_error_from_json() {
        let json_err = serde_json::from_str::<serde_json::Value>("{").unwrap_err();
        let err: EnvelopeError = json_err.into();
        assert!(err.to_string().starts_with("invalid JSON"));
    }
}
