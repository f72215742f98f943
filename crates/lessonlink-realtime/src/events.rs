//! Names and payloads of the locally generated events.
//!
//! Server messages are dispatched under their own `type`; these are the
//! lifecycle events the connection raises itself.

use serde_json::{Value, json};

/// The link opened. Payload: `{ "subjectId": ... }`.
pub const CONNECTED: &str = "connected";
/// The link closed. Payload: `{ "code": u16, "reason": string }`.
pub const DISCONNECTED: &str = "disconnected";
/// A transport-level error. Payload: `{ "message": string }`.
pub const ERROR: &str = "error";
/// Reconnection gave up. Payload: `{ "attempts": u32 }`.
pub const RECONNECT_FAILED: &str = "reconnect_failed";
/// Every valid inbound message, regardless of its type.
pub const MESSAGE: &str = "message";

/// Close code reported when the link ended without a close frame.
pub const CLOSE_ABNORMAL: u16 = 1006;
/// Close code used when the client closes the link itself.
pub const CLOSE_NORMAL: u16 = 1000;
/// Close code used when the pong timeout fires.
pub const CLOSE_PONG_TIMEOUT: u16 = 4000;

pub(crate) fn connected(subject_id: &str) -> Value {
    json!({ "subjectId": subject_id })
}

pub(crate) fn disconnected(code: u16, reason: &str) -> Value {
    json!({ "code": code, "reason": reason })
}

pub(crate) fn error(message: &str) -> Value {
    json!({ "message": message })
}

pub(crate) fn reconnect_failed(attempts: u32) -> Value {
    json!({ "attempts": attempts })
}
