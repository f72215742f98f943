//! # lessonlink-realtime
//!
//! Reconnecting push-update client for live progress events.
//!
//! - **Connection**: [`RealtimeConnection`] manages one subject's link, its
//!   lifecycle state, fixed-delay reconnection and application keepalive
//! - **Listeners**: per-connection fan-out of server messages and lifecycle
//!   events, with panicking callbacks isolated from each other
//! - **Transport**: [`Transport`] seam with a WebSocket implementation and a
//!   scripted in-memory one for tests
//! - **Notify**: optional hook turning achievements and mastery changes into
//!   user-facing notices
//!
//! ```no_run
//! use std::sync::Arc;
//! use lessonlink_realtime::{ConnectionConfig, RealtimeConnection, WsTransport, events};
//!
//! # async fn run() {
//! let config = ConnectionConfig::new("ws://localhost:8000/ws/progress");
//! let conn = RealtimeConnection::new("student-42", config, Arc::new(WsTransport));
//! let _ = conn.on("mastery_update", |payload| println!("{payload}"));
//! let _ = conn.on(events::RECONNECT_FAILED, |payload| eprintln!("gave up: {payload}"));
//! assert!(conn.connect());
//! # conn.close().await;
//! # }
//! ```

#![deny(unsafe_code)]

pub mod config;
pub mod connection;
pub mod envelope;
pub mod error;
pub mod events;
pub mod heartbeat;
pub mod listeners;
pub mod notify;
pub mod policy;
pub mod state;
pub mod transport;

pub use config::ConnectionConfig;
pub use connection::RealtimeConnection;
pub use envelope::{InboundMessage, MessageKind, encode_outbound};
pub use error::{EnvelopeError, TransportError};
pub use listeners::{Listener, ListenerId, ListenerRegistry};
pub use notify::{LogNotificationSink, NotificationSink, Notice};
pub use policy::{ReconnectDecision, ReconnectPolicy};
pub use state::ConnectionState;
pub use transport::{MockPeer, MockTransport, Transport, TransportEvent, TransportLink, WsTransport};
