//! Transport abstraction.
//!
//! A [`Transport`] opens links; a [`TransportLink`] carries text frames for one
//! open connection. The connection manager only talks to these traits, so
//! it runs unchanged over a real WebSocket ([`WsTransport`]) or a scripted
//! in-memory peer ([`MockTransport`]).

mod mock;
mod ws;

pub use mock::{MockLink, MockPeer, MockTransport};
pub use ws::WsTransport;

use async_trait::async_trait;

use crate::error::TransportError;

/// Something that happened on an open link.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum TransportEvent {
    /// A text frame arrived.
    Text(String),
    /// A transport-level error. The link may still close afterwards.
    Error(String),
    /// The link closed. Further `recv` calls keep reporting closure.
    Closed {
        /// Close code (1006 when the peer vanished without a close frame).
        code: u16,
        /// Close reason, possibly empty.
        reason: String,
    },
}

/// Opens links to an endpoint.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Open a link to `url`.
    async fn open(&self, url: &str) -> Result<Box<dyn TransportLink>, TransportError>;
}

/// One open link.
///
/// `recv` must be cancel-safe: the driver polls it inside `select!` and drops
/// the future whenever another branch wins.
#[async_trait]
pub trait TransportLink: Send {
    /// Write a text frame.
    async fn send(&mut self, text: String) -> Result<(), TransportError>;

    /// Wait for the next event.
    async fn recv(&mut self) -> TransportEvent;

    /// Close the link. Safe to call more than once.
    async fn close(&mut self);
}
