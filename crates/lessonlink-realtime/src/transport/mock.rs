//! Scripted in-memory transport for tests and offline demos.
//!
//! Each call to [`Transport::open`] consumes the next scripted outcome:
//! either a refusal or an accepted link whose far end is a [`MockPeer`] the
//! test drives directly. An empty script refuses.

use std::collections::VecDeque;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use parking_lot::Mutex;
use serde_json::Value;
use tokio::sync::mpsc;

use super::{Transport, TransportEvent, TransportLink};
use crate::error::TransportError;
use crate::events::CLOSE_ABNORMAL;

enum Outcome {
    Refuse(String),
    Accept(MockLink),
}

/// Transport whose open results are scripted in advance.
#[derive(Default)]
pub struct MockTransport {
    script: Mutex<VecDeque<Outcome>>,
    opened: Mutex<Vec<String>>,
}

impl MockTransport {
    /// Create with an empty script.
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a refused open.
    pub fn refuse(&self, reason: impl Into<String>) {
        self.script.lock().push_back(Outcome::Refuse(reason.into()));
    }

    /// Queue an accepted open and return the far end of that link.
    pub fn accept(&self) -> MockPeer {
        let (link, peer) = MockLink::pair();
        self.script.lock().push_back(Outcome::Accept(link));
        peer
    }

    /// Number of open attempts so far.
    pub fn attempts(&self) -> usize {
        self.opened.lock().len()
    }

    /// URLs passed to each open attempt, in order.
    pub fn urls(&self) -> Vec<String> {
        self.opened.lock().clone()
    }
}

#[async_trait]
impl Transport for MockTransport {
    async fn open(&self, url: &str) -> Result<Box<dyn TransportLink>, TransportError> {
        self.opened.lock().push(url.to_owned());
        let next = self.script.lock().pop_front();
        match next {
            Some(Outcome::Accept(link)) => Ok(Box::new(link)),
            Some(Outcome::Refuse(message)) => Err(TransportError::Connect {
                url: url.to_owned(),
                message,
            }),
            None => Err(TransportError::Connect {
                url: url.to_owned(),
                message: "no scripted outcome".to_owned(),
            }),
        }
    }
}

/// Near end of an in-memory link, handed to the connection.
pub struct MockLink {
    inbound: mpsc::UnboundedReceiver<TransportEvent>,
    outbound: mpsc::UnboundedSender<String>,
    closed: Arc<AtomicBool>,
}

impl MockLink {
    /// Create a connected link/peer pair.
    pub fn pair() -> (Self, MockPeer) {
        let (in_tx, in_rx) = mpsc::unbounded_channel();
        let (out_tx, out_rx) = mpsc::unbounded_channel();
        let closed = Arc::new(AtomicBool::new(false));
        let link = Self {
            inbound: in_rx,
            outbound: out_tx,
            closed: closed.clone(),
        };
        let peer = MockPeer {
            inbound: in_tx,
            outbound: out_rx,
            closed,
        };
        (link, peer)
    }
}

#[async_trait]
impl TransportLink for MockLink {
    async fn send(&mut self, text: String) -> Result<(), TransportError> {
        if self.closed.load(Ordering::Acquire) {
            return Err(TransportError::Closed);
        }
        self.outbound
            .send(text)
            .map_err(|_| TransportError::Send("peer dropped".to_owned()))
    }

    async fn recv(&mut self) -> TransportEvent {
        self.inbound
            .recv()
            .await
            .unwrap_or_else(|| TransportEvent::Closed {
                code: CLOSE_ABNORMAL,
                reason: "peer dropped".to_owned(),
            })
    }

    async fn close(&mut self) {
        self.closed.store(true, Ordering::Release);
    }
}

/// Far end of an in-memory link, driven by the test.
pub struct MockPeer {
    inbound: mpsc::UnboundedSender<TransportEvent>,
    outbound: mpsc::UnboundedReceiver<String>,
    closed: Arc<AtomicBool>,
}

impl MockPeer {
    /// Deliver a raw text frame.
    pub fn push_text(&self, text: impl Into<String>) {
        let _ = self.inbound.send(TransportEvent::Text(text.into()));
    }

    /// Deliver a JSON frame.
    pub fn push_json(&self, value: &Value) {
        self.push_text(value.to_string());
    }

    /// Report a transport error.
    pub fn push_error(&self, message: impl Into<String>) {
        let _ = self.inbound.send(TransportEvent::Error(message.into()));
    }

    /// Close the link from the server side.
    pub fn close(&self, code: u16, reason: impl Into<String>) {
        let _ = self.inbound.send(TransportEvent::Closed {
            code,
            reason: reason.into(),
        });
    }

    /// Wait for the next frame the client sent.
    pub async fn next_sent(&mut self) -> Option<String> {
        self.outbound.recv().await
    }

    /// Next frame the client sent, without waiting.
    pub fn try_next_sent(&mut self) -> Option<String> {
        self.outbound.try_recv().ok()
    }

    /// Whether the client closed its end.
    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::Acquire)
    }
}
