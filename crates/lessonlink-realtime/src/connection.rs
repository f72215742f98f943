//! Realtime connection manager.
//!
//! A [`RealtimeConnection`] owns one logical push-update connection for a
//! subject. `connect()` spawns a driver task that opens the transport, runs
//! the keepalive ticker, dispatches inbound frames to listeners and, when the
//! link drops, applies the fixed-delay reconnection policy. `close()` is the
//! single teardown path: it cancels the driver (and with it any pending
//! reconnect delay) and waits for it to release the link.
//!
//! All listener callbacks for a connection run on its driver task.

use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::Arc;
use std::time::Duration;

use lessonlink_core::{ConnectionId, SubjectId};
use parking_lot::Mutex;
use serde_json::{Value, json};
use tokio::sync::{broadcast, mpsc};
use tokio::task::JoinHandle;
use tokio::time::{self, Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{Instrument, debug, error, info, info_span, trace, warn};

use crate::config::ConnectionConfig;
use crate::envelope::{InboundMessage, MessageKind, encode_outbound};
use crate::events::{self, CLOSE_ABNORMAL, CLOSE_NORMAL, CLOSE_PONG_TIMEOUT};
use crate::heartbeat::{Heartbeat, HeartbeatAction};
use crate::listeners::{ListenerId, ListenerRegistry, panic_message};
use crate::notify::{NotificationSink, Notice};
use crate::policy::ReconnectDecision;
use crate::state::ConnectionState;
use crate::transport::{Transport, TransportEvent, TransportLink};

const PING_FRAME: &str = r#"{"type":"ping"}"#;
const STATE_CHANNEL_CAPACITY: usize = 64;

/// One logical realtime connection for a subject.
pub struct RealtimeConnection {
    inner: Arc<Inner>,
}

struct Inner {
    subject_id: SubjectId,
    config: ConnectionConfig,
    transport: Arc<dyn Transport>,
    listeners: ListenerRegistry,
    notifier: Mutex<Option<Arc<dyn NotificationSink>>>,
    shared: Mutex<Shared>,
    state_tx: broadcast::Sender<ConnectionState>,
}

#[derive(Default)]
struct Shared {
    state: ConnectionState,
    retry_count: u32,
    awaiting_pong: bool,
    outbound: Option<mpsc::Sender<String>>,
    cancel: Option<CancellationToken>,
    task: Option<JoinHandle<()>>,
}

enum LinkEnd {
    Closed { code: u16, reason: String },
    Cancelled,
}

impl RealtimeConnection {
    /// Create an idle connection. Nothing is opened until [`connect`](Self::connect).
    pub fn new(
        subject_id: impl Into<SubjectId>,
        config: ConnectionConfig,
        transport: Arc<dyn Transport>,
    ) -> Self {
        let (state_tx, _) = broadcast::channel(STATE_CHANNEL_CAPACITY);
        Self {
            inner: Arc::new(Inner {
                subject_id: subject_id.into(),
                config,
                transport,
                listeners: ListenerRegistry::new(),
                notifier: Mutex::new(None),
                shared: Mutex::new(Shared::default()),
                state_tx,
            }),
        }
    }

    /// Install the collaborator that surfaces user-facing notices.
    pub fn set_notifier(&self, sink: Arc<dyn NotificationSink>) {
        *self.inner.notifier.lock() = Some(sink);
    }

    /// Subject this connection is scoped to.
    pub fn subject_id(&self) -> &SubjectId {
        &self.inner.subject_id
    }

    /// Endpoint opened for this subject.
    pub fn endpoint(&self) -> String {
        self.inner.config.endpoint(&self.inner.subject_id)
    }

    /// Current lifecycle state.
    pub fn state(&self) -> ConnectionState {
        self.inner.shared.lock().state
    }

    /// Consecutive failed open attempts since the last successful open.
    pub fn retry_count(&self) -> u32 {
        self.inner.shared.lock().retry_count
    }

    /// Whether the last keepalive ping is still unanswered.
    pub fn is_awaiting_pong(&self) -> bool {
        self.inner.shared.lock().awaiting_pong
    }

    /// Receive every state transition from now on.
    pub fn subscribe_state(&self) -> broadcast::Receiver<ConnectionState> {
        self.inner.state_tx.subscribe()
    }

    /// Start connecting.
    ///
    /// Only valid from `disconnected` or `closed` with no driver already
    /// running; otherwise this is a no-op returning `false`. Must be called
    /// from within a tokio runtime.
    pub fn connect(&self) -> bool {
        let Ok(runtime) = tokio::runtime::Handle::try_current() else {
            error!(subject_id = %self.inner.subject_id, "connect() called outside a tokio runtime");
            return false;
        };

        let mut shared = self.inner.shared.lock();
        if !shared.state.can_connect() {
            debug!(subject_id = %self.inner.subject_id, state = %shared.state, "connect ignored");
            return false;
        }
        if shared.task.as_ref().is_some_and(|task| !task.is_finished()) {
            debug!(subject_id = %self.inner.subject_id, "connect ignored, reconnect already pending");
            return false;
        }

        let cancel = CancellationToken::new();
        shared.retry_count = 0;
        shared.cancel = Some(cancel.clone());
        self.inner.set_state_locked(&mut shared, ConnectionState::Connecting);

        let span = info_span!(
            "realtime",
            subject_id = %self.inner.subject_id,
            connection_id = %ConnectionId::new(),
        );
        let driver = self.inner.clone().drive(cancel).instrument(span);
        shared.task = Some(runtime.spawn(driver));
        true
    }

    /// Send `{type, ...data}`. Returns `false` (and drops the message) unless
    /// currently connected.
    pub fn send(&self, message_type: &str, data: Value) -> bool {
        let outbound = {
            let shared = self.inner.shared.lock();
            if shared.state != ConnectionState::Connected {
                debug!(message_type, state = %shared.state, "send dropped, not connected");
                return false;
            }
            shared.outbound.clone()
        };
        let Some(outbound) = outbound else {
            return false;
        };

        let frame = match encode_outbound(message_type, data) {
            Ok(frame) => frame,
            Err(e) => {
                warn!(message_type, error = %e, "failed to encode outbound message");
                return false;
            }
        };
        match outbound.try_send(frame) {
            Ok(()) => true,
            Err(e) => {
                warn!(message_type, error = %e, "outbound queue rejected message");
                false
            }
        }
    }

    /// Ask the server to start pushing `topic`. Fire-and-forget.
    pub fn subscribe(&self, topic: &str) -> bool {
        self.send("subscribe", json!({ "topic": topic }))
    }

    /// Ask the server to stop pushing `topic`. Fire-and-forget.
    pub fn unsubscribe(&self, topic: &str) -> bool {
        self.send("unsubscribe", json!({ "topic": topic }))
    }

    /// Register a listener for `event` (a server message type or one of the
    /// names in [`events`]).
    pub fn on<F>(&self, event: impl Into<String>, callback: F) -> ListenerId
    where
        F: Fn(&Value) + Send + Sync + 'static,
    {
        self.inner.listeners.on(event, callback)
    }

    /// Remove one listener, or all listeners for `event` when `id` is `None`.
    pub fn off(&self, event: &str, id: Option<ListenerId>) -> usize {
        self.inner.listeners.off(event, id)
    }

    /// Number of listeners registered for `event`.
    pub fn listener_count(&self, event: &str) -> usize {
        self.inner.listeners.listener_count(event)
    }

    /// Tear down: cancel keepalive and any pending reconnect, release the
    /// link, end in `closed`. Safe to call repeatedly.
    pub async fn close(&self) {
        let task = {
            let mut shared = self.inner.shared.lock();
            let running = shared.task.is_some();
            if !running && matches!(shared.state, ConnectionState::Closing | ConnectionState::Closed) {
                return;
            }
            shared.outbound = None;
            shared.awaiting_pong = false;
            if let Some(cancel) = shared.cancel.take() {
                cancel.cancel();
            }
            shared.state = ConnectionState::Closing;
            let _ = self.inner.state_tx.send(ConnectionState::Closing);
            shared.task.take()
        };

        if let Some(task) = task {
            if let Err(e) = task.await {
                if e.is_panic() {
                    error!(subject_id = %self.inner.subject_id, "realtime driver panicked");
                }
            }
        }

        {
            let mut shared = self.inner.shared.lock();
            shared.retry_count = 0;
            shared.state = ConnectionState::Closed;
            let _ = self.inner.state_tx.send(ConnectionState::Closed);
        }
        info!(subject_id = %self.inner.subject_id, "realtime connection closed");
    }
}

impl Drop for RealtimeConnection {
    fn drop(&mut self) {
        if let Some(cancel) = self.inner.shared.lock().cancel.take() {
            cancel.cancel();
        }
    }
}

impl std::fmt::Debug for RealtimeConnection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RealtimeConnection")
            .field("subject_id", &self.inner.subject_id)
            .field("state", &self.state())
            .field("listeners", &self.inner.listeners)
            .finish_non_exhaustive()
    }
}

impl Inner {
    /// Move to `to` unless an explicit close has begun. Publishes under the
    /// lock so observers see transitions in order.
    fn set_state_locked(&self, shared: &mut Shared, to: ConnectionState) -> bool {
        if matches!(shared.state, ConnectionState::Closing | ConnectionState::Closed) {
            return false;
        }
        if shared.state != to {
            shared.state = to;
            let _ = self.state_tx.send(to);
        }
        true
    }

    async fn drive(self: Arc<Self>, cancel: CancellationToken) {
        let url = self.config.endpoint(&self.subject_id);
        let policy = self.config.policy();
        let mut first_attempt = true;

        loop {
            if !first_attempt && !self.begin_attempt(&cancel) {
                return;
            }
            first_attempt = false;

            debug!(url, "opening link");
            let opened = tokio::select! {
                biased;
                () = cancel.cancelled() => return,
                opened = self.transport.open(&url) => opened,
            };

            match opened {
                Ok(link) => match self.run_link(link, &cancel).await {
                    LinkEnd::Cancelled => return,
                    LinkEnd::Closed { code, reason } => self.on_close(code, &reason),
                },
                Err(e) => {
                    warn!(error = %e, "failed to open link");
                    self.shared.lock().retry_count += 1;
                    let message = e.to_string();
                    self.on_error(&message);
                    self.on_close(CLOSE_ABNORMAL, &message);
                }
            }

            let retry_count = self.shared.lock().retry_count;
            match policy.decide(retry_count) {
                ReconnectDecision::GiveUp { attempts } => {
                    {
                        // detach so a listener may call connect() again right away
                        let mut shared = self.shared.lock();
                        shared.cancel = None;
                        shared.task = None;
                    }
                    warn!(attempts, "reconnect attempts exhausted");
                    let _ = self
                        .listeners
                        .emit(events::RECONNECT_FAILED, &events::reconnect_failed(attempts));
                    return;
                }
                ReconnectDecision::Retry { delay } => {
                    info!(
                        attempt = retry_count + 1,
                        delay_ms = u64::try_from(delay.as_millis()).unwrap_or(u64::MAX),
                        "scheduling reconnect"
                    );
                    tokio::select! {
                        biased;
                        () = cancel.cancelled() => return,
                        () = time::sleep(delay) => {}
                    }
                }
            }
        }
    }

    fn begin_attempt(&self, cancel: &CancellationToken) -> bool {
        let mut shared = self.shared.lock();
        !cancel.is_cancelled() && self.set_state_locked(&mut shared, ConnectionState::Connecting)
    }

    async fn run_link(&self, mut link: Box<dyn TransportLink>, cancel: &CancellationToken) -> LinkEnd {
        let (outbound_tx, mut outbound_rx) = mpsc::channel(self.config.outbound_buffer.max(1));
        let accepted = {
            let mut shared = self.shared.lock();
            if cancel.is_cancelled() || !self.set_state_locked(&mut shared, ConnectionState::Connected) {
                false
            } else {
                shared.retry_count = 0;
                shared.awaiting_pong = false;
                shared.outbound = Some(outbound_tx);
                true
            }
        };
        if !accepted {
            link.close().await;
            return LinkEnd::Cancelled;
        }

        info!("realtime link open");
        let _ = self
            .listeners
            .emit(events::CONNECTED, &events::connected(&self.subject_id));

        let mut heartbeat = Heartbeat::new(self.config.ping_interval, self.config.pong_timeout);
        let period = self.config.ping_interval.max(Duration::from_millis(1));
        let mut ticker = time::interval_at(Instant::now() + period, period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                biased;
                () = cancel.cancelled() => {
                    link.close().await;
                    let _ = self.listeners.emit(
                        events::DISCONNECTED,
                        &events::disconnected(CLOSE_NORMAL, "client closed"),
                    );
                    return LinkEnd::Cancelled;
                }
                event = link.recv() => match event {
                    TransportEvent::Text(raw) => self.on_message(&raw, &mut heartbeat),
                    TransportEvent::Error(message) => self.on_error(&message),
                    TransportEvent::Closed { code, reason } => {
                        return LinkEnd::Closed { code, reason };
                    }
                },
                Some(frame) = outbound_rx.recv() => {
                    if let Err(e) = link.send(frame).await {
                        warn!(error = %e, "failed to write frame");
                        self.on_error(&e.to_string());
                    }
                }
                _ = ticker.tick() => match heartbeat.on_tick() {
                    HeartbeatAction::SendPing => {
                        self.shared.lock().awaiting_pong = true;
                        trace!("sending ping");
                        if let Err(e) = link.send(PING_FRAME.to_owned()).await {
                            warn!(error = %e, "failed to send ping");
                        }
                    }
                    HeartbeatAction::TimedOut => {
                        warn!(missed = heartbeat.missed_pongs(), "pong timeout, dropping link");
                        link.close().await;
                        return LinkEnd::Closed {
                            code: CLOSE_PONG_TIMEOUT,
                            reason: "pong timeout".to_owned(),
                        };
                    }
                },
            }
        }
    }

    fn on_message(&self, raw: &str, heartbeat: &mut Heartbeat) {
        let message = match InboundMessage::parse(raw) {
            Ok(message) => message,
            Err(e) => {
                warn!(error = %e, len = raw.len(), "dropping malformed frame");
                return;
            }
        };

        match message.kind() {
            MessageKind::Pong => {
                heartbeat.on_pong();
                self.shared.lock().awaiting_pong = false;
            }
            MessageKind::Other => {
                debug!(event_type = message.message_type(), "unrecognized message type");
            }
            _ => trace!(event_type = message.message_type(), "message received"),
        }

        let notifier = self.notifier.lock().clone();
        if let Some(sink) = notifier {
            if let Some(notice) = Notice::from_message(&message) {
                if let Err(panic) = catch_unwind(AssertUnwindSafe(|| sink.notify(&notice))) {
                    error!(
                        event_type = message.message_type(),
                        panic = panic_message(panic.as_ref()),
                        "notification sink panicked"
                    );
                }
            }
        }

        let _ = self.listeners.emit(message.message_type(), message.payload());
        let _ = self.listeners.emit(events::MESSAGE, message.payload());
    }

    fn on_error(&self, message: &str) {
        warn!(error = message, "transport error");
        let _ = self.listeners.emit(events::ERROR, &events::error(message));
    }

    fn on_close(&self, code: u16, reason: &str) {
        let changed = {
            let mut shared = self.shared.lock();
            shared.outbound = None;
            shared.awaiting_pong = false;
            self.set_state_locked(&mut shared, ConnectionState::Disconnected)
        };
        if changed {
            info!(code, reason, "realtime link closed");
            let _ = self
                .listeners
                .emit(events::DISCONNECTED, &events::disconnected(code, reason));
        }
    }
}
