//! Per-connection listener registry.
//!
//! Maps an event name to an ordered list of callbacks. Each connection owns
//! its own registry, so several connections never see each other's
//! listeners.

use std::any::Any;
use std::collections::HashMap;
use std::fmt;
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use parking_lot::Mutex;
use serde_json::Value;
use tracing::error;

/// Callback invoked with an event payload.
pub type Listener = Arc<dyn Fn(&Value) + Send + Sync>;

/// Handle returned by [`ListenerRegistry::on`], used for targeted removal.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ListenerId(u64);

impl fmt::Display for ListenerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "listener-{}", self.0)
    }
}

/// Event name → ordered callbacks.
#[derive(Default)]
pub struct ListenerRegistry {
    next_id: AtomicU64,
    listeners: Mutex<HashMap<String, Vec<(ListenerId, Listener)>>>,
}

impl ListenerRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `callback` for `event`. Callbacks run in registration order.
    pub fn on<F>(&self, event: impl Into<String>, callback: F) -> ListenerId
    where
        F: Fn(&Value) + Send + Sync + 'static,
    {
        let id = ListenerId(self.next_id.fetch_add(1, Ordering::Relaxed));
        self.listeners
            .lock()
            .entry(event.into())
            .or_default()
            .push((id, Arc::new(callback)));
        id
    }

    /// Remove one listener, or every listener for `event` when `id` is `None`.
    ///
    /// Returns the number of callbacks removed.
    pub fn off(&self, event: &str, id: Option<ListenerId>) -> usize {
        let mut listeners = self.listeners.lock();
        let Some(list) = listeners.get_mut(event) else {
            return 0;
        };
        let before = list.len();
        match id {
            Some(id) => list.retain(|(existing, _)| *existing != id),
            None => list.clear(),
        }
        let removed = before - list.len();
        if list.is_empty() {
            let _ = listeners.remove(event);
        }
        removed
    }

    /// Number of callbacks registered for `event`.
    pub fn listener_count(&self, event: &str) -> usize {
        self.listeners.lock().get(event).map_or(0, Vec::len)
    }

    /// Invoke every callback for `event` with `payload`.
    ///
    /// The callback list is snapshotted first, so callbacks may register or
    /// remove listeners without deadlocking; such changes apply from the next
    /// emit. A panicking callback is logged and skipped. Returns the number of
    /// callbacks that completed normally.
    pub fn emit(&self, event: &str, payload: &Value) -> usize {
        let snapshot: Vec<(ListenerId, Listener)> = match self.listeners.lock().get(event) {
            Some(list) => list.clone(),
            None => return 0,
        };

        let mut completed = 0;
        for (id, callback) in snapshot {
            match catch_unwind(AssertUnwindSafe(|| callback(payload))) {
                Ok(()) => completed += 1,
                Err(panic) => {
                    error!(
                        event,
                        listener = %id,
                        panic = panic_message(panic.as_ref()),
                        "listener panicked"
                    );
                }
            }
        }
        completed
    }
}

impl fmt::Debug for ListenerRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let listeners = self.listeners.lock();
        let counts: HashMap<&str, usize> = listeners
            .iter()
            .map(|(name, list)| (name.as_str(), list.len()))
            .collect();
        f.debug_struct("ListenerRegistry")
            .field("listeners", &counts)
            .finish()
    }
}

pub(crate) fn panic_message(panic: &(dyn Any + Send)) -> &str {
    if let Some(s) = panic.downcast_ref::<&str>() {
        s
    } else if let Some(s) = panic.downcast_ref::<String>() {
        s.as_str()
    } else {
        "non-string panic payload"
    }
}
