//! Keepalive ping/pong bookkeeping.
//!
//! The connection driver owns the ticker; this type only decides what each
//! tick means. Without a pong timeout every tick just sends a ping and the
//! "awaiting pong" flag is diagnostic. With a timeout, unanswered ticks are
//! counted and the link is declared dead after `timeout / interval`
//! consecutive misses (clamped to at least 1).

use std::time::Duration;

/// What the driver should do on a keepalive tick.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum HeartbeatAction {
    /// Send a `ping` frame.
    SendPing,
    /// Too many pings went unanswered; force the link closed.
    TimedOut,
}

/// Ping/pong state for one open link.
#[derive(Clone, Debug)]
pub struct Heartbeat {
    awaiting_pong: bool,
    missed_pongs: u32,
    max_missed: Option<u32>,
}

impl Heartbeat {
    /// Create for a link with the given ping `interval` and optional `timeout`.
    pub fn new(interval: Duration, timeout: Option<Duration>) -> Self {
        let interval_ms = interval.as_millis().max(1);
        #[allow(clippy::cast_possible_truncation)]
        let max_missed = timeout.map(|t| {
            (t.as_millis() / interval_ms).clamp(1, u128::from(u32::MAX)) as u32
        });
        Self {
            awaiting_pong: false,
            missed_pongs: 0,
            max_missed,
        }
    }

    /// Advance one tick.
    pub fn on_tick(&mut self) -> HeartbeatAction {
        if self.awaiting_pong {
            self.missed_pongs += 1;
            if self.max_missed.is_some_and(|max| self.missed_pongs >= max) {
                return HeartbeatAction::TimedOut;
            }
        }
        self.awaiting_pong = true;
        HeartbeatAction::SendPing
    }

    /// Record a pong.
    pub fn on_pong(&mut self) {
        self.awaiting_pong = false;
        self.missed_pongs = 0;
    }

    /// Whether the last ping is still unanswered.
    pub fn is_awaiting_pong(&self) -> bool {
        self.awaiting_pong
    }

    /// Consecutive unanswered pings.
    pub fn missed_pongs(&self) -> u32 {
        self.missed_pongs
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_tick_sends_ping() {
        let mut hb = Heartbeat::new(Duration::from_secs(30), None);
        assert!(!hb.is_awaiting_pong());
        assert_eq!(hb.on_tick(), HeartbeatAction::SendPing);
        assert!(hb.is_awaiting_pong());
    }

    #[test]
    fn without_timeout_never_times_out() {
        let mut hb = Heartbeat::new(Duration::from_millis(10), None);
        for _ in 0..1000 {
            assert_eq!(hb.on_tick(), HeartbeatAction::SendPing);
        }
        assert_eq!(hb.missed_pongs(), 999);
    }

    #[test]
    fn max_missed_computed_from_timeout_and_interval() {
        // timeout=300ms, interval=100ms → 3 misses allowed
        let mut hb = Heartbeat::new(Duration::from_millis(100), Some(Duration::from_millis(300)));
        assert_eq!(hb.on_tick(), HeartbeatAction::SendPing);
        assert_eq!(hb.on_tick(), HeartbeatAction::SendPing);
        assert_eq!(hb.on_tick(), HeartbeatAction::SendPing);
        assert_eq!(hb.on_tick(), HeartbeatAction::TimedOut);
    }

    #[test]
    fn timeout_shorter_than_interval_clamps_to_one() {
        let mut hb = Heartbeat::new(Duration::from_secs(30), Some(Duration::from_secs(1)));
        assert_eq!(hb.on_tick(), HeartbeatAction::SendPing);
        assert_eq!(hb.on_tick(), HeartbeatAction::TimedOut);
    }

    #[test]
    fn pong_resets_missed_count() {
        let mut hb = Heartbeat::new(Duration::from_millis(100), Some(Duration::from_millis(200)));
        assert_eq!(hb.on_tick(), HeartbeatAction::SendPing);
        assert_eq!(hb.on_tick(), HeartbeatAction::SendPing);
        assert_eq!(hb.missed_pongs(), 1);
        hb.on_pong();
        assert!(!hb.is_awaiting_pong());
        assert_eq!(hb.missed_pongs(), 0);
        assert_eq!(hb.on_tick(), HeartbeatAction::SendPing);
        assert_eq!(hb.on_tick(), HeartbeatAction::SendPing);
        assert_eq!(hb.on_tick(), HeartbeatAction::TimedOut);
    }
}
