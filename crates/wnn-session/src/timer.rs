//! Single-slot debounce timer for delayed prediction.
//!
//! The slot holds at most one pending token; scheduling replaces it. Time is
//! supplied by the caller, so the host decides how deadlines are driven.

use std::time::{Duration, Instant};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TimerToken(u64);

#[derive(Debug, Default)]
pub struct TimerSlot {
    next_id: u64,
    pending: Option<(TimerToken, Instant)>,
}

impl TimerSlot {
    pub fn new() -> Self {
        Self::default()
    }

    /// Schedule a token due at `now + delay`, cancelling any pending one.
    pub fn schedule_after(&mut self, now: Instant, delay: Duration) -> TimerToken {
        self.next_id += 1;
        let token = TimerToken(self.next_id);
        self.pending = Some((token, now + delay));
        token
    }

    /// Cancel `token` if it is the pending one. Returns whether it was.
    pub fn cancel(&mut self, token: TimerToken) -> bool {
        if self.pending.is_some_and(|(t, _)| t == token) {
            self.pending = None;
            true
        } else {
            false
        }
    }

    pub fn cancel_all(&mut self) {
        self.pending = None;
    }

    pub fn is_pending(&self) -> bool {
        self.pending.is_some()
    }

    pub fn deadline(&self) -> Option<Instant> {
        self.pending.map(|(_, at)| at)
    }

    /// Take the pending token if it is due at `now`.
    pub fn poll(&mut self, now: Instant) -> Option<TimerToken> {
        match self.pending {
            Some((token, at)) if at <= now => {
                self.pending = None;
                Some(token)
            }
            _ => None,
        }
    }

    /// Consume `token` when the host reports it fired. Stale tokens
    /// (replaced or cancelled) return `false`.
    pub fn fire(&mut self, token: TimerToken) -> bool {
        self.cancel(token)
    }
}
