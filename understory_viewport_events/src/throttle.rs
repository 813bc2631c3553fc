// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Trailing-edge throttle for resize events.
//!
//! Window resize events arrive in bursts far faster than a breakpoint pass is worth
//! running. [`Throttle`] coalesces a burst into a single trailing call:
//!
//! - The first event while idle arms a one-shot timer of `interval_ms`.
//! - Further events before that timer fires are counted and otherwise dropped.
//! - When the timer fires, [`Throttle::on_timer`] returns `true` exactly once and the host
//!   runs its pass. Measuring happens at that point, so the latest size is used.
//!
//! ```
//! use understory_viewport_events::throttle::Throttle;
//! use understory_viewport_events::timer::ManualTimers;
//!
//! let mut timers = ManualTimers::new();
//! let mut throttle = Throttle::new(17);
//!
//! assert!(throttle.on_event(&mut timers)); // arms the window
//! assert!(!throttle.on_event(&mut timers)); // coalesced
//! assert!(!throttle.on_event(&mut timers)); // coalesced
//!
//! let id = timers.fire_next(17).unwrap();
//! assert!(throttle.on_timer(id));
//! assert!(!throttle.is_pending());
//! ```

use tracing::trace;

use crate::timer::{TimerId, Timers};

/// Trailing-edge rate limiter driven by a [`Timers`] service.
#[derive(Clone, Debug)]
pub struct Throttle {
    interval_ms: u64,
    pending: Option<TimerId>,
    coalesced: u32,
}

impl Throttle {
    /// Create an idle throttle with the given window length in milliseconds.
    pub fn new(interval_ms: u64) -> Self {
        Self {
            interval_ms,
            pending: None,
            coalesced: 0,
        }
    }

    /// Window length in milliseconds.
    pub fn interval_ms(&self) -> u64 {
        self.interval_ms
    }

    /// Returns `true` while a trailing call is armed.
    pub fn is_pending(&self) -> bool {
        self.pending.is_some()
    }

    /// Timer backing the current window, if any.
    pub fn pending_timer(&self) -> Option<TimerId> {
        self.pending
    }

    /// Number of events folded into the current window, including the one that opened it.
    pub fn coalesced(&self) -> u32 {
        self.coalesced
    }

    /// Record an event.
    ///
    /// Returns `true` if this event opened a new window (and armed a timer).
    pub fn on_event<T: Timers>(&mut self, timers: &mut T) -> bool {
        self.coalesced = self.coalesced.saturating_add(1);
        if self.pending.is_some() {
            trace!(coalesced = self.coalesced, "resize coalesced");
            return false;
        }
        self.pending = Some(timers.set_timeout(self.interval_ms));
        true
    }

    /// Handle a fired timer.
    ///
    /// Returns `true` if `id` closes the current window; the caller should run its
    /// throttled work now. Unknown ids return `false`.
    pub fn on_timer(&mut self, id: TimerId) -> bool {
        if self.pending != Some(id) {
            return false;
        }
        trace!(coalesced = self.coalesced, "resize window closed");
        self.pending = None;
        self.coalesced = 0;
        true
    }

    /// Drop the armed window without running the trailing call.
    ///
    /// Returns `true` if a window was armed.
    pub fn cancel<T: Timers>(&mut self, timers: &mut T) -> bool {
        self.coalesced = 0;
        match self.pending.take() {
            Some(id) => {
                timers.clear_timeout(id);
                true
            }
            None => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::timer::ManualTimers;

    #[test]
    fn burst_within_window_fires_once() {
        let mut timers = ManualTimers::new();
        let mut throttle = Throttle::new(17);

        for _ in 0..10 {
            throttle.on_event(&mut timers);
        }
        assert_eq!(throttle.coalesced(), 10);
        assert_eq!(timers.armed_count(), 1);

        let mut fired = 0;
        while let Some(id) = timers.fire_next(100) {
            if throttle.on_timer(id) {
                fired += 1;
            }
        }
        assert_eq!(fired, 1);
        assert_eq!(throttle.coalesced(), 0);
    }

    #[test]
    fn events_after_window_open_a_new_one() {
        let mut timers = ManualTimers::new();
        let mut throttle = Throttle::new(17);

        assert!(throttle.on_event(&mut timers));
        let first = timers.fire_next(17).unwrap();
        assert!(throttle.on_timer(first));

        assert!(throttle.on_event(&mut timers));
        let second = timers.fire_next(100).unwrap();
        assert_ne!(first, second);
        assert_eq!(timers.now(), 34);
        assert!(throttle.on_timer(second));
    }

    #[test]
    fn foreign_and_stale_timers_are_ignored() {
        let mut timers = ManualTimers::new();
        let mut throttle = Throttle::new(17);
        let other = timers.set_timeout(1);
        throttle.on_event(&mut timers);
        assert!(!throttle.on_timer(other));
        assert!(throttle.is_pending());

        let id = throttle.pending_timer().unwrap();
        assert!(throttle.on_timer(id));
        assert!(!throttle.on_timer(id));
    }

    #[test]
    fn cancel_clears_timer() {
        let mut timers = ManualTimers::new();
        let mut throttle = Throttle::new(17);
        throttle.on_event(&mut timers);
        let id = throttle.pending_timer().unwrap();
        assert!(throttle.cancel(&mut timers));
        assert!(!timers.is_armed(id));
        assert!(!throttle.cancel(&mut timers));
    }
}
