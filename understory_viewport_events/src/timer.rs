// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Timer service abstraction and a deterministic virtual clock.
//!
//! The state machines in this crate never read a wall clock. They arm and cancel timers
//! through [`Timers`], and the host calls back into them with the [`TimerId`] that fired.
//! In a browser this maps onto `setInterval`/`setTimeout`; in tests and headless hosts
//! [`ManualTimers`] plays the same role with explicit, virtual time.
//!
//! ```
//! use understory_viewport_events::timer::{ManualTimers, Timers};
//!
//! let mut timers = ManualTimers::new();
//! let tick = timers.set_interval(10);
//! let done = timers.set_timeout(25);
//!
//! assert_eq!(timers.fire_next(100), Some(tick)); // t = 10
//! assert_eq!(timers.fire_next(100), Some(tick)); // t = 20
//! assert_eq!(timers.fire_next(100), Some(done)); // t = 25
//! timers.clear_interval(tick);
//! assert_eq!(timers.fire_next(100), None);
//! assert_eq!(timers.now(), 100);
//! ```

use alloc::collections::BTreeMap;

/// Opaque handle for a timer armed through [`Timers`].
///
/// Ids are never reused by [`ManualTimers`]; hosts backed by a real event loop should
/// hand out ids with the same property so stale callbacks can be told apart.
#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TimerId(pub u64);

/// Host timer service.
///
/// All delays are in milliseconds. Clearing an id that is unknown or already cleared
/// must be a no-op.
pub trait Timers {
    /// Arm a periodic timer firing every `period_ms`, first after one period.
    fn set_interval(&mut self, period_ms: u64) -> TimerId;
    /// Cancel a periodic timer.
    fn clear_interval(&mut self, id: TimerId);
    /// Arm a one-shot timer firing once after `delay_ms`.
    fn set_timeout(&mut self, delay_ms: u64) -> TimerId;
    /// Cancel a one-shot timer.
    fn clear_timeout(&mut self, id: TimerId);
}

#[derive(Copy, Clone, Debug)]
struct Armed {
    due: u64,
    period: Option<u64>,
}

/// Virtual-time implementation of [`Timers`].
///
/// Time only moves when [`ManualTimers::fire_next`] or [`ManualTimers::advance_to`] is
/// called. Timers due at the same instant fire in creation order. Periods of zero are
/// treated as one millisecond so an interval can never starve the clock.
#[derive(Clone, Debug, Default)]
pub struct ManualTimers {
    now: u64,
    next_id: u64,
    armed: BTreeMap<TimerId, Armed>,
}

impl ManualTimers {
    /// Create a clock at `t = 0` with no armed timers.
    pub fn new() -> Self {
        Self::default()
    }

    /// Current virtual time in milliseconds.
    pub fn now(&self) -> u64 {
        self.now
    }

    /// Returns `true` if `id` is still armed.
    pub fn is_armed(&self, id: TimerId) -> bool {
        self.armed.contains_key(&id)
    }

    /// Number of armed timers.
    pub fn armed_count(&self) -> usize {
        self.armed.len()
    }

    /// Due time of the earliest armed timer, if any.
    pub fn next_due(&self) -> Option<u64> {
        self.earliest().map(|(_, armed)| armed.due)
    }

    /// Fire the earliest timer due at or before `until`.
    ///
    /// On success the clock moves to the timer's due time, intervals are re-armed one
    /// period later and one-shots are dropped. When nothing is due the clock moves to
    /// `until` (it never moves backwards) and `None` is returned.
    pub fn fire_next(&mut self, until: u64) -> Option<TimerId> {
        match self.earliest() {
            Some((id, armed)) if armed.due <= until => {
                self.now = self.now.max(armed.due);
                match armed.period {
                    Some(period) => {
                        if let Some(slot) = self.armed.get_mut(&id) {
                            slot.due = armed.due.saturating_add(period);
                        }
                    }
                    None => {
                        self.armed.remove(&id);
                    }
                }
                Some(id)
            }
            _ => {
                self.now = self.now.max(until);
                None
            }
        }
    }

    /// Move the clock to `until` without firing anything.
    ///
    /// Timers that were due in between stay due and fire on the next
    /// [`fire_next`](Self::fire_next) call.
    pub fn advance_to(&mut self, until: u64) {
        self.now = self.now.max(until);
    }

    fn earliest(&self) -> Option<(TimerId, Armed)> {
        self.armed
            .iter()
            .min_by_key(|(id, armed)| (armed.due, **id))
            .map(|(id, armed)| (*id, *armed))
    }

    fn arm(&mut self, delay_ms: u64, period: Option<u64>) -> TimerId {
        let id = TimerId(self.next_id);
        self.next_id += 1;
        self.armed.insert(
            id,
            Armed {
                due: self.now.saturating_add(delay_ms),
                period,
            },
        );
        id
    }
}

impl Timers for ManualTimers {
    fn set_interval(&mut self, period_ms: u64) -> TimerId {
        let period = period_ms.max(1);
        self.arm(period, Some(period))
    }

    fn clear_interval(&mut self, id: TimerId) {
        self.armed.remove(&id);
    }

    fn set_timeout(&mut self, delay_ms: u64) -> TimerId {
        self.arm(delay_ms, None)
    }

    fn clear_timeout(&mut self, id: TimerId) {
        self.armed.remove(&id);
    }
}
