// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Orientation-change settling.
//!
//! A device rotation does not produce one clean resize. Browsers report a few intermediate
//! viewport sizes (address bars collapse, the keyboard hides, the layout reflows) before
//! the final one sticks. [`OrientationDebounce`] polls the viewport after an
//! orientation-change event until it has been stable for a number of consecutive polls, or
//! until a hard deadline passes, whichever comes first.
//!
//! ## States
//!
//! - [`DebounceState::Idle`]: nothing armed.
//! - [`DebounceState::Polling`]: a periodic poll timer and a one-shot deadline are armed,
//!   and a counter tracks consecutive unchanged polls.
//!
//! A new orientation-change while polling restarts both timers and the counter; there is
//! never more than one polling session.
//!
//! ## Usage
//!
//! The host routes fired timers through [`OrientationDebounce::timer_kind`] and measures
//! the viewport only for poll ticks:
//!
//! ```
//! use kurbo::Size;
//! use understory_viewport_events::orientation::{
//!     DebounceTimer, OrientationDebounce, OrientationSettings, PollOutcome,
//! };
//! use understory_viewport_events::timer::ManualTimers;
//!
//! let settings = OrientationSettings {
//!     poll_interval_ms: 17,
//!     stable_polls: 2,
//!     max_wait_ms: 1000,
//! };
//! let mut timers = ManualTimers::new();
//! let mut debounce = OrientationDebounce::new(settings);
//! let recorded = Size::new(800.0, 600.0);
//!
//! debounce.on_orientation_change(&mut timers);
//! assert!(debounce.is_polling());
//!
//! // The viewport has already rotated by the first poll.
//! let id = timers.fire_next(1000).unwrap();
//! assert_eq!(debounce.timer_kind(id), Some(DebounceTimer::Poll));
//! let rotated = Size::new(600.0, 800.0);
//! assert_eq!(
//!     debounce.on_poll(rotated, recorded, &mut timers),
//!     PollOutcome::Changed(rotated)
//! );
//!
//! // Two quiet polls later the machine goes idle on its own.
//! for _ in 0..2 {
//!     timers.fire_next(1000).unwrap();
//!     debounce.on_poll(rotated, rotated, &mut timers);
//! }
//! assert!(!debounce.is_polling());
//! assert_eq!(timers.armed_count(), 0);
//! ```

use kurbo::Size;
use tracing::debug;

use crate::timer::{TimerId, Timers};

/// Tuning for [`OrientationDebounce`].
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct OrientationSettings {
    /// Poll period in milliseconds.
    pub poll_interval_ms: u64,
    /// Consecutive unchanged polls after which the viewport is considered settled.
    pub stable_polls: u32,
    /// Hard upper bound on a polling session in milliseconds.
    pub max_wait_ms: u64,
}

impl Default for OrientationSettings {
    fn default() -> Self {
        Self {
            poll_interval_ms: 17,
            stable_polls: 50,
            max_wait_ms: 1000,
        }
    }
}

/// Observable state of an [`OrientationDebounce`].
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum DebounceState {
    /// No polling session is running.
    Idle,
    /// A polling session is running.
    Polling {
        /// Periodic poll timer.
        interval: TimerId,
        /// One-shot deadline timer.
        timeout: TimerId,
        /// Consecutive polls that saw the recorded viewport.
        stable_count: u32,
    },
}

/// Which of the session's timers an id refers to.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum DebounceTimer {
    /// The periodic poll timer; measure and call [`OrientationDebounce::on_poll`].
    Poll,
    /// The deadline; call [`OrientationDebounce::on_timeout`].
    Timeout,
}

/// Result of a poll tick.
#[derive(Copy, Clone, Debug, PartialEq)]
pub enum PollOutcome {
    /// The machine was idle; nothing happened.
    Ignored,
    /// The viewport matched the recorded size; still polling.
    Stable {
        /// Consecutive stable polls so far.
        count: u32,
    },
    /// The viewport matched for the configured number of polls; now idle.
    Settled,
    /// The viewport differs from the recorded size. The host should record it and
    /// re-run classification. The stability counter has been reset.
    Changed(Size),
}

/// Orientation-change debounce state machine.
///
/// The machine owns no clock. It arms and cancels timers through [`Timers`] and learns
/// about elapsed time only through the ids it is handed back.
#[derive(Clone, Debug)]
pub struct OrientationDebounce {
    settings: OrientationSettings,
    state: DebounceState,
}

impl OrientationDebounce {
    /// Create an idle machine.
    pub fn new(settings: OrientationSettings) -> Self {
        Self {
            settings,
            state: DebounceState::Idle,
        }
    }

    /// The configured settings.
    pub fn settings(&self) -> &OrientationSettings {
        &self.settings
    }

    /// Current state.
    pub fn state(&self) -> DebounceState {
        self.state
    }

    /// Returns `true` while a polling session is running.
    pub fn is_polling(&self) -> bool {
        matches!(self.state, DebounceState::Polling { .. })
    }

    /// Start (or restart) a polling session.
    pub fn on_orientation_change<T: Timers>(&mut self, timers: &mut T) {
        if self.stop(timers) {
            debug!("orientation change while polling; restarting");
        }
        let interval = timers.set_interval(self.settings.poll_interval_ms);
        let timeout = timers.set_timeout(self.settings.max_wait_ms);
        debug!(
            poll_interval_ms = self.settings.poll_interval_ms,
            max_wait_ms = self.settings.max_wait_ms,
            "orientation polling started"
        );
        self.state = DebounceState::Polling {
            interval,
            timeout,
            stable_count: 0,
        };
    }

    /// Classify a fired timer id against the current session.
    ///
    /// Returns `None` for ids this machine does not own, including timers from a
    /// session that has since been restarted or stopped.
    pub fn timer_kind(&self, id: TimerId) -> Option<DebounceTimer> {
        match self.state {
            DebounceState::Polling { interval, .. } if interval == id => Some(DebounceTimer::Poll),
            DebounceState::Polling { timeout, .. } if timeout == id => {
                Some(DebounceTimer::Timeout)
            }
            _ => None,
        }
    }

    /// Handle a poll tick.
    ///
    /// `current` is the freshly measured viewport, `recorded` the size the host last
    /// classified against.
    pub fn on_poll<T: Timers>(
        &mut self,
        current: Size,
        recorded: Size,
        timers: &mut T,
    ) -> PollOutcome {
        let DebounceState::Polling {
            interval,
            timeout,
            stable_count,
        } = self.state
        else {
            return PollOutcome::Ignored;
        };

        if current != recorded {
            self.state = DebounceState::Polling {
                interval,
                timeout,
                stable_count: 0,
            };
            return PollOutcome::Changed(current);
        }

        let count = stable_count + 1;
        if count >= self.settings.stable_polls {
            timers.clear_interval(interval);
            timers.clear_timeout(timeout);
            self.state = DebounceState::Idle;
            debug!(stable_polls = count, "orientation settled");
            return PollOutcome::Settled;
        }
        self.state = DebounceState::Polling {
            interval,
            timeout,
            stable_count: count,
        };
        PollOutcome::Stable { count }
    }

    /// Handle the deadline firing.
    ///
    /// Returns `true` if a session was running and has now been stopped.
    pub fn on_timeout<T: Timers>(&mut self, timers: &mut T) -> bool {
        let DebounceState::Polling {
            interval,
            stable_count,
            ..
        } = self.state
        else {
            return false;
        };
        // The one-shot has already fired; only the poll timer is left to cancel.
        timers.clear_interval(interval);
        self.state = DebounceState::Idle;
        debug!(stable_count, "orientation polling timed out");
        true
    }

    /// Stop any running session and cancel its timers.
    ///
    /// Returns `true` if a session was running.
    pub fn stop<T: Timers>(&mut self, timers: &mut T) -> bool {
        let DebounceState::Polling {
            interval, timeout, ..
        } = self.state
        else {
            return false;
        };
        timers.clear_interval(interval);
        timers.clear_timeout(timeout);
        self.state = DebounceState::Idle;
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::timer::ManualTimers;

    fn settings(stable_polls: u32) -> OrientationSettings {
        OrientationSettings {
            poll_interval_ms: 17,
            stable_polls,
            max_wait_ms: 1000,
        }
    }

    /// Drive the clock until the machine goes idle or `until` passes.
    /// `viewport` maps a poll index to the measured size; every change is recorded.
    fn run(
        debounce: &mut OrientationDebounce,
        timers: &mut ManualTimers,
        mut recorded: Size,
        until: u64,
        viewport: impl Fn(u32) -> Size,
    ) -> (u32, u32) {
        let mut polls = 0;
        let mut changes = 0;
        while let Some(id) = timers.fire_next(until) {
            match debounce.timer_kind(id) {
                Some(DebounceTimer::Poll) => {
                    let current = viewport(polls);
                    polls += 1;
                    if let PollOutcome::Changed(size) = debounce.on_poll(current, recorded, timers)
                    {
                        recorded = size;
                        changes += 1;
                    }
                }
                Some(DebounceTimer::Timeout) => {
                    debounce.on_timeout(timers);
                }
                None => {}
            }
            if !debounce.is_polling() {
                break;
            }
        }
        (polls, changes)
    }

    #[test]
    fn settles_after_threshold_identical_polls() {
        let mut timers = ManualTimers::new();
        let mut debounce = OrientationDebounce::new(settings(50));
        let size = Size::new(375.0, 667.0);

        debounce.on_orientation_change(&mut timers);
        let (polls, changes) = run(&mut debounce, &mut timers, size, 10_000, |_| size);

        assert_eq!(polls, 50);
        assert_eq!(changes, 0);
        assert_eq!(timers.now(), 50 * 17);
        assert_eq!(debounce.state(), DebounceState::Idle);
        assert_eq!(timers.armed_count(), 0);
    }

    #[test]
    fn forty_nine_polls_are_not_enough() {
        let mut timers = ManualTimers::new();
        let mut debounce = OrientationDebounce::new(settings(50));
        let size = Size::new(375.0, 667.0);

        debounce.on_orientation_change(&mut timers);
        for _ in 0..49 {
            let id = timers.fire_next(10_000).unwrap();
            assert_eq!(debounce.timer_kind(id), Some(DebounceTimer::Poll));
            debounce.on_poll(size, size, &mut timers);
        }
        assert!(matches!(
            debounce.state(),
            DebounceState::Polling {
                stable_count: 49,
                ..
            }
        ));
    }

    #[test]
    fn unstable_viewport_is_cut_off_by_deadline() {
        let mut timers = ManualTimers::new();
        let mut debounce = OrientationDebounce::new(settings(50));

        debounce.on_orientation_change(&mut timers);
        let (polls, changes) = run(
            &mut debounce,
            &mut timers,
            Size::new(0.0, 0.0),
            10_000,
            |i| Size::new(f64::from(i) + 1.0, 500.0),
        );

        // Polls at 17, 34, ..., 986; the deadline wins at 1000.
        assert_eq!(polls, 58);
        assert_eq!(changes, 58);
        assert_eq!(timers.now(), 1000);
        assert!(!debounce.is_polling());
        assert_eq!(timers.armed_count(), 0);
    }

    #[test]
    fn change_resets_stability_counter() {
        let mut timers = ManualTimers::new();
        let mut debounce = OrientationDebounce::new(settings(3));
        let a = Size::new(100.0, 200.0);
        let b = Size::new(200.0, 100.0);

        debounce.on_orientation_change(&mut timers);
        assert_eq!(
            debounce.on_poll(a, a, &mut timers),
            PollOutcome::Stable { count: 1 }
        );
        assert_eq!(
            debounce.on_poll(a, a, &mut timers),
            PollOutcome::Stable { count: 2 }
        );
        assert_eq!(debounce.on_poll(b, a, &mut timers), PollOutcome::Changed(b));
        assert_eq!(
            debounce.on_poll(b, b, &mut timers),
            PollOutcome::Stable { count: 1 }
        );
        assert_eq!(
            debounce.on_poll(b, b, &mut timers),
            PollOutcome::Stable { count: 2 }
        );
        assert_eq!(debounce.on_poll(b, b, &mut timers), PollOutcome::Settled);
    }

    #[test]
    fn restart_replaces_session_and_cancels_old_timers() {
        let mut timers = ManualTimers::new();
        let mut debounce = OrientationDebounce::new(settings(50));

        debounce.on_orientation_change(&mut timers);
        let DebounceState::Polling {
            interval: old_interval,
            timeout: old_timeout,
            ..
        } = debounce.state()
        else {
            panic!("expected polling");
        };
        let size = Size::new(1.0, 1.0);
        debounce.on_poll(size, size, &mut timers);

        debounce.on_orientation_change(&mut timers);
        assert!(!timers.is_armed(old_interval));
        assert!(!timers.is_armed(old_timeout));
        assert_eq!(timers.armed_count(), 2);
        assert_eq!(debounce.timer_kind(old_interval), None);
        assert_eq!(debounce.timer_kind(old_timeout), None);
        assert!(matches!(
            debounce.state(),
            DebounceState::Polling {
                stable_count: 0,
                ..
            }
        ));
    }

    #[test]
    fn idle_machine_ignores_ticks_and_timeouts() {
        let mut timers = ManualTimers::new();
        let mut debounce = OrientationDebounce::new(settings(50));
        let size = Size::new(1.0, 1.0);
        assert_eq!(debounce.on_poll(size, size, &mut timers), PollOutcome::Ignored);
        assert!(!debounce.on_timeout(&mut timers));
        assert!(!debounce.stop(&mut timers));
        assert_eq!(debounce.timer_kind(TimerId(0)), None);
    }

    #[test]
    fn stop_cancels_both_timers() {
        let mut timers = ManualTimers::new();
        let mut debounce = OrientationDebounce::new(settings(50));
        debounce.on_orientation_change(&mut timers);
        assert!(debounce.stop(&mut timers));
        assert_eq!(timers.armed_count(), 0);
        assert_eq!(debounce.state(), DebounceState::Idle);
    }
}
