// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

use tracing::{debug, trace};
use understory_breakpoints::{
    BreakpointConfig, Changes, Classification, DocumentSink, Engine, Error, Measure, PassKind,
    PassReport, StateView, Subscription,
};
use understory_viewport_events::TimerId;
use understory_viewport_events::orientation::{
    DebounceTimer, OrientationDebounce, OrientationSettings, PollOutcome,
};
use understory_viewport_events::throttle::Throttle;
use understory_viewport_events::timer::Timers;

/// A viewport event forwarded by the host.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum ViewportEvent {
    /// The window was resized.
    Resize,
    /// The device orientation changed.
    OrientationChange,
    /// A timer armed through the context's [`Timers`] fired.
    Timer(TimerId),
}

/// What a fired timer did.
#[derive(Clone, Debug, PartialEq)]
pub enum TimerOutcome {
    /// The id belongs to neither the resize window nor the current polling session.
    Ignored,
    /// The resize window closed and a pass ran against the latest viewport.
    Resized(PassReport),
    /// An orientation poll saw the recorded viewport; polling continues.
    Stable {
        /// Consecutive stable polls so far.
        count: u32,
    },
    /// An orientation poll saw the recorded viewport often enough; polling stopped.
    Settled,
    /// An orientation poll saw a new viewport, which was recorded and classified.
    Reoriented(PassReport),
    /// Orientation polling hit its deadline and stopped.
    TimedOut,
}

/// Responsive breakpoint context for one document.
///
/// Owns the breakpoint [`Engine`], the resize [`Throttle`], the orientation
/// [`OrientationDebounce`] and the three host collaborators. Construction runs the
/// initial pass; after that every pass is triggered by an event, a fired timer, or
/// [`refresh`](Self::refresh).
///
/// Several contexts can coexist; they share nothing.
#[derive(Debug)]
pub struct Adaptive<M, D, T> {
    engine: Engine,
    throttle: Throttle,
    orientation: OrientationDebounce,
    measure: M,
    document: D,
    timers: T,
}

impl<M, D, T> Adaptive<M, D, T>
where
    M: Measure,
    D: DocumentSink,
    T: Timers,
{
    /// Create a context and run the initial pass.
    ///
    /// Fails if the initial pass cannot measure one of its sources. No timers are armed
    /// until the first event arrives.
    pub fn new(
        config: BreakpointConfig,
        measure: M,
        document: D,
        timers: T,
    ) -> Result<Self, Error> {
        let settings = *config.settings();
        let mut adaptive = Self {
            engine: Engine::new(config),
            throttle: Throttle::new(settings.throttle_ms),
            orientation: OrientationDebounce::new(OrientationSettings {
                poll_interval_ms: settings.throttle_ms,
                stable_polls: settings.orientation_test_count,
                max_wait_ms: settings.orientation_change_timeout_ms,
            }),
            measure,
            document,
            timers,
        };
        adaptive.pass(PassKind::Initial)?;
        Ok(adaptive)
    }

    /// Record a resize event.
    ///
    /// Returns `true` if this event opened a new throttle window. The pass runs when the
    /// window's timer fires, against the viewport at that moment.
    pub fn on_resize(&mut self) -> bool {
        self.throttle.on_event(&mut self.timers)
    }

    /// Record an orientation change and (re)start viewport polling.
    pub fn on_orientation_change(&mut self) {
        self.orientation.on_orientation_change(&mut self.timers);
    }

    /// Handle a fired timer.
    ///
    /// Errors come from the pass the timer triggered; that pass committed nothing and
    /// polling, if running, continues.
    pub fn on_timer(&mut self, id: TimerId) -> Result<TimerOutcome, Error> {
        if self.throttle.on_timer(id) {
            return self.pass(PassKind::Update).map(TimerOutcome::Resized);
        }
        match self.orientation.timer_kind(id) {
            Some(DebounceTimer::Poll) => self.poll(),
            Some(DebounceTimer::Timeout) => {
                self.orientation.on_timeout(&mut self.timers);
                Ok(TimerOutcome::TimedOut)
            }
            None => {
                trace!(?id, "ignoring foreign timer");
                Ok(TimerOutcome::Ignored)
            }
        }
    }

    /// Dispatch a forwarded event.
    ///
    /// Only [`ViewportEvent::Timer`] can run a pass, so only it yields an outcome.
    pub fn handle(&mut self, event: ViewportEvent) -> Result<Option<TimerOutcome>, Error> {
        match event {
            ViewportEvent::Resize => {
                self.on_resize();
                Ok(None)
            }
            ViewportEvent::OrientationChange => {
                self.on_orientation_change();
                Ok(None)
            }
            ViewportEvent::Timer(id) => self.on_timer(id).map(Some),
        }
    }

    /// Run an update pass now, bypassing the throttle.
    pub fn refresh(&mut self) -> Result<PassReport, Error> {
        self.pass(PassKind::Update)
    }

    /// Read-only view of the committed classification.
    pub fn view(&self) -> StateView {
        self.engine.view()
    }

    /// Call `subscriber` after every commit that changes something.
    ///
    /// The subscriber runs until the returned handle is dropped or cancelled.
    pub fn subscribe(
        &self,
        subscriber: impl FnMut(&Classification, Changes) + 'static,
    ) -> Subscription {
        self.engine.view().subscribe(subscriber)
    }

    /// The breakpoint engine.
    pub fn engine(&self) -> &Engine {
        &self.engine
    }

    /// The resize throttle.
    pub fn throttle(&self) -> &Throttle {
        &self.throttle
    }

    /// The orientation debounce machine.
    pub fn orientation(&self) -> &OrientationDebounce {
        &self.orientation
    }

    /// The measurement collaborator.
    pub fn measure(&self) -> &M {
        &self.measure
    }

    /// Mutable access to the measurement collaborator.
    pub fn measure_mut(&mut self) -> &mut M {
        &mut self.measure
    }

    /// The document collaborator.
    pub fn document(&self) -> &D {
        &self.document
    }

    /// Mutable access to the document collaborator.
    pub fn document_mut(&mut self) -> &mut D {
        &mut self.document
    }

    /// The timer service.
    pub fn timers(&self) -> &T {
        &self.timers
    }

    /// Mutable access to the timer service.
    ///
    /// Hosts driving a virtual clock fire timers through this and hand the ids back to
    /// [`on_timer`](Self::on_timer).
    pub fn timers_mut(&mut self) -> &mut T {
        &mut self.timers
    }

    /// Cancel every armed timer and hand back the collaborators.
    pub fn into_parts(mut self) -> (M, D, T) {
        self.throttle.cancel(&mut self.timers);
        self.orientation.stop(&mut self.timers);
        (self.measure, self.document, self.timers)
    }

    fn poll(&mut self) -> Result<TimerOutcome, Error> {
        let current = self.measure.viewport();
        let recorded = self.engine.view().with(Classification::size);
        match self.orientation.on_poll(current, recorded, &mut self.timers) {
            PollOutcome::Ignored => Ok(TimerOutcome::Ignored),
            PollOutcome::Stable { count } => Ok(TimerOutcome::Stable { count }),
            PollOutcome::Settled => Ok(TimerOutcome::Settled),
            PollOutcome::Changed(size) => {
                debug!(
                    width = size.width,
                    height = size.height,
                    "viewport changed while polling"
                );
                // The pass commits the new size together with the flags. If it fails,
                // nothing is recorded and the next poll retries.
                self.pass(PassKind::Update).map(TimerOutcome::Reoriented)
            }
        }
    }

    fn pass(&mut self, kind: PassKind) -> Result<PassReport, Error> {
        self.engine.pass(kind, &mut self.measure, &mut self.document)
    }
}
