// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Classification state: the committed result of the latest pass.
//!
//! The state lives in a `spark_signals` signal. The [`Engine`](crate::Engine) holds the
//! only writing handle; everyone else gets a [`StateView`], which can read, take snapshots,
//! and subscribe to commits but cannot write. Subscriptions are effects over the signal, so
//! reading a view inside a `spark_signals` effect or derived tracks it like any other signal.

use core::fmt;
use std::rc::Rc;

use kurbo::Size;
use spark_signals::{Signal, effect, flush_sync, signal};

use crate::config::DeviceId;

bitflags::bitflags! {
    /// Fields of a [`Classification`] touched by a commit.
    #[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
    pub struct Changes: u8 {
        /// Viewport width changed.
        const WIDTH = 0b0000_0001;
        /// Viewport height changed.
        const HEIGHT = 0b0000_0010;
        /// At least one device flag changed.
        const FLAGS = 0b0000_0100;
        /// Root font size changed.
        const REM = 0b0000_1000;
    }
}

/// Committed classification: device flags, viewport size, and root font size.
///
/// Created with every flag `false` and all metrics zero.
#[derive(Clone, PartialEq)]
pub struct Classification {
    devices: Rc<[Box<str>]>,
    flags: Vec<bool>,
    width: f64,
    height: f64,
    rem: f64,
}

impl Classification {
    pub(crate) fn new(devices: Rc<[Box<str>]>) -> Self {
        let flags = vec![false; devices.len()];
        Self {
            devices,
            flags,
            width: 0.0,
            height: 0.0,
            rem: 0.0,
        }
    }

    /// Flag for a device by name, or `None` if no rule names that device.
    pub fn is(&self, device: &str) -> Option<bool> {
        self.devices
            .iter()
            .position(|d| &**d == device)
            .map(|i| self.flags[i])
    }

    /// Flag for a device by id.
    ///
    /// # Panics
    ///
    /// Panics if `id` belongs to a different configuration with more devices.
    pub fn flag(&self, id: DeviceId) -> bool {
        self.flags[id.index()]
    }

    /// All `(device, flag)` pairs in configuration order.
    pub fn flags(&self) -> impl Iterator<Item = (&str, bool)> + '_ {
        self.devices
            .iter()
            .map(|d| &**d)
            .zip(self.flags.iter().copied())
    }

    /// Names of devices whose flag is set.
    pub fn active(&self) -> impl Iterator<Item = &str> + '_ {
        self.flags().filter_map(|(d, on)| on.then_some(d))
    }

    /// Last recorded viewport width.
    pub fn width(&self) -> f64 {
        self.width
    }

    /// Last recorded viewport height.
    pub fn height(&self) -> f64 {
        self.height
    }

    /// Last recorded viewport size.
    pub fn size(&self) -> Size {
        Size::new(self.width, self.height)
    }

    /// Root font size in pixels; `0.0` until some rule proposes a scale.
    pub fn rem(&self) -> f64 {
        self.rem
    }

    pub(crate) fn flag_slice(&self) -> &[bool] {
        &self.flags
    }
}

impl fmt::Debug for Classification {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Classification")
            .field("is", &DebugFlags(self))
            .field("width", &self.width)
            .field("height", &self.height)
            .field("rem", &self.rem)
            .finish()
    }
}

struct DebugFlags<'a>(&'a Classification);

impl fmt::Debug for DebugFlags<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map().entries(self.0.flags()).finish()
    }
}

/// A commit as stored in the signal.
#[derive(Clone, PartialEq)]
struct Committed {
    current: Classification,
    revision: u64,
    /// Fields touched by the commit that produced this revision.
    changes: Changes,
}

/// Live subscription returned by [`StateView::subscribe`].
///
/// The subscriber is stopped when this handle is dropped or [`cancel`](Self::cancel)ed.
/// Use [`detach`](Self::detach) to keep it running for the life of the state.
#[must_use = "dropping a Subscription stops it"]
pub struct Subscription {
    stop: Option<Box<dyn FnOnce()>>,
}

impl Subscription {
    /// Stop the subscriber.
    pub fn cancel(mut self) {
        if let Some(stop) = self.stop.take() {
            stop();
        }
    }

    /// Keep the subscriber running without holding the handle.
    pub fn detach(mut self) {
        self.stop = None;
    }

    /// Returns `true` until the subscription is cancelled or detached.
    pub fn is_active(&self) -> bool {
        self.stop.is_some()
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        if let Some(stop) = self.stop.take() {
            stop();
        }
    }
}

impl fmt::Debug for Subscription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subscription")
            .field("active", &self.is_active())
            .finish_non_exhaustive()
    }
}

/// Read-only, shared view of a [`Classification`].
///
/// Views are cheap to clone and always observe the latest commit. They are `!Send`:
/// classification is single-threaded.
#[derive(Clone)]
pub struct StateView {
    state: Signal<Committed>,
}

impl StateView {
    /// Flag for a device by name, or `None` if no rule names that device.
    pub fn is(&self, device: &str) -> Option<bool> {
        self.state.get().current.is(device)
    }

    /// All `(device, flag)` pairs in configuration order.
    pub fn flags(&self) -> Vec<(Box<str>, bool)> {
        self.with(|state| state.flags().map(|(device, on)| (device.into(), on)).collect())
    }

    /// Last recorded viewport width.
    pub fn width(&self) -> f64 {
        self.state.get().current.width
    }

    /// Last recorded viewport height.
    pub fn height(&self) -> f64 {
        self.state.get().current.height
    }

    /// Root font size in pixels.
    pub fn rem(&self) -> f64 {
        self.state.get().current.rem
    }

    /// Number of commits that changed something.
    pub fn revision(&self) -> u64 {
        self.state.get().revision
    }

    /// Copy of the current classification.
    pub fn snapshot(&self) -> Classification {
        self.state.get().current
    }

    /// Run `f` against the current classification.
    pub fn with<R>(&self, f: impl FnOnce(&Classification) -> R) -> R {
        f(&self.state.get().current)
    }

    /// Call `subscriber` after every commit that changes something.
    ///
    /// Subscribers run after all document side effects of the pass have been applied and
    /// before the pass returns. They may read any view but must not start a pass.
    pub fn subscribe(
        &self,
        mut subscriber: impl FnMut(&Classification, Changes) + 'static,
    ) -> Subscription {
        let state = self.state.clone();
        let mut seen = self.revision();
        let stop = effect(move || {
            let committed = state.get();
            // The effect also runs once on creation; only report new revisions.
            if committed.revision == seen {
                return;
            }
            seen = committed.revision;
            subscriber(&committed.current, committed.changes);
        });
        Subscription {
            stop: Some(Box::new(stop)),
        }
    }
}

impl fmt::Debug for StateView {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let committed = self.state.get();
        f.debug_struct("StateView")
            .field("current", &committed.current)
            .field("revision", &committed.revision)
            .finish()
    }
}

/// Writing handle, owned by the engine.
pub(crate) struct Store {
    state: Signal<Committed>,
}

impl Store {
    pub(crate) fn new(devices: Rc<[Box<str>]>) -> Self {
        Self {
            state: signal(Committed {
                current: Classification::new(devices),
                revision: 0,
                changes: Changes::empty(),
            }),
        }
    }

    pub(crate) fn view(&self) -> StateView {
        StateView {
            state: self.state.clone(),
        }
    }

    pub(crate) fn with<R>(&self, f: impl FnOnce(&Classification) -> R) -> R {
        f(&self.state.get().current)
    }

    /// Write a full pass result in one signal update and notify subscribers if anything
    /// changed.
    pub(crate) fn commit(&self, size: Size, flags: &[bool], rem: f64) -> Changes {
        let Committed {
            mut current,
            revision,
            ..
        } = self.state.get();
        let mut changes = Changes::empty();
        if current.width != size.width {
            current.width = size.width;
            changes |= Changes::WIDTH;
        }
        if current.height != size.height {
            current.height = size.height;
            changes |= Changes::HEIGHT;
        }
        if current.flags != flags {
            current.flags.copy_from_slice(flags);
            changes |= Changes::FLAGS;
        }
        if current.rem != rem {
            current.rem = rem;
            changes |= Changes::REM;
        }
        if changes.is_empty() {
            return changes;
        }
        self.state.set(Committed {
            current,
            revision: revision + 1,
            changes,
        });
        flush_sync();
        changes
    }
}

impl fmt::Debug for Store {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Store").field(&self.view()).finish()
    }
}
