// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

// After you edit the crate's doc comment, run this command, then check README.md for any missing links
// cargo rdme --workspace-project=understory_adaptive --heading-base-level=0

//! Understory Adaptive: a responsive breakpoint context.
//!
//! [`Adaptive`] ties together the pieces from the lower crates:
//! - `understory_breakpoints` classifies the document (device flags, class tokens, root
//!   font size) in atomic passes.
//! - `understory_viewport_events` decides *when* to classify: a trailing-edge
//!   [`Throttle`](understory_viewport_events::throttle::Throttle) for resize bursts and an
//!   [`OrientationDebounce`](understory_viewport_events::orientation::OrientationDebounce)
//!   that polls the viewport until it settles after a rotation.
//!
//! The host supplies three collaborators: a [`Measure`](understory_breakpoints::Measure)
//! for layout queries, a [`DocumentSink`](understory_breakpoints::DocumentSink) for root
//! element mutations, and a [`Timers`](understory_viewport_events::timer::Timers) service.
//! It forwards resize and orientation events and hands fired timer ids back.
//!
//! ## Minimal example
//!
//! ```rust
//! use kurbo::Size;
//! use understory_adaptive::{Adaptive, TimerOutcome};
//! use understory_breakpoints::{BreakpointConfig, HeadlessLayout, HeadlessRoot};
//! use understory_viewport_events::timer::ManualTimers;
//!
//! let config = BreakpointConfig::from_json(r#"{
//!     "global": { "throttle": 20 },
//!     "compact": { "to": { "width": 600 } },
//!     "wide": { "from": { "width": 600 } }
//! }"#).unwrap();
//!
//! let mut adaptive = Adaptive::new(
//!     config,
//!     HeadlessLayout::new(Size::new(400.0, 800.0)),
//!     HeadlessRoot::default(),
//!     ManualTimers::new(),
//! ).unwrap();
//! assert_eq!(adaptive.view().is("compact"), Some(true));
//!
//! // A drag produces a burst of resize events; only the first arms a timer.
//! for width in [500.0, 700.0, 900.0] {
//!     adaptive.measure_mut().set_viewport(Size::new(width, 800.0));
//!     adaptive.on_resize();
//! }
//!
//! // When the window closes, one pass runs against the latest size.
//! let id = adaptive.timers_mut().fire_next(u64::MAX).unwrap();
//! assert_eq!(adaptive.timers().now(), 20);
//! let TimerOutcome::Resized(report) = adaptive.on_timer(id).unwrap() else {
//!     unreachable!()
//! };
//! assert_eq!(report.viewport.width, 900.0);
//! assert_eq!(adaptive.view().is("wide"), Some(true));
//! assert!(adaptive.document().has_class("no-compact"));
//! ```
//!
//! ## Orientation changes
//!
//! [`Adaptive::on_orientation_change`] starts polling the viewport every `throttle`
//! milliseconds. A poll that sees a new size runs a pass against it right away; the
//! session ends after `orientationTestCount` consecutive unchanged polls or after
//! `orientationChangeTimeout` milliseconds, whichever comes first. A second orientation
//! change restarts the session.

mod context;

pub use context::{Adaptive, TimerOutcome, ViewportEvent};
