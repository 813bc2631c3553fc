// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

// After you edit the crate's doc comment, run this command, then check README.md for any missing links
// cargo rdme --workspace-project=understory_viewport_events --heading-base-level=0

//! Understory Viewport Events: deterministic helpers for viewport change events.
//!
//! Hosts see two kinds of viewport churn: bursts of resize events while a window is dragged,
//! and orientation changes on handheld devices that settle over several frames. This crate
//! turns both into a small number of well-defined "re-measure now" signals.
//!
//! - [`timer`]: the [`Timers`](timer::Timers) service trait the state machines arm and cancel
//!   timers through, and [`ManualTimers`](timer::ManualTimers), a virtual clock for tests and
//!   headless hosts.
//! - [`throttle`]: [`Throttle`](throttle::Throttle), a trailing-edge rate limiter for resize
//!   events.
//! - [`orientation`]: [`OrientationDebounce`](orientation::OrientationDebounce), which polls
//!   the viewport after an orientation change until it is stable for N consecutive polls or a
//!   deadline passes.
//!
//! None of the state machines read a clock. Time enters only through fired [`TimerId`]s,
//! so behavior is reproducible and tests never sleep.
//!
//! ## Layering
//!
//! This crate knows nothing about breakpoints or documents. It reports *when* to measure and
//! *whether* a measurement differs from the last recorded one; what to do with the
//! measurement is up to the caller (see `understory_adaptive`).
//!
//! ## Features
//!
//! - `std` (default): enables `std` support for dependencies such as `kurbo`.
//! - `libm`: enables `no_std` + `alloc` builds that rely on `libm` for floating-point math.
//!
//! This crate is `no_std` and uses `alloc`.

#![no_std]

extern crate alloc;

pub mod orientation;
pub mod throttle;
pub mod timer;

pub use timer::TimerId;
