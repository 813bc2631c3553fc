// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

// After you edit the crate's doc comment, run this command, then check README.md for any missing links
// cargo rdme --workspace-project=understory_breakpoints --heading-base-level=0

//! Understory Breakpoints: named, overlapping viewport classification.
//!
//! A configuration is an ordered list of named rules. Each rule measures a source (the
//! viewport or one element), checks an optional predicate, an inclusive lower bound and an
//! exclusive upper bound, and may propose a root font size. Rule names of the form
//! `device:variant` group variants under one device flag: the device is set if *any* of its
//! variants matched.
//!
//! - [`BreakpointConfig`] / [`ConfigBuilder`]: validated, ordered rule sets, from code or JSON.
//! - [`evaluate`]: one rule against one measurement.
//! - [`MeasureCache`]: per-pass memoization over the host's [`Measure`] implementation.
//! - [`Engine`]: atomic classification passes. A pass either commits completely (device
//!   flags, viewport size, root font size, document class tokens) or not at all.
//! - [`StateView`]: read-only, subscribable access to the committed [`Classification`].
//! - [`DocumentSink`]: where class tokens and the root font size are written.
//! - [`HeadlessDocument`]: an in-memory host for tests and headless use.
//!
//! ## Minimal example
//!
//! ```rust
//! use kurbo::Size;
//! use understory_breakpoints::{
//!     BreakpointConfig, Changes, Engine, HeadlessDocument, PassKind,
//! };
//!
//! let config = BreakpointConfig::from_json(r#"{
//!     "phone": { "to": { "width": 600 }, "base": { "width": 375 } },
//!     "desktop": { "from": { "width": 1024 }, "rem": 10 }
//! }"#).unwrap();
//!
//! let mut engine = Engine::new(config);
//! let mut page = HeadlessDocument::new(Size::new(375.0, 812.0));
//! engine.pass(PassKind::Initial, &mut page.layout, &mut page.root).unwrap();
//!
//! let view = engine.view();
//! assert_eq!(view.is("phone"), Some(true));
//! assert_eq!(view.rem(), 10.0);
//! assert_eq!(page.root.classes().collect::<Vec<_>>(), ["phone", "no-desktop"]);
//!
//! // Rotate to a wide window: only the devices that changed are touched.
//! page.layout.set_viewport(Size::new(1280.0, 800.0));
//! let report = engine.pass(PassKind::Update, &mut page.layout, &mut page.root).unwrap();
//! assert!(report.changes.contains(Changes::FLAGS));
//! assert_eq!(page.root.classes().collect::<Vec<_>>(), ["no-phone", "desktop"]);
//! ```
//!
//! ## Root font size
//!
//! Every matching rule with `rem` or `base` proposes a root font size; the last proposal in
//! configuration order wins. A `base` proposal is the smallest ratio of measured size to
//! base size across the axes `base` names, times `k`, times [`REM_UNIT`]. If no rule
//! proposes a size, the previous one is kept and the document is not touched.
//!
//! ## Threading
//!
//! Classification is single-threaded: predicates, views and subscribers are `!Send`.

mod config;
mod document;
mod engine;
mod error;
mod eval;
mod headless;
mod measure;
mod rule;
mod state;

pub use config::{BreakpointConfig, ConfigBuilder, DeviceId, GLOBAL_KEY, GlobalSettings, RuleEntry};
pub use document::{ClassChange, DocumentSink, class_token};
pub use engine::{Engine, PassKind, PassReport};
pub use error::{Error, ErrorKind};
pub use eval::{Evaluation, REM_UNIT, evaluate};
pub use headless::{HeadlessDocument, HeadlessLayout, HeadlessRoot};
pub use measure::{Measure, MeasureCache};
pub use rule::{Predicate, Rule, RuleName, SizeBound, Source};
pub use state::{Changes, Classification, StateView, Subscription};
