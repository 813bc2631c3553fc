// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The breakpoint engine: one atomic classification pass over all rules.

use kurbo::Size;
use smallvec::SmallVec;
use tracing::{debug, trace, warn};

use crate::config::{BreakpointConfig, DeviceId};
use crate::document::{ClassChange, DocumentSink};
use crate::error::Error;
use crate::eval::evaluate;
use crate::measure::{Measure, MeasureCache};
use crate::state::{Changes, StateView, Store};

/// Whether a pass is the first one for its document.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum PassKind {
    /// First pass: every device gets its token added, nothing is removed.
    Initial,
    /// Any later pass: only changed devices are touched.
    Update,
}

/// What a successful pass did.
#[derive(Clone, Debug, PartialEq)]
pub struct PassReport {
    /// The kind of pass.
    pub kind: PassKind,
    /// Viewport size the pass measured.
    pub viewport: Size,
    /// Class transitions applied to the document, in device order.
    pub class_changes: SmallVec<[ClassChange; 4]>,
    /// New root font size, if it was written.
    pub rem: Option<f64>,
    /// Fields of the committed state that changed.
    pub changes: Changes,
}

impl PassReport {
    /// Returns `true` if the pass mutated the document.
    pub fn touched_document(&self) -> bool {
        !self.class_changes.is_empty() || self.rem.is_some()
    }
}

/// Runs classification passes and owns the only writable handle to their result.
///
/// A pass works in two phases. First every rule is evaluated in configuration order
/// against measurements from a fresh [`MeasureCache`]; nothing is written. Then, only
/// if every source could be measured, document side effects are applied and the new
/// state is committed in one step. A failed pass leaves both the document and the state
/// exactly as they were.
///
/// ```
/// use kurbo::Size;
/// use understory_breakpoints::{
///     BreakpointConfig, Engine, HeadlessDocument, PassKind,
/// };
///
/// let config = BreakpointConfig::from_json(r#"{
///     "mobile:portrait": { "to": { "width": 450 } },
///     "mobile:landscape": { "to": { "height": 450 } },
///     "desktop": { "from": { "width": 1024 }, "rem": 10 }
/// }"#).unwrap();
///
/// let mut engine = Engine::new(config);
/// let mut page = HeadlessDocument::new(Size::new(800.0, 400.0));
/// engine
///     .pass(PassKind::Initial, &mut page.layout, &mut page.root)
///     .unwrap();
///
/// let view = engine.view();
/// assert_eq!(view.is("mobile"), Some(true)); // landscape variant matched
/// assert_eq!(view.is("desktop"), Some(false));
/// assert!(page.root.has_class("mobile"));
/// assert!(page.root.has_class("no-desktop"));
/// ```
#[derive(Debug)]
pub struct Engine {
    config: BreakpointConfig,
    store: Store,
    passes: u64,
}

impl Engine {
    /// Create an engine with a zeroed state. No pass is run.
    pub fn new(config: BreakpointConfig) -> Self {
        let store = Store::new(config.shared_devices());
        Self {
            config,
            store,
            passes: 0,
        }
    }

    /// The configuration this engine evaluates.
    pub fn config(&self) -> &BreakpointConfig {
        &self.config
    }

    /// A read-only view of the committed state.
    pub fn view(&self) -> StateView {
        self.store.view()
    }

    /// Number of passes that committed.
    pub fn passes(&self) -> u64 {
        self.passes
    }

    /// Run one classification pass.
    pub fn pass<M, D>(
        &mut self,
        kind: PassKind,
        host: &mut M,
        document: &mut D,
    ) -> Result<PassReport, Error>
    where
        M: Measure + ?Sized,
        D: DocumentSink + ?Sized,
    {
        let viewport = host.viewport();
        let (previous, previous_rem) = self
            .store
            .with(|state| (state.flag_slice().to_vec(), state.rem()));

        // Evaluate everything before touching the document or the store.
        let mut next = vec![false; previous.len()];
        let mut rem = previous_rem;
        let mut cache = MeasureCache::new(viewport);
        for entry in self.config.entries() {
            let size = match cache.get(&entry.rule.source, host) {
                Ok(size) => size,
                Err(err) => {
                    warn!(rule = %entry.name, error = %err, "breakpoint pass aborted");
                    return Err(err);
                }
            };
            let evaluation = evaluate(&entry.rule, size);
            // Variants of a device are OR-ed; a later miss never clears an earlier hit.
            next[entry.device.index()] |= evaluation.matched;
            // Last matching rule with a scale wins.
            if let Some(scale) = evaluation.scale {
                rem = scale;
            }
        }

        let class_changes: SmallVec<[ClassChange; 4]> = previous
            .iter()
            .zip(&next)
            .enumerate()
            .filter_map(|(index, (&was, &now))| {
                let device = DeviceId::new(index);
                match kind {
                    PassKind::Initial => Some(ClassChange {
                        device,
                        previous: None,
                        current: now,
                    }),
                    PassKind::Update => (was != now).then_some(ClassChange {
                        device,
                        previous: Some(was),
                        current: now,
                    }),
                }
            })
            .collect();

        for change in &class_changes {
            let name = self.config.device_name(change.device);
            trace!(device = name, previous = ?change.previous, current = change.current, "class");
            change.apply(name, document);
        }
        let rem_written = (rem != previous_rem).then(|| {
            document.set_root_font_size(rem);
            rem
        });
        let changes = self.store.commit(viewport, &next, rem);
        self.passes += 1;

        debug!(
            ?kind,
            width = viewport.width,
            height = viewport.height,
            rem,
            classes = class_changes.len(),
            element_sources = cache.element_count(),
            "breakpoint pass"
        );
        Ok(PassReport {
            kind,
            viewport,
            class_changes,
            rem: rem_written,
            changes,
        })
    }
}
