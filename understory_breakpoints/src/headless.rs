// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! In-memory host for tests, demos, and server-side classification.

use hashbrown::HashMap;
use kurbo::Size;

use crate::document::DocumentSink;
use crate::measure::Measure;

/// A headless page: a [`HeadlessLayout`] to measure and a [`HeadlessRoot`] to mutate.
///
/// The two halves are separate fields so a pass can borrow both at once:
///
/// ```
/// use kurbo::Size;
/// use understory_breakpoints::{BreakpointConfig, Engine, HeadlessDocument, PassKind};
///
/// let config = BreakpointConfig::from_json(r#"{ "wide": { "from": { "width": 800 } } }"#)
///     .unwrap();
/// let mut engine = Engine::new(config);
/// let mut page = HeadlessDocument::new(Size::new(1024.0, 768.0));
/// engine
///     .pass(PassKind::Initial, &mut page.layout, &mut page.root)
///     .unwrap();
/// assert!(page.root.has_class("wide"));
/// ```
#[derive(Clone, Debug, Default)]
pub struct HeadlessDocument {
    /// Measurable boxes.
    pub layout: HeadlessLayout,
    /// Root element state.
    pub root: HeadlessRoot,
}

impl HeadlessDocument {
    /// Create a page with the given viewport and no elements.
    pub fn new(viewport: Size) -> Self {
        Self {
            layout: HeadlessLayout::new(viewport),
            root: HeadlessRoot::default(),
        }
    }
}

/// Viewport plus a flat table of selector-addressed element boxes.
#[derive(Clone, Debug, Default)]
pub struct HeadlessLayout {
    viewport: Size,
    // `None` marks an element that still resolves but can no longer be measured.
    elements: HashMap<String, Option<Size>>,
    queries: u64,
}

impl HeadlessLayout {
    /// Create a layout with the given viewport and no elements.
    pub fn new(viewport: Size) -> Self {
        Self {
            viewport,
            ..Self::default()
        }
    }

    /// Resize the viewport.
    pub fn set_viewport(&mut self, viewport: Size) {
        self.viewport = viewport;
    }

    /// Insert or resize an element.
    pub fn insert_element(&mut self, selector: &str, size: Size) {
        self.elements.insert(selector.to_owned(), Some(size));
    }

    /// Keep an element resolvable but make it fail measurement.
    pub fn detach_element(&mut self, selector: &str) {
        if let Some(size) = self.elements.get_mut(selector) {
            *size = None;
        }
    }

    /// Remove an element entirely.
    pub fn remove_element(&mut self, selector: &str) -> bool {
        self.elements.remove(selector).is_some()
    }

    /// Number of selector queries served.
    pub fn queries(&self) -> u64 {
        self.queries
    }
}

impl Measure for HeadlessLayout {
    type Element = String;

    fn viewport(&mut self) -> Size {
        self.viewport
    }

    fn query(&mut self, selector: &str) -> Option<String> {
        self.queries += 1;
        self.elements
            .contains_key(selector)
            .then(|| selector.to_owned())
    }

    fn measure(&mut self, element: &String) -> Option<Size> {
        self.elements.get(element).copied().flatten()
    }
}

/// Root element: an ordered class list and an optional inline font size.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct HeadlessRoot {
    classes: Vec<String>,
    font_size: Option<f64>,
    mutations: u64,
    removals: u64,
}

impl HeadlessRoot {
    /// Class tokens in insertion order.
    pub fn classes(&self) -> impl Iterator<Item = &str> + '_ {
        self.classes.iter().map(String::as_str)
    }

    /// Returns `true` if `token` is present.
    pub fn has_class(&self, token: &str) -> bool {
        self.classes.iter().any(|class| class == token)
    }

    /// Root font size in pixels, if ever written.
    pub fn root_font_size(&self) -> Option<f64> {
        self.font_size
    }

    /// Total number of sink calls received.
    pub fn mutations(&self) -> u64 {
        self.mutations
    }

    /// Number of class removals received.
    pub fn removals(&self) -> u64 {
        self.removals
    }
}

impl DocumentSink for HeadlessRoot {
    fn add_class(&mut self, token: &str) {
        self.mutations += 1;
        if !self.has_class(token) {
            self.classes.push(token.to_owned());
        }
    }

    fn remove_class(&mut self, token: &str) {
        self.mutations += 1;
        self.removals += 1;
        if let Some(index) = self.classes.iter().position(|class| class == token) {
            self.classes.remove(index);
        }
    }

    fn set_root_font_size(&mut self, px: f64) {
        self.mutations += 1;
        self.font_size = Some(px);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn class_list_behaves_like_a_token_set() {
        let mut root = HeadlessRoot::default();
        root.add_class("a");
        root.add_class("b");
        root.add_class("a");
        assert_eq!(root.classes().collect::<Vec<_>>(), ["a", "b"]);
        root.remove_class("a");
        root.remove_class("missing");
        assert_eq!(root.classes().collect::<Vec<_>>(), ["b"]);
        assert_eq!(root.mutations(), 5);
        assert_eq!(root.removals(), 2);
    }

    #[test]
    fn detached_elements_resolve_but_do_not_measure() {
        let mut layout = HeadlessLayout::new(Size::new(1.0, 2.0));
        layout.insert_element("#a", Size::new(3.0, 4.0));
        let element = layout.query("#a").unwrap();
        assert_eq!(layout.measure(&element), Some(Size::new(3.0, 4.0)));

        layout.detach_element("#a");
        let element = layout.query("#a").unwrap();
        assert_eq!(layout.measure(&element), None);

        assert!(layout.remove_element("#a"));
        assert_eq!(layout.query("#a"), None);
        assert_eq!(layout.queries(), 3);
    }
}
