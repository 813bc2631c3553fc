// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Breakpoint rules: names, bounds, measurement sources, and scale options.

use core::fmt;
use std::rc::Rc;

use kurbo::Size;
use serde::Deserialize;

/// Custom gate evaluated against the rule's measurement.
pub type Predicate = Rc<dyn Fn(Size) -> bool>;

/// A size bound where each axis is optional.
///
/// An absent axis never constrains. The same type is used for inclusive lower bounds
/// (`from`), exclusive upper bounds (`to`), and base sizes for scale derivation.
#[derive(Copy, Clone, Debug, Default, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SizeBound {
    /// Width bound, if any.
    pub width: Option<f64>,
    /// Height bound, if any.
    pub height: Option<f64>,
}

impl SizeBound {
    /// A bound on both axes.
    pub const fn new(width: f64, height: f64) -> Self {
        Self {
            width: Some(width),
            height: Some(height),
        }
    }

    /// A bound on width only.
    pub const fn width(width: f64) -> Self {
        Self {
            width: Some(width),
            height: None,
        }
    }

    /// A bound on height only.
    pub const fn height(height: f64) -> Self {
        Self {
            width: None,
            height: Some(height),
        }
    }

    /// Returns `true` if neither axis is set.
    pub fn is_empty(&self) -> bool {
        self.width.is_none() && self.height.is_none()
    }

    /// Inclusive lower-bound test: every present axis is `<=` the measured one.
    pub fn allows_min(&self, size: Size) -> bool {
        self.width.is_none_or(|w| size.width >= w) && self.height.is_none_or(|h| size.height >= h)
    }

    /// Exclusive upper-bound test: every present axis is `>` the measured one.
    pub fn allows_max(&self, size: Size) -> bool {
        self.width.is_none_or(|w| size.width < w) && self.height.is_none_or(|h| size.height < h)
    }

    /// Iterate `(measured, bound)` pairs for the axes that are present.
    pub(crate) fn axes(&self, size: Size) -> impl Iterator<Item = (f64, f64)> {
        [(size.width, self.width), (size.height, self.height)]
            .into_iter()
            .filter_map(|(measured, bound)| bound.map(|b| (measured, b)))
    }
}

/// What a rule measures.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash)]
pub enum Source {
    /// The viewport (root element box).
    #[default]
    Viewport,
    /// The first element matching a CSS selector.
    Element(Box<str>),
}

impl Source {
    /// Selector of an element source.
    pub fn selector(&self) -> Option<&str> {
        match self {
            Self::Viewport => None,
            Self::Element(selector) => Some(selector),
        }
    }
}

/// A rule name split into its device key and optional variant tag.
///
/// `"mobile:portrait"` has device `"mobile"` and variant `"portrait"`. Only the text
/// before the first `:` is the device; everything after it is the variant.
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct RuleName {
    full: Box<str>,
    split: usize,
}

impl RuleName {
    /// Parse a rule name.
    pub fn parse(name: &str) -> Self {
        let split = name.find(':').unwrap_or(name.len());
        Self {
            full: name.into(),
            split,
        }
    }

    /// The full name as written in configuration.
    pub fn as_str(&self) -> &str {
        &self.full
    }

    /// The classification key.
    pub fn device(&self) -> &str {
        &self.full[..self.split]
    }

    /// The variant tag, if the name had a `:`.
    pub fn variant(&self) -> Option<&str> {
        (self.split < self.full.len()).then(|| &self.full[self.split + 1..])
    }
}

impl fmt::Debug for RuleName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(&*self.full, f)
    }
}

impl fmt::Display for RuleName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.full)
    }
}

/// A single breakpoint rule.
///
/// A rule matches when its predicate (if any) passes, the measurement is at least `from`
/// and strictly below `to`. When it matches it may also propose a root font size:
/// `fixed_scale` wins over `base_scale`.
///
/// ```
/// use understory_breakpoints::{Rule, SizeBound};
///
/// let tablet = Rule::new()
///     .from(SizeBound::width(768.0))
///     .to(SizeBound::width(1024.0))
///     .base_scale(SizeBound::width(768.0), 1.0);
/// assert!(tablet.fixed_scale.is_none());
/// ```
#[derive(Clone)]
pub struct Rule {
    /// Custom gate.
    pub predicate: Option<Predicate>,
    /// Inclusive lower bound.
    pub from: Option<SizeBound>,
    /// Exclusive upper bound.
    pub to: Option<SizeBound>,
    /// What to measure.
    pub source: Source,
    /// Root font size in pixels to force when matched.
    pub fixed_scale: Option<f64>,
    /// Reference size for a derived root font size.
    pub base_scale: Option<SizeBound>,
    /// Multiplier applied to a derived root font size.
    pub multiplier: f64,
}

impl Rule {
    /// An unconstrained rule measuring the viewport. It always matches.
    pub fn new() -> Self {
        Self {
            predicate: None,
            from: None,
            to: None,
            source: Source::Viewport,
            fixed_scale: None,
            base_scale: None,
            multiplier: 1.0,
        }
    }

    /// Set the inclusive lower bound.
    #[must_use]
    pub fn from(mut self, bound: SizeBound) -> Self {
        self.from = Some(bound);
        self
    }

    /// Set the exclusive upper bound.
    #[must_use]
    pub fn to(mut self, bound: SizeBound) -> Self {
        self.to = Some(bound);
        self
    }

    /// Measure the first element matching `selector` instead of the viewport.
    #[must_use]
    pub fn element(mut self, selector: &str) -> Self {
        self.source = Source::Element(selector.into());
        self
    }

    /// Force the root font size to `px` when matched.
    #[must_use]
    pub fn fixed_scale(mut self, px: f64) -> Self {
        self.fixed_scale = Some(px);
        self
    }

    /// Derive the root font size from the measurement relative to `base`.
    #[must_use]
    pub fn base_scale(mut self, base: SizeBound, multiplier: f64) -> Self {
        self.base_scale = Some(base);
        self.multiplier = multiplier;
        self
    }

    /// Gate the rule on a custom predicate.
    #[must_use]
    pub fn when(mut self, predicate: impl Fn(Size) -> bool + 'static) -> Self {
        self.predicate = Some(Rc::new(predicate));
        self
    }
}

impl Default for Rule {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for Rule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Rule")
            .field("predicate", &self.predicate.as_ref().map(|_| "Fn(Size) -> bool"))
            .field("from", &self.from)
            .field("to", &self.to)
            .field("source", &self.source)
            .field("fixed_scale", &self.fixed_scale)
            .field("base_scale", &self.base_scale)
            .field("multiplier", &self.multiplier)
            .finish()
    }
}
