// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Box measurement: the host-facing [`Measure`] trait and the per-pass [`MeasureCache`].

use hashbrown::HashMap;
use kurbo::Size;

use crate::error::Error;
use crate::rule::Source;

/// Host layout measurement.
///
/// Implementations wrap whatever the host uses for layout queries (a DOM, a retained
/// widget tree, a test fixture). Methods take `&mut self` so implementations can keep
/// their own bookkeeping without interior mutability.
pub trait Measure {
    /// Handle for a resolved element.
    type Element;

    /// Current viewport (root element) box size.
    fn viewport(&mut self) -> Size;

    /// Resolve the first element matching `selector`, or `None` if nothing matches.
    fn query(&mut self, selector: &str) -> Option<Self::Element>;

    /// Measure a resolved element's box, or `None` if it can no longer be measured.
    fn measure(&mut self, element: &Self::Element) -> Option<Size>;
}

/// Read-through cache of source sizes for a single pass.
///
/// The viewport is seeded on creation. Each selector is resolved and measured at most
/// once per cache; rules sharing a source share the measurement.
#[derive(Clone, Debug)]
pub struct MeasureCache<'a> {
    viewport: Size,
    elements: HashMap<&'a str, Size>,
}

impl<'a> MeasureCache<'a> {
    /// Create a cache seeded with the viewport size.
    pub fn new(viewport: Size) -> Self {
        Self {
            viewport,
            elements: HashMap::new(),
        }
    }

    /// The seeded viewport size.
    pub fn viewport(&self) -> Size {
        self.viewport
    }

    /// Number of element sources measured so far.
    pub fn element_count(&self) -> usize {
        self.elements.len()
    }

    /// Size of `source`, measuring through `host` on first use.
    pub fn get<M: Measure + ?Sized>(
        &mut self,
        source: &'a Source,
        host: &mut M,
    ) -> Result<Size, Error> {
        let selector = match source {
            Source::Viewport => return Ok(self.viewport),
            Source::Element(selector) => &**selector,
        };
        if let Some(size) = self.elements.get(selector) {
            return Ok(*size);
        }
        let element = host.query(selector).ok_or_else(|| Error::UnresolvedSource {
            selector: selector.to_owned(),
        })?;
        let size = host
            .measure(&element)
            .ok_or_else(|| Error::DetachedSource {
                selector: selector.to_owned(),
            })?;
        self.elements.insert(selector, size);
        Ok(size)
    }
}
