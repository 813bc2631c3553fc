// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Document side effects: root class tokens and root font size.

use std::borrow::Cow;

use crate::config::DeviceId;

/// Host document mutation sink.
///
/// Every device owns exactly one class token on the root element at a time: the device
/// name while its flag is set, `no-<device>` while it is not.
pub trait DocumentSink {
    /// Add a class token to the root element.
    fn add_class(&mut self, token: &str);
    /// Remove a class token from the root element.
    fn remove_class(&mut self, token: &str);
    /// Set the root element's font size in pixels.
    fn set_root_font_size(&mut self, px: f64);
}

/// Class token for a device flag: `device` when set, `no-device` otherwise.
///
/// ```
/// use understory_breakpoints::class_token;
///
/// assert_eq!(class_token("tablet", true), "tablet");
/// assert_eq!(class_token("tablet", false), "no-tablet");
/// ```
pub fn class_token(device: &str, on: bool) -> Cow<'_, str> {
    if on {
        Cow::Borrowed(device)
    } else {
        Cow::Owned(format!("no-{device}"))
    }
}

/// One device's class transition within a pass.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct ClassChange {
    /// The device.
    pub device: DeviceId,
    /// Flag whose token is removed; `None` on the initial pass, where nothing is present yet.
    pub previous: Option<bool>,
    /// Flag whose token is added.
    pub current: bool,
}

impl ClassChange {
    pub(crate) fn apply<D: DocumentSink + ?Sized>(&self, device: &str, document: &mut D) {
        if let Some(previous) = self.previous {
            document.remove_class(&class_token(device, previous));
        }
        document.add_class(&class_token(device, self.current));
    }
}
