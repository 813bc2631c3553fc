// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Loading and validating breakpoint configuration.
//!
//! Configuration is an ordered mapping from rule names to rule options, plus a reserved
//! `global` entry for timing settings. It can be built in code with [`ConfigBuilder`] or
//! read from a JSON object with [`BreakpointConfig::from_json`]:
//!
//! ```
//! use understory_breakpoints::BreakpointConfig;
//!
//! let config = BreakpointConfig::from_json(r#"{
//!     "global": { "throttle": 30 },
//!     "mobile:portrait": { "to": { "width": 450 }, "base": { "width": 375 } },
//!     "mobile:landscape": { "to": { "height": 450 }, "rem": false },
//!     "desktop": { "from": { "width": 1024 }, "rem": 10 }
//! }"#).unwrap();
//!
//! assert_eq!(config.settings().throttle_ms, 30);
//! assert_eq!(config.settings().orientation_test_count, 50);
//! assert_eq!(config.entries().len(), 3);
//! let devices: Vec<&str> = config.devices().iter().map(|d| &**d).collect();
//! assert_eq!(devices, ["mobile", "desktop"]);
//! ```
//!
//! Recognized rule options, where `false`, `null` and absence all mean "unset":
//!
//! | Key | Meaning |
//! |---|---|
//! | `if` | Only `false` in JSON; attach predicates with [`ConfigBuilder::predicate`]. |
//! | `element` | CSS selector to measure; `"window"` means the viewport. |
//! | `rem` | Fixed root font size in pixels. |
//! | `from` | Inclusive lower bound `{ width?, height? }`. |
//! | `to` | Exclusive upper bound `{ width?, height? }`. |
//! | `base` | Reference size for a derived root font size. |
//! | `k` | Multiplier for the derived root font size (default 1). |
//!
//! Object order is configuration order, and configuration order decides ties.

use core::fmt;
use std::rc::Rc;

use hashbrown::HashMap;
use kurbo::Size;
use serde::Deserialize;
use serde_json::{Map, Value};

use crate::error::Error;
use crate::rule::{Predicate, Rule, RuleName, SizeBound, Source};

/// Name of the reserved settings entry.
pub const GLOBAL_KEY: &str = "global";

/// Process-wide timing settings.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct GlobalSettings {
    /// Resize throttle window and orientation poll period, in milliseconds.
    #[serde(rename = "throttle")]
    pub throttle_ms: u64,
    /// Consecutive unchanged polls after which an orientation change is settled.
    #[serde(rename = "orientationTestCount")]
    pub orientation_test_count: u32,
    /// Upper bound on orientation polling, in milliseconds.
    #[serde(rename = "orientationChangeTimeout")]
    pub orientation_change_timeout_ms: u64,
}

impl Default for GlobalSettings {
    fn default() -> Self {
        Self {
            throttle_ms: 17,
            orientation_test_count: 50,
            orientation_change_timeout_ms: 1000,
        }
    }
}

/// Dense index of a device (the part of a rule name before `:`).
///
/// Ids are assigned in order of first appearance in configuration.
#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct DeviceId(usize);

impl DeviceId {
    pub(crate) const fn new(index: usize) -> Self {
        Self(index)
    }

    /// Position of this device in [`BreakpointConfig::devices`].
    pub const fn index(self) -> usize {
        self.0
    }
}

/// A validated rule together with its parsed name and device.
#[derive(Clone, Debug)]
pub struct RuleEntry {
    /// Parsed rule name.
    pub name: RuleName,
    /// Device this rule classifies.
    pub device: DeviceId,
    /// The rule itself.
    pub rule: Rule,
}

/// Validated, immutable breakpoint configuration.
#[derive(Clone, Debug)]
pub struct BreakpointConfig {
    settings: GlobalSettings,
    entries: Vec<RuleEntry>,
    devices: Rc<[Box<str>]>,
    index: HashMap<Box<str>, DeviceId>,
}

impl BreakpointConfig {
    /// Start building a configuration in code.
    pub fn builder() -> ConfigBuilder {
        ConfigBuilder::new()
    }

    /// Parse and validate a JSON configuration object.
    pub fn from_json(json: &str) -> Result<Self, Error> {
        ConfigBuilder::from_json(json)?.build()
    }

    /// Timing settings.
    pub fn settings(&self) -> &GlobalSettings {
        &self.settings
    }

    /// Rules in configuration order.
    pub fn entries(&self) -> &[RuleEntry] {
        &self.entries
    }

    /// Device names in order of first appearance, indexed by [`DeviceId`].
    pub fn devices(&self) -> &[Box<str>] {
        &self.devices
    }

    /// Look up a device by name.
    pub fn device(&self, name: &str) -> Option<DeviceId> {
        self.index.get(name).copied()
    }

    /// Name of a device.
    ///
    /// # Panics
    ///
    /// Panics if `id` came from a different configuration with more devices.
    pub fn device_name(&self, id: DeviceId) -> &str {
        &self.devices[id.index()]
    }

    pub(crate) fn shared_devices(&self) -> Rc<[Box<str>]> {
        Rc::clone(&self.devices)
    }
}

/// Builder for [`BreakpointConfig`].
///
/// Rules keep the order they are added in. Nothing is validated until
/// [`build`](Self::build).
///
/// ```
/// use understory_breakpoints::{ConfigBuilder, Rule, SizeBound};
///
/// let config = ConfigBuilder::new()
///     .rule("mobile", Rule::new().to(SizeBound::width(768.0)))
///     .rule("desktop", Rule::new().from(SizeBound::width(768.0)))
///     .predicate("mobile", |size| size.height > 0.0)
///     .build()
///     .unwrap();
/// assert!(config.entries()[0].rule.predicate.is_some());
/// ```
#[derive(Default)]
pub struct ConfigBuilder {
    settings: GlobalSettings,
    rules: Vec<(String, Rule)>,
    predicates: Vec<(String, Predicate)>,
}

impl ConfigBuilder {
    /// An empty builder with default settings.
    pub fn new() -> Self {
        Self::default()
    }

    /// Read rules and settings from a JSON object.
    ///
    /// The result can be extended with more rules or predicates before building.
    pub fn from_json(json: &str) -> Result<Self, Error> {
        let document: Map<String, Value> =
            serde_json::from_str(json).map_err(|e| Error::Json(e.to_string()))?;
        let mut builder = Self::new();
        for (name, value) in document {
            if name == GLOBAL_KEY {
                builder.settings = parse_settings(value)?;
                continue;
            }
            let options: RuleOptions =
                serde_json::from_value(value).map_err(|e| Error::malformed(&name, e.to_string()))?;
            let rule = options.into_rule(&name)?;
            builder.rules.push((name, rule));
        }
        Ok(builder)
    }

    /// Replace the timing settings.
    #[must_use]
    pub fn settings(mut self, settings: GlobalSettings) -> Self {
        self.settings = settings;
        self
    }

    /// Append a rule.
    #[must_use]
    pub fn rule(mut self, name: impl Into<String>, rule: Rule) -> Self {
        self.rules.push((name.into(), rule));
        self
    }

    /// Attach a predicate to the rule with the given full name.
    ///
    /// The rule may be added before or after this call; it must exist by
    /// [`build`](Self::build).
    #[must_use]
    pub fn predicate(
        mut self,
        rule: impl Into<String>,
        predicate: impl Fn(Size) -> bool + 'static,
    ) -> Self {
        self.predicates.push((rule.into(), Rc::new(predicate)));
        self
    }

    /// Validate everything and produce the configuration.
    pub fn build(self) -> Result<BreakpointConfig, Error> {
        validate_settings(&self.settings)?;

        let mut entries: Vec<RuleEntry> = Vec::with_capacity(self.rules.len());
        let mut devices: Vec<Box<str>> = Vec::new();
        let mut index: HashMap<Box<str>, DeviceId> = HashMap::new();

        for (name, rule) in self.rules {
            if name == GLOBAL_KEY {
                return Err(Error::malformed(&name, "the name is reserved for settings"));
            }
            let parsed = RuleName::parse(&name);
            if parsed.device().is_empty() {
                return Err(Error::malformed(&name, "empty device name"));
            }
            if parsed.device().chars().any(char::is_whitespace) {
                return Err(Error::malformed(&name, "device names cannot contain whitespace"));
            }
            if entries.iter().any(|e| e.name == parsed) {
                return Err(Error::malformed(&name, "duplicate rule name"));
            }
            validate_rule(&name, &rule)?;

            let device = match index.get(parsed.device()) {
                Some(&id) => id,
                None => {
                    if let Some(other) = negated_token_clash(&index, parsed.device()) {
                        return Err(Error::malformed(
                            &name,
                            format!("class tokens collide with device `{other}`"),
                        ));
                    }
                    let id = DeviceId(devices.len());
                    devices.push(parsed.device().into());
                    index.insert(parsed.device().into(), id);
                    id
                }
            };
            entries.push(RuleEntry {
                name: parsed,
                device,
                rule,
            });
        }

        for (name, predicate) in self.predicates {
            let entry = entries
                .iter_mut()
                .find(|e| e.name.as_str() == name)
                .ok_or_else(|| Error::malformed(&name, "predicate attached to an unknown rule"))?;
            entry.rule.predicate = Some(predicate);
        }

        Ok(BreakpointConfig {
            settings: self.settings,
            entries,
            devices: devices.into(),
            index,
        })
    }
}

impl fmt::Debug for ConfigBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConfigBuilder")
            .field("settings", &self.settings)
            .field("rules", &self.rules)
            .field("predicates", &self.predicates.len())
            .finish()
    }
}

fn parse_settings(value: Value) -> Result<GlobalSettings, Error> {
    match value {
        Value::Null | Value::Bool(false) => Ok(GlobalSettings::default()),
        value => serde_json::from_value(value).map_err(|e| Error::InvalidSettings {
            reason: e.to_string(),
        }),
    }
}

/// Another device whose class tokens overlap with `device`'s: `x` and `no-x` both
/// write `no-x` to the document.
fn negated_token_clash(index: &HashMap<Box<str>, DeviceId>, device: &str) -> Option<String> {
    let negated = format!("no-{device}");
    if index.contains_key(negated.as_str()) {
        return Some(negated);
    }
    device
        .strip_prefix("no-")
        .filter(|plain| index.contains_key(*plain))
        .map(String::from)
}

fn validate_settings(settings: &GlobalSettings) -> Result<(), Error> {
    if settings.throttle_ms == 0 {
        return Err(Error::InvalidSettings {
            reason: "`throttle` must be at least 1ms".into(),
        });
    }
    if settings.orientation_test_count == 0 {
        return Err(Error::InvalidSettings {
            reason: "`orientationTestCount` must be at least 1".into(),
        });
    }
    Ok(())
}

fn validate_rule(name: &str, rule: &Rule) -> Result<(), Error> {
    if let Some(bound) = &rule.from {
        check_bound(name, "from", bound, false)?;
    }
    if let Some(bound) = &rule.to {
        check_bound(name, "to", bound, false)?;
    }
    if let Some(base) = &rule.base_scale {
        if base.is_empty() {
            return Err(Error::malformed(name, "`base` needs a width or a height"));
        }
        check_bound(name, "base", base, true)?;
    }
    if let Some(px) = rule.fixed_scale {
        if !(px.is_finite() && px > 0.0) {
            return Err(Error::malformed(name, "`rem` must be a positive number"));
        }
    }
    if !(rule.multiplier.is_finite() && rule.multiplier > 0.0) {
        return Err(Error::malformed(name, "`k` must be a positive number"));
    }
    if let Source::Element(selector) = &rule.source {
        if selector.trim().is_empty() {
            return Err(Error::malformed(name, "`element` must be a non-empty selector"));
        }
    }
    Ok(())
}

fn check_bound(name: &str, key: &str, bound: &SizeBound, positive: bool) -> Result<(), Error> {
    for value in [bound.width, bound.height].into_iter().flatten() {
        let ok = value.is_finite() && if positive { value > 0.0 } else { value >= 0.0 };
        if !ok {
            let expected = if positive { "positive" } else { "non-negative" };
            return Err(Error::malformed(
                name,
                format!("`{key}` axes must be {expected} numbers"),
            ));
        }
    }
    Ok(())
}

/// `false` or a value.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum OrFalse<T> {
    Flag(bool),
    Value(T),
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
struct RuleOptions {
    #[serde(rename = "if")]
    predicate: Option<bool>,
    element: Option<OrFalse<String>>,
    rem: Option<OrFalse<f64>>,
    from: Option<OrFalse<SizeBound>>,
    to: Option<OrFalse<SizeBound>>,
    base: Option<OrFalse<SizeBound>>,
    k: Option<f64>,
}

impl RuleOptions {
    fn into_rule(self, name: &str) -> Result<Rule, Error> {
        if self.predicate == Some(true) {
            return Err(Error::malformed(
                name,
                "`if` can only be `false` in JSON; attach predicates in code",
            ));
        }
        let source = match unset_or(name, "element", self.element)? {
            None => Source::Viewport,
            Some(selector) if selector == "window" => Source::Viewport,
            Some(selector) => Source::Element(selector.into()),
        };
        Ok(Rule {
            predicate: None,
            from: unset_or(name, "from", self.from)?,
            to: unset_or(name, "to", self.to)?,
            source,
            fixed_scale: unset_or(name, "rem", self.rem)?,
            base_scale: unset_or(name, "base", self.base)?,
            multiplier: self.k.unwrap_or(1.0),
        })
    }
}

fn unset_or<T>(name: &str, key: &str, option: Option<OrFalse<T>>) -> Result<Option<T>, Error> {
    match option {
        None | Some(OrFalse::Flag(false)) => Ok(None),
        Some(OrFalse::Flag(true)) => Err(Error::malformed(
            name,
            format!("`{key}` cannot be `true`; use `false` or a value"),
        )),
        Some(OrFalse::Value(value)) => Ok(Some(value)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rule_error(json: &str) -> String {
        match BreakpointConfig::from_json(json) {
            Err(Error::MalformedRule { reason, .. }) => reason,
            other => panic!("expected a malformed rule, got {other:?}"),
        }
    }

    #[test]
    fn document_order_is_configuration_order() {
        let config = BreakpointConfig::from_json(
            r#"{ "zeta": {}, "alpha:b": {}, "mid": {}, "alpha:a": {} }"#,
        )
        .unwrap();
        let names: Vec<&str> = config.entries().iter().map(|e| e.name.as_str()).collect();
        assert_eq!(names, ["zeta", "alpha:b", "mid", "alpha:a"]);
        let devices: Vec<&str> = config.devices().iter().map(|d| &**d).collect();
        assert_eq!(devices, ["zeta", "alpha", "mid"]);
        assert_eq!(config.entries()[1].device, config.entries()[3].device);
        assert_eq!(config.device("alpha").map(DeviceId::index), Some(1));
        assert_eq!(config.device_name(config.entries()[3].device), "alpha");
    }

    #[test]
    fn false_and_null_mean_unset() {
        let config = BreakpointConfig::from_json(
            r#"{ "any": { "if": false, "element": false, "rem": null, "from": false, "to": null, "base": false } }"#,
        )
        .unwrap();
        let rule = &config.entries()[0].rule;
        assert!(rule.predicate.is_none());
        assert_eq!(rule.source, Source::Viewport);
        assert_eq!(rule.fixed_scale, None);
        assert_eq!(rule.from, None);
        assert_eq!(rule.to, None);
        assert_eq!(rule.base_scale, None);
        assert_eq!(rule.multiplier, 1.0);
    }

    #[test]
    fn options_are_read() {
        let config = BreakpointConfig::from_json(
            r##"{ "panel": { "element": "#side", "from": { "width": 200 }, "to": { "width": 400, "height": 900 }, "base": { "height": 600 }, "k": 1.5, "rem": 12 } }"##,
        )
        .unwrap();
        let rule = &config.entries()[0].rule;
        assert_eq!(rule.source, Source::Element("#side".into()));
        assert_eq!(rule.from, Some(SizeBound::width(200.0)));
        assert_eq!(rule.to, Some(SizeBound::new(400.0, 900.0)));
        assert_eq!(rule.base_scale, Some(SizeBound::height(600.0)));
        assert_eq!(rule.multiplier, 1.5);
        assert_eq!(rule.fixed_scale, Some(12.0));
    }

    #[test]
    fn window_element_is_the_viewport() {
        let config = BreakpointConfig::from_json(r#"{ "a": { "element": "window" } }"#).unwrap();
        assert_eq!(config.entries()[0].rule.source, Source::Viewport);
    }

    #[test]
    fn global_settings_merge_with_defaults() {
        let config = BreakpointConfig::from_json(
            r#"{ "global": { "orientationTestCount": 10 }, "a": {} }"#,
        )
        .unwrap();
        assert_eq!(
            *config.settings(),
            GlobalSettings {
                throttle_ms: 17,
                orientation_test_count: 10,
                orientation_change_timeout_ms: 1000,
            }
        );
        assert_eq!(config.entries().len(), 1);
    }

    #[test]
    fn invalid_settings_are_rejected() {
        assert!(matches!(
            BreakpointConfig::from_json(r#"{ "global": { "throttle": 0 } }"#),
            Err(Error::InvalidSettings { .. })
        ));
        assert!(matches!(
            BreakpointConfig::from_json(r#"{ "global": { "throttle": "fast" } }"#),
            Err(Error::InvalidSettings { .. })
        ));
        assert!(matches!(
            BreakpointConfig::from_json(r#"{ "global": { "orientationTestCount": 0 } }"#),
            Err(Error::InvalidSettings { .. })
        ));
    }

    #[test]
    fn true_where_false_is_expected_is_rejected() {
        assert!(rule_error(r#"{ "a": { "if": true } }"#).contains("`if`"));
        assert!(rule_error(r#"{ "a": { "rem": true } }"#).contains("`rem`"));
        assert!(rule_error(r#"{ "a": { "from": true } }"#).contains("`from`"));
    }

    #[test]
    fn unknown_keys_are_rejected() {
        rule_error(r#"{ "a": { "form": { "width": 10 } } }"#);
        rule_error(r#"{ "a": { "from": { "widht": 10 } } }"#);
    }

    #[test]
    fn bad_values_are_rejected() {
        assert!(rule_error(r#"{ "a": { "base": {} } }"#).contains("`base`"));
        assert!(rule_error(r#"{ "a": { "base": { "width": 0 } } }"#).contains("`base`"));
        assert!(rule_error(r#"{ "a": { "from": { "width": -1 } } }"#).contains("`from`"));
        assert!(rule_error(r#"{ "a": { "rem": 0 } }"#).contains("`rem`"));
        assert!(rule_error(r#"{ "a": { "k": 0 } }"#).contains("`k`"));
        assert!(rule_error(r#"{ "a": { "element": " " } }"#).contains("`element`"));
        assert!(rule_error(r#"{ ":landscape": {} }"#).contains("empty device"));
    }

    #[test]
    fn non_object_documents_are_rejected() {
        assert!(matches!(
            BreakpointConfig::from_json("[1, 2]"),
            Err(Error::Json(_))
        ));
        assert!(matches!(
            BreakpointConfig::from_json("{ nope"),
            Err(Error::Json(_))
        ));
    }

    #[test]
    fn builder_rejects_duplicates_and_reserved_names() {
        let dup = ConfigBuilder::new()
            .rule("a:x", Rule::new())
            .rule("a:x", Rule::new())
            .build();
        assert!(matches!(dup, Err(Error::MalformedRule { .. })));

        let reserved = ConfigBuilder::new().rule(GLOBAL_KEY, Rule::new()).build();
        assert!(matches!(reserved, Err(Error::MalformedRule { .. })));
    }

    #[test]
    fn device_names_must_be_valid_class_tokens() {
        assert_eq!(
            rule_error(r#"{ "big screen": {} }"#),
            "device names cannot contain whitespace"
        );
        assert_eq!(
            rule_error(r#"{ "tab\tlet:a": {} }"#),
            "device names cannot contain whitespace"
        );
        // Whitespace in the variant tag never reaches the document.
        assert!(BreakpointConfig::from_json(r#"{ "tablet:wide ish": {} }"#).is_ok());
    }

    #[test]
    fn negated_tokens_cannot_collide() {
        assert_eq!(
            rule_error(r#"{ "x": {}, "no-x": {} }"#),
            "class tokens collide with device `x`"
        );
        assert_eq!(
            rule_error(r#"{ "no-x:a": {}, "x:b": {} }"#),
            "class tokens collide with device `no-x`"
        );
        match BreakpointConfig::from_json(r#"{ "x": {}, "no-x": {} }"#) {
            Err(Error::MalformedRule { rule, .. }) => assert_eq!(rule, "no-x"),
            other => panic!("expected a malformed rule, got {other:?}"),
        }
        // `no-x` alone, or next to an unrelated device, is fine.
        assert!(BreakpointConfig::from_json(r#"{ "no-x": {}, "y": {} }"#).is_ok());
    }

    #[test]
    fn predicates_attach_by_full_name() {
        let config = ConfigBuilder::from_json(r#"{ "mobile:portrait": {}, "mobile:landscape": {} }"#)
            .unwrap()
            .predicate("mobile:landscape", |size| size.width > size.height)
            .build()
            .unwrap();
        assert!(config.entries()[0].rule.predicate.is_none());
        let predicate = config.entries()[1].rule.predicate.as_ref().unwrap();
        assert!(predicate(Size::new(2.0, 1.0)));
        assert!(!predicate(Size::new(1.0, 2.0)));

        let unknown = ConfigBuilder::new()
            .rule("a", Rule::new())
            .predicate("b", |_| true)
            .build();
        assert!(matches!(unknown, Err(Error::MalformedRule { rule, .. }) if rule == "b"));
    }

    #[test]
    fn empty_configuration_is_valid() {
        let config = BreakpointConfig::from_json("{}").unwrap();
        assert!(config.entries().is_empty());
        assert!(config.devices().is_empty());
        assert_eq!(*config.settings(), GlobalSettings::default());
    }
}
