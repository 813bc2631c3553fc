// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Single-rule evaluation.

use kurbo::Size;
use smallvec::SmallVec;

use crate::rule::Rule;

/// Pixels per unit of derived scale: a ratio of `1.0` yields a `10px` root font size.
pub const REM_UNIT: f64 = 10.0;

/// Outcome of evaluating one rule against one measurement.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Evaluation {
    /// Whether the rule matched.
    pub matched: bool,
    /// Root font size this rule proposes. Only ever set when `matched`.
    pub scale: Option<f64>,
}

impl Evaluation {
    const MISS: Self = Self {
        matched: false,
        scale: None,
    };
}

/// Evaluate `rule` against `size`.
///
/// Checks short-circuit in order: predicate, then `from` (inclusive), then `to`
/// (exclusive). A matching rule proposes its fixed scale if it has one, otherwise the
/// smallest per-axis ratio of `size` to its base size, times its multiplier and
/// [`REM_UNIT`]. Using the smallest ratio keeps the most constrained axis from
/// overflowing.
///
/// ```
/// use kurbo::Size;
/// use understory_breakpoints::{evaluate, Rule, SizeBound};
///
/// let rule = Rule::new()
///     .to(SizeBound::width(768.0))
///     .base_scale(SizeBound::new(375.0, 667.0), 1.0);
///
/// let hit = evaluate(&rule, Size::new(750.0, 667.0));
/// assert!(hit.matched);
/// assert_eq!(hit.scale, Some(10.0)); // min(2.0, 1.0) * 10
///
/// assert!(!evaluate(&rule, Size::new(768.0, 667.0)).matched);
/// ```
pub fn evaluate(rule: &Rule, size: Size) -> Evaluation {
    if rule.predicate.as_ref().is_some_and(|predicate| !predicate(size)) {
        return Evaluation::MISS;
    }
    if rule.from.is_some_and(|from| !from.allows_min(size)) {
        return Evaluation::MISS;
    }
    if rule.to.is_some_and(|to| !to.allows_max(size)) {
        return Evaluation::MISS;
    }

    let scale = match (rule.fixed_scale, rule.base_scale) {
        (Some(px), _) => Some(px),
        (None, Some(base)) => {
            let ratios: SmallVec<[f64; 2]> = base
                .axes(size)
                .map(|(measured, reference)| measured / reference)
                .collect();
            ratios
                .into_iter()
                .reduce(f64::min)
                .map(|ratio| ratio * rule.multiplier * REM_UNIT)
        }
        (None, None) => None,
    };
    Evaluation {
        matched: true,
        scale,
    }
}
