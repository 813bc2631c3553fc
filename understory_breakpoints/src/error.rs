// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Error type shared by configuration loading and classification passes.

/// Broad class of an [`Error`].
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// The configuration cannot work against this document.
    Configuration,
    /// A source resolved but could not be measured.
    Measurement,
}

/// Errors produced while loading rules or running a pass.
///
/// All variants are fatal for the operation that produced them. A failed pass commits
/// nothing, and nothing is retried: a selector that is missing now will still be missing
/// later in the same turn of the event loop.
#[derive(Clone, Debug, PartialEq, thiserror::Error)]
pub enum Error {
    /// A rule was rejected at load time.
    #[error("rule `{rule}` is malformed: {reason}")]
    MalformedRule {
        /// Full rule name, including any `:variant` suffix.
        rule: String,
        /// What was wrong with it.
        reason: String,
    },
    /// The reserved `global` entry was rejected at load time.
    #[error("invalid global settings: {reason}")]
    InvalidSettings {
        /// What was wrong with it.
        reason: String,
    },
    /// The configuration document is not a JSON object.
    #[error("configuration is not a valid JSON object: {0}")]
    Json(String),
    /// No element matches a rule's selector.
    #[error("no element matches selector `{selector}`")]
    UnresolvedSource {
        /// The selector that failed to resolve.
        selector: String,
    },
    /// An element was found but could not be measured (for example it was detached).
    #[error("element `{selector}` could not be measured")]
    DetachedSource {
        /// The selector the element was resolved from.
        selector: String,
    },
}

impl Error {
    /// Classify this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::DetachedSource { .. } => ErrorKind::Measurement,
            Self::MalformedRule { .. }
            | Self::InvalidSettings { .. }
            | Self::Json(_)
            | Self::UnresolvedSource { .. } => ErrorKind::Configuration,
        }
    }

    pub(crate) fn malformed(rule: &str, reason: impl Into<String>) -> Self {
        Self::MalformedRule {
            rule: rule.to_owned(),
            reason: reason.into(),
        }
    }
}
