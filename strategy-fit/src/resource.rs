/*
SPDX-FileCopyrightText: Copyright 2026 LG Electronics Inc.
SPDX-License-Identifier: MIT
*/

//! Named resource quantities.
//!
//! A [`ResourceVector`] maps a resource name (`"cpu"`, `"memory"`, or any
//! extended resource such as `"nvidia.com/gpu"`) to a floating point quantity.
//! Units are whatever the host uses; the engine only ever compares and divides
//! quantities of the same resource.
//!
//! Backed by a `BTreeMap` so iteration is always sorted by name, which keeps
//! scoring and log output deterministic.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

/// Well-known resource name for CPU.
pub const CPU: &str = "cpu";
/// Well-known resource name for memory.
pub const MEMORY: &str = "memory";

/// Mapping from resource name to a non-negative quantity.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ResourceVector {
    quantities: BTreeMap<String, f64>,
}

impl ResourceVector {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert, handy for tests and snapshots.
    pub fn with(mut self, name: impl Into<String>, quantity: f64) -> Self {
        self.set(name, quantity);
        self
    }

    pub fn set(&mut self, name: impl Into<String>, quantity: f64) {
        self.quantities.insert(name.into(), quantity);
    }

    /// Quantity of `name`, `0.0` when the resource is absent.
    pub fn get(&self, name: &str) -> f64 {
        self.quantities.get(name).copied().unwrap_or(0.0)
    }

    /// Returns `true` if `name` is tracked by this vector, even at zero.
    pub fn contains(&self, name: &str) -> bool {
        self.quantities.contains_key(name)
    }

    /// Names of the resources with a positive quantity, sorted.
    ///
    /// Zero entries are skipped: a task "requesting" 0 of a resource does not
    /// request it.
    pub fn resource_names(&self) -> impl Iterator<Item = &str> {
        self.quantities
            .iter()
            .filter(|(_, q)| **q > 0.0)
            .map(|(name, _)| name.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, f64)> {
        self.quantities.iter().map(|(name, q)| (name.as_str(), *q))
    }

    pub fn is_empty(&self) -> bool {
        self.quantities.is_empty()
    }

    /// Element-wise `self - other`.
    ///
    /// Keys present only in `other` appear negated; the result is not clamped
    /// so an over-committed node shows a negative remainder.
    pub fn sub(&self, other: &ResourceVector) -> ResourceVector {
        let mut out = self.clone();
        for (name, q) in other.iter() {
            *out.quantities.entry(name.to_string()).or_insert(0.0) -= q;
        }
        out
    }
}

impl<S: Into<String>> FromIterator<(S, f64)> for ResourceVector {
    fn from_iter<I: IntoIterator<Item = (S, f64)>>(iter: I) -> Self {
        Self {
            quantities: iter.into_iter().map(|(k, v)| (k.into(), v)).collect(),
        }
    }
}

impl fmt::Display for ResourceVector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let parts: Vec<String> = self
            .quantities
            .iter()
            .map(|(name, q)| format!("{name} {q:.2}"))
            .collect();
        write!(f, "{}", parts.join(", "))
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
