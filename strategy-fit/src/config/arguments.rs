/*
SPDX-FileCopyrightText: Copyright 2026 LG Electronics Inc.
SPDX-License-Identifier: MIT
*/

//! Already-decoded plugin argument bag.
//!
//! The host hands every plugin a loosely typed key/value mapping.  Accessors
//! never fail: a missing key or a value of the wrong type simply reads as
//! "absent" so callers can fall back to their defaults.

use std::collections::BTreeMap;

use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_yaml::Value;
use tracing::debug;

/// Key/value arguments for one plugin.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(transparent)]
pub struct Arguments(BTreeMap<String, Value>);

impl Arguments {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse a YAML mapping into an argument bag.
    pub fn from_yaml_str(content: &str) -> Result<Self, serde_yaml::Error> {
        if content.trim().is_empty() {
            return Ok(Self::default());
        }
        // `~` or `null` documents are an empty bag too.
        match serde_yaml::from_str::<Value>(content)? {
            Value::Null => Ok(Self::default()),
            value => serde_yaml::from_value(value),
        }
    }

    pub fn insert(&mut self, key: impl Into<String>, value: Value) {
        self.0.insert(key.into(), value);
    }

    pub fn contains(&self, key: &str) -> bool {
        self.0.contains_key(key)
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Typed lookup with presence flag.
    ///
    /// Returns `None` when the key is absent **or** the value cannot be
    /// decoded as `T`.
    pub fn get<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        let value = self.0.get(key)?;
        match serde_yaml::from_value(value.clone()) {
            Ok(v) => Some(v),
            Err(e) => {
                debug!(key = key, error = %e, "argument has unexpected type, ignoring");
                None
            }
        }
    }

    /// Overwrite `target` with the integer stored under `key`, if any.
    ///
    /// Leaves `target` untouched when the key is missing or not an integer.
    pub fn get_int(&self, target: &mut i64, key: &str) {
        if let Some(v) = self.get::<i64>(key) {
            *target = v;
        }
    }

    /// Overwrite `target` with the number stored under `key`, if any.
    ///
    /// Integers are accepted and widened.
    pub fn get_float(&self, target: &mut f64, key: &str) {
        if let Some(v) = self.0.get(key).and_then(Value::as_f64) {
            *target = v;
        } else if self.0.contains_key(key) {
            debug!(key = key, "argument is not a number, ignoring");
        }
    }

    /// Nested argument bag stored under `key`; empty when absent or not a
    /// mapping.
    pub fn section(&self, key: &str) -> Arguments {
        self.get::<Arguments>(key).unwrap_or_default()
    }
}

impl FromIterator<(String, Value)> for Arguments {
    fn from_iter<I: IntoIterator<Item = (String, Value)>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
