/*
SPDX-FileCopyrightText: Copyright 2026 LG Electronics Inc.
SPDX-License-Identifier: MIT
*/

//! Read-only task and node snapshots supplied by the host per invocation.
//!
//! ```text
//! host session ──(TaskInfo, NodeInfo)──►  filter / node_order  ──►  admit? / score
//!                  ↑ borrowed, never mutated
//! ```
//!
//! # Ownership model
//! Snapshots are **owned** by the host.  Every engine entry point takes them by
//! shared reference, so any number of (task, node) pairs can be evaluated
//! concurrently without synchronisation.

use serde::Deserialize;

use crate::resource::ResourceVector;

// ── TaskInfo ──────────────────────────────────────────────────────────────────

/// A unit of work awaiting placement.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct TaskInfo {
    #[serde(default = "default_namespace")]
    pub namespace: String,
    pub name: String,
    /// Requested resource vector.
    #[serde(default)]
    pub resreq: ResourceVector,
}

fn default_namespace() -> String {
    String::from("default")
}

impl TaskInfo {
    pub fn new(namespace: impl Into<String>, name: impl Into<String>, resreq: ResourceVector) -> Self {
        Self {
            namespace: namespace.into(),
            name: name.into(),
            resreq,
        }
    }

    /// `namespace/name`, used in log fields and fit errors.
    pub fn key(&self) -> String {
        format!("{}/{}", self.namespace, self.name)
    }
}

// ── NodeInfo ──────────────────────────────────────────────────────────────────

/// A schedulable node as seen in the current cycle.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NodeInfo {
    pub name: String,
    /// Total resources of the node.
    pub capacity: ResourceVector,
    /// Usable ceiling for workloads (≤ capacity).
    pub allocatable: ResourceVector,
    /// Already allocated to running tasks.
    pub used: ResourceVector,
}

impl NodeInfo {
    /// A node whose allocatable ceiling equals its capacity.
    pub fn new(name: impl Into<String>, capacity: ResourceVector, used: ResourceVector) -> Self {
        Self {
            name: name.into(),
            allocatable: capacity.clone(),
            capacity,
            used,
        }
    }

    pub fn with_allocatable(mut self, allocatable: ResourceVector) -> Self {
        self.allocatable = allocatable;
        self
    }

    /// Resources still free for new tasks: `allocatable - used`.
    pub fn idle(&self) -> ResourceVector {
        self.allocatable.sub(&self.used)
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
