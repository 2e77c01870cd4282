/*
SPDX-FileCopyrightText: Copyright 2026 LG Electronics Inc.
SPDX-License-Identifier: MIT
*/

//! Minimal host session: one scheduling pass over a fixed node set.
//!
//! Mirrors what a real scheduler does with the plugin each cycle:
//!
//! 1. `open` – read the [`Registration`] descriptor, run the scarce resource
//!    audit once.
//! 2. `place` – for one task, run the filter (if registered) and the order
//!    function (if registered) over every node and rank the survivors.
//!
//! The session never mutates node snapshots; `place` is a dry run.

use std::cmp::Ordering;

use tracing::{debug, info, warn};

use crate::plugin::{Registration, ResourceStrategyFit};
use crate::snapshot::{NodeInfo, TaskInfo};

/// Score of one admitted node.
#[derive(Debug, Clone, PartialEq)]
pub struct NodeScore {
    pub node: String,
    pub score: f64,
}

/// Ranking of every node for one task.
#[derive(Debug, Clone, PartialEq)]
pub struct Placement {
    pub task: String,
    /// Admitted nodes, best first; ties broken by node name.
    pub ranked: Vec<NodeScore>,
    /// Nodes the filter rejected, with the reason.
    pub rejected: Vec<(String, String)>,
}

impl Placement {
    /// Name of the best admitted node, if any.
    pub fn best(&self) -> Option<&str> {
        self.ranked.first().map(|s| s.node.as_str())
    }
}

/// One scheduling pass with a configured plugin.
pub struct Session<'a> {
    plugin: &'a ResourceStrategyFit,
    nodes: &'a [NodeInfo],
    registration: Registration,
    missing_scarce: Vec<String>,
}

impl<'a> Session<'a> {
    pub fn open(plugin: &'a ResourceStrategyFit, nodes: &'a [NodeInfo]) -> Self {
        let registration = plugin.registration();
        let missing_scarce = plugin.audit_scarce_resources(nodes);

        info!(
            plugin = plugin.name(),
            nodes = nodes.len(),
            filter = registration.filter_enabled,
            order = registration.order_enabled,
            "=== session opened ==="
        );

        Self {
            plugin,
            nodes,
            registration,
            missing_scarce,
        }
    }

    pub fn registration(&self) -> Registration {
        self.registration
    }

    /// Scarce resources found on no node when the session was opened.
    pub fn missing_scarce_resources(&self) -> &[String] {
        &self.missing_scarce
    }

    /// Rank every node for `task`.
    pub fn place(&self, task: &TaskInfo) -> Placement {
        let mut ranked = Vec::with_capacity(self.nodes.len());
        let mut rejected = Vec::new();

        for node in self.nodes {
            if self.registration.filter_enabled {
                if let Err(e) = self.plugin.filter(task, node) {
                    debug!(task = %task.key(), node = %node.name, "✗ filtered: {e}");
                    rejected.push((node.name.clone(), e.reasons().join(", ")));
                    continue;
                }
            }

            let score = if self.registration.order_enabled {
                self.plugin.node_order(task, node)
            } else {
                0.0
            };
            ranked.push(NodeScore {
                node: node.name.clone(),
                score,
            });
        }

        ranked.sort_by(|a, b| {
            b.score
                .partial_cmp(&a.score)
                .unwrap_or(Ordering::Equal)
                .then_with(|| a.node.cmp(&b.node))
        });

        match ranked.first() {
            Some(best) => info!(
                task = %task.key(),
                node = %best.node,
                score = best.score,
                "✓ best node"
            ),
            None => warn!(task = %task.key(), "✗ no node admitted the task"),
        }

        Placement {
            task: task.key(),
            ranked,
            rejected,
        }
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
