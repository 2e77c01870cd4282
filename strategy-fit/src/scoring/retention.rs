/*
SPDX-FileCopyrightText: Copyright 2026 LG Electronics Inc.
SPDX-License-Identifier: MIT
*/

//! Scarce resource retention scoring.
//!
//! Biases generic work away from nodes that still hold designated scarce
//! resources, so those nodes stay available for tasks that need them.
//!
//! | node holds                 | raw score  | normalised term |
//! |----------------------------|------------|-----------------|
//! | none of the scarce set     | 0          | full weight     |
//! | some of the scarce set     | partial    | in between      |
//! | all of the scarce set      | weight sum | 0               |

use std::collections::BTreeMap;

use tracing::{debug, trace, warn};

use super::weighted_ceiling;
use crate::config::RetentionConfig;
use crate::resource::ResourceVector;
use crate::snapshot::{NodeInfo, TaskInfo};

/// Retention contribution of placing `task` on `node`.
///
/// A node that lacks capacity for anything the task requests gets `0`: this
/// policy cannot help it.  Otherwise the raw score is inverted and mapped to
/// `[0, MAX_NODE_SCORE * config.weight]`.
pub fn retention_score(task: &TaskInfo, node: &NodeInfo, config: &RetentionConfig) -> f64 {
    let requested = &task.resreq;
    let capacity = &node.capacity;

    if let Some(missing) = requested.resource_names().find(|r| capacity.get(r) == 0.0) {
        debug!(
            task = %task.key(),
            node = %node.name,
            resource = missing,
            "cannot sra node: node has no capacity for requested resource"
        );
        return 0.0;
    }

    let mut score = resource_retention_score(&config.resources, capacity);
    trace!(
        task = %task.key(),
        node = %node.name,
        raw = score,
        "sra raw score"
    );

    if config.weight_sum > 0 {
        score /= config.weight_sum as f64;
        score = 1.0 - score;
    }
    score * weighted_ceiling(config.weight)
}

/// Sum of the weights of the scarce resources present on a node.
pub fn resource_retention_score(resources: &BTreeMap<String, i64>, capacity: &ResourceVector) -> f64 {
    resources
        .iter()
        .filter(|(resource, _)| capacity.get(resource) > 0.0)
        .map(|(_, weight)| *weight as f64)
        .sum()
}

/// Configured scarce resources that no node in the cycle has capacity for.
///
/// Diagnostic only; meant to be run once per scheduling pass rather than per
/// (task, node) pair.
pub fn missing_scarce_resources<'a>(
    config: &RetentionConfig,
    nodes: impl IntoIterator<Item = &'a NodeInfo>,
) -> Vec<String> {
    let nodes: Vec<&NodeInfo> = nodes.into_iter().collect();

    let missing: Vec<String> = config
        .resources
        .keys()
        .filter(|resource| !nodes.iter().any(|n| n.capacity.get(resource) > 0.0))
        .cloned()
        .collect();

    if !missing.is_empty() {
        warn!(
            "resources [{}] record in sra.resources but not found on any node",
            missing.join(", ")
        );
    }
    missing
}

// ── Tests ─────────────────────────────────────────────────────────────────────
