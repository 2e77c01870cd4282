/*
SPDX-FileCopyrightText: Copyright 2026 LG Electronics Inc.
SPDX-License-Identifier: MIT
*/

//! Node scoring.
//!
//! * Per-resource scorers ([`most_allocated_score`], [`least_allocated_score`])
//!   map one resource's projected utilisation to `[0, weight]`.
//! * [`strategy_fit_score`] combines them into one normalised node score
//!   under a [`PrimaryConfig`].
//! * [`retention`] layers the scarce resource avoidance term on top.
//!
//! Everything here is a pure function of its arguments.

pub mod error;
pub mod retention;

pub use error::ScoreError;
pub use retention::{missing_scarce_resources, resource_retention_score, retention_score};

use tracing::{debug, trace};

use crate::config::{PrimaryConfig, ScoringStrategy};
use crate::snapshot::{NodeInfo, TaskInfo};

// ── Constants ─────────────────────────────────────────────────────────────────

/// Ceiling of a single normalised score contribution, before plugin weights.
pub const MAX_NODE_SCORE: i64 = 100;

// ── Per-resource scorers ──────────────────────────────────────────────────────

/// Score that grows with post-placement utilisation.
///
/// `(requested + used) * weight / capacity`.  A zero capacity or weight is
/// neutral (`0`), not a failure.
pub fn most_allocated_score(
    resource: &str,
    requested: f64,
    used: f64,
    capacity: f64,
    weight: i64,
) -> Result<f64, ScoreError> {
    let projected = projected_usage(resource, requested, used, capacity, weight)?;
    Ok(projected.map_or(0.0, |p| p * weight as f64 / capacity))
}

/// Score that shrinks with post-placement utilisation.
///
/// `(capacity - requested - used) * weight / capacity`, same guards as
/// [`most_allocated_score`].
pub fn least_allocated_score(
    resource: &str,
    requested: f64,
    used: f64,
    capacity: f64,
    weight: i64,
) -> Result<f64, ScoreError> {
    let projected = projected_usage(resource, requested, used, capacity, weight)?;
    Ok(projected.map_or(0.0, |p| (capacity - p) * weight as f64 / capacity))
}

/// Dispatch on `strategy`.
pub fn resource_score(
    strategy: ScoringStrategy,
    resource: &str,
    requested: f64,
    used: f64,
    capacity: f64,
    weight: i64,
) -> Result<f64, ScoreError> {
    match strategy {
        ScoringStrategy::MostAllocated => {
            most_allocated_score(resource, requested, used, capacity, weight)
        }
        ScoringStrategy::LeastAllocated => {
            least_allocated_score(resource, requested, used, capacity, weight)
        }
    }
}

/// Maximum contribution of a term scaled by `weight`, computed in `f64` so a
/// huge configured weight cannot overflow.
pub(crate) fn weighted_ceiling(weight: i64) -> f64 {
    MAX_NODE_SCORE as f64 * weight as f64
}

/// `Ok(None)` for the neutral case, `Ok(Some(projected))` when scorable.
fn projected_usage(
    resource: &str,
    requested: f64,
    used: f64,
    capacity: f64,
    weight: i64,
) -> Result<Option<f64>, ScoreError> {
    if capacity == 0.0 || weight == 0 {
        return Ok(None);
    }
    let projected = requested + used;
    if projected > capacity {
        return Err(ScoreError::InsufficientResource {
            resource: resource.to_string(),
            requested,
            used,
            capacity,
        });
    }
    Ok(Some(projected))
}

// ── Weighted aggregator ───────────────────────────────────────────────────────

/// Primary strategy score of placing `task` on `node`.
///
/// Only resources both requested by the task and present in
/// `config.resources` take part.  If any of them does not fit, the whole
/// score is `0`.  Otherwise the weighted sum is mapped from `[0, weightSum]`
/// to `[0, MAX_NODE_SCORE * config.weight]`.
pub fn strategy_fit_score(task: &TaskInfo, node: &NodeInfo, config: &PrimaryConfig) -> f64 {
    let requested = &task.resreq;
    let allocatable = &node.allocatable;
    let used = &node.used;

    let mut score = 0.0;
    let mut weight_sum: i64 = 0;

    for resource in requested.resource_names() {
        let Some(rule) = config.resources.get(resource) else {
            continue;
        };

        let request = requested.get(resource);
        let allocate = allocatable.get(resource);
        let node_used = used.get(resource);

        match resource_score(rule.strategy, resource, request, node_used, allocate, rule.weight) {
            Ok(resource_score) => {
                trace!(
                    task = %task.key(),
                    node = %node.name,
                    resource = resource,
                    need = request,
                    used = node_used,
                    allocatable = allocate,
                    weight = rule.weight,
                    score = resource_score,
                    "resource scored"
                );
                score += resource_score;
                weight_sum = weight_sum.saturating_add(rule.weight);
            }
            Err(e) => {
                debug!(
                    task = %task.key(),
                    node = %node.name,
                    resource = resource,
                    "cannot resourceStrategyFit node: {e}"
                );
                return 0.0;
            }
        }
    }

    if weight_sum > 0 {
        score /= weight_sum as f64;
    }
    score * weighted_ceiling(config.weight)
}

// ── Tests ─────────────────────────────────────────────────────────────────────
