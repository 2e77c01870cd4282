/*
SPDX-FileCopyrightText: Copyright 2026 LG Electronics Inc.
SPDX-License-Identifier: MIT
*/

//! Proportionality admission filter.
//!
//! Keeps companion resources (CPU, memory, ...) reserved in proportion to the
//! scarce resource still idle on a node, so tasks that do not use the scarce
//! resource cannot starve the ones that do.
//!
//! For each configured scarce resource `s` present in the node's idle vector
//! and each companion `c` with factor `f`:
//!
//! ```text
//! idle[c] - requested[c]  >=  idle[s] * f
//! ```
//!
//! Tasks that request any configured scarce resource are exempt: they are the
//! consumers the reservation exists for.

use std::fmt;

use thiserror::Error;
use tracing::{debug, trace};

use crate::config::ProportionalConfig;
use crate::snapshot::{NodeInfo, TaskInfo};

// ── Status ────────────────────────────────────────────────────────────────────

/// Outcome code of a filter check.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StatusCode {
    #[default]
    Success,
    /// Internal failure of the check itself.
    Error,
    /// The node cannot run the task right now.
    Unschedulable,
    /// The node cannot run the task and waiting will not help.
    UnschedulableAndUnresolvable,
    /// The task should wait for something outside this check.
    Wait,
    /// The check does not apply.
    Skip,
}

/// Structured filter result: code plus human-readable reasons.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Status {
    pub code: StatusCode,
    pub reasons: Vec<String>,
}

impl Status {
    pub fn success() -> Self {
        Self::default()
    }

    pub fn new(code: StatusCode, reason: impl Into<String>) -> Self {
        Self {
            code,
            reasons: vec![reason.into()],
        }
    }

    pub fn is_success(&self) -> bool {
        self.code == StatusCode::Success
    }

    /// `true` when the host must reject the node outright instead of treating
    /// the status as advisory.
    pub fn should_abort(&self) -> bool {
        matches!(
            self.code,
            StatusCode::Error
                | StatusCode::Unschedulable
                | StatusCode::UnschedulableAndUnresolvable
        )
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}: {}", self.code, self.reasons.join(", "))
    }
}

// ── Fit error ─────────────────────────────────────────────────────────────────

/// Node rejected for a task by the filter, with every non-success status
/// collected up to and including the aborting one.
#[derive(Debug, Clone, PartialEq, Error)]
#[error("task {task} on node {node} fit failed: {}", format_statuses(.statuses))]
pub struct FitError {
    pub task: String,
    pub node: String,
    pub statuses: Vec<Status>,
}

impl FitError {
    pub fn new(task: &TaskInfo, node: &NodeInfo, statuses: Vec<Status>) -> Self {
        Self {
            task: task.key(),
            node: node.name.clone(),
            statuses,
        }
    }

    /// All reasons, flattened.
    pub fn reasons(&self) -> Vec<&str> {
        self.statuses
            .iter()
            .flat_map(|s| s.reasons.iter().map(String::as_str))
            .collect()
    }
}

fn format_statuses(statuses: &[Status]) -> String {
    statuses
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

// ── Check ─────────────────────────────────────────────────────────────────────

/// Check whether placing `task` keeps `node`'s companion resources in
/// proportion to its idle scarce resources.
pub fn check_node_resource_is_proportional(
    task: &TaskInfo,
    node: &NodeInfo,
    config: &ProportionalConfig,
) -> Status {
    let requested = &task.resreq;

    if let Some(scarce) = config
        .resources
        .keys()
        .find(|scarce| requested.get(scarce) > 0.0)
    {
        trace!(
            task = %task.key(),
            resource = %scarce,
            "task requests scarce resource, proportional check skipped"
        );
        return Status::success();
    }

    let idle = node.idle();

    for (scarce, ratios) in &config.resources {
        if !idle.contains(scarce) {
            continue;
        }
        let scarce_idle = idle.get(scarce);

        for (companion, factor) in ratios {
            let reserved = scarce_idle * factor;
            let remaining = idle.get(companion) - requested.get(companion);
            if remaining < reserved {
                debug!(
                    task = %task.key(),
                    node = %node.name,
                    resource = %scarce,
                    companion = %companion,
                    remaining = remaining,
                    reserved = reserved,
                    "proportional check failed"
                );
                return Status::new(
                    StatusCode::Unschedulable,
                    format!("proportional of resource {scarce} check failed"),
                );
            }
        }
    }

    Status::success()
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::CompanionRatios;
    use crate::resource::{ResourceVector, CPU, MEMORY};

    const GPU: &str = "nvidia.com/gpu";

    fn gpu_config(cpu: f64, memory: f64) -> ProportionalConfig {
        let ratios: CompanionRatios = [(CPU.to_string(), cpu), (MEMORY.to_string(), memory)]
            .into_iter()
            .collect();
        ProportionalConfig {
            resources: [(GPU.to_string(), ratios)].into_iter().collect(),
        }
    }

    /// 8 cpu, 32 memory, 2 gpu; 2 cpu and 4 memory already used.
    fn gpu_node() -> NodeInfo {
        NodeInfo::new(
            "gpu-node",
            ResourceVector::new()
                .with(CPU, 8.0)
                .with(MEMORY, 32.0)
                .with(GPU, 2.0),
            ResourceVector::new().with(CPU, 2.0).with(MEMORY, 4.0),
        )
    }

    fn task(req: ResourceVector) -> TaskInfo {
        TaskInfo::new("default", "t", req)
    }

    #[test]
    fn task_within_proportion_is_admitted() {
        // idle cpu 6, reserved 2 * 2 = 4 → may take 2
        let t = task(ResourceVector::new().with(CPU, 2.0).with(MEMORY, 4.0));
        let status = check_node_resource_is_proportional(&t, &gpu_node(), &gpu_config(2.0, 8.0));
        assert!(status.is_success(), "{status}");
    }

    #[test]
    fn task_eating_reserved_cpu_is_rejected() {
        let t = task(ResourceVector::new().with(CPU, 3.0));
        let status = check_node_resource_is_proportional(&t, &gpu_node(), &gpu_config(2.0, 8.0));
        assert_eq!(status.code, StatusCode::Unschedulable);
        assert!(status.should_abort());
        assert_eq!(
            status.reasons,
            vec![format!("proportional of resource {GPU} check failed")]
        );
    }

    #[test]
    fn task_eating_reserved_memory_is_rejected() {
        // idle memory 28, reserved 2 * 8 = 16 → 13 is too much
        let t = task(ResourceVector::new().with(MEMORY, 13.0));
        let status = check_node_resource_is_proportional(&t, &gpu_node(), &gpu_config(1.0, 8.0));
        assert!(!status.is_success());
    }

    #[test]
    fn scarce_consumer_is_exempt() {
        let t = task(ResourceVector::new().with(CPU, 6.0).with(GPU, 1.0));
        let status = check_node_resource_is_proportional(&t, &gpu_node(), &gpu_config(2.0, 8.0));
        assert!(status.is_success());
    }

    #[test]
    fn node_without_scarce_resource_is_not_checked() {
        let node = NodeInfo::new(
            "cpu-node",
            ResourceVector::new().with(CPU, 4.0),
            ResourceVector::new(),
        );
        let t = task(ResourceVector::new().with(CPU, 4.0));
        let status = check_node_resource_is_proportional(&t, &node, &gpu_config(2.0, 8.0));
        assert!(status.is_success());
    }

    #[test]
    fn advisory_codes_do_not_abort() {
        assert!(!Status::new(StatusCode::Wait, "later").should_abort());
        assert!(!Status::new(StatusCode::Skip, "n/a").should_abort());
        assert!(!Status::success().should_abort());
        assert!(Status::new(StatusCode::Error, "boom").should_abort());
        assert!(Status::new(StatusCode::UnschedulableAndUnresolvable, "x").should_abort());
    }

    #[test]
    fn fit_error_message_lists_reasons() {
        let t = task(ResourceVector::new());
        let err = FitError::new(
            &t,
            &gpu_node(),
            vec![Status::new(StatusCode::Unschedulable, "proportional of resource gpu check failed")],
        );
        assert_eq!(err.reasons(), vec!["proportional of resource gpu check failed"]);
        assert_eq!(
            err.to_string(),
            "task default/t on node gpu-node fit failed: Unschedulable: proportional of resource gpu check failed"
        );
    }
}
