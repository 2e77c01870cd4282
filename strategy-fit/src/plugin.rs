/*
SPDX-FileCopyrightText: Copyright 2026 LG Electronics Inc.
SPDX-License-Identifier: MIT
*/

//! The resource-strategy-fit plugin façade.
//!
//! [`ResourceStrategyFit`] is built once per scheduler session from the
//! plugin's [`Arguments`] and then only read.  It exposes the two callbacks
//! the host invokes per (task, node) pair:
//!
//! * [`filter`](ResourceStrategyFit::filter) – proportionality admission,
//!   active only under the proportional policy.
//! * [`node_order`](ResourceStrategyFit::node_order) – primary strategy score
//!   plus the retention term when that policy is active.
//!
//! Instead of registering itself with the session, the plugin reports which
//! callbacks are worth registering through [`Registration`]; the host decides.
//!
//! # Design decisions
//!
//! | Topic | Choice |
//! |---|---|
//! | Policy dispatch | Closed [`SecondaryPolicy`] enum resolved at construction |
//! | Registration | Returned as data, no callbacks into the session |
//! | Scarce resource audit | Separate call, once per pass, off the hot path |
//! | Thread safety | `Send + Sync`, no interior mutability |

use tracing::{debug, info, trace};

use crate::config::{resolve, Arguments, PrimaryConfig, SecondaryPolicy};
use crate::proportional::{check_node_resource_is_proportional, FitError};
use crate::scoring::{missing_scarce_resources, retention_score, strategy_fit_score};
use crate::snapshot::{NodeInfo, TaskInfo};

/// Name used for registration and log correlation.
pub const PLUGIN_NAME: &str = "resource-strategy-fit";

/// Which callbacks the host should register for this session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Registration {
    pub filter_enabled: bool,
    pub order_enabled: bool,
}

/// Node ranking and admission filtering driven by per-resource strategies.
#[derive(Debug, Clone)]
pub struct ResourceStrategyFit {
    primary: PrimaryConfig,
    secondary: SecondaryPolicy,
}

impl ResourceStrategyFit {
    /// Resolve `args` into an immutable plugin instance.  Never fails.
    pub fn new(args: &Arguments) -> Self {
        let (primary, secondary) = resolve(args);
        info!(
            plugin = PLUGIN_NAME,
            config = %primary,
            sra_policy = secondary.name(),
            "plugin configured"
        );
        Self { primary, secondary }
    }

    /// Build directly from resolved configuration.
    pub fn from_config(primary: PrimaryConfig, secondary: SecondaryPolicy) -> Self {
        Self { primary, secondary }
    }

    pub fn name(&self) -> &'static str {
        PLUGIN_NAME
    }

    pub fn primary(&self) -> &PrimaryConfig {
        &self.primary
    }

    pub fn secondary(&self) -> &SecondaryPolicy {
        &self.secondary
    }

    /// Registration descriptor for the host.
    ///
    /// The filter only exists under the proportional policy.  The order
    /// callback is skipped when both the primary weight and the retention
    /// weight are non-positive.
    pub fn registration(&self) -> Registration {
        let filter_enabled = self.secondary.proportional().is_some();
        if !filter_enabled {
            debug!("proportional policy is not enabled, skip predicate function");
        }

        let order_enabled = self.primary.weight > 0 || self.retention_weight() > 0;
        if !order_enabled {
            debug!("the weights of both resourceStrategyFit and sra.retention are zero, skip node order function");
        }

        Registration {
            filter_enabled,
            order_enabled,
        }
    }

    /// Admission check of `task` on `node`.
    ///
    /// Always admits unless the proportional policy is active.  Non-success
    /// statuses that do not abort are advisory and only logged.
    pub fn filter(&self, task: &TaskInfo, node: &NodeInfo) -> Result<(), FitError> {
        let Some(proportional) = self.secondary.proportional() else {
            return Ok(());
        };

        let status = check_node_resource_is_proportional(task, node, proportional);
        if !status.is_success() {
            if status.should_abort() {
                return Err(FitError::new(task, node, vec![status]));
            }
            debug!(
                task = %task.key(),
                node = %node.name,
                status = %status,
                "advisory proportional status, admitting"
            );
        }

        trace!(
            task = %task.key(),
            node = %node.name,
            "proportional policy filter pass"
        );
        Ok(())
    }

    /// Desirability of `node` for `task`; higher is better.
    pub fn node_order(&self, task: &TaskInfo, node: &NodeInfo) -> f64 {
        let mut score = 0.0;

        if self.primary.weight > 0 {
            score += strategy_fit_score(task, node, &self.primary);
            trace!(
                task = %task.key(),
                node = %node.name,
                score = score,
                "resourceStrategyFit policy score"
            );
        }

        if let Some(retention) = self.secondary.retention().filter(|r| r.weight > 0) {
            let rs = retention_score(task, node, retention);
            trace!(
                task = %task.key(),
                node = %node.name,
                score = rs,
                "sra.retention score"
            );
            score += rs;
        }

        debug!(
            task = %task.key(),
            node = %node.name,
            score = score,
            "resource-strategy-fit total score"
        );
        score
    }

    /// Retention resources that no node in `nodes` has capacity for.
    ///
    /// Empty unless the retention policy is active.
    pub fn audit_scarce_resources<'a>(
        &self,
        nodes: impl IntoIterator<Item = &'a NodeInfo>,
    ) -> Vec<String> {
        match self.secondary.retention() {
            Some(retention) if retention.weight > 0 => missing_scarce_resources(retention, nodes),
            _ => Vec::new(),
        }
    }

    fn retention_weight(&self) -> i64 {
        self.secondary.retention().map_or(0, |r| r.weight)
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
