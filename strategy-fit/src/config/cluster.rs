/*
SPDX-FileCopyrightText: Copyright 2026 LG Electronics Inc.
SPDX-License-Identifier: MIT
*/

//! Cluster snapshot loading for offline ranking.
//!
//! The expected YAML structure is:
//! ```yaml
//! nodes:
//!   node-a:
//!     capacity: {cpu: 16, memory: 64, nvidia.com/gpu: 4}
//!     allocatable: {cpu: 15, memory: 60, nvidia.com/gpu: 4}   # optional
//!     used: {cpu: 2, memory: 8}                               # optional
//! tasks:
//!   - namespace: batch
//!     name: train-0
//!     resreq: {cpu: 4, memory: 16, nvidia.com/gpu: 1}
//! ```

use std::collections::BTreeMap;
use std::path::Path;

use anyhow::{Context, Result};
use serde::Deserialize;
use tracing::{debug, info, warn};

use crate::resource::ResourceVector;
use crate::snapshot::{NodeInfo, TaskInfo};

// ── Private YAML deserialization types ────────────────────────────────────────

#[derive(Debug, Deserialize)]
struct ClusterFile {
    #[serde(default)]
    nodes: BTreeMap<String, NodeEntry>,
    #[serde(default)]
    tasks: Vec<TaskInfo>,
}

/// Per-node vectors as they appear in the YAML file.
///
/// `allocatable` falls back to `capacity` and `used` to empty when absent.
#[derive(Debug, Deserialize)]
struct NodeEntry {
    #[serde(default)]
    capacity: ResourceVector,
    allocatable: Option<ResourceVector>,
    #[serde(default)]
    used: ResourceVector,
}

// ── Public data structures ────────────────────────────────────────────────────

/// Nodes and pending tasks of one scheduling cycle.
#[derive(Debug, Clone, Default)]
pub struct ClusterSnapshot {
    /// Sorted by node name.
    pub nodes: Vec<NodeInfo>,
    /// In file order.
    pub tasks: Vec<TaskInfo>,
}

impl ClusterSnapshot {
    /// Parses `path` into a snapshot.
    ///
    /// # Errors
    /// Returns an error if the file cannot be opened or if the YAML is
    /// structurally invalid.
    pub fn load_from_file(path: &Path) -> Result<Self> {
        info!("Loading cluster snapshot from: {}", path.display());

        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Cannot open cluster snapshot: {}", path.display()))?;

        Self::from_yaml_str(&content)
            .with_context(|| format!("Failed to parse YAML file: {}", path.display()))
    }

    /// Parses a snapshot from YAML text.
    pub fn from_yaml_str(content: &str) -> Result<Self> {
        let file: ClusterFile = serde_yaml::from_str(content)?;

        let nodes: Vec<NodeInfo> = file
            .nodes
            .into_iter()
            .map(|(name, entry)| {
                let allocatable = entry.allocatable.unwrap_or_else(|| entry.capacity.clone());
                debug!(
                    "  Node: {} | capacity: [{}] | allocatable: [{}] | used: [{}]",
                    name, entry.capacity, allocatable, entry.used,
                );
                NodeInfo {
                    name,
                    capacity: entry.capacity,
                    allocatable,
                    used: entry.used,
                }
            })
            .collect();

        if nodes.is_empty() {
            warn!("No nodes found in cluster snapshot");
        }

        info!(
            nodes = nodes.len(),
            tasks = file.tasks.len(),
            "Cluster snapshot loaded"
        );

        Ok(Self {
            nodes,
            tasks: file.tasks,
        })
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
