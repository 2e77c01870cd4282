/*
SPDX-FileCopyrightText: Copyright 2026 LG Electronics Inc.
SPDX-License-Identifier: MIT
*/

//! Resource strategy fit – node ranking and admission filtering
//!
//! Module layout:
//!
//! ```text
//! lib.rs
//! ├── resource/       – named resource quantity vectors
//! ├── snapshot/       – task / node snapshots supplied by the host
//! ├── config/         – argument bag, resolver, YAML loading
//! ├── scoring/        – per-resource scorers, aggregator, retention
//! ├── proportional/   – proportionality admission filter
//! ├── plugin/         – façade: filter + node order callbacks
//! └── session/        – one scheduling pass over a snapshot
//! ```

pub mod config;
pub mod plugin;
pub mod proportional;
pub mod resource;
pub mod scoring;
pub mod session;
pub mod snapshot;

pub use plugin::{Registration, ResourceStrategyFit, PLUGIN_NAME};
