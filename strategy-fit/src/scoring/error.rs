/*
SPDX-FileCopyrightText: Copyright 2026 LG Electronics Inc.
SPDX-License-Identifier: MIT
*/

//! Local scoring outcomes.
//!
//! Insufficiency is an expected, frequent condition, not a fault: the
//! aggregator turns it into a zero node score and never surfaces it to the
//! host.  The variant still carries the exact quantities so the caller can log
//! them without further parsing.

use thiserror::Error;

/// Why a single resource could not be scored on a node.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ScoreError {
    /// `requested + used` exceeds the node's capacity for the resource.
    #[error(
        "node resource {resource} is not enough: need {requested}, used {used}, capacity {capacity}"
    )]
    InsufficientResource {
        resource: String,
        requested: f64,
        used: f64,
        capacity: f64,
    },
}
