/*
SPDX-FileCopyrightText: Copyright 2026 LG Electronics Inc.
SPDX-License-Identifier: MIT
*/

//! Configuration resolver: raw [`Arguments`] → validated, defaulted config.
//!
//! Resolution **never fails**.  Every missing or malformed value falls back to
//! a documented default so that bad configuration can never block scheduling.
//!
//! The recognised argument layout is:
//! ```yaml
//! resourceStrategyFitWeight: 10
//! resources:
//!   nvidia.com/gpu:
//!     type: MostAllocated
//!     weight: 2
//!   cpu:
//!     type: LeastAllocated
//!     weight: 1
//! sra:
//!   policy: retention            # "", "retention" or "proportional"
//!   resources: nvidia.com/gpu    # comma-separated
//!   retention:
//!     weight: 10
//!     nvidia.com/gpu: 1
//!   proportional:
//!     nvidia.com/gpu.cpu: 4
//!     nvidia.com/gpu.memory: 8
//! ```

use std::collections::BTreeMap;
use std::fmt;

use serde_yaml::Value;
use thiserror::Error;
use tracing::{debug, warn};

use super::arguments::Arguments;
use crate::resource::{CPU, MEMORY};

// ── Keys and defaults ─────────────────────────────────────────────────────────

/// Argument key of the overall primary weight.
pub const PLUGIN_WEIGHT_KEY: &str = "resourceStrategyFitWeight";
/// Argument key of the per-resource rule mapping.
pub const RESOURCES_KEY: &str = "resources";
/// Argument key of the secondary (scarce resource avoidance) block.
pub const SRA_KEY: &str = "sra";

/// Default overall weight when absent or negative.
pub const DEFAULT_PLUGIN_WEIGHT: i64 = 10;

/// Policy name selecting [`SecondaryPolicy::Retention`].
pub const RETENTION_POLICY: &str = "retention";
/// Policy name selecting [`SecondaryPolicy::Proportional`].
pub const PROPORTIONAL_POLICY: &str = "proportional";

/// Key inside `sra.retention` holding the overall retention multiplier.
const RETENTION_WEIGHT_KEY: &str = "weight";
/// Keys of one entry under `resources`.
const RULE_TYPE_KEY: &str = "type";
const RULE_WEIGHT_KEY: &str = "weight";

// ── Primary strategy ──────────────────────────────────────────────────────────

/// Per-resource scoring strategy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ScoringStrategy {
    /// Prefer nodes that end up more utilised (bin packing).
    MostAllocated,
    /// Prefer nodes that end up less utilised (spreading).
    #[default]
    LeastAllocated,
}

impl ScoringStrategy {
    /// Resolve a raw strategy name.
    ///
    /// Anything other than the two exact names maps to `LeastAllocated`.
    pub fn resolve(raw: &str) -> Self {
        match raw {
            "MostAllocated" => ScoringStrategy::MostAllocated,
            "LeastAllocated" => ScoringStrategy::LeastAllocated,
            other => {
                debug!(strategy = other, "unsupported scoring strategy, using LeastAllocated");
                ScoringStrategy::LeastAllocated
            }
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            ScoringStrategy::MostAllocated => "MostAllocated",
            ScoringStrategy::LeastAllocated => "LeastAllocated",
        }
    }
}

/// Strategy and weight for one resource.  `weight` is always ≥ 1.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResourceScoringRule {
    pub strategy: ScoringStrategy,
    pub weight: i64,
}

impl ResourceScoringRule {
    /// Build a rule, resetting a non-positive weight to 1.
    pub fn new(strategy: ScoringStrategy, weight: i64) -> Self {
        Self {
            strategy,
            weight: if weight <= 0 { 1 } else { weight },
        }
    }
}

/// Primary (per-resource strategy) configuration.
#[derive(Debug, Clone, PartialEq)]
pub struct PrimaryConfig {
    /// Multiplier of the whole normalised primary score.
    pub weight: i64,
    /// Resource name → rule.  Resources absent here do not take part in
    /// scoring.
    pub resources: BTreeMap<String, ResourceScoringRule>,
}

impl PrimaryConfig {
    /// `{cpu, memory}` × `LeastAllocated` / 1.
    pub fn default_resources() -> BTreeMap<String, ResourceScoringRule> {
        [CPU, MEMORY]
            .into_iter()
            .map(|r| {
                (
                    r.to_string(),
                    ResourceScoringRule::new(ScoringStrategy::LeastAllocated, 1),
                )
            })
            .collect()
    }
}

impl Default for PrimaryConfig {
    fn default() -> Self {
        Self {
            weight: DEFAULT_PLUGIN_WEIGHT,
            resources: Self::default_resources(),
        }
    }
}

impl fmt::Display for PrimaryConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let rules: Vec<String> = self
            .resources
            .iter()
            .map(|(name, rule)| {
                format!(
                    "\"{}\":{{\"type\":\"{}\",\"weight\":{}}}",
                    name,
                    rule.strategy.as_str(),
                    rule.weight
                )
            })
            .collect();
        write!(
            f,
            "{{\"{}\":{},\"{}\":{{{}}}}}",
            PLUGIN_WEIGHT_KEY,
            self.weight,
            RESOURCES_KEY,
            rules.join(",")
        )
    }
}

// ── Secondary policy ──────────────────────────────────────────────────────────

/// Retention (scarce resource avoidance) parameters.
#[derive(Debug, Clone, PartialEq)]
pub struct RetentionConfig {
    /// Overall multiplier of the retention contribution.
    pub weight: i64,
    /// Scarce resource → weight.
    pub resources: BTreeMap<String, i64>,
    /// Sum of `resources` weights; `0` disables normalisation.
    pub weight_sum: i64,
}

impl Default for RetentionConfig {
    fn default() -> Self {
        Self {
            weight: 1,
            resources: BTreeMap::new(),
            weight_sum: 0,
        }
    }
}

impl fmt::Display for RetentionConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut parts = vec![format!("sra.retention.weight[{}]", self.weight)];
        if self.resources.is_empty() {
            parts.push("no extend resources.".to_string());
        } else {
            parts.extend(
                self.resources
                    .iter()
                    .map(|(name, weight)| format!("{name}[{weight}]")),
            );
        }
        write!(f, "{}", parts.join(", "))
    }
}

/// Companion resource → factor (companion quantity reserved per unit of the
/// scarce resource).
pub type CompanionRatios = BTreeMap<String, f64>;

/// Proportionality parameters: scarce resource → companion ratios.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProportionalConfig {
    pub resources: BTreeMap<String, CompanionRatios>,
}

/// The single active secondary policy, resolved once at construction.
#[derive(Debug, Clone, Default, PartialEq)]
pub enum SecondaryPolicy {
    #[default]
    None,
    Retention(RetentionConfig),
    Proportional(ProportionalConfig),
}

impl SecondaryPolicy {
    pub fn name(&self) -> &'static str {
        match self {
            SecondaryPolicy::None => "",
            SecondaryPolicy::Retention(_) => RETENTION_POLICY,
            SecondaryPolicy::Proportional(_) => PROPORTIONAL_POLICY,
        }
    }

    pub fn retention(&self) -> Option<&RetentionConfig> {
        match self {
            SecondaryPolicy::Retention(r) => Some(r),
            _ => None,
        }
    }

    pub fn proportional(&self) -> Option<&ProportionalConfig> {
        match self {
            SecondaryPolicy::Proportional(p) => Some(p),
            _ => None,
        }
    }
}

/// Secondary policy selected by name, before its parameters are resolved.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PolicyKind {
    None,
    Retention,
    Proportional,
}

/// `sra.policy` names something other than retention or proportional.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("sra.policy {0:?} is not supported")]
pub struct UnsupportedPolicy(pub String);

impl PolicyKind {
    /// Match a policy name case-insensitively; empty means no policy.
    pub fn parse(raw: &str) -> Result<Self, UnsupportedPolicy> {
        match raw.to_lowercase().as_str() {
            "" => Ok(PolicyKind::None),
            RETENTION_POLICY => Ok(PolicyKind::Retention),
            PROPORTIONAL_POLICY => Ok(PolicyKind::Proportional),
            _ => Err(UnsupportedPolicy(raw.to_string())),
        }
    }
}

// ── Resolution ────────────────────────────────────────────────────────────────

/// Resolve both halves of the plugin configuration.
pub fn resolve(args: &Arguments) -> (PrimaryConfig, SecondaryPolicy) {
    (resolve_primary(args), resolve_secondary(args))
}

/// Resolve the overall weight and the per-resource rules.
pub fn resolve_primary(args: &Arguments) -> PrimaryConfig {
    let weight = match args.get::<i64>(PLUGIN_WEIGHT_KEY) {
        Some(w) if w >= 0 => w,
        Some(w) => {
            debug!(weight = w, "negative {PLUGIN_WEIGHT_KEY}, using default");
            DEFAULT_PLUGIN_WEIGHT
        }
        None => DEFAULT_PLUGIN_WEIGHT,
    };

    let raw = match args.get::<BTreeMap<String, Value>>(RESOURCES_KEY) {
        Some(raw) => raw,
        None if args.contains(RESOURCES_KEY) => {
            warn!("{RESOURCES_KEY} is not a mapping of resource rules, using defaults");
            BTreeMap::new()
        }
        None => BTreeMap::new(),
    };

    let resources = if raw.is_empty() {
        debug!("no resource rules configured, using cpu/memory LeastAllocated defaults");
        PrimaryConfig::default_resources()
    } else {
        raw.into_iter()
            .map(|(name, value)| {
                let rule = resolve_rule(&name, value);
                (name, rule)
            })
            .collect()
    };

    PrimaryConfig { weight, resources }
}

/// Resolve one `resources` entry field by field.
///
/// A field of the wrong type falls back on its own; the other fields and the
/// other resources keep their configured values.
fn resolve_rule(name: &str, value: Value) -> ResourceScoringRule {
    let fields = serde_yaml::from_value::<Arguments>(value).unwrap_or_else(|e| {
        warn!(resource = name, error = %e, "resource rule is not a mapping, using defaults");
        Arguments::default()
    });

    let strategy = fields.get::<String>(RULE_TYPE_KEY).unwrap_or_default();
    if strategy.is_empty() && fields.contains(RULE_TYPE_KEY) {
        warn!(resource = name, "resource rule type is not a string, using LeastAllocated");
    }
    let mut weight = 0;
    fields.get_int(&mut weight, RULE_WEIGHT_KEY);

    ResourceScoringRule::new(ScoringStrategy::resolve(&strategy), weight)
}

/// Resolve the secondary policy from the `sra` block.
///
/// An unsupported policy name is reported and resolves to
/// [`SecondaryPolicy::None`].
pub fn resolve_secondary(args: &Arguments) -> SecondaryPolicy {
    let sra = args.section(SRA_KEY);
    let policy = sra.get::<String>("policy").unwrap_or_default();
    let resource_list = sra.get::<String>(RESOURCES_KEY).unwrap_or_default();
    debug!(resources = %resource_list, "sra resources provided");

    let resources = split_resource_list(&resource_list);

    match PolicyKind::parse(&policy) {
        Ok(PolicyKind::None) => {
            debug!("sra.policy is not provided");
            SecondaryPolicy::None
        }
        Ok(PolicyKind::Retention) => {
            let retention = resolve_retention(&resources, &sra.section(RETENTION_POLICY));
            debug!(config = %retention, "sra.policy: retention is provided");
            SecondaryPolicy::Retention(retention)
        }
        Ok(PolicyKind::Proportional) => {
            let proportional =
                resolve_proportional(&resources, &sra.section(PROPORTIONAL_POLICY));
            debug!(config = ?proportional, "sra.policy: proportional is provided");
            SecondaryPolicy::Proportional(proportional)
        }
        Err(e) => {
            warn!(policy = %e.0, "{e}, secondary policy disabled");
            SecondaryPolicy::None
        }
    }
}

/// Split a comma-separated resource list, trimming and skipping empties.
pub fn split_resource_list(list: &str) -> Vec<String> {
    list.split(',')
        .map(str::trim)
        .filter(|r| !r.is_empty())
        .map(str::to_string)
        .collect()
}

fn resolve_retention(resources: &[String], retention: &Arguments) -> RetentionConfig {
    let mut config = RetentionConfig::default();
    retention.get_int(&mut config.weight, RETENTION_WEIGHT_KEY);

    for resource in resources {
        let mut weight = 1;
        retention.get_int(&mut weight, resource);
        if weight < 0 {
            weight = 1;
        }
        // A repeated name replaces its earlier weight instead of counting twice.
        config.resources.insert(resource.clone(), weight);
    }
    config.weight_sum = config
        .resources
        .values()
        .fold(0, |sum: i64, weight| sum.saturating_add(*weight));

    config
}

fn resolve_proportional(resources: &[String], proportional: &Arguments) -> ProportionalConfig {
    let mut config = ProportionalConfig::default();

    for resource in resources {
        let ratios: CompanionRatios = [(CPU.to_string(), 1.0), (MEMORY.to_string(), 1.0)]
            .into_iter()
            .collect();
        config.resources.insert(resource.clone(), ratios);
    }

    for key in proportional.keys() {
        // Longest configured scarce name wins, so "a.b" is not split as "a" + "b.cpu".
        let owner = resources
            .iter()
            .filter(|r| {
                key.strip_prefix(r.as_str())
                    .and_then(|rest| rest.strip_prefix('.'))
                    .is_some_and(|companion| !companion.is_empty())
            })
            .max_by_key(|r| r.len());

        let Some(scarce) = owner else {
            debug!(key = key, "proportional ratio does not belong to any sra resource, ignoring");
            continue;
        };
        let companion = &key[scarce.len() + 1..];

        let mut factor = 1.0;
        proportional.get_float(&mut factor, key);
        if factor < 0.0 {
            factor = 1.0;
        }
        if let Some(ratios) = config.resources.get_mut(scarce) {
            ratios.insert(companion.to_string(), factor);
        }
    }

    config
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn args(yaml: &str) -> Arguments {
        Arguments::from_yaml_str(yaml).unwrap()
    }

    // ── Primary ───────────────────────────────────────────────────────────────

    #[test]
    fn empty_arguments_resolve_to_defaults() {
        let (primary, secondary) = resolve(&Arguments::new());
        assert_eq!(primary, PrimaryConfig::default());
        assert_eq!(primary.weight, 10);
        assert_eq!(primary.resources.len(), 2);
        assert_eq!(
            primary.resources[CPU],
            ResourceScoringRule::new(ScoringStrategy::LeastAllocated, 1)
        );
        assert_eq!(secondary, SecondaryPolicy::None);
    }

    #[test]
    fn empty_resource_mapping_uses_defaults() {
        let primary = resolve_primary(&args("resources: {}\n"));
        assert_eq!(primary.resources, PrimaryConfig::default_resources());
    }

    #[test]
    fn negative_weight_resets_to_default_but_zero_is_kept() {
        assert_eq!(resolve_primary(&args("resourceStrategyFitWeight: -3\n")).weight, 10);
        assert_eq!(resolve_primary(&args("resourceStrategyFitWeight: 0\n")).weight, 0);
        assert_eq!(resolve_primary(&args("resourceStrategyFitWeight: 25\n")).weight, 25);
    }

    #[test]
    fn rules_are_normalised() {
        let primary = resolve_primary(&args(
            r#"
resources:
  nvidia.com/gpu:
    type: MostAllocated
    weight: 2
  cpu:
    type: RequestedToCapacityRatio
    weight: 0
  memory:
    weight: -4
"#,
        ));
        assert_eq!(primary.resources.len(), 3);
        assert_eq!(
            primary.resources["nvidia.com/gpu"],
            ResourceScoringRule::new(ScoringStrategy::MostAllocated, 2)
        );
        assert_eq!(primary.resources[CPU].strategy, ScoringStrategy::LeastAllocated);
        assert_eq!(primary.resources[CPU].weight, 1);
        assert_eq!(primary.resources[MEMORY].strategy, ScoringStrategy::LeastAllocated);
        assert_eq!(primary.resources[MEMORY].weight, 1);
    }

    #[test]
    fn malformed_resource_mapping_falls_back_to_defaults() {
        let primary = resolve_primary(&args("resources: [cpu, memory]\n"));
        assert_eq!(primary.resources, PrimaryConfig::default_resources());
    }

    #[test]
    fn wrong_typed_rule_field_falls_back_alone() {
        let primary = resolve_primary(&args(
            r#"
resources:
  cpu:
    type: 5
    weight: 3
  memory: heavy
  nvidia.com/gpu:
    type: MostAllocated
    weight: 2
"#,
        ));
        assert_eq!(primary.resources.len(), 3);
        assert_eq!(
            primary.resources["nvidia.com/gpu"],
            ResourceScoringRule::new(ScoringStrategy::MostAllocated, 2)
        );
        assert_eq!(
            primary.resources[CPU],
            ResourceScoringRule::new(ScoringStrategy::LeastAllocated, 3)
        );
        assert_eq!(
            primary.resources[MEMORY],
            ResourceScoringRule::new(ScoringStrategy::LeastAllocated, 1)
        );
    }

    #[test]
    fn display_is_a_json_like_summary() {
        let s = PrimaryConfig::default().to_string();
        assert_eq!(
            s,
            r#"{"resourceStrategyFitWeight":10,"resources":{"cpu":{"type":"LeastAllocated","weight":1},"memory":{"type":"LeastAllocated","weight":1}}}"#
        );
    }

    proptest! {
        #[test]
        fn rule_weight_is_always_positive_and_idempotent(w in any::<i64>()) {
            let once = ResourceScoringRule::new(ScoringStrategy::MostAllocated, w);
            prop_assert!(once.weight >= 1);
            if w <= 0 {
                prop_assert_eq!(once.weight, 1);
            }
            let twice = ResourceScoringRule::new(once.strategy, once.weight);
            prop_assert_eq!(once, twice);
        }

        #[test]
        fn unknown_strategy_names_become_least_allocated(name in "[a-zA-Z]{0,20}") {
            prop_assume!(name != "MostAllocated");
            prop_assert_eq!(ScoringStrategy::resolve(&name), ScoringStrategy::LeastAllocated);
        }
    }

    // ── Secondary ─────────────────────────────────────────────────────────────

    #[test]
    fn policy_name_is_case_insensitive() {
        let p = resolve_secondary(&args("sra:\n  policy: ReTeNtIoN\n"));
        assert_eq!(p.name(), RETENTION_POLICY);
        let p = resolve_secondary(&args("sra:\n  policy: PROPORTIONAL\n"));
        assert_eq!(p.name(), PROPORTIONAL_POLICY);
    }

    #[test]
    fn unsupported_policy_is_disabled() {
        let p = resolve_secondary(&args("sra:\n  policy: binpack\n  resources: gpu\n"));
        assert_eq!(p, SecondaryPolicy::None);
    }

    #[test]
    fn unsupported_policy_name_is_reported() {
        let err = PolicyKind::parse("BinPack").unwrap_err();
        assert_eq!(err, UnsupportedPolicy("BinPack".to_string()));
        assert_eq!(err.to_string(), "sra.policy \"BinPack\" is not supported");

        assert_eq!(PolicyKind::parse(""), Ok(PolicyKind::None));
        assert_eq!(PolicyKind::parse("Retention"), Ok(PolicyKind::Retention));
        assert_eq!(PolicyKind::parse("proportional"), Ok(PolicyKind::Proportional));
    }

    #[test]
    fn resource_list_is_trimmed_and_skips_empties() {
        assert_eq!(
            split_resource_list(" nvidia.com/gpu , ,rdma ,"),
            vec!["nvidia.com/gpu".to_string(), "rdma".to_string()]
        );
        assert!(split_resource_list("").is_empty());
    }

    #[test]
    fn retention_weights_default_and_sum() {
        let p = resolve_secondary(&args(
            r#"
sra:
  policy: retention
  resources: "nvidia.com/gpu, rdma, fpga"
  retention:
    weight: 10
    nvidia.com/gpu: 5
    rdma: -2
"#,
        ));
        let r = p.retention().unwrap();
        assert_eq!(r.weight, 10);
        assert_eq!(r.resources["nvidia.com/gpu"], 5);
        assert_eq!(r.resources["rdma"], 1);
        assert_eq!(r.resources["fpga"], 1);
        assert_eq!(r.weight_sum, 7);
    }

    #[test]
    fn huge_retention_weights_saturate_the_sum() {
        let p = resolve_secondary(&args(
            r#"
sra:
  policy: retention
  resources: "a, b"
  retention:
    a: 9223372036854775807
    b: 9223372036854775807
"#,
        ));
        let r = p.retention().unwrap();
        assert_eq!(r.resources["a"], i64::MAX);
        assert_eq!(r.weight_sum, i64::MAX);
    }

    #[test]
    fn retention_without_resources_has_zero_sum() {
        let p = resolve_secondary(&args("sra:\n  policy: retention\n"));
        let r = p.retention().unwrap();
        assert_eq!(r.weight, 1);
        assert_eq!(r.weight_sum, 0);
        assert_eq!(r.to_string(), "sra.retention.weight[1], no extend resources.");
    }

    #[test]
    fn repeated_retention_resource_counts_once() {
        let p = resolve_secondary(&args("sra:\n  policy: retention\n  resources: gpu,gpu\n"));
        let r = p.retention().unwrap();
        assert_eq!(r.resources.len(), 1);
        assert_eq!(r.weight_sum, 1);
    }

    #[test]
    fn proportional_ratios_default_and_override() {
        let p = resolve_secondary(&args(
            r#"
sra:
  policy: proportional
  resources: nvidia.com/gpu
  proportional:
    nvidia.com/gpu.cpu: 4
    nvidia.com/gpu.memory: -8
    nvidia.com/gpu.ephemeral-storage: 2.5
    rdma.cpu: 3
"#,
        ));
        let cfg = p.proportional().unwrap();
        assert_eq!(cfg.resources.len(), 1);
        let ratios = &cfg.resources["nvidia.com/gpu"];
        assert_eq!(ratios[CPU], 4.0);
        assert_eq!(ratios[MEMORY], 1.0);
        assert_eq!(ratios["ephemeral-storage"], 2.5);
    }

    #[test]
    fn proportional_key_goes_to_longest_resource_name() {
        let p = resolve_secondary(&args(
            r#"
sra:
  policy: proportional
  resources: a, a.b
  proportional:
    a.b.cpu: 6
"#,
        ));
        let cfg = p.proportional().unwrap();
        assert_eq!(cfg.resources["a.b"][CPU], 6.0);
        assert_eq!(cfg.resources["a"][CPU], 1.0);
        assert!(!cfg.resources["a"].contains_key("b.cpu"));
    }
}
