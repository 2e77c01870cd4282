//! Configuration loading and resolution.
//!
//! * [`Arguments`] – loosely typed key/value bag handed to the plugin.
//! * [`resolver`] – turns arguments into [`PrimaryConfig`] + [`SecondaryPolicy`].
//! * [`SchedulerConf`] – the host's scheduler configuration file, from which
//!   the plugin's argument bag is extracted.
//! * [`ClusterSnapshot`] – nodes and pending tasks for offline ranking.
//!
//! The expected scheduler configuration layout is:
//! ```yaml
//! actions: "enqueue, allocate, backfill"
//! tiers:
//! - plugins:
//!   - name: priority
//!   - name: resource-strategy-fit
//!     arguments:
//!       resourceStrategyFitWeight: 10
//!       resources:
//!         cpu:
//!           type: LeastAllocated
//!           weight: 1
//! ```

pub mod arguments;
pub mod cluster;
pub mod resolver;

pub use arguments::Arguments;
pub use cluster::ClusterSnapshot;
pub use resolver::{
    resolve, CompanionRatios, PolicyKind, PrimaryConfig, ProportionalConfig,
    ResourceScoringRule, RetentionConfig, ScoringStrategy, SecondaryPolicy, UnsupportedPolicy,
    DEFAULT_PLUGIN_WEIGHT, PROPORTIONAL_POLICY, RETENTION_POLICY,
};

use std::path::Path;

use anyhow::{Context, Result};
use serde::Deserialize;
use tracing::{debug, info, warn};

// ── YAML deserialization types ────────────────────────────────────────────────

/// One tier of plugins, in priority order.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Tier {
    #[serde(default)]
    pub plugins: Vec<PluginOption>,
}

/// A plugin entry inside a tier.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PluginOption {
    pub name: String,
    #[serde(default)]
    pub arguments: Arguments,
}

// ── SchedulerConf ─────────────────────────────────────────────────────────────

/// Host scheduler configuration: actions plus plugin tiers.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SchedulerConf {
    #[serde(default)]
    pub actions: String,
    #[serde(default)]
    pub tiers: Vec<Tier>,
}

impl SchedulerConf {
    /// Parses `path` as a scheduler configuration.
    ///
    /// # Errors
    /// Returns an error if the file cannot be opened or if the YAML is
    /// structurally invalid.  Semantic problems inside a plugin's arguments
    /// are not errors; they are resolved to defaults later.
    pub fn load_from_file(path: &Path) -> Result<Self> {
        info!("Loading scheduler configuration from: {}", path.display());

        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Cannot open configuration file: {}", path.display()))?;

        let conf: SchedulerConf = serde_yaml::from_str(&content)
            .with_context(|| format!("Failed to parse YAML file: {}", path.display()))?;

        debug!(
            actions = %conf.actions,
            tiers = conf.tiers.len(),
            "scheduler configuration parsed"
        );
        Ok(conf)
    }

    /// Arguments of the first plugin entry named `name`.
    ///
    /// Returns an empty bag (all defaults) when the plugin is not listed.
    pub fn plugin_arguments(&self, name: &str) -> Arguments {
        let found = self
            .tiers
            .iter()
            .flat_map(|tier| tier.plugins.iter())
            .find(|plugin| plugin.name == name);

        match found {
            Some(plugin) => plugin.arguments.clone(),
            None => {
                warn!(plugin = name, "plugin not listed in scheduler configuration, using defaults");
                Arguments::default()
            }
        }
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    /// Helper: write a YAML string to a temp file and return it.
    fn yaml_tempfile(content: &str) -> NamedTempFile {
        let mut f = NamedTempFile::new().unwrap();
        f.write_all(content.as_bytes()).unwrap();
        f
    }

    #[test]
    fn load_scheduler_conf_and_extract_arguments() {
        let yaml = r#"
actions: "enqueue, allocate, backfill"
tiers:
- plugins:
  - name: priority
  - name: gang
- plugins:
  - name: resource-strategy-fit
    arguments:
      resourceStrategyFitWeight: 20
      resources:
        nvidia.com/gpu:
          type: MostAllocated
          weight: 2
      sra:
        policy: retention
        resources: nvidia.com/gpu
        retention:
          weight: 10
"#;
        let f = yaml_tempfile(yaml);
        let conf = SchedulerConf::load_from_file(f.path()).unwrap();
        assert_eq!(conf.tiers.len(), 2);

        let args = conf.plugin_arguments("resource-strategy-fit");
        let (primary, secondary) = resolve(&args);
        assert_eq!(primary.weight, 20);
        assert_eq!(
            primary.resources["nvidia.com/gpu"].strategy,
            ScoringStrategy::MostAllocated
        );
        assert_eq!(secondary.retention().unwrap().weight, 10);
    }

    #[test]
    fn plugin_without_arguments_gets_empty_bag() {
        let f = yaml_tempfile("tiers:\n- plugins:\n  - name: resource-strategy-fit\n");
        let conf = SchedulerConf::load_from_file(f.path()).unwrap();
        assert!(conf.plugin_arguments("resource-strategy-fit").is_empty());
    }

    #[test]
    fn unlisted_plugin_gets_empty_bag() {
        let conf = SchedulerConf::default();
        assert!(conf.plugin_arguments("resource-strategy-fit").is_empty());
    }

    #[test]
    fn missing_file_returns_error() {
        let result = SchedulerConf::load_from_file(Path::new("/nonexistent/path/conf.yaml"));
        assert!(result.is_err());
    }

    #[test]
    fn malformed_yaml_returns_error() {
        let f = yaml_tempfile("tiers: [plugins: {name: [}");
        assert!(SchedulerConf::load_from_file(f.path()).is_err());
    }
}
