/*
SPDX-FileCopyrightText: Copyright 2026 LG Electronics Inc.
SPDX-License-Identifier: MIT
*/

use std::path::PathBuf;
use std::process;

use clap::Parser;
use tracing::{error, info, warn};

use strategy_fit::config::{Arguments, ClusterSnapshot, SchedulerConf};
use strategy_fit::session::Session;
use strategy_fit::{ResourceStrategyFit, PLUGIN_NAME};

// ── CLI argument definition ───────────────────────────────────────────────────

/// Rank the nodes of a cluster snapshot for each pending task.
///
/// Example:
///   strategy-fit --conf scheduler.yaml --cluster cluster.yaml
#[derive(Debug, Parser)]
#[command(
    name = "strategy-fit",
    about = "Resource strategy fit – offline node ranking",
    long_about = None,
)]
struct Cli {
    /// Path to the YAML scheduler configuration (plugin tiers and arguments).
    /// Without it every plugin argument takes its default.
    #[arg(short = 'c', long = "conf")]
    conf: Option<PathBuf>,

    /// Path to the YAML cluster snapshot (nodes and tasks).
    #[arg(short = 's', long = "cluster")]
    cluster: PathBuf,

    /// Plugin entry to read arguments from.
    #[arg(short = 'p', long = "plugin-name", default_value = PLUGIN_NAME)]
    plugin_name: String,
}

// ── Entry point ───────────────────────────────────────────────────────────────

fn main() {
    // Level is controlled by the RUST_LOG env-var (e.g. RUST_LOG=debug).
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();

    info!(
        conf = ?cli.conf,
        cluster = %cli.cluster.display(),
        plugin = %cli.plugin_name,
        "Configuration"
    );

    // ── Load plugin arguments ─────────────────────────────────────────────────
    let args = match &cli.conf {
        Some(path) => match SchedulerConf::load_from_file(path) {
            Ok(conf) => conf.plugin_arguments(&cli.plugin_name),
            Err(e) => {
                error!("Failed to load scheduler configuration: {:#}", e);
                process::exit(1);
            }
        },
        None => {
            warn!("No scheduler configuration provided, using default plugin arguments");
            Arguments::default()
        }
    };

    // ── Load cluster snapshot ─────────────────────────────────────────────────
    let snapshot = match ClusterSnapshot::load_from_file(&cli.cluster) {
        Ok(s) => s,
        Err(e) => {
            error!("Failed to load cluster snapshot: {:#}", e);
            process::exit(1);
        }
    };

    // ── Rank ──────────────────────────────────────────────────────────────────
    let plugin = ResourceStrategyFit::new(&args);
    let session = Session::open(&plugin, &snapshot.nodes);

    for task in &snapshot.tasks {
        let placement = session.place(task);

        println!("task {}", placement.task);
        for (rank, s) in placement.ranked.iter().enumerate() {
            println!("  {:>3}. {:<24} {:>12.3}", rank + 1, s.node, s.score);
        }
        for (node, reason) in &placement.rejected {
            println!("   --  {:<24} rejected: {}", node, reason);
        }
        match placement.best() {
            Some(node) => println!("  => {}", node),
            None => println!("  => unschedulable"),
        }
    }
}
