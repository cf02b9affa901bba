//! `ringway`: inspect key routing on a consistent hash ring.
//!
//! Builds a ring from a TOML config (and/or `--node` flags) and reports how
//! keys are routed and how much they move when membership changes.
//!
//! # Usage
//!
//! ```text
//! ringway -c ring.toml route user:1 user:2      # owner of each key
//! ringway -c ring.toml distribution -n 100000   # per-node key share
//! ringway -c ring.toml rebalance --remove cache-2
//! ringway --node a --node b:3 positions         # ring summary
//! ```

mod config;

use std::collections::BTreeMap;
use std::io::{self, Write};
use std::path::PathBuf;

use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand};
use ringway_ring::{ConsistentHash, Maintenance, REPLICATION_BASE, Ring};
use tracing::debug;

use config::{CliConfig, parse_node_spec};

// -----------------------------------------------------------------------
// CLI definition
// -----------------------------------------------------------------------

#[derive(Parser)]
#[command(
    name = "ringway",
    version,
    about = "Consistent hash ring routing inspector"
)]
struct Cli {
    /// Path to TOML config file.
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Extra node, as `NAME[:WEIGHT][=VALUE]`. Can be repeated.
    #[arg(long = "node", global = true)]
    nodes: Vec<String>,

    /// Use lazy maintenance regardless of the config file.
    #[arg(long, global = true)]
    lazy: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the owning node of each key.
    Route {
        /// Keys to route.
        #[arg(required = true)]
        keys: Vec<String>,
    },

    /// Route a generated key sample and print the share of each node.
    Distribution {
        /// Number of keys to route.
        #[arg(short = 'n', long, default_value = "100000")]
        count: usize,

        /// Prefix of the generated keys (`<prefix><index>`).
        #[arg(short, long, default_value = "key-")]
        prefix: String,
    },

    /// Report how many sampled keys move when a node leaves.
    Rebalance {
        /// Name of the node to remove.
        #[arg(short, long)]
        remove: String,

        /// Number of keys to sample.
        #[arg(short = 'n', long, default_value = "100000")]
        count: usize,

        /// Prefix of the generated keys (`<prefix><index>`).
        #[arg(short, long, default_value = "key-")]
        prefix: String,
    },

    /// Summarize nodes, weights and ring positions.
    Positions,
}

// -----------------------------------------------------------------------
// Entrypoint
// -----------------------------------------------------------------------

fn main() -> Result<()> {
    let cli = Cli::parse();
    let mut config = CliConfig::load(cli.config.as_deref()).context("failed to load config")?;

    setup_tracing(&config.log.level);

    // CLI nodes are appended to the configured ones.
    for spec in &cli.nodes {
        config.nodes.push(parse_node_spec(spec)?);
    }
    if cli.lazy {
        config.ring.maintenance = Maintenance::Lazy;
    }

    let ring = config.build_ring()?;
    let mut out = io::stdout().lock();

    match cli.command {
        Commands::Route { keys } => cmd_route(&ring, &keys, &mut out),
        Commands::Distribution { count, prefix } => {
            cmd_distribution(&ring, &sample_keys(&prefix, count), &mut out)
        }
        Commands::Rebalance {
            remove,
            count,
            prefix,
        } => cmd_rebalance(&ring, &remove, &sample_keys(&prefix, count), &mut out),
        Commands::Positions => cmd_positions(&ring.ring(), &mut out),
    }
}

/// Initialize the `tracing` subscriber with the given level filter.
///
/// Respects `RUST_LOG` env var if set, otherwise uses the config value.
/// Logs go to stderr so command output stays pipeable.
fn setup_tracing(level: &str) {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn sample_keys(prefix: &str, count: usize) -> Vec<String> {
    (0..count).map(|i| format!("{prefix}{i}")).collect()
}

// -----------------------------------------------------------------------
// Commands
// -----------------------------------------------------------------------

fn cmd_route(ring: &ConsistentHash<String>, keys: &[String], out: &mut impl Write) -> Result<()> {
    for key in keys {
        let node = ring.get(key)?;
        if node.value.is_empty() {
            writeln!(out, "{key}\t{}", node.name)?;
        } else {
            writeln!(out, "{key}\t{}\t{}", node.name, node.value)?;
        }
    }
    Ok(())
}

fn cmd_distribution(
    ring: &ConsistentHash<String>,
    keys: &[String],
    out: &mut impl Write,
) -> Result<()> {
    let snapshot = ring.ring();
    let counts = snapshot.distribution(keys);
    let total_weight = total_weight(&snapshot);

    writeln!(
        out,
        "{:<24} {:>6} {:>10} {:>8} {:>8}",
        "node", "weight", "keys", "share", "target"
    )?;
    for (name, count) in &counts {
        let weight = snapshot.node(name).map_or(0, |n| n.weight);
        writeln!(
            out,
            "{name:<24} {weight:>6} {count:>10} {:>7.2}% {:>7.2}%",
            percent(*count as u64, keys.len() as u64),
            percent(u64::from(weight), total_weight),
        )?;
    }
    writeln!(out, "{:<24} {:>6} {:>10}", "total", total_weight, keys.len())?;
    Ok(())
}

/// Key movement caused by removing one node, measured on a key sample.
#[derive(Debug)]
struct RebalanceReport {
    removed: String,
    sampled: usize,
    /// Sampled keys whose owner changed.
    moved: usize,
    /// Sampled keys the removed node owned beforehand.
    owned_before: usize,
    /// The removed node's share of the total weight, in percent.
    expected_share: f64,
    /// Moved key counts per new owner.
    destinations: BTreeMap<String, usize>,
}

/// Compare `ring` with a copy that lacks `remove`. The live ring is not
/// modified.
fn plan_rebalance(
    ring: &ConsistentHash<String>,
    remove: &str,
    keys: &[String],
) -> Result<RebalanceReport> {
    let before = ring.ring();
    let Some(node) = before.node(remove).cloned() else {
        bail!("node {remove:?} is not in the ring");
    };

    let mut after = before.clone();
    after.remove(remove);
    after.prepare();
    if after.node_count() == 0 {
        bail!("removing {remove:?} would leave the ring empty");
    }

    let moved = Ring::diff(&before, &after, keys);
    debug!(moved = moved.len(), sampled = keys.len(), "computed reassignments");

    let mut destinations: BTreeMap<String, usize> = BTreeMap::new();
    for r in &moved {
        *destinations.entry(r.to.clone()).or_default() += 1;
    }

    Ok(RebalanceReport {
        removed: remove.to_string(),
        sampled: keys.len(),
        moved: moved.len(),
        owned_before: before.distribution(keys).get(remove).copied().unwrap_or(0),
        expected_share: percent(u64::from(node.weight), total_weight(&before)),
        destinations,
    })
}

fn cmd_rebalance(
    ring: &ConsistentHash<String>,
    remove: &str,
    keys: &[String],
    out: &mut impl Write,
) -> Result<()> {
    let report = plan_rebalance(ring, remove, keys)?;
    writeln!(
        out,
        "removing {}: {} of {} keys moved ({:.2}%), {} were owned by {}",
        report.removed,
        report.moved,
        report.sampled,
        percent(report.moved as u64, report.sampled as u64),
        report.owned_before,
        report.removed,
    )?;
    writeln!(out, "weight share of {}: {:.2}%", report.removed, report.expected_share)?;
    for (to, count) in &report.destinations {
        writeln!(out, "  -> {to:<24} {count:>10}")?;
    }
    Ok(())
}

fn cmd_positions(ring: &Ring<String>, out: &mut impl Write) -> Result<()> {
    let config = ring.config();
    writeln!(out, "maintenance: {:?}", config.maintenance)?;
    writeln!(out, "hash:        {:?}", config.hash)?;
    writeln!(out, "nodes:       {}", ring.node_count())?;
    writeln!(out, "points:      {}", ring.point_count())?;

    let mut owned: BTreeMap<&str, usize> = BTreeMap::new();
    for (_, node) in ring.placements() {
        *owned.entry(node.name.as_str()).or_default() += 1;
    }

    writeln!(out)?;
    writeln!(
        out,
        "{:<24} {:>6} {:>8} {:>8}",
        "node", "weight", "points", "placed"
    )?;
    let mut nodes: Vec<_> = ring.nodes().collect();
    nodes.sort_by(|a, b| a.name.cmp(&b.name));
    for node in nodes {
        let expected = u64::from(REPLICATION_BASE) * u64::from(node.weight) + 1;
        let placed = owned.get(node.name.as_str()).copied().unwrap_or(0);
        writeln!(
            out,
            "{:<24} {:>6} {expected:>8} {placed:>8}",
            node.name, node.weight
        )?;
    }

    if let (Some(first), Some(last)) = (ring.positions().first(), ring.positions().last()) {
        writeln!(out)?;
        writeln!(out, "span:        {first:#010x} .. {last:#010x}")?;
    }
    Ok(())
}

fn total_weight(ring: &Ring<String>) -> u64 {
    ring.nodes().map(|n| u64::from(n.weight)).sum()
}

fn percent(part: u64, whole: u64) -> f64 {
    if whole == 0 {
        0.0
    } else {
        part as f64 * 100.0 / whole as f64
    }
}
