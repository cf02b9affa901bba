//! TOML configuration for the `ringway` tool.
//!
//! A config file describes the ring settings and its initial members. Nodes
//! given on the command line are appended to the ones from the file.

use std::path::Path;

use anyhow::{Context, bail};
use ringway_ring::{ConsistentHash, RingConfig};
use serde::Deserialize;
use tracing::info;

/// Top-level configuration, parsed from TOML.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct CliConfig {
    /// Maintenance mode and hash function.
    pub ring: RingConfig,
    /// Initial ring members.
    pub nodes: Vec<NodeSection>,
    /// Logging configuration.
    pub log: LogSection,
}

/// One `[[nodes]]` entry.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct NodeSection {
    /// Unique node name.
    pub name: String,
    /// Opaque payload printed next to routed keys, e.g. an address.
    #[serde(default)]
    pub value: String,
    /// Relative share of the key space.
    #[serde(default = "default_weight")]
    pub weight: u32,
}

fn default_weight() -> u32 {
    1
}

/// `[log]` section.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct LogSection {
    /// Log level filter (e.g. `"info"`, `"debug"`, `"warn"`).
    pub level: String,
}

impl Default for LogSection {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

impl CliConfig {
    /// Load config from a TOML file, or start empty if no path given.
    pub fn load(path: Option<&Path>) -> anyhow::Result<Self> {
        match path {
            Some(p) => {
                let content = std::fs::read_to_string(p)
                    .with_context(|| format!("failed to read {}", p.display()))?;
                let config: CliConfig = toml::from_str(&content)?;
                Ok(config)
            }
            None => Ok(Self::default()),
        }
    }

    /// Parse config from a TOML string (used in tests).
    #[cfg(test)]
    pub fn from_toml(s: &str) -> anyhow::Result<Self> {
        Ok(toml::from_str(s)?)
    }

    /// Build a ring holding every configured node.
    ///
    /// Nodes are added in file order and the ring is prepared once at the
    /// end, so lazy rings are ready for lookups too. A duplicate name or an
    /// out-of-range weight is a configuration error.
    pub fn build_ring(&self) -> anyhow::Result<ConsistentHash<String>> {
        if self.nodes.is_empty() {
            bail!("no nodes configured; add [[nodes]] to the config or pass --node");
        }

        let ring = ConsistentHash::with_config(self.ring);
        for node in &self.nodes {
            ring.try_add(node.name.clone(), node.value.clone(), node.weight)
                .with_context(|| format!("invalid node {:?}", node.name))?;
        }
        ring.prepare();

        info!(
            nodes = ring.node_count(),
            points = ring.point_count(),
            maintenance = ?self.ring.maintenance,
            hash = ?self.ring.hash,
            "ring built"
        );
        Ok(ring)
    }
}

/// Parse a command-line node spec: `NAME[:WEIGHT][=VALUE]`.
///
/// `cache-1:2=10.0.0.1:11211` is node `cache-1` with weight 2 and value
/// `10.0.0.1:11211`. The weight defaults to 1 and the value to empty.
pub fn parse_node_spec(spec: &str) -> anyhow::Result<NodeSection> {
    let (head, value) = spec.split_once('=').unwrap_or((spec, ""));
    let (name, weight) = match head.split_once(':') {
        Some((name, weight)) => {
            let weight = weight
                .trim()
                .parse::<u32>()
                .with_context(|| format!("invalid weight in node spec {spec:?}"))?;
            (name, weight)
        }
        None => (head, default_weight()),
    };

    let name = name.trim();
    if name.is_empty() {
        bail!("node spec {spec:?} has an empty name");
    }

    Ok(NodeSection {
        name: name.to_string(),
        value: value.to_string(),
        weight,
    })
}
