//! Construction-time ring settings.

use serde::{Deserialize, Serialize};

use crate::hash::PointHash;

/// When the sorted position list is rebuilt.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Maintenance {
    /// Rebuild after every `add` and `remove`.
    #[default]
    Eager,
    /// Rebuild only on an explicit `prepare`.
    ///
    /// Lookups made between a mutation and the next `prepare` route over the
    /// positions of the previous rebuild.
    Lazy,
}

impl Maintenance {
    /// Map the boolean "auto sort" switch onto a maintenance mode.
    pub fn from_eager(eager: bool) -> Self {
        if eager { Self::Eager } else { Self::Lazy }
    }
}

/// Settings fixed for the lifetime of a ring.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RingConfig {
    /// Eager or lazy rebuild of the sorted positions.
    pub maintenance: Maintenance,
    /// Hash used for keys and virtual points.
    pub hash: PointHash,
}

impl RingConfig {
    /// Default config with the given maintenance mode.
    pub fn new(eager: bool) -> Self {
        Self {
            maintenance: Maintenance::from_eager(eager),
            ..Self::default()
        }
    }
}
