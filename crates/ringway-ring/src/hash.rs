//! Position hashing for keys and virtual points.
//!
//! Every virtual point is placed at `hash(name*weight-index)`. The label
//! format and the hash function together decide which node owns which part
//! of the key space, so neither may change under a live ring.

use serde::{Deserialize, Serialize};

/// Number of virtual points a node of weight 1 places on the ring.
pub const REPLICATION_BASE: u32 = 160;

/// Largest accepted node weight. Its virtual points still number below
/// `u32::MAX`, the size of the position space.
pub const MAX_WEIGHT: u32 = u32::MAX / REPLICATION_BASE;

/// The 32-bit hash used for both keys and virtual points.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PointHash {
    /// CRC-32 (IEEE) checksum.
    #[default]
    Crc32,
    /// First four bytes of the BLAKE3 digest, little-endian.
    Blake3,
}

impl PointHash {
    /// Hash arbitrary bytes to a ring position.
    pub fn hash(self, bytes: &[u8]) -> u32 {
        match self {
            PointHash::Crc32 => crc32fast::hash(bytes),
            PointHash::Blake3 => {
                let digest = blake3::hash(bytes);
                let b = digest.as_bytes();
                u32::from_le_bytes([b[0], b[1], b[2], b[3]])
            }
        }
    }
}

/// Synthetic label for the `replica`-th virtual point of a node.
pub fn point_label(name: &str, weight: u32, replica: u32) -> String {
    format!("{name}*{weight}-{replica}")
}

/// Number of virtual points (excluding the anchor) for a node of `weight`.
///
/// Weights above [`MAX_WEIGHT`] are rejected before placement.
pub fn point_count(weight: u32) -> u32 {
    debug_assert!(weight <= MAX_WEIGHT);
    REPLICATION_BASE * weight
}
