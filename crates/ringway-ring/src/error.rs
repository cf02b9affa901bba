//! Error types for ring operations.

/// Errors that can occur when adding nodes to or routing keys on the ring.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RingError {
    /// A node with this name is already registered.
    #[error("node already registered: {0}")]
    DuplicateName(String),

    /// The node was given a weight of zero and would own no virtual points.
    #[error("node {0} has zero weight")]
    ZeroWeight(String),

    /// The node's weight exceeds [`MAX_WEIGHT`](crate::MAX_WEIGHT).
    #[error("node {name} has weight {weight}, above the maximum of {max}")]
    WeightTooLarge { name: String, weight: u32, max: u32 },

    /// No position is available to route a key to.
    ///
    /// Returned when no nodes are registered, and by a lazily maintained
    /// ring that has not been prepared since its nodes were added.
    #[error("ring is empty")]
    EmptyRing,
}
