//! Routable ring members.

use std::fmt;

/// A named, weighted member of the ring carrying an opaque payload.
///
/// The ring only looks at `name` and `weight`. `value` is handed back
/// untouched to whoever routes a key to this node.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Node<V> {
    /// Unique identifier; also the registry key.
    pub name: String,
    /// Multiplier applied to the replication base to get the point count.
    pub weight: u32,
    /// Caller payload, e.g. an address or a connection handle.
    pub value: V,
}

impl<V> Node<V> {
    /// Create a node.
    pub fn new(name: impl Into<String>, value: V, weight: u32) -> Self {
        Self {
            name: name.into(),
            weight,
            value,
        }
    }
}

impl<V> fmt::Display for Node<V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}(w{})", self.name, self.weight)
    }
}
