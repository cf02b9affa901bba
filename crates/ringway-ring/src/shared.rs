//! Thread-safe handle around [`Ring`].
//!
//! Lookups take the read side of a `RwLock` and run in parallel. Adds,
//! removals and `prepare` take the write side and finish any rebuild before
//! releasing it, so a lookup never sees a half-applied mutation.

use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

use crate::config::RingConfig;
use crate::error::RingError;
use crate::node::Node;
use crate::ring::Ring;

/// Consistent hash ring shared between threads.
///
/// Construct one explicitly and pass it around, typically inside an `Arc`.
pub struct ConsistentHash<V> {
    ring: RwLock<Ring<V>>,
}

impl<V> ConsistentHash<V> {
    /// Create an empty ring.
    ///
    /// `eager` rebuilds the sorted positions on every mutation. Otherwise
    /// callers must call [`ConsistentHash::prepare`] before lookups see
    /// membership changes.
    pub fn new(eager: bool) -> Self {
        Self::with_config(RingConfig::new(eager))
    }

    /// Create an empty ring with explicit settings.
    pub fn with_config(config: RingConfig) -> Self {
        Self {
            ring: RwLock::new(Ring::new(config)),
        }
    }

    /// Add a node. Returns `false` if the name is taken or the weight is
    /// zero or above [`MAX_WEIGHT`](crate::MAX_WEIGHT).
    pub fn add(&self, name: impl Into<String>, value: V, weight: u32) -> bool {
        self.write().add(name, value, weight)
    }

    /// Add a node, reporting why it was rejected.
    pub fn try_add(
        &self,
        name: impl Into<String>,
        value: V,
        weight: u32,
    ) -> Result<Arc<Node<V>>, RingError> {
        self.write().try_add(Node::new(name, value, weight))
    }

    /// Remove a node. Unknown nodes are ignored.
    ///
    /// Only the name is consulted; the points purged are the ones placed when
    /// the node was added.
    pub fn remove(&self, node: &Node<V>) {
        self.remove_named(&node.name);
    }

    /// Remove a node by name. Unknown names are ignored.
    pub fn remove_named(&self, name: &str) {
        self.write().remove(name);
    }

    /// Rebuild the sorted positions.
    pub fn prepare(&self) {
        self.write().prepare();
    }

    /// Find the node owning `key`.
    pub fn get(&self, key: impl AsRef<[u8]>) -> Result<Arc<Node<V>>, RingError> {
        self.read().get(key).map(Arc::clone)
    }

    /// Number of registered nodes.
    pub fn node_count(&self) -> usize {
        self.read().node_count()
    }

    /// Number of placement table entries.
    pub fn point_count(&self) -> usize {
        self.read().point_count()
    }

    /// Whether `name` is registered.
    pub fn contains(&self, name: &str) -> bool {
        self.read().contains(name)
    }

    /// Look up a registered node by name.
    pub fn node(&self, name: &str) -> Option<Arc<Node<V>>> {
        self.read().node(name).cloned()
    }

    /// Snapshot of the registered nodes.
    pub fn nodes(&self) -> Vec<Arc<Node<V>>> {
        self.read().nodes().cloned().collect()
    }

    /// Whether a lazy ring is waiting for `prepare`.
    pub fn is_stale(&self) -> bool {
        self.read().is_stale()
    }

    /// The settings this ring was built with.
    pub fn config(&self) -> RingConfig {
        self.read().config()
    }

    /// Return a clone of the current ring.
    ///
    /// Node values are shared with the live ring, not copied.
    pub fn ring(&self) -> Ring<V> {
        self.read().clone()
    }

    fn read(&self) -> RwLockReadGuard<'_, Ring<V>> {
        self.ring.read().expect("ring lock poisoned")
    }

    fn write(&self) -> RwLockWriteGuard<'_, Ring<V>> {
        self.ring.write().expect("ring lock poisoned")
    }
}

impl<V> Default for ConsistentHash<V> {
    fn default() -> Self {
        Self::with_config(RingConfig::default())
    }
}

impl<V> std::fmt::Debug for ConsistentHash<V> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.ring.try_read() {
            Ok(ring) => f.debug_struct("ConsistentHash").field("ring", &*ring).finish(),
            Err(_) => f.debug_struct("ConsistentHash").finish_non_exhaustive(),
        }
    }
}
