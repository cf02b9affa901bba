//! Consistent hashing ring implementation.

use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::sync::Arc;

use tracing::{debug, trace};

use crate::config::{Maintenance, RingConfig};
use crate::error::RingError;
use crate::hash::{MAX_WEIGHT, point_count, point_label};
use crate::node::Node;

/// A key whose owner differs between two ring states.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reassignment {
    /// The sampled key.
    pub key: String,
    /// Name of the node that owned the key before.
    pub from: String,
    /// Name of the node that owns it after.
    pub to: String,
}

/// Unsynchronized consistent hashing ring.
///
/// Each node of weight `w` is placed at `160 * w` virtual points plus one
/// anchor point at the hash of its bare name. A key is owned by the node at
/// the first position at or after the key's hash, wrapping around past the
/// largest position.
///
/// Lookups binary-search `positions`, a sorted copy of the placement table's
/// keys. With [`Maintenance::Eager`] it is rebuilt after every mutation; with
/// [`Maintenance::Lazy`] only by [`Ring::prepare`].
///
/// See [`ConsistentHash`](crate::ConsistentHash) for the thread-safe handle.
pub struct Ring<V> {
    /// Placement table: ring position -> owning node.
    points: HashMap<u32, Arc<Node<V>>>,
    /// Registered nodes, keyed by name.
    nodes: HashMap<String, Arc<Node<V>>>,
    /// Ascending positions as of the last rebuild.
    positions: Vec<u32>,
    /// Whether mutations happened since the last rebuild.
    stale: bool,
    config: RingConfig,
}

impl<V> Ring<V> {
    /// Create an empty ring.
    pub fn new(config: RingConfig) -> Self {
        Self {
            points: HashMap::new(),
            nodes: HashMap::new(),
            positions: Vec::new(),
            stale: false,
            config,
        }
    }

    /// The settings this ring was built with.
    pub fn config(&self) -> RingConfig {
        self.config
    }

    /// Add a node, returning `false` if it was rejected.
    ///
    /// A name that is already registered, or a weight of zero or above
    /// [`MAX_WEIGHT`], leaves the ring untouched. Use [`Ring::try_add`] to
    /// learn which.
    pub fn add(&mut self, name: impl Into<String>, value: V, weight: u32) -> bool {
        self.try_add(Node::new(name, value, weight)).is_ok()
    }

    /// Add a node and place its virtual points.
    ///
    /// When two points hash to the same position, the one inserted last owns
    /// it.
    pub fn try_add(&mut self, node: Node<V>) -> Result<Arc<Node<V>>, RingError> {
        if self.nodes.contains_key(&node.name) {
            debug!(name = %node.name, "rejected duplicate node");
            return Err(RingError::DuplicateName(node.name));
        }
        if node.weight == 0 {
            debug!(name = %node.name, "rejected zero-weight node");
            return Err(RingError::ZeroWeight(node.name));
        }
        if node.weight > MAX_WEIGHT {
            debug!(name = %node.name, weight = node.weight, "rejected oversized node");
            return Err(RingError::WeightTooLarge {
                name: node.name,
                weight: node.weight,
                max: MAX_WEIGHT,
            });
        }

        let node = Arc::new(node);
        let hash = self.config.hash;

        self.points.insert(hash.hash(node.name.as_bytes()), Arc::clone(&node));
        for i in 0..point_count(node.weight) {
            let label = point_label(&node.name, node.weight, i);
            self.points.insert(hash.hash(label.as_bytes()), Arc::clone(&node));
        }
        self.nodes.insert(node.name.clone(), Arc::clone(&node));

        debug!(
            name = %node.name,
            weight = node.weight,
            points = self.points.len(),
            "added node to ring"
        );
        self.mutated();
        Ok(node)
    }

    /// Remove a node by name, returning it if it was registered.
    ///
    /// The weight recorded at insertion decides which points are purged.
    /// Positions that a later node took over through a hash collision stay
    /// with that node.
    pub fn remove(&mut self, name: &str) -> Option<Arc<Node<V>>> {
        let node = self.nodes.remove(name)?;
        let hash = self.config.hash;

        self.release(hash.hash(node.name.as_bytes()), &node);
        for i in 0..point_count(node.weight) {
            let label = point_label(&node.name, node.weight, i);
            self.release(hash.hash(label.as_bytes()), &node);
        }

        debug!(
            name = %node.name,
            points = self.points.len(),
            "removed node from ring"
        );
        self.mutated();
        Some(node)
    }

    /// Rebuild the sorted positions from the placement table.
    pub fn prepare(&mut self) {
        self.positions.clear();
        self.positions.extend(self.points.keys().copied());
        self.positions.sort_unstable();
        self.stale = false;
        trace!(positions = self.positions.len(), "rebuilt ring positions");
    }

    /// Find the node owning `key`.
    ///
    /// Returns [`RingError::EmptyRing`] when no node is registered or when
    /// no rebuilt position is left to route to. On a stale lazy ring,
    /// positions whose node has since been removed are skipped clockwise.
    pub fn get(&self, key: impl AsRef<[u8]>) -> Result<&Arc<Node<V>>, RingError> {
        if self.nodes.is_empty() {
            return Err(RingError::EmptyRing);
        }
        let position = self.config.hash.hash(key.as_ref());
        self.locate(position).ok_or(RingError::EmptyRing)
    }

    /// Owner of the first live position at or after `position`, wrapping.
    fn locate(&self, position: u32) -> Option<&Arc<Node<V>>> {
        let start = self.positions.partition_point(|&p| p < position);
        let after = self.positions[start..].iter();
        let before = self.positions[..start].iter();
        after.chain(before).find_map(|p| self.points.get(p))
    }

    fn release(&mut self, position: u32, node: &Arc<Node<V>>) {
        if self
            .points
            .get(&position)
            .is_some_and(|owner| Arc::ptr_eq(owner, node))
        {
            self.points.remove(&position);
        }
    }

    fn mutated(&mut self) {
        match self.config.maintenance {
            Maintenance::Eager => self.prepare(),
            Maintenance::Lazy => self.stale = true,
        }
    }

    /// Owner histogram for a sample of keys.
    ///
    /// Every registered node appears, with a count of zero if no key landed
    /// on it.
    pub fn distribution<K: AsRef<[u8]>>(
        &self,
        keys: impl IntoIterator<Item = K>,
    ) -> BTreeMap<String, usize> {
        let mut counts: BTreeMap<String, usize> =
            self.nodes.keys().map(|name| (name.clone(), 0)).collect();
        for key in keys {
            if let Ok(node) = self.get(key) {
                *counts.entry(node.name.clone()).or_default() += 1;
            }
        }
        counts
    }

    /// Compute which keys change owner between two ring states.
    ///
    /// Keys that cannot be routed on either side are skipped.
    pub fn diff<K: AsRef<str>>(old: &Ring<V>, new: &Ring<V>, keys: &[K]) -> Vec<Reassignment> {
        keys.iter()
            .filter_map(|key| {
                let key = key.as_ref();
                let from = old.get(key).ok()?;
                let to = new.get(key).ok()?;
                (from.name != to.name).then(|| Reassignment {
                    key: key.to_string(),
                    from: from.name.clone(),
                    to: to.name.clone(),
                })
            })
            .collect()
    }

    /// Number of registered nodes.
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Number of entries in the placement table, anchors included.
    pub fn point_count(&self) -> usize {
        self.points.len()
    }

    /// Whether a node with this name is registered.
    pub fn contains(&self, name: &str) -> bool {
        self.nodes.contains_key(name)
    }

    /// Look up a registered node by name.
    pub fn node(&self, name: &str) -> Option<&Arc<Node<V>>> {
        self.nodes.get(name)
    }

    /// All registered nodes, in no particular order.
    pub fn nodes(&self) -> impl Iterator<Item = &Arc<Node<V>>> {
        self.nodes.values()
    }

    /// The sorted positions used for lookups.
    pub fn positions(&self) -> &[u32] {
        &self.positions
    }

    /// Node placed at exactly `position`, if any.
    pub fn owner_at(&self, position: u32) -> Option<&Arc<Node<V>>> {
        self.points.get(&position)
    }

    /// Placement table entries, in no particular order.
    pub fn placements(&self) -> impl Iterator<Item = (u32, &Arc<Node<V>>)> {
        self.points.iter().map(|(pos, node)| (*pos, node))
    }

    /// Whether a lazy ring has mutations that `prepare` has not folded in.
    pub fn is_stale(&self) -> bool {
        self.stale
    }
}

impl<V> Default for Ring<V> {
    fn default() -> Self {
        Self::new(RingConfig::default())
    }
}

impl<V> Clone for Ring<V> {
    fn clone(&self) -> Self {
        Self {
            points: self.points.clone(),
            nodes: self.nodes.clone(),
            positions: self.positions.clone(),
            stale: self.stale,
            config: self.config,
        }
    }
}

impl<V> fmt::Debug for Ring<V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Ring")
            .field("nodes", &self.nodes.len())
            .field("points", &self.points.len())
            .field("positions", &self.positions.len())
            .field("stale", &self.stale)
            .field("config", &self.config)
            .finish()
    }
}
