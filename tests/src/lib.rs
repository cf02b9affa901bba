//! Shared helpers for ringway integration tests.
//!
//! Builds rings of uniformly named nodes and compares key ownership across
//! ring states.

use ringway_ring::ConsistentHash;

/// Deterministic key sample: `<prefix>0`, `<prefix>1`, ...
pub fn sample_keys(prefix: &str, count: usize) -> Vec<String> {
    (0..count).map(|i| format!("{prefix}{i}")).collect()
}

/// Name of the `i`-th test node (1-based).
pub fn node_name(i: usize) -> String {
    format!("node-{i}")
}

/// Address-like payload for the `i`-th test node.
pub fn node_addr(i: usize) -> String {
    format!("10.0.0.{i}:11211")
}

/// A ring with `n` weight-1 nodes named `node-1` through `node-n`.
///
/// Lazy rings are prepared before being returned.
pub fn uniform_ring(n: usize, eager: bool) -> ConsistentHash<String> {
    let ring = ConsistentHash::new(eager);
    for i in 1..=n {
        assert!(ring.add(node_name(i), node_addr(i), 1));
    }
    ring.prepare();
    ring
}

/// Owner name of every key, in key order.
///
/// Panics if a key cannot be routed.
pub fn owners(ring: &ConsistentHash<String>, keys: &[String]) -> Vec<String> {
    keys.iter()
        .map(|k| ring.get(k).expect("ring should route").name.clone())
        .collect()
}

/// Fraction of positions where two owner lists differ.
pub fn moved_fraction(before: &[String], after: &[String]) -> f64 {
    assert_eq!(before.len(), after.len());
    let moved = before.iter().zip(after).filter(|(b, a)| b != a).count();
    moved as f64 / before.len() as f64
}
