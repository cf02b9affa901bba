//! Integration test: eager vs lazy maintenance.
//!
//! A lazy ring only reflects membership changes after `prepare`; once
//! prepared it must be indistinguishable from an eager ring.

use ringway_integration_tests::{node_addr, node_name, owners, sample_keys};
use ringway_ring::{ConsistentHash, RingError};

/// Batch-building a lazy ring then preparing it matches an eager ring.
#[test]
fn test_prepared_lazy_ring_matches_eager() {
    let eager = ConsistentHash::new(true);
    let lazy = ConsistentHash::new(false);
    for i in 1..=8 {
        let weight = (i % 3 + 1) as u32;
        eager.add(node_name(i), node_addr(i), weight);
        lazy.add(node_name(i), node_addr(i), weight);
    }
    lazy.remove_named("node-4");
    eager.remove_named("node-4");

    assert!(lazy.is_stale());
    assert!(!eager.is_stale());
    lazy.prepare();

    assert_eq!(eager.ring().positions(), lazy.ring().positions());
    let keys = sample_keys("key-", 5000);
    assert_eq!(owners(&eager, &keys), owners(&lazy, &keys));
}

/// Before the first prepare a lazy ring has nothing to route to.
#[test]
fn test_lazy_ring_before_first_prepare() {
    let ring = ConsistentHash::new(false);
    ring.add("node-1", node_addr(1), 1);
    ring.add("node-2", node_addr(2), 1);

    assert!(ring.ring().positions().is_empty());
    assert_eq!(ring.get("key-1").unwrap_err(), RingError::EmptyRing);
}

/// Lookups keep using the previous rebuild until prepare is called again.
#[test]
fn test_lazy_ring_serves_previous_rebuild() {
    let ring = ConsistentHash::new(false);
    ring.add("node-1", node_addr(1), 1);
    ring.add("node-2", node_addr(2), 1);
    ring.prepare();

    let keys = sample_keys("key-", 3000);
    let before = owners(&ring, &keys);

    ring.add("node-3", node_addr(3), 1);
    assert_eq!(owners(&ring, &keys), before, "unprepared add changed routing");

    ring.prepare();
    let after = owners(&ring, &keys);
    assert!(after.iter().any(|o| o == "node-3"));
}

/// A stale lazy ring never hands out a node that has been removed.
#[test]
fn test_lazy_ring_never_returns_removed_node() {
    let ring = ConsistentHash::new(false);
    for i in 1..=3 {
        ring.add(node_name(i), node_addr(i), 1);
    }
    ring.prepare();
    let keys = sample_keys("key-", 3000);
    let before = owners(&ring, &keys);

    ring.remove_named("node-1");
    let during = owners(&ring, &keys);
    assert!(during.iter().all(|o| o != "node-1"));
    for (b, d) in before.iter().zip(&during) {
        if b != "node-1" {
            assert_eq!(b, d);
        }
    }

    // Skipping purged positions clockwise is exactly what a rebuild does.
    ring.prepare();
    assert_eq!(owners(&ring, &keys), during);
}
