//! Integration test: key routing through the shared ring handle.

use ringway_integration_tests::{node_addr, owners, sample_keys, uniform_ring};
use ringway_ring::{ConsistentHash, Node, PointHash, RingConfig, RingError};

/// Two rings built from the same membership route every key identically.
#[test]
fn test_independent_rings_agree() {
    let a = uniform_ring(5, true);
    let b = uniform_ring(5, false);
    let keys = sample_keys("user:", 5000);

    assert_eq!(owners(&a, &keys), owners(&b, &keys));
}

/// Repeated lookups of the same key return the same node and payload.
#[test]
fn test_repeated_lookups_are_stable() {
    let ring = uniform_ring(3, true);
    for key in sample_keys("session-", 200) {
        let first = ring.get(&key).unwrap();
        for _ in 0..5 {
            let again = ring.get(&key).unwrap();
            assert_eq!(again.name, first.name);
            assert_eq!(again.value, first.value);
        }
    }
}

/// Routing a key as `&str`, `String` or raw bytes gives the same owner.
#[test]
fn test_key_representations_route_alike() {
    let ring = uniform_ring(4, true);
    for key in sample_keys("k", 300) {
        let by_str = ring.get(key.as_str()).unwrap();
        let by_bytes = ring.get(key.as_bytes()).unwrap();
        let by_string = ring.get(key.clone()).unwrap();
        assert_eq!(by_str.name, by_bytes.name);
        assert_eq!(by_str.name, by_string.name);
    }
}

/// Payloads come back exactly as registered.
#[test]
fn test_payload_round_trips() {
    let ring = uniform_ring(3, true);
    for key in sample_keys("key-", 100) {
        let node = ring.get(&key).unwrap();
        let index: usize = node.name.trim_start_matches("node-").parse().unwrap();
        assert_eq!(node.value, node_addr(index));
    }
}

/// An empty ring, including one emptied by removals, signals EmptyRing.
#[test]
fn test_empty_ring_signal() {
    let ring: ConsistentHash<String> = ConsistentHash::new(true);
    assert_eq!(ring.get("key-1").unwrap_err(), RingError::EmptyRing);

    let ring = uniform_ring(2, true);
    ring.remove_named("node-1");
    ring.remove(&Node::new("node-2", String::new(), 1));
    assert_eq!(ring.node_count(), 0);
    assert_eq!(ring.point_count(), 0);
    assert_eq!(ring.get("key-1").unwrap_err(), RingError::EmptyRing);
}

/// A weight-3 node takes about three times the keys of a weight-1 node.
#[test]
fn test_weighted_share_over_100k_keys() {
    let ring = ConsistentHash::new(true);
    ring.add("node-a", "a", 1);
    ring.add("node-b", "b", 3);

    let counts = ring.ring().distribution(sample_keys("key-", 100_000));
    let ratio = counts["node-b"] as f64 / counts["node-a"] as f64;
    assert!(
        (2.7..=3.3).contains(&ratio),
        "weighted share off: {counts:?} (ratio {ratio:.2})"
    );
}

/// Heavier nodes get proportionally more placed points.
#[test]
fn test_points_scale_with_weight() {
    let ring = ConsistentHash::new(true);
    for (name, weight) in [("w1", 1u32), ("w2", 2), ("w5", 5)] {
        ring.add(name, (), weight);
    }

    let snapshot = ring.ring();
    let placed = |name: &str| snapshot.placements().filter(|(_, n)| n.name == name).count();
    let (w1, w2, w5) = (placed("w1"), placed("w2"), placed("w5"));

    // Each node places 160 * weight replica points plus its anchor, minus
    // the rare position another node overwrote.
    assert!(w1 <= 161 && w1 > 150, "w1 placed {w1}");
    assert!(w2 <= 321 && w2 > 310, "w2 placed {w2}");
    assert!(w5 <= 801 && w5 > 790, "w5 placed {w5}");
}

/// A key hashing past the last position belongs to the first position.
#[test]
fn test_wrap_around() {
    let ring = uniform_ring(3, true);
    let snapshot = ring.ring();
    let last = *snapshot.positions().last().unwrap();
    let first_owner = snapshot.owner_at(snapshot.positions()[0]).unwrap();

    let wrapping: Vec<String> = sample_keys("wrap-", 200_000)
        .into_iter()
        .filter(|k| PointHash::Crc32.hash(k.as_bytes()) > last)
        .take(3)
        .collect();
    assert!(!wrapping.is_empty(), "no key hashed past the last position");

    for key in wrapping {
        assert_eq!(ring.get(&key).unwrap().name, first_owner.name);
    }
}

/// The hash function is part of the ring's identity.
#[test]
fn test_hash_choice_changes_placement_not_behavior() {
    let crc = uniform_ring(4, true);
    let blake = ConsistentHash::with_config(RingConfig {
        hash: PointHash::Blake3,
        ..RingConfig::default()
    });
    for i in 1..=4 {
        blake.add(format!("node-{i}"), node_addr(i), 1);
    }

    assert_ne!(crc.ring().positions(), blake.ring().positions());

    let keys = sample_keys("key-", 4000);
    let counts = blake.ring().distribution(&keys);
    assert_eq!(counts.len(), 4);
    assert_eq!(counts.values().sum::<usize>(), keys.len());
    assert!(counts.values().all(|&c| c > 0));
}
