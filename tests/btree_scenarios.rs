//! Scenario tests for the B+ tree engine.
//!
//! Small hand-picked key sets at order 3 plus large seeded random workloads
//! at order 20, each checked against the structural validator.

use bplustree::{BPlusTree, Key, Value};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};

const SIMPLE: [(Key, Value); 10] = [
    (9, 0.7258506976568656),
    (1, 0.25137529047540985),
    (8, 0.436500663475739),
    (4, 0.2963288216690265),
    (5, 0.6161846898229543),
    (7, 0.056058099068894474),
    (2, 0.1688243376166424),
    (0, 0.46375381209298183),
    (3, 0.6122986978235035),
    (6, 0.4837472857372376),
];

const SIMPLE_20: [(Key, Value); 20] = [
    (2, 0.784514),
    (1, 0.523413),
    (3, 0.947660),
    (10, 0.805863),
    (11, 0.234790),
    (19, 0.301759),
    (8, 0.988133),
    (0, 0.911702),
    (14, 0.706333),
    (16, 0.250606),
    (6, 0.161544),
    (7, 0.335414),
    (13, 0.506242),
    (17, 0.317764),
    (5, 0.277398),
    (9, 0.054883),
    (18, 0.511996),
    (4, 0.773309),
    (12, 0.534230),
    (15, 0.562825),
];

/// Keys `0..n` with random values, in random order.
fn shuffled_pairs(n: Key, seed: u64) -> Vec<(Key, Value)> {
    let mut rng = StdRng::seed_from_u64(seed);
    let mut pairs: Vec<(Key, Value)> = (0..n).map(|k| (k, rng.gen::<f64>())).collect();
    pairs.shuffle(&mut rng);
    pairs
}

fn build(m: usize, pairs: &[(Key, Value)]) -> BPlusTree {
    let mut tree = BPlusTree::with_order(m).unwrap();
    for &(k, v) in pairs {
        assert!(tree.insert(k, v));
    }
    tree
}

// ============================================================================
// Small scenarios
// ============================================================================

#[test]
fn test_simple_insert_then_get() {
    let tree = build(3, &SIMPLE);

    for (k, v) in SIMPLE {
        assert_eq!(tree.get(k), Some(v));
    }
    tree.validate().unwrap();
}

#[test]
fn test_simple_insert_then_delete_in_insertion_order() {
    let mut tree = build(3, &SIMPLE);

    for (i, (k, v)) in SIMPLE.iter().enumerate() {
        assert_eq!(tree.remove(*k).unwrap(), Some(*v));
        tree.validate().unwrap();
        for (later, expected) in &SIMPLE[i + 1..] {
            assert_eq!(tree.get(*later), Some(*expected));
        }
    }
    assert!(tree.is_empty());
    assert_eq!(tree.to_string(), "[]\n");
}

#[test]
fn test_twenty_pairs_insert_then_delete() {
    let mut tree = build(3, &SIMPLE_20);
    tree.validate().unwrap();

    let mut sorted = SIMPLE_20;
    sorted.sort_by_key(|&(k, _)| k);
    let expected: Vec<Value> = sorted.iter().map(|&(_, v)| v).collect();
    assert_eq!(tree.range(0, 19).unwrap(), expected);

    for (k, v) in SIMPLE_20 {
        assert_eq!(tree.remove(k).unwrap(), Some(v));
        assert_eq!(tree.get(k), None);
        tree.validate().unwrap();
    }
    assert!(tree.is_empty());
    assert_eq!(tree.height(), 1);
}

#[test]
fn test_delete_from_empty_tree() {
    let mut tree = BPlusTree::with_order(3).unwrap();

    assert_eq!(tree.remove(0).unwrap(), None);
    assert_eq!(tree.get(0), None);
    tree.validate().unwrap();
}

// ============================================================================
// Large randomized scenarios
// ============================================================================

#[test]
fn test_random_bulk_insert_and_get() {
    let pairs = shuffled_pairs(10_000, 0x5eed);
    let tree = build(20, &pairs);

    for &(k, v) in &pairs {
        assert_eq!(tree.get(k), Some(v));
    }
    assert_eq!(tree.len(), 10_000);
    tree.validate().unwrap();
}

#[test]
fn test_random_bulk_insert_and_delete() {
    let pairs = shuffled_pairs(10_000, 7);
    let mut tree = build(20, &pairs);

    let mut order = pairs.clone();
    order.shuffle(&mut StdRng::seed_from_u64(8));
    for (i, &(k, v)) in order.iter().enumerate() {
        assert_eq!(tree.remove(k).unwrap(), Some(v));
        if i % 500 == 0 {
            tree.validate().unwrap();
        }
    }

    assert!(tree.is_empty());
    assert_eq!(tree.node_count(), 1);
    tree.validate().unwrap();
}

#[test]
fn test_random_ranges() {
    let pairs = shuffled_pairs(10_000, 42);
    let tree = build(20, &pairs);

    let mut by_key = pairs.clone();
    by_key.sort_by_key(|&(k, _)| k);

    let mut rng = StdRng::seed_from_u64(43);
    for _ in 0..200 {
        let a = rng.gen_range(0..10_000);
        let b = rng.gen_range(0..10_000);
        let (low, high) = if a <= b { (a, b) } else { (b, a) };

        let expected: Vec<Value> = by_key[low as usize..=high as usize].iter().map(|&(_, v)| v).collect();
        assert_eq!(tree.range(low, high).unwrap(), expected);
    }
}

#[test]
fn test_interleaved_workload_small_order() {
    let mut rng = StdRng::seed_from_u64(99);
    let mut tree = BPlusTree::with_order(3).unwrap();
    let mut present = std::collections::BTreeMap::new();

    for step in 0..5_000 {
        let key = rng.gen_range(-200..200);
        if rng.gen_bool(0.55) {
            let value = rng.gen::<f64>();
            let inserted = tree.insert(key, value);
            assert_eq!(inserted, !present.contains_key(&key));
            present.entry(key).or_insert(value);
        } else {
            assert_eq!(tree.remove(key).unwrap(), present.remove(&key));
        }
        if step % 100 == 0 {
            tree.validate().unwrap();
        }
    }

    assert_eq!(tree.len(), present.len());
    let entries: Vec<(Key, Value)> = tree.iter().collect();
    let expected: Vec<(Key, Value)> = present.into_iter().collect();
    assert_eq!(entries, expected);
}
