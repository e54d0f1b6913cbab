//! Property-based tests for the persistent red-black tree, set and map.

mod common;

use std::collections::BTreeMap;
use std::collections::BTreeSet;

use proptest::prelude::*;
use weave::crdt::primitives::Natural;
use weave::crdt::primitives::RbMap;
use weave::crdt::primitives::RbSet;

// =============================================================================
// Test helpers
// =============================================================================

#[derive(Clone, Debug)]
enum SetOp {
    Insert(u32),
    Delete(u32),
}

fn arbitrary_set_op() -> impl Strategy<Value = SetOp> {
    prop_oneof![
        // Small keys so deletes usually hit something.
        2 => (0..64u32).prop_map(SetOp::Insert),
        1 => (0..64u32).prop_map(SetOp::Delete),
    ]
}

fn elems(set: &RbSet<u32>) -> Vec<u32> {
    return set.iter().copied().collect();
}

// =============================================================================
// Tree invariants
// =============================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(200))]

    /// Every intermediate set is a valid red-black tree holding exactly what
    /// a BTreeSet holds after the same operations.
    #[test]
    fn set_matches_model(ops in prop::collection::vec(arbitrary_set_op(), 1..200)) {
        let mut set = RbSet::new(Natural);
        let mut model = BTreeSet::new();
        for op in &ops {
            match *op {
                SetOp::Insert(x) => {
                    set = set.insert(x).unwrap();
                    model.insert(x);
                }
                SetOp::Delete(x) => {
                    set = set.delete(&x).unwrap();
                    model.remove(&x);
                }
            }
            prop_assert!(set.validate().is_ok(), "invalid after {:?}", op);
        }
        prop_assert_eq!(elems(&set), model.iter().copied().collect::<Vec<_>>());
        prop_assert_eq!(set.len(), model.len());
    }

    /// Old versions are unaffected by later operations.
    #[test]
    fn sets_are_persistent(
        xs in prop::collection::btree_set(0..1000u32, 1..100),
        extra in prop::collection::vec(0..1000u32, 1..50),
    ) {
        let before = RbSet::from_elems(Natural, xs.iter().copied()).unwrap();
        let snapshot = elems(&before);
        let first = *xs.iter().next().unwrap();
        let mut after = before.delete(&first).unwrap();
        for x in &extra {
            after = after.insert(*x).unwrap();
        }
        prop_assert!(after.validate().is_ok());
        prop_assert_eq!(elems(&before), snapshot);
        prop_assert!(before.validate().is_ok());
    }

    // =========================================================================
    // Round trips
    // =========================================================================

    /// Inserting then deleting every element, in any order, leaves nothing.
    #[test]
    fn insert_then_delete_all_is_empty(
        xs in prop::collection::btree_set(any::<u32>(), 0..150)
            .prop_map(|set| set.into_iter().collect::<Vec<_>>())
            .prop_shuffle(),
        shift in 0..1000usize,
    ) {
        let mut set = RbSet::new(Natural);
        for &x in &xs {
            set = set.insert(x).unwrap();
            prop_assert!(set.has(&x).unwrap());
        }
        prop_assert_eq!(set.len(), xs.len());

        // Delete in a rotated order, unrelated to insertion order.
        let shift = if xs.is_empty() { 0 } else { shift % xs.len() };
        let mut doomed = xs.clone();
        doomed.rotate_left(shift);
        for x in &doomed {
            set = set.delete(x).unwrap();
            prop_assert!(!set.has(x).unwrap());
            prop_assert!(set.validate().is_ok());
        }
        prop_assert!(set.is_empty());
        prop_assert_eq!(set.iter().count(), 0);
    }

    /// The map agrees with a BTreeMap, including overwrites and removals.
    #[test]
    fn map_matches_model(
        ops in prop::collection::vec((0..32u32, prop::option::of(any::<i64>())), 1..150),
    ) {
        let mut map: RbMap<u32, i64> = RbMap::default();
        let mut model = BTreeMap::new();
        for &(key, value) in &ops {
            match value {
                Some(value) => {
                    map = map.set(key, value).unwrap();
                    model.insert(key, value);
                }
                None => {
                    map = map.remove(&key).unwrap();
                    model.remove(&key);
                }
            }
        }
        prop_assert_eq!(map.len(), model.len());
        for (key, value) in &model {
            prop_assert_eq!(map.get(key).unwrap(), Some(value));
        }
        let pairs: Vec<(u32, i64)> = map.iter().cloned().collect();
        prop_assert_eq!(pairs, model.into_iter().collect::<Vec<_>>());
    }

    /// Set algebra agrees with BTreeSet.
    #[test]
    fn set_algebra_matches_model(
        a in prop::collection::btree_set(0..100u32, 0..60),
        b in prop::collection::btree_set(0..100u32, 0..60),
    ) {
        let sa = RbSet::from_elems(Natural, a.iter().copied()).unwrap();
        let sb = RbSet::from_elems(Natural, b.iter().copied()).unwrap();

        let union = sa.union(&sb).unwrap();
        let intersection = sa.intersection(&sb).unwrap();
        let difference = sa.difference(&sb).unwrap();
        for set in [&union, &intersection, &difference] {
            prop_assert!(set.validate().is_ok());
        }
        prop_assert_eq!(elems(&union), a.union(&b).copied().collect::<Vec<_>>());
        prop_assert_eq!(elems(&intersection), a.intersection(&b).copied().collect::<Vec<_>>());
        prop_assert_eq!(elems(&difference), a.difference(&b).copied().collect::<Vec<_>>());
    }
}
