//! The LeftRight order resolver.
//!
//! A `LeftRightPos` says exactly where its entry was typed: between the
//! entries named by `left` and `right`. Resolution replays that: entries
//! are integrated one at a time into a growing sequence, each after both
//! of its neighbours, in an order fixed by the dependency graph with ties
//! broken by id.
//!
//! Integration is WOOT's. Between the two neighbours there may already be
//! entries typed concurrently into the same gap. Of those, only the ones
//! whose own neighbours lie outside the gap compete directly with the new
//! entry; they are ordered by id, the new entry slots in among them, and
//! the search repeats inside the narrower gap it landed in.
//!
//! Complexity: O(n^2) worst case, O(n) per integration.

use rustc_hash::FxHashSet;
use tracing::trace;

use crate::crdt::position::LeftRightPos;
use crate::crdt::primitives::graph::Digraph;
use crate::crdt::primitives::graph::topological_sort_by_key;
use crate::crdt::primitives::id::PositionId;
use crate::crdt::primitives::rb_map::RbMap;
use crate::crdt::sequence::Entry;
use crate::error::Error;
use crate::error::Result;

/// Index every entry by id.
pub(crate) fn index_of_positions<P, V>(
    state: &[Entry<P, V>],
    id_of: impl Fn(&P) -> &PositionId,
) -> Result<RbMap<PositionId, usize>> {
    let mut index = RbMap::default();
    for (i, entry) in state.iter().enumerate() {
        let id = id_of(&entry.position);
        if index.has(id)? {
            return Err(Error::DuplicatePosition { id: id.clone() });
        }
        index = index.set(id.clone(), i)?;
    }
    return Ok(index);
}

/// Resolve the order of a LeftRight log: a permutation of its indices.
pub fn order_state<V>(state: &[Entry<LeftRightPos, V>]) -> Result<Vec<usize>> {
    let index = index_of_positions(state, |position| &position.id)?;

    // neighbour -> entry: an entry integrates after both its neighbours.
    let mut graph = Digraph::with_vertices(state.len());
    for (i, entry) in state.iter().enumerate() {
        let position = &entry.position;
        for neighbour in [&position.left, &position.right].into_iter().flatten() {
            let &j = index
                .get(neighbour)?
                .ok_or_else(|| Error::UnknownPosition { id: neighbour.clone() })?;
            graph.connect(j, i);
        }
    }
    let schedule = topological_sort_by_key(&graph, |v| &state[v].position.id)?;

    let mut ordered: Vec<usize> = Vec::with_capacity(state.len());
    for vertex in schedule {
        integrate(state, &mut ordered, vertex)?;
    }
    trace!(entries = state.len(), edges = graph.edge_count(), "integrated order");
    return Ok(ordered);
}

/// Slot of the entry with `id` in `ordered`, counting the start of the
/// sequence as slot 0.
fn slot_of<V>(state: &[Entry<LeftRightPos, V>], ordered: &[usize], id: &PositionId) -> Result<usize> {
    return ordered
        .iter()
        .position(|&k| &state[k].position.id == id)
        .map(|k| k + 1)
        .ok_or_else(|| Error::UnknownPosition { id: id.clone() });
}

/// Insert log entry `vertex` into `ordered`.
///
/// Works in slots: slot 0 is the start, slot `k` for `1 <= k <= len` is
/// `ordered[k - 1]`, slot `len + 1` is the end.
fn integrate<V>(state: &[Entry<LeftRightPos, V>], ordered: &mut Vec<usize>, vertex: usize) -> Result<()> {
    let position = &state[vertex].position;
    let mut left = match &position.left {
        Some(id) => slot_of(state, ordered, id)?,
        None => 0,
    };
    let mut right = match &position.right {
        Some(id) => slot_of(state, ordered, id)?,
        None => ordered.len() + 1,
    };

    loop {
        if left >= right {
            return Err(Error::CyclicOrder);
        }
        if left + 1 == right {
            ordered.insert(left, vertex);
            return Ok(());
        }

        // Ids strictly inside the gap.
        let inside: FxHashSet<&PositionId> =
            ordered[left..right - 1].iter().map(|&k| &state[k].position.id).collect();
        let in_gap = |id: &Option<PositionId>| id.as_ref().is_some_and(|id| inside.contains(id));

        // The gap's bounds plus every entry inside whose neighbours are not.
        let mut candidates = vec![left];
        for slot in left + 1..right {
            let other = &state[ordered[slot - 1]].position;
            if !in_gap(&other.left) && !in_gap(&other.right) {
                candidates.push(slot);
            }
        }
        candidates.push(right);

        let mut i = 1;
        while i < candidates.len() - 1 && state[ordered[candidates[i] - 1]].position.id < position.id {
            i += 1;
        }
        let (next_left, next_right) = (candidates[i - 1], candidates[i]);
        if (next_left, next_right) == (left, right) {
            return Err(Error::UnresolvedOrder { remaining: right - left - 1 });
        }
        left = next_left;
        right = next_right;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn id(replica: &str, counter: u64) -> PositionId {
        return PositionId::new(replica.into(), counter);
    }

    fn entry(
        this: (&str, u64),
        left: Option<(&str, u64)>,
        right: Option<(&str, u64)>,
        value: char,
    ) -> Entry<LeftRightPos, char> {
        let position = LeftRightPos {
            id: id(this.0, this.1),
            left: left.map(|(r, c)| id(r, c)),
            right: right.map(|(r, c)| id(r, c)),
        };
        return Entry::new(position, value);
    }

    fn resolve(state: &[Entry<LeftRightPos, char>]) -> String {
        let order = order_state(state).unwrap();
        return order.iter().map(|&k| state[k].value).collect();
    }

    #[test]
    fn typed_between_neighbours() {
        let state = vec![
            entry(("r", 0), None, None, 'a'),
            entry(("r", 1), Some(("r", 0)), None, 'b'),
            entry(("r", 2), Some(("r", 0)), Some(("r", 1)), 'x'),
        ];
        assert_eq!(resolve(&state), "axb");
    }

    #[test]
    fn concurrent_roots_order_by_id() {
        let state = vec![
            entry(("s", 0), None, None, 'p'),
            entry(("r", 0), None, None, 'a'),
            entry(("r", 1), Some(("r", 0)), None, 'b'),
            entry(("r", 2), Some(("r", 0)), Some(("r", 1)), 'x'),
        ];
        assert_eq!(resolve(&state), "axbp");
    }

    #[test]
    fn concurrent_inserts_in_one_gap() {
        // Both replicas saw "ab" and typed between a and b.
        let state = vec![
            entry(("r", 0), None, None, 'a'),
            entry(("r", 1), Some(("r", 0)), None, 'b'),
            entry(("t", 0), Some(("r", 0)), Some(("r", 1)), 'y'),
            entry(("s", 0), Some(("r", 0)), Some(("r", 1)), 'x'),
        ];
        assert_eq!(resolve(&state), "axyb");
    }

    #[test]
    fn result_ignores_log_order() {
        let mut state = vec![
            entry(("r", 0), None, None, 'a'),
            entry(("r", 1), Some(("r", 0)), None, 'b'),
            entry(("s", 0), Some(("r", 0)), Some(("r", 1)), 'x'),
            entry(("s", 1), Some(("s", 0)), Some(("r", 1)), 'y'),
            entry(("t", 0), Some(("r", 0)), Some(("r", 1)), 'z'),
        ];
        let expected = resolve(&state);
        state.reverse();
        assert_eq!(resolve(&state), expected);
        state.swap(0, 3);
        assert_eq!(resolve(&state), expected);
    }

    #[test]
    fn missing_neighbour_is_unknown() {
        let state = vec![entry(("r", 1), Some(("r", 0)), None, 'b')];
        let err = order_state(&state).unwrap_err();
        assert_eq!(err, Error::UnknownPosition { id: id("r", 0) });
    }

    #[test]
    fn duplicate_ids_are_rejected() {
        let state = vec![entry(("r", 0), None, None, 'a'), entry(("r", 0), None, None, 'b')];
        assert_eq!(order_state(&state).unwrap_err(), Error::DuplicatePosition { id: id("r", 0) });
    }

    #[test]
    fn neighbour_cycles_are_rejected() {
        let state = vec![
            entry(("r", 0), Some(("r", 1)), None, 'a'),
            entry(("r", 1), Some(("r", 0)), None, 'b'),
        ];
        assert!(order_state(&state).unwrap_err().is_invariant_violation());
    }
}
