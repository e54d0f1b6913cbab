//! The Left order resolver.
//!
//! Left positions form a tree: every entry hangs under the entry it was
//! typed behind, and entries typed at the very start hang under a virtual
//! root. The sequence is a preorder walk of that tree. Children of a node
//! are visited newest first and each subtree is emitted whole, so an entry
//! typed behind `a` lands directly after `a`, ahead of whatever was typed
//! behind `a` earlier.
//!
//! "Newest" compares `(counter, replica)`. `LeftEnv` mints every counter
//! above both neighbours' counters, which makes the counter a Lamport
//! timestamp: a child always outranks its parent, and a new entry outranks
//! the entry it was typed in front of.
//!
//! Complexity: O(n log n), the log from sorting siblings.

use std::cmp::Reverse;

use tracing::trace;

use crate::crdt::integrate::index_of_positions;
use crate::crdt::position::LeftPos;
use crate::crdt::primitives::id::PositionId;
use crate::crdt::primitives::id::ReplicaId;
use crate::crdt::sequence::Entry;
use crate::error::Error;
use crate::error::Result;

/// Sort key that puts the newest sibling first.
fn newest_first(id: &PositionId) -> Reverse<(u64, &ReplicaId)> {
    return Reverse((id.counter, &id.replica));
}

/// Resolve the order of a Left log: a permutation of its indices.
pub fn order_tree<V>(state: &[Entry<LeftPos, V>]) -> Result<Vec<usize>> {
    let index = index_of_positions(state, |position| &position.id)?;

    // children[0] belongs to the root, children[k + 1] to entry k.
    let mut children: Vec<Vec<usize>> = vec![Vec::new(); state.len() + 1];
    for (i, entry) in state.iter().enumerate() {
        let parent = match &entry.position.left {
            Some(left) => {
                let &j = index
                    .get(left)?
                    .ok_or_else(|| Error::UnknownPosition { id: left.clone() })?;
                j + 1
            }
            None => 0,
        };
        children[parent].push(i);
    }
    for siblings in &mut children {
        siblings.sort_by_key(|&k| newest_first(&state[k].position.id));
    }

    let mut ordered = Vec::with_capacity(state.len());
    let mut stack: Vec<usize> = children[0].iter().rev().copied().collect();
    while let Some(k) = stack.pop() {
        ordered.push(k);
        stack.extend(children[k + 1].iter().rev().copied());
    }
    // Entries on a cycle of left links never hang off the root.
    if ordered.len() != state.len() {
        return Err(Error::CyclicOrder);
    }
    trace!(entries = state.len(), roots = children[0].len(), "walked order");
    return Ok(ordered);
}
