//! The general order resolver.
//!
//! Works for any position scheme, given only its pairwise comparison:
//!
//! 1. one vertex per log entry, one edge per related pair
//! 2. transitive reduction, which also rejects cycles; the closure is
//!    never materialised
//! 3. Kahn's sort, breaking every tie by `PositionId`
//!
//! The result depends only on the set of entries in the log, never on
//! their array order, so every replica holding the same entries resolves
//! the same sequence.
//!
//! Complexity: O(n^2) comparisons, plus the reduction.

use rustc_hash::FxHashSet;
use tracing::trace;

use crate::crdt::position::PositionEnv;
use crate::crdt::primitives::graph::Digraph;
use crate::crdt::primitives::graph::topological_sort_by_key;
use crate::crdt::primitives::graph::transitive_reduction;
use crate::crdt::primitives::relation::Relation;
use crate::crdt::sequence::Entry;
use crate::crdt::sequence::State;
use crate::error::Error;
use crate::error::Result;

/// A resolved order.
#[derive(Clone, Debug)]
pub struct Resolution {
    /// The partial order between entries, without implied edges.
    pub reduction: Digraph,
    /// Log indices in sequence order.
    pub sorted: Vec<usize>,
}

/// Reject logs in which two entries share an id.
pub(crate) fn check_unique_ids<E, V>(env: &E, state: &[Entry<E::Position, V>]) -> Result<()>
where
    E: PositionEnv + ?Sized,
{
    let mut seen = FxHashSet::default();
    for entry in state {
        let id = env.id_of(&entry.position);
        if !seen.insert(id) {
            return Err(Error::DuplicatePosition { id: id.clone() });
        }
    }
    return Ok(());
}

/// Resolve the order of `state` from pairwise comparisons.
pub fn order_of_state<E, V>(env: &E, state: &[Entry<E::Position, V>]) -> Result<Resolution>
where
    E: PositionEnv + ?Sized,
{
    check_unique_ids(env, state)?;

    let mut graph = Digraph::with_vertices(state.len());
    for i in 0..state.len() {
        for j in i + 1..state.len() {
            match env.compare_positions(&state[i].position, &state[j].position) {
                Relation::Less => {
                    graph.connect(i, j);
                }
                Relation::Greater => {
                    graph.connect(j, i);
                }
                Relation::Unrelated => {}
                Relation::Equal => {
                    let id = env.id_of(&state[i].position).clone();
                    return Err(Error::DuplicatePosition { id });
                }
            }
        }
    }

    let reduction = transitive_reduction(&graph)?;
    let sorted = topological_sort_by_key(&reduction, |v| env.id_of(&state[v].position))?;
    trace!(
        entries = state.len(),
        edges = graph.edge_count(),
        reduced = reduction.edge_count(),
        "resolved order"
    );
    return Ok(Resolution { reduction, sorted });
}

/// Rearrange `state` so that entry `order[i]` lands at index `i`.
///
/// `order` must be a permutation of the log's indices; anything else
/// means a resolver lost or repeated an entry.
pub fn apply_order<P, V>(state: State<P, V>, order: &[usize]) -> Result<State<P, V>> {
    let total = state.len();
    let mut slots: Vec<Option<Entry<P, V>>> = state.into_iter().map(Some).collect();
    let mut ordered = Vec::with_capacity(total);
    for &index in order {
        let entry = slots
            .get_mut(index)
            .and_then(Option::take)
            .ok_or(Error::UnresolvedOrder { remaining: total - ordered.len() })?;
        ordered.push(entry);
    }
    if ordered.len() != total {
        return Err(Error::UnresolvedOrder { remaining: total - ordered.len() });
    }
    return Ok(ordered);
}
