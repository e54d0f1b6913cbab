//! Merging replication logs.
//!
//! The merged log holds every position id seen in any input exactly once.
//! When inputs disagree about an id, the tombstoned copy wins: the only
//! way two copies of an entry can differ is that one replica has deleted
//! it. Output is in id order, so the result does not depend on the order
//! of the inputs. Merging is commutative, associative and idempotent.

use tracing::debug;

use crate::crdt::position::PositionEnv;
use crate::crdt::primitives::id::PositionId;
use crate::crdt::primitives::rb_map::RbMap;
use crate::crdt::sequence::Entry;
use crate::crdt::sequence::State;
use crate::error::Result;

/// Merge any number of logs into one.
pub fn merge_states<E, V, I, S>(env: &E, states: I) -> Result<State<E::Position, V>>
where
    E: PositionEnv + ?Sized,
    V: Clone,
    I: IntoIterator<Item = S>,
    S: AsRef<[Entry<E::Position, V>]>,
{
    // id -> slot in `entries`
    let mut index: RbMap<PositionId, usize> = RbMap::default();
    let mut entries: Vec<Entry<E::Position, V>> = Vec::new();
    let mut inputs = 0;
    for state in states {
        inputs += 1;
        for entry in state.as_ref() {
            let id = env.id_of(&entry.position);
            match index.get(id)? {
                None => {
                    index = index.set(id.clone(), entries.len())?;
                    entries.push(entry.clone());
                }
                Some(&slot) => {
                    if entry.deleted {
                        entries[slot].deleted = true;
                    }
                }
            }
        }
    }
    let merged: State<E::Position, V> = index.values().map(|&slot| entries[slot].clone()).collect();
    debug!(inputs, entries = merged.len(), "merged states");
    return Ok(merged);
}
