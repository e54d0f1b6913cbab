//! One participant's copy of a sequence.
//!
//! A replica owns its log, keeps it in resolved order, and tells a single
//! listener whenever the log changes. Mutations build the next log first
//! and install it only once ordering has succeeded, so a failed insert or
//! delete leaves the replica as it was.

use std::fmt;

use tracing::debug;
use tracing::trace;

use crate::crdt::merge::merge_states;
use crate::crdt::order::apply_order;
use crate::crdt::position::PositionEnv;
use crate::crdt::primitives::id::ReplicaId;
use crate::crdt::sequence;
use crate::crdt::sequence::State;
use crate::crdt::sequence::delete_value;
use crate::crdt::sequence::describe_state;
use crate::crdt::sequence::insert_value;
use crate::error::Result;

/// Change callback. Runs synchronously after every installed update.
pub type Listener = Box<dyn FnMut()>;

/// A replica of a sequence of `V`, using position scheme `E`.
pub struct Replica<E: PositionEnv, V> {
    id: ReplicaId,
    env: E,
    state: State<E::Position, V>,
    listener: Option<Listener>,
}

impl<E, V> Replica<E, V>
where
    E: PositionEnv,
    V: Clone + fmt::Debug,
{
    /// An empty replica named after its env.
    pub fn new(env: E) -> Replica<E, V> {
        return Replica {
            id: env.replica().clone(),
            env,
            state: Vec::new(),
            listener: None,
        };
    }

    pub fn id(&self) -> &ReplicaId {
        return &self.id;
    }

    pub fn env(&self) -> &E {
        return &self.env;
    }

    /// The log, in resolved order, tombstones included.
    pub fn state(&self) -> &State<E::Position, V> {
        return &self.state;
    }

    /// Number of live values.
    pub fn len(&self) -> usize {
        return sequence::visible_len(&self.state);
    }

    pub fn is_empty(&self) -> bool {
        return self.len() == 0;
    }

    /// The live values, in order.
    pub fn values(&self) -> Vec<V> {
        return sequence::values(&self.state);
    }

    /// Resolve the order of `state`, install it and notify the listener.
    pub fn update(&mut self, state: State<E::Position, V>) -> Result<()> {
        let order = self.env.order(&state)?;
        let state = apply_order(state, &order)?;
        trace!(replica = %self.id, state = %describe_state(&self.env, &state), "updated");
        self.state = state;
        if let Some(listener) = self.listener.as_mut() {
            listener();
        }
        return Ok(());
    }

    /// Insert `value` so that it becomes the live value at `index`.
    ///
    /// Fails with `OutOfRange` if `index > len()`.
    pub fn insert(&mut self, index: usize, value: V) -> Result<()> {
        debug!(replica = %self.id, index, ?value, "insert");
        let state = insert_value(&mut self.env, &self.state, index, value)?;
        return self.update(state);
    }

    /// Delete the live value at `index`.
    ///
    /// Fails with `NotFound` if `index >= len()`.
    pub fn delete(&mut self, index: usize) -> Result<()> {
        debug!(replica = %self.id, index, "delete");
        let state = delete_value(&self.state, index)?;
        return self.update(state);
    }

    /// Replace the listener. `None` clears it.
    pub fn on_change(&mut self, listener: Option<Listener>) {
        self.listener = listener;
    }
}

impl<E, V> fmt::Debug for Replica<E, V>
where
    E: PositionEnv,
    V: fmt::Debug,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        return f
            .debug_struct("Replica")
            .field("id", &self.id)
            .field("state", &self.state)
            .field("listener", &self.listener.is_some())
            .finish();
    }
}

/// Bring a group of replicas in sync.
///
/// Merges every replica's log, then hands the merged log to each replica,
/// which resolves its order independently.
pub fn sync_replicas<E, V>(replicas: &mut [Replica<E, V>]) -> Result<()>
where
    E: PositionEnv,
    V: Clone + fmt::Debug,
{
    let Some(first) = replicas.first() else {
        return Ok(());
    };
    let merged = merge_states(&first.env, replicas.iter().map(|replica| replica.state()))?;
    debug!(replicas = replicas.len(), entries = merged.len(), "sync");
    for replica in replicas.iter_mut() {
        replica.update(merged.clone())?;
    }
    return Ok(());
}

#[cfg(test)]
mod tests {
    use std::cell::Cell;
    use std::rc::Rc;

    use super::*;
    use crate::crdt::position::LeftRightEnv;
    use crate::error::Error;

    fn replica(name: &str) -> Replica<LeftRightEnv, char> {
        return Replica::new(LeftRightEnv::new(name));
    }

    #[test]
    fn insert_in_the_middle() {
        let mut r = replica("r");
        r.insert(0, 'a').unwrap();
        r.insert(1, 'b').unwrap();
        r.insert(1, 'x').unwrap();
        assert_eq!(r.values(), vec!['a', 'x', 'b']);
        assert_eq!(r.len(), 3);
        assert_eq!(r.id().as_str(), "r");
    }

    #[test]
    fn failed_mutations_leave_state_alone() {
        let mut r = replica("r");
        r.insert(0, 'a').unwrap();
        let before = r.state().clone();
        assert_eq!(r.insert(5, 'z').unwrap_err(), Error::OutOfRange { index: 5, len: 1 });
        assert_eq!(r.delete(1).unwrap_err(), Error::NotFound { index: 1 });
        assert_eq!(r.state(), &before);
    }

    #[test]
    fn listener_fires_per_mutation() {
        let mut r = replica("r");
        let calls = Rc::new(Cell::new(0));
        let counter = calls.clone();
        r.on_change(Some(Box::new(move || counter.set(counter.get() + 1))));
        r.insert(0, 'a').unwrap();
        r.delete(0).unwrap();
        assert_eq!(calls.get(), 2);
        assert!(r.is_empty());

        r.on_change(None);
        r.insert(0, 'b').unwrap();
        assert_eq!(calls.get(), 2);
    }

    #[test]
    fn sync_converges() {
        let mut replicas = vec![replica("r"), replica("s")];
        replicas[0].insert(0, 'a').unwrap();
        replicas[1].insert(0, 'p').unwrap();
        sync_replicas(&mut replicas).unwrap();
        assert_eq!(replicas[0].values(), replicas[1].values());
        assert_eq!(replicas[0].values(), vec!['a', 'p']);
    }

    #[test]
    fn sync_of_nothing_is_fine() {
        let mut replicas: Vec<Replica<LeftRightEnv, char>> = Vec::new();
        sync_replicas(&mut replicas).unwrap();
    }
}
