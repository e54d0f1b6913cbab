//! The replication log.
//!
//! A state is an append-ordered list of entries. Entries are never taken
//! out: deleting flips a tombstone, so a merge can always tell "never seen"
//! apart from "seen and deleted". The visible sequence is the live entries
//! in resolved order, and after `Replica::update` the log itself is kept
//! in that order, so visible indices can be found with one scan.
//!
//! Every operation here is a pure function of its inputs and returns a
//! fresh state; the caller decides when to install it.

use std::fmt;

use tracing::trace;

use crate::crdt::position::PositionEnv;
use crate::error::Error;
use crate::error::Result;

/// One logged value.
#[derive(Clone, Debug, PartialEq)]
pub struct Entry<P, V> {
    pub position: P,
    pub value: V,
    /// Set once, never cleared.
    pub deleted: bool,
}

impl<P, V> Entry<P, V> {
    /// A live entry.
    pub fn new(position: P, value: V) -> Entry<P, V> {
        return Entry { position, value, deleted: false };
    }
}

/// A replication log.
pub type State<P, V> = Vec<Entry<P, V>>;

/// Log index of the live entry at visible index `index`.
pub fn find_entry_index<P, V>(state: &[Entry<P, V>], index: usize) -> Option<usize> {
    return state
        .iter()
        .enumerate()
        .filter(|(_, entry)| !entry.deleted)
        .nth(index)
        .map(|(k, _)| k);
}

/// Number of live entries.
pub fn visible_len<P, V>(state: &[Entry<P, V>]) -> usize {
    return state.iter().filter(|entry| !entry.deleted).count();
}

/// The live values, in log order.
pub fn values<P, V: Clone>(state: &[Entry<P, V>]) -> Vec<V> {
    return state
        .iter()
        .filter(|entry| !entry.deleted)
        .map(|entry| entry.value.clone())
        .collect();
}

/// Append a new entry that lands at visible index `index`.
///
/// The new position is minted between the live entries currently at
/// `index - 1` and `index`. Fails with `OutOfRange` past the end.
pub fn insert_value<E, V>(
    env: &mut E,
    state: &[Entry<E::Position, V>],
    index: usize,
    value: V,
) -> Result<State<E::Position, V>>
where
    E: PositionEnv,
    V: Clone,
{
    let len = visible_len(state);
    if index > len {
        return Err(Error::OutOfRange { index, len });
    }
    let left = match index {
        0 => None,
        _ => find_entry_index(state, index - 1),
    };
    let right = find_entry_index(state, index);
    trace!(?left, ?right, "neighbours for insert");
    let position = env.new_position(
        left.map(|k| &state[k].position),
        right.map(|k| &state[k].position),
    )?;
    let mut next = Vec::with_capacity(state.len() + 1);
    next.extend_from_slice(state);
    next.push(Entry::new(position, value));
    return Ok(next);
}

/// Tombstone the live entry at visible index `index`.
///
/// Fails with `NotFound` if there is no such entry.
pub fn delete_value<P, V>(state: &[Entry<P, V>], index: usize) -> Result<State<P, V>>
where
    P: Clone,
    V: Clone,
{
    let k = find_entry_index(state, index).ok_or(Error::NotFound { index })?;
    let mut next = state.to_vec();
    next[k].deleted = true;
    return Ok(next);
}

/// Render a log as two lines: values (deleted ones in parentheses) and
/// positions.
pub fn describe_state<E, V>(env: &E, state: &[Entry<E::Position, V>]) -> String
where
    E: PositionEnv + ?Sized,
    V: fmt::Debug,
{
    let mut values = String::new();
    let mut positions = String::new();
    for (i, entry) in state.iter().enumerate() {
        if i > 0 {
            values.push(' ');
            positions.push(' ');
        }
        if entry.deleted {
            values.push_str(&format!("({:?})", entry.value));
        } else {
            values.push_str(&format!("{:?}", entry.value));
        }
        positions.push_str(&env.display_position(&entry.position));
    }
    return format!("values: {}\npositions: {}", values, positions);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crdt::position::LeftRightEnv;

    #[test]
    fn visible_index_skips_tombstones() {
        let mut env = LeftRightEnv::new("r");
        let state = insert_value(&mut env, &[], 0, 'a').unwrap();
        let state = insert_value(&mut env, &state, 1, 'b').unwrap();
        let state = insert_value(&mut env, &state, 2, 'c').unwrap();
        let state = delete_value(&state, 1).unwrap();
        assert_eq!(find_entry_index(&state, 0), Some(0));
        assert_eq!(find_entry_index(&state, 1), Some(2));
        assert_eq!(find_entry_index(&state, 2), None);
        assert_eq!(visible_len(&state), 2);
        assert_eq!(values(&state), vec!['a', 'c']);
    }

    #[test]
    fn insert_records_live_neighbours() {
        let mut env = LeftRightEnv::new("r");
        let state = insert_value(&mut env, &[], 0, 'a').unwrap();
        let state = insert_value(&mut env, &state, 1, 'b').unwrap();
        let state = insert_value(&mut env, &state, 1, 'x').unwrap();
        let x = &state[2].position;
        assert_eq!(x.left.as_ref(), Some(&state[0].position.id));
        assert_eq!(x.right.as_ref(), Some(&state[1].position.id));
    }

    #[test]
    fn insert_past_the_end_is_out_of_range() {
        let mut env = LeftRightEnv::new("r");
        let state = insert_value(&mut env, &[], 0, 'a').unwrap();
        let err = insert_value(&mut env, &state, 2, 'z').unwrap_err();
        assert_eq!(err, Error::OutOfRange { index: 2, len: 1 });
    }

    #[test]
    fn delete_twice_is_not_found() {
        let mut env = LeftRightEnv::new("r");
        let state = insert_value(&mut env, &[], 0, 'a').unwrap();
        let state = delete_value(&state, 0).unwrap();
        assert_eq!(state.len(), 1);
        assert_eq!(delete_value(&state, 0).unwrap_err(), Error::NotFound { index: 0 });
    }

    #[test]
    fn describe_marks_tombstones() {
        let mut env = LeftRightEnv::new("r");
        let state = insert_value(&mut env, &[], 0, 'a').unwrap();
        let state = insert_value(&mut env, &state, 1, 'b').unwrap();
        let state = delete_value(&state, 0).unwrap();
        let text = describe_state(&env, &state);
        assert_eq!(text, "values: ('a') 'b'\npositions: r:0<null, null> r:1<r:0, null>");
    }
}
