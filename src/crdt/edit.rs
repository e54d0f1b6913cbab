//! Turning whole-value replacements into edits.
//!
//! Text widgets report "the content is now X", not what changed. `diff`
//! recovers single-element inserts and deletes from the old and new
//! contents with a greedy scan: skip a common prefix, trim a common
//! suffix, and delete the first mismatched old element until one side
//! runs out. Not minimal in general, but typing and pasting at one spot
//! produce exactly the edit that was made.

use std::fmt;

use tracing::debug;

use crate::crdt::position::PositionEnv;
use crate::crdt::replica::Replica;
use crate::error::Result;

/// One single-element edit, addressed by visible index at the time it is
/// applied.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Edit<V> {
    Insert { index: usize, value: V },
    Delete { index: usize },
}

/// The edits that turn `old` into `new`.
///
/// `cursor` is the caret offset in `new`, if known. When everything after
/// the caret is unchanged, the scan is confined to the text before it.
pub fn diff<V: Clone + PartialEq>(old: &[V], new: &[V], cursor: Option<usize>) -> Vec<Edit<V>> {
    let mut edits = Vec::new();
    if let Some(cursor) = cursor {
        if same_tail(old, new, cursor) {
            let n = new.len() - cursor;
            greedy(&old[..old.len() - n], &new[..cursor], &mut edits);
            return edits;
        }
    }
    greedy(old, new, &mut edits);
    return edits;
}

/// True if the `new.len() - cursor` trailing elements of both sides agree.
fn same_tail<V: PartialEq>(old: &[V], new: &[V], cursor: usize) -> bool {
    if cursor > new.len() {
        return false;
    }
    let n = new.len() - cursor;
    if n > old.len() {
        return false;
    }
    return old[old.len() - n..] == new[cursor..];
}

fn greedy<V: Clone + PartialEq>(mut old: &[V], mut new: &[V], edits: &mut Vec<Edit<V>>) {
    let mut index = 0;
    loop {
        if old.is_empty() {
            for value in new {
                edits.push(Edit::Insert { index, value: value.clone() });
                index += 1;
            }
            return;
        }
        if new.is_empty() {
            for _ in old {
                edits.push(Edit::Delete { index });
            }
            return;
        }
        if old[0] == new[0] {
            index += 1;
            old = &old[1..];
            new = &new[1..];
        } else if old[old.len() - 1] == new[new.len() - 1] {
            old = &old[..old.len() - 1];
            new = &new[..new.len() - 1];
        } else {
            edits.push(Edit::Delete { index });
            old = &old[1..];
        }
    }
}

/// Apply edits to a plain vector, as a replica would see them.
pub fn apply_edits<V: Clone>(values: &mut Vec<V>, edits: &[Edit<V>]) {
    for edit in edits {
        match edit {
            Edit::Insert { index, value } => values.insert(*index, value.clone()),
            Edit::Delete { index } => {
                values.remove(*index);
            }
        }
    }
}

/// Bring `replica` to `values` through single-element inserts and deletes.
///
/// The listener fires once per edit.
pub fn edit_replica<E, V>(replica: &mut Replica<E, V>, values: &[V], cursor: Option<usize>) -> Result<()>
where
    E: PositionEnv,
    V: Clone + PartialEq + fmt::Debug,
{
    let edits = diff(&replica.values(), values, cursor);
    debug!(replica = %replica.id(), edits = edits.len(), ?cursor, "edit");
    for edit in edits {
        match edit {
            Edit::Insert { index, value } => replica.insert(index, value)?,
            Edit::Delete { index } => replica.delete(index)?,
        }
    }
    return Ok(());
}
