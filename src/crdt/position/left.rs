//! Positions that remember only the left neighbour.
//!
//! The right neighbour is not stored, so comparison only knows that an
//! entry comes after the entry it was typed behind. The right neighbour
//! still shapes the id: its counter, like the left one's, is pushed below
//! the new entry's, which is what lets the tree walk in `walk` put the new
//! entry in front of it.

use crate::crdt::position::PositionEnv;
use crate::crdt::primitives::id::IdGenerator;
use crate::crdt::primitives::id::PositionId;
use crate::crdt::primitives::id::ReplicaId;
use crate::crdt::primitives::id::display_id;
use crate::crdt::primitives::relation::Relation;
use crate::crdt::sequence::Entry;
use crate::crdt::walk::order_tree;
use crate::error::Result;

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct LeftPos {
    pub id: PositionId,
    pub left: Option<PositionId>,
}

#[derive(Clone, Debug)]
pub struct LeftEnv {
    ids: IdGenerator,
}

impl LeftEnv {
    pub fn new(replica: impl Into<ReplicaId>) -> LeftEnv {
        return LeftEnv { ids: IdGenerator::new(replica.into()) };
    }
}

impl PositionEnv for LeftEnv {
    type Position = LeftPos;

    fn replica(&self) -> &ReplicaId {
        return self.ids.replica();
    }

    fn new_position(&mut self, left: Option<&LeftPos>, right: Option<&LeftPos>) -> Result<LeftPos> {
        for neighbour in [left, right].into_iter().flatten() {
            self.ids.observe(neighbour.id.counter);
        }
        return Ok(LeftPos {
            id: self.ids.fresh(),
            left: left.map(|p| p.id.clone()),
        });
    }

    fn compare_positions(&self, p: &LeftPos, q: &LeftPos) -> Relation {
        if p.id == q.id {
            return Relation::Equal;
        }
        if q.left.as_ref() == Some(&p.id) {
            return Relation::Less;
        }
        if p.left.as_ref() == Some(&q.id) {
            return Relation::Greater;
        }
        return Relation::Unrelated;
    }

    fn id_of<'a>(&self, position: &'a LeftPos) -> &'a PositionId {
        return &position.id;
    }

    fn display_position(&self, position: &LeftPos) -> String {
        return format!("{}<{}>", position.id, display_id(position.left.as_ref()));
    }

    fn order<V>(&self, state: &[Entry<LeftPos, V>]) -> Result<Vec<usize>> {
        return order_tree(state);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn right_neighbour_is_ignored() {
        let mut env = LeftEnv::new("r");
        let a = env.new_position(None, None).unwrap();
        let b = env.new_position(Some(&a), None).unwrap();
        let x = env.new_position(Some(&a), Some(&b)).unwrap();
        assert_eq!(env.compare_positions(&a, &x), Relation::Less);
        assert_eq!(env.compare_positions(&b, &x), Relation::Unrelated);
        assert_eq!(env.display_position(&x), "r:2<r:0>");
    }

    #[test]
    fn counter_passes_both_neighbours() {
        let mut r = LeftEnv::new("r");
        let mut s = LeftEnv::new("s");
        let a = r.new_position(None, None).unwrap();
        let b = r.new_position(Some(&a), None).unwrap();
        let c = r.new_position(Some(&b), None).unwrap();
        // s has minted nothing yet, but still lands above a and c.
        let x = s.new_position(Some(&a), Some(&c)).unwrap();
        assert_eq!(x.id, PositionId::new("s".into(), 3));
        assert_eq!(s.new_position(None, None).unwrap().id.counter, 4);
    }
}
