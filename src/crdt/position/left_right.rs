//! Positions that remember both neighbours.
//!
//! An entry inserted between `a` and `b` records `a`'s and `b`'s ids and
//! nothing else. Two positions are related only when one names the other
//! as a neighbour, so comparison needs no context beyond the pair.

use crate::crdt::integrate::order_state;
use crate::crdt::position::PositionEnv;
use crate::crdt::primitives::id::IdGenerator;
use crate::crdt::primitives::id::PositionId;
use crate::crdt::primitives::id::ReplicaId;
use crate::crdt::primitives::id::display_id;
use crate::crdt::primitives::relation::Relation;
use crate::crdt::sequence::Entry;
use crate::error::Result;

/// A position with its neighbours at creation time.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct LeftRightPos {
    pub id: PositionId,
    pub left: Option<PositionId>,
    pub right: Option<PositionId>,
}

/// Mints `LeftRightPos` values for one replica.
#[derive(Clone, Debug)]
pub struct LeftRightEnv {
    ids: IdGenerator,
}

impl LeftRightEnv {
    pub fn new(replica: impl Into<ReplicaId>) -> LeftRightEnv {
        return LeftRightEnv { ids: IdGenerator::new(replica.into()) };
    }
}

impl PositionEnv for LeftRightEnv {
    type Position = LeftRightPos;

    fn replica(&self) -> &ReplicaId {
        return self.ids.replica();
    }

    fn new_position(
        &mut self,
        left: Option<&LeftRightPos>,
        right: Option<&LeftRightPos>,
    ) -> Result<LeftRightPos> {
        return Ok(LeftRightPos {
            id: self.ids.fresh(),
            left: left.map(|p| p.id.clone()),
            right: right.map(|p| p.id.clone()),
        });
    }

    fn compare_positions(&self, p: &LeftRightPos, q: &LeftRightPos) -> Relation {
        if p.id == q.id {
            return Relation::Equal;
        }
        if q.left.as_ref() == Some(&p.id) {
            return Relation::Less;
        }
        if q.right.as_ref() == Some(&p.id) {
            return Relation::Greater;
        }
        if p.left.as_ref() == Some(&q.id) {
            return Relation::Greater;
        }
        if p.right.as_ref() == Some(&q.id) {
            return Relation::Less;
        }
        return Relation::Unrelated;
    }

    fn id_of<'a>(&self, position: &'a LeftRightPos) -> &'a PositionId {
        return &position.id;
    }

    fn display_position(&self, position: &LeftRightPos) -> String {
        return format!(
            "{}<{}, {}>",
            position.id,
            display_id(position.left.as_ref()),
            display_id(position.right.as_ref()),
        );
    }

    /// Neighbour-driven integration instead of pairwise comparison.
    fn order<V>(&self, state: &[Entry<LeftRightPos, V>]) -> Result<Vec<usize>> {
        return order_state(state);
    }
}
