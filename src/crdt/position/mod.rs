//! Position schemes.
//!
//! A position is the metadata an entry carries so that any replica can
//! place it relative to other entries without asking anyone. A scheme
//! mints positions for "between these two neighbours" and judges how two
//! positions relate. Positions minted independently at unrelated places
//! come back `Unrelated`; the order resolver settles those by id.
//!
//! # Schemes
//!
//! - `LeftRightEnv`: records both neighbour ids at creation time
//! - `LeftEnv`: records the left neighbour only
//! - `FractionEnv`: embeds every entry in a dense fraction space

pub mod fraction;
pub mod left;
pub mod left_right;

use std::fmt;

use crate::crdt::order::order_of_state;
use crate::crdt::primitives::id::PositionId;
use crate::crdt::primitives::id::ReplicaId;
use crate::crdt::primitives::relation::Relation;
use crate::crdt::sequence::Entry;
use crate::error::Result;

pub use fraction::Fraction;
pub use fraction::FractionEnv;
pub use fraction::FractionPos;
pub use left::LeftEnv;
pub use left::LeftPos;
pub use left_right::LeftRightEnv;
pub use left_right::LeftRightPos;

/// The capabilities every position scheme provides.
///
/// One env belongs to one replica: it owns that replica's id counter, so
/// minting needs `&mut self`. Comparison and id lookup are pure and must
/// give the same answer on every replica, which is what makes merging
/// commutative.
pub trait PositionEnv {
    type Position: Clone + PartialEq + fmt::Debug;

    /// The replica this env mints positions for.
    fn replica(&self) -> &ReplicaId;

    /// Mint a position between `left` and `right`. `None` stands for the
    /// start or the end of the sequence.
    fn new_position(
        &mut self,
        left: Option<&Self::Position>,
        right: Option<&Self::Position>,
    ) -> Result<Self::Position>;

    /// How `p` relates to `q`. Never `Equal` for positions with distinct ids.
    fn compare_positions(&self, p: &Self::Position, q: &Self::Position) -> Relation;

    fn id_of<'a>(&self, position: &'a Self::Position) -> &'a PositionId;

    /// Human-readable form, for logs and test failures.
    fn display_position(&self, position: &Self::Position) -> String;

    /// Resolve the order of a log: a permutation of `0..state.len()`.
    ///
    /// The default runs the general pairwise resolver. Schemes with more
    /// structure can override it with something cheaper.
    fn order<V>(&self, state: &[Entry<Self::Position, V>]) -> Result<Vec<usize>> {
        return Ok(order_of_state(self, state)?.sorted);
    }
}
