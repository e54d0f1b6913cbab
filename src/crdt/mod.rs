//! Replicated ordered sequences.
//!
//! Each replica keeps a log of `(position, value, deleted)` entries.
//! Positions are minted by a pluggable scheme and compared without any
//! global context; the order resolvers turn those comparisons into one
//! sequence, the same on every replica that holds the same entries.
//!
//! Data flow: `edit_replica` diffs a new value list into inserts and
//! deletes, the `Replica` appends or tombstones entries and re-resolves
//! its order, and `sync_replicas` merges logs across replicas.

pub mod edit;
pub mod integrate;
pub mod merge;
pub mod order;
pub mod position;
pub mod primitives;
pub mod replica;
pub mod sequence;
pub mod walk;

pub use edit::Edit;
pub use edit::diff;
pub use edit::edit_replica;
pub use merge::merge_states;
pub use order::Resolution;
pub use order::order_of_state;
pub use position::PositionEnv;
pub use replica::Replica;
pub use replica::sync_replicas;
pub use sequence::Entry;
pub use sequence::State;
