//! Error type shared by the tree, the position schemes and the replica.
//!
//! Two kinds of failure exist. Usage errors (`OutOfRange`, `NotFound`) are
//! reported before anything is mutated. Everything else is an invariant
//! violation: a bug in a comparator, a position scheme or the tree itself,
//! and the operation that hit it is abandoned.

use thiserror::Error;

use crate::crdt::primitives::id::PositionId;

/// Errors produced by the sequence store.
#[non_exhaustive]
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Error {
    /// An insert index lies past the end of the visible sequence.
    #[error("index {index} out of range for visible length {len}")]
    OutOfRange { index: usize, len: usize },

    /// A delete index does not name a live entry.
    #[error("no live value at index {index}")]
    NotFound { index: usize },

    /// The comparator handed to the tree returned `Unrelated`.
    #[error("cannot compare {left} with {right}")]
    CannotCompare { left: String, right: String },

    /// Red-black colouring was broken when rebalancing after a delete.
    #[error("red-black tree invariant violated")]
    MalformedTree,

    /// Two entries of one log share a position id.
    #[error("position {id} appears twice in one log")]
    DuplicatePosition { id: PositionId },

    /// A position refers to a neighbour that is not in the log.
    #[error("cannot find position {id}")]
    UnknownPosition { id: PositionId },

    /// The positions of a log order each other in a cycle.
    #[error("positions are ordered cyclically")]
    CyclicOrder,

    /// Topological sorting finished with edges left over.
    #[error("topological sort left {remaining} edges unresolved")]
    UnresolvedOrder { remaining: usize },

    /// A fraction was requested between bounds that are not strictly ordered.
    #[error("no fraction exists between {lower} and {upper}")]
    NoFractionBetween { lower: String, upper: String },
}

/// Convenience alias used throughout the crate.
pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    /// True for errors caused by the caller passing a bad index.
    pub fn is_usage_error(&self) -> bool {
        return matches!(self, Error::OutOfRange { .. } | Error::NotFound { .. });
    }

    /// True for errors that signal a programming error in this crate or in
    /// a position scheme. These are never worth retrying.
    pub fn is_invariant_violation(&self) -> bool {
        return !self.is_usage_error();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn usage_errors_are_classified() {
        assert!(Error::OutOfRange { index: 3, len: 2 }.is_usage_error());
        assert!(Error::NotFound { index: 0 }.is_usage_error());
        assert!(!Error::CyclicOrder.is_usage_error());
    }

    #[test]
    fn invariant_violations_are_classified() {
        assert!(Error::MalformedTree.is_invariant_violation());
        assert!(Error::UnresolvedOrder { remaining: 1 }.is_invariant_violation());
        assert!(!Error::NotFound { index: 1 }.is_invariant_violation());
    }

    #[test]
    fn messages_name_the_index() {
        let err = Error::OutOfRange { index: 7, len: 4 };
        assert_eq!(err.to_string(), "index 7 out of range for visible length 4");
    }
}
