//! Identifier types for sequence entries.
//!
//! # Identifier Hierarchy
//!
//! - `ReplicaId`: names one participant
//! - `PositionId`: names one entry, as (replica, counter)
//! - `IdGenerator`: the per-replica counter that mints position ids
//!
//! Position ids are globally unique as long as replica ids are, since
//! each replica's counter only moves forward. They are totally ordered by
//! replica first and counter second, and that order is the tie-break of
//! last resort everywhere a deterministic choice is needed.

use std::fmt;
use std::sync::Arc;

/// A replica identifier.
///
/// Cheap to clone: every position minted by a replica shares its name.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ReplicaId(Arc<str>);

impl ReplicaId {
    pub fn new(name: &str) -> ReplicaId {
        return ReplicaId(Arc::from(name));
    }

    pub fn as_str(&self) -> &str {
        return &self.0;
    }
}

impl From<&str> for ReplicaId {
    fn from(name: &str) -> ReplicaId {
        return ReplicaId::new(name);
    }
}

impl fmt::Debug for ReplicaId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        return write!(f, "ReplicaId({})", self.0);
    }
}

impl fmt::Display for ReplicaId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        return f.write_str(&self.0);
    }
}

/// A position identifier.
///
/// The derived ordering compares `replica` first, then `counter`, which is
/// the lexicographic order the tie-breaks rely on. Keep the field order.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PositionId {
    /// The replica that minted this id.
    pub replica: ReplicaId,
    /// Monotonic per replica, starting at 0.
    pub counter: u64,
}

impl PositionId {
    pub fn new(replica: ReplicaId, counter: u64) -> PositionId {
        return PositionId { replica, counter };
    }
}

impl fmt::Debug for PositionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        return write!(f, "PositionId({}:{})", self.replica, self.counter);
    }
}

impl fmt::Display for PositionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        return write!(f, "{}:{}", self.replica, self.counter);
    }
}

/// Render an optional neighbour id, `null` when absent.
pub fn display_id(id: Option<&PositionId>) -> String {
    return match id {
        Some(id) => id.to_string(),
        None => "null".to_string(),
    };
}

/// Mints fresh position ids for a single replica.
///
/// Works like a Lamport clock: ids are handed out in increasing counter
/// order and never reused, and `observe` moves the counter past one seen
/// on another replica.
#[derive(Clone, Debug)]
pub struct IdGenerator {
    replica: ReplicaId,
    next: u64,
}

impl IdGenerator {
    /// Create a generator starting at counter 0.
    pub fn new(replica: ReplicaId) -> IdGenerator {
        return IdGenerator { replica, next: 0 };
    }

    /// The replica this generator mints for.
    pub fn replica(&self) -> &ReplicaId {
        return &self.replica;
    }

    /// The counter the next id will carry.
    #[inline]
    pub fn peek(&self) -> u64 {
        return self.next;
    }

    /// Make sure the next id carries a counter above `counter`.
    #[inline]
    pub fn observe(&mut self, counter: u64) {
        self.next = self.next.max(counter + 1);
    }

    /// Hand out the next id.
    #[inline]
    pub fn fresh(&mut self) -> PositionId {
        let id = PositionId::new(self.replica.clone(), self.next);
        self.next += 1;
        return id;
    }
}
