//! Shared primitives for the sequence store.
//!
//! # Primitives
//!
//! ## Orders
//! - `Relation`: less, equal, greater, or unrelated
//! - `Order`: comparator objects (`Natural`, `ByKey`, `FnOrder`)
//!
//! ## IDs
//! - `ReplicaId`: participant name
//! - `PositionId`: entry identifier (replica, counter)
//! - `IdGenerator`: per-replica counter
//!
//! ## Trees
//! - `RbTree`: persistent red-black tree with structural sharing
//! - `RbSet`: ordered set with union, difference, intersection, filter
//! - `RbMap`: ordered map, compared by key alone
//!
//! ## Graphs
//! - `Digraph`: dense-index directed graph
//! - transitive reduction and closure
//! - Kahn's topological sort with a key tie-break

pub mod graph;
pub mod id;
pub mod rb_map;
pub mod rb_set;
pub mod rb_tree;
pub mod relation;

// Re-exports for convenience
pub use graph::Digraph;
pub use id::IdGenerator;
pub use id::PositionId;
pub use id::ReplicaId;
pub use rb_map::RbMap;
pub use rb_set::RbSet;
pub use rb_tree::RbTree;
pub use relation::Natural;
pub use relation::Order;
pub use relation::Relation;
