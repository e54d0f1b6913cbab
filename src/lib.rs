//! Weave - replicated ordered sequences that merge without a coordinator.
//!
//! # Quick Start
//!
//! ```
//! use weave::crdt::position::LeftRightEnv;
//! use weave::crdt::Replica;
//! use weave::crdt::sync_replicas;
//!
//! // Two replicas edit independently.
//! let mut replicas: Vec<Replica<LeftRightEnv, char>> = vec![
//!     Replica::new(LeftRightEnv::new("r")),
//!     Replica::new(LeftRightEnv::new("s")),
//! ];
//! replicas[0].insert(0, 'a').unwrap();
//! replicas[0].insert(1, 'b').unwrap();
//! replicas[0].insert(1, 'x').unwrap();
//! assert_eq!(replicas[0].values(), vec!['a', 'x', 'b']);
//! replicas[1].insert(0, 'p').unwrap();
//!
//! // Merge their logs; both end up with the same sequence.
//! sync_replicas(&mut replicas).unwrap();
//! assert_eq!(replicas[0].values(), vec!['a', 'x', 'b', 'p']);
//! assert_eq!(replicas[1].values(), replicas[0].values());
//! ```

pub mod crdt;
pub mod error;

pub use error::Error;
pub use error::Result;
