//! State primitives
//!
//! Key/value state, value equality, partial updates and the shared store
//! that every history instance reads and commits through.

use std::collections::BTreeMap;

pub mod equality;
pub mod patch;
pub mod store;

pub use equality::{FnEq, Identity, StrictEq, ValueEq};
pub use patch::{shallow_merge, Candidate, Patch};
pub use store::HistoryStore;

/// Committed state: key to value. Absent keys are simply not present.
pub type State<V> = BTreeMap<String, V>;
