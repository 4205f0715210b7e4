//! Change resolution and dispatch
//!
//! A reconciliation diffs a merged candidate against the previous state
//! (`resolver`) and then either announces and commits the result or commits
//! it quietly (`dispatcher`).

use std::collections::BTreeMap;

use serde::Serialize;

use crate::state::State;

pub mod dispatcher;
pub mod resolver;

pub use dispatcher::{DispatchMode, Dispatcher};
pub use resolver::resolve;

/// New and previous value of an added or changed key.
///
/// `prev_val` is `None` when the key was newly added.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ValueChange<V> {
    pub new_val: V,
    pub prev_val: Option<V>,
}

/// Diff produced by one reconciliation.
#[derive(Debug, Clone, PartialEq)]
pub struct ChangeSet<V> {
    /// Added or changed keys.
    pub changed: BTreeMap<String, ValueChange<V>>,
    /// Removed keys with their value prior to removal.
    pub removed: BTreeMap<String, V>,
    /// State to commit, with removed keys stripped.
    pub new_state: State<V>,
    /// State before this reconciliation.
    pub prev_state: State<V>,
}

impl<V> ChangeSet<V> {
    pub fn is_empty(&self) -> bool {
        self.changed.is_empty() && self.removed.is_empty()
    }

    /// Every key touched by this change set, changed keys first.
    pub fn affected_keys(&self) -> impl Iterator<Item = &str> {
        self.changed
            .keys()
            .chain(self.removed.keys())
            .map(String::as_str)
    }
}
