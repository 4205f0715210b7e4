//! Shared state store.
//!
//! One store backs every history instance attached to the same
//! environment. The stored map is replaced wholesale on commit and never
//! mutated in place, so readers always see a complete state.

use std::sync::Arc;

use parking_lot::RwLock;

use crate::state::State;

pub struct HistoryStore<V> {
    state: RwLock<Arc<State<V>>>,
}

impl<V> Default for HistoryStore<V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<V> HistoryStore<V> {
    pub fn new() -> Self {
        HistoryStore {
            state: RwLock::new(Arc::new(State::new())),
        }
    }

    /// Shared handle on the current state. Cheap; the map is not copied.
    pub fn current(&self) -> Arc<State<V>> {
        self.state.read().clone()
    }

    pub fn len(&self) -> usize {
        self.state.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.state.read().is_empty()
    }

    /// Replace the stored state. Only the change dispatcher calls this.
    pub(crate) fn commit(&self, new_state: State<V>) {
        *self.state.write() = Arc::new(new_state);
    }
}

impl<V: Clone> HistoryStore<V> {
    /// Current value for `key`, or `None` when absent.
    pub fn read(&self, key: &str) -> Option<V> {
        self.state.read().get(key).cloned()
    }

    /// Copy of the full state. Changes to the copy never reach the store.
    pub fn snapshot(&self) -> State<V> {
        self.state.read().as_ref().clone()
    }
}
