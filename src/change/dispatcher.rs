//! Change dispatcher: announces and commits, or commits quietly.

use tracing::debug;

use crate::change::ChangeSet;
use crate::events::{HistoryEvent, InstanceId, ItemEvent, Notifier, StateChange};
use crate::state::HistoryStore;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DispatchMode {
    /// Fire the global change event (whose default handling commits), then
    /// one item event per changed or removed key.
    Notify,
    /// Commit without firing anything.
    Silent,
}

pub struct Dispatcher<'a, V> {
    store: &'a HistoryStore<V>,
    notifier: &'a dyn Notifier<V>,
    source: InstanceId,
}

impl<'a, V: Clone> Dispatcher<'a, V> {
    pub fn new(store: &'a HistoryStore<V>, notifier: &'a dyn Notifier<V>, source: InstanceId) -> Self {
        Dispatcher {
            store,
            notifier,
            source,
        }
    }

    pub fn dispatch(&self, changes: ChangeSet<V>, mode: DispatchMode) {
        debug!(
            source = %self.source,
            ?mode,
            changed = changes.changed.len(),
            removed = changes.removed.len(),
            "dispatching state change"
        );
        match mode {
            DispatchMode::Silent => self.store.commit(changes.new_state),
            DispatchMode::Notify => self.notify(changes),
        }
    }

    fn notify(&self, changes: ChangeSet<V>) {
        let mut pending = Some(changes.new_state.clone());
        let event = HistoryEvent::Change(StateChange::from(changes));

        self.notifier.fire(self.source, &event, &mut || {
            if let Some(state) = pending.take() {
                self.store.commit(state);
            }
        });

        // The change event cannot be prevented.
        if let Some(state) = pending.take() {
            debug!(source = %self.source, "notifier skipped default handling; committing");
            self.store.commit(state);
        }

        let HistoryEvent::Change(change) = event else {
            return;
        };
        for (key, value) in change.changed {
            let item = HistoryEvent::Item(ItemEvent::changed(key, value));
            self.notifier.fire(self.source, &item, &mut || {});
        }
        for (key, prev_val) in change.removed {
            let item = HistoryEvent::Item(ItemEvent::removed(key, prev_val));
            self.notifier.fire(self.source, &item, &mut || {});
        }
    }
}
