//! History events
//!
//! A notifying mutation produces one global change event followed by one
//! item event per affected key. Events are handed to a [`Notifier`], the
//! seam through which any event substrate plugs in; [`EventHub`] is the
//! in-process default.

use std::collections::BTreeMap;
use std::fmt;

use serde::Serialize;

use crate::change::{ChangeSet, ValueChange};
use crate::state::State;

pub mod hub;

pub use hub::{EventFilter, EventHub, Listener, Notification, Phase, Relay, Scope, SubscriptionId};

/// Prefix of qualified event names.
pub const EVENT_PREFIX: &str = "history";

/// Name of the global change event.
pub const CHANGE_EVENT: &str = "change";

/// Identity of the history instance that issued a mutation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct InstanceId(u64);

impl InstanceId {
    pub fn new(raw: u64) -> Self {
        InstanceId(raw)
    }

    pub fn as_u64(self) -> u64 {
        self.0
    }
}

impl fmt::Display for InstanceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "history#{}", self.0)
    }
}

/// Payload of the global change event.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StateChange<V> {
    pub changed: BTreeMap<String, ValueChange<V>>,
    pub removed: BTreeMap<String, V>,
    /// Full state after the change.
    pub new_val: State<V>,
    /// Full state before the change.
    pub prev_val: State<V>,
}

impl<V> From<ChangeSet<V>> for StateChange<V> {
    fn from(changes: ChangeSet<V>) -> Self {
        StateChange {
            changed: changes.changed,
            removed: changes.removed,
            new_val: changes.new_state,
            prev_val: changes.prev_state,
        }
    }
}

/// What happened to a single key.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ItemChange<V> {
    Changed { new_val: V, prev_val: Option<V> },
    Removed { prev_val: V },
}

/// Per-key notification.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ItemEvent<V> {
    pub key: String,
    pub change: ItemChange<V>,
}

impl<V> ItemEvent<V> {
    pub fn changed(key: impl Into<String>, change: ValueChange<V>) -> Self {
        ItemEvent {
            key: key.into(),
            change: ItemChange::Changed {
                new_val: change.new_val,
                prev_val: change.prev_val,
            },
        }
    }

    pub fn removed(key: impl Into<String>, prev_val: V) -> Self {
        ItemEvent {
            key: key.into(),
            change: ItemChange::Removed { prev_val },
        }
    }

    pub fn is_removal(&self) -> bool {
        matches!(self.change, ItemChange::Removed { .. })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum HistoryEvent<V> {
    Change(StateChange<V>),
    Item(ItemEvent<V>),
}

impl<V> HistoryEvent<V> {
    /// Conventional event name: `change`, `<key>Change` or `<key>Remove`.
    pub fn name(&self) -> String {
        match self {
            HistoryEvent::Change(_) => CHANGE_EVENT.to_string(),
            HistoryEvent::Item(item) => match item.change {
                ItemChange::Changed { .. } => format!("{}Change", item.key),
                ItemChange::Removed { .. } => format!("{}Remove", item.key),
            },
        }
    }

    /// Event name with the `history:` prefix.
    pub fn qualified_name(&self) -> String {
        format!("{}:{}", EVENT_PREFIX, self.name())
    }

    pub fn key(&self) -> Option<&str> {
        match self {
            HistoryEvent::Change(_) => None,
            HistoryEvent::Item(item) => Some(&item.key),
        }
    }

    pub fn as_change(&self) -> Option<&StateChange<V>> {
        match self {
            HistoryEvent::Change(change) => Some(change),
            HistoryEvent::Item(_) => None,
        }
    }

    pub fn as_item(&self) -> Option<&ItemEvent<V>> {
        match self {
            HistoryEvent::Item(item) => Some(item),
            HistoryEvent::Change(_) => None,
        }
    }
}

/// Event substrate used by the change dispatcher.
///
/// `fire` delivers `event` synchronously and must invoke `default_fn`
/// exactly once, between the listeners that see the event before and after
/// its default handling. For the global change event the default handling
/// is the commit; item events pass a no-op.
pub trait Notifier<V>: Send + Sync {
    fn fire(&self, source: InstanceId, event: &HistoryEvent<V>, default_fn: &mut dyn FnMut());
}
