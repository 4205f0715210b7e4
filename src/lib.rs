//! Histate: Shared History State With Change Notification
//!
//! A key/value state container shared by every `History` instance built on
//! the same `HistoryEnv`. Mutations are shallow-merged, reduced to the keys
//! that actually changed, committed, and announced through a global `change`
//! event plus one `<key>Change` / `<key>Remove` event per affected key.

pub mod change;
pub mod cli;
pub mod config;
pub mod error;
pub mod events;
pub mod history;
pub mod json;
pub mod logging;
pub mod script;
pub mod state;

pub use change::{ChangeSet, ValueChange};
pub use error::{HistoryError, HistoryResult};
pub use events::{
    EventFilter, HistoryEvent, InstanceId, ItemChange, ItemEvent, Notification, Notifier, Phase,
    Scope, StateChange, SubscriptionId,
};
pub use history::{History, HistoryEnv, HistoryOptions, WeakHistory, DEFAULT_NAME};
pub use state::{FnEq, Identity, Patch, State, StrictEq, ValueEq};
