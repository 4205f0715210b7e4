//! History instance facade.
//!
//! A `History` is a lightweight handle on a shared [`HistoryEnv`]. Every
//! instance attached to the same environment reads and mutates the same
//! state; clones of a handle are the same instance.

use std::fmt;
use std::sync::{Arc, Weak};

use tracing::{trace, warn};

use crate::change::DispatchMode;
use crate::error::HistoryResult;
use crate::events::{
    EventFilter, InstanceId, Notification, Notifier, Phase, Relay, Scope, SubscriptionId,
};
use crate::history::env::{HistoryEnv, Reconciliation};
use crate::state::{Patch, State};

/// Default instance name.
pub const DEFAULT_NAME: &str = "historyBase";

/// Construction options for a [`History`].
pub struct HistoryOptions<V> {
    pub name: String,
    /// Merged into the shared state on construction through the notifying
    /// path, exactly like a call to `add`.
    pub initial_state: Option<Patch<V>>,
    /// Substrate receiving this instance's events. Defaults to the
    /// environment's hub.
    pub notifier: Option<Arc<dyn Notifier<V>>>,
}

impl<V> Default for HistoryOptions<V> {
    fn default() -> Self {
        HistoryOptions {
            name: DEFAULT_NAME.to_string(),
            initial_state: None,
            notifier: None,
        }
    }
}

impl<V> HistoryOptions<V> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    pub fn initial_state(mut self, state: impl Into<Patch<V>>) -> Self {
        self.initial_state = Some(state.into());
        self
    }

    pub fn notifier(mut self, notifier: Arc<dyn Notifier<V>>) -> Self {
        self.notifier = Some(notifier);
        self
    }
}

struct Inner<V> {
    id: InstanceId,
    name: String,
    env: Arc<HistoryEnv<V>>,
    notifier: Arc<dyn Notifier<V>>,
    custom_notifier: bool,
}

impl<V> Drop for Inner<V> {
    fn drop(&mut self) {
        let released = self.env.events().unsubscribe_instance(self.id);
        trace!(instance = %self.id, released, "history instance dropped");
    }
}

/// Handle on one history instance. Clones are the same instance; the
/// instance's subscriptions are released when the last clone is dropped.
///
/// A listener that needs the instance should capture a [`WeakHistory`]
/// from [`downgrade`](Self::downgrade). A strong clone held by one of the
/// instance's own listeners keeps it alive for as long as the environment.
pub struct History<V> {
    inner: Arc<Inner<V>>,
}

/// Non-owning handle on a [`History`].
pub struct WeakHistory<V> {
    inner: Weak<Inner<V>>,
}

impl<V> WeakHistory<V> {
    /// The instance, if any strong handle is still alive.
    pub fn upgrade(&self) -> Option<History<V>> {
        self.inner.upgrade().map(|inner| History { inner })
    }
}

impl<V> Clone for WeakHistory<V> {
    fn clone(&self) -> Self {
        WeakHistory {
            inner: self.inner.clone(),
        }
    }
}

impl<V> Clone for History<V> {
    fn clone(&self) -> Self {
        History {
            inner: self.inner.clone(),
        }
    }
}

impl<V> fmt::Debug for History<V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("History")
            .field("id", &self.inner.id)
            .field("name", &self.inner.name)
            .finish()
    }
}

impl<V> History<V>
where
    V: Clone + Send + Sync + 'static,
{
    /// Attach a new instance to `env`.
    pub fn new(env: &Arc<HistoryEnv<V>>) -> Self {
        History {
            inner: Arc::new(Inner {
                id: env.allocate_instance(),
                name: DEFAULT_NAME.to_string(),
                env: env.clone(),
                notifier: env.events().clone(),
                custom_notifier: false,
            }),
        }
    }

    /// Attach a new instance and apply `options`.
    ///
    /// An initial state is added with notification, so process-scoped
    /// listeners already registered on the environment observe it. Listeners
    /// on the new instance itself cannot exist yet.
    ///
    /// A custom notifier receives every event of the instance. The global
    /// change event is still broadcast to the environment's process-scoped
    /// listeners.
    pub fn with_options(env: &Arc<HistoryEnv<V>>, options: HistoryOptions<V>) -> HistoryResult<Self> {
        let custom_notifier = options.notifier.is_some();
        let notifier: Arc<dyn Notifier<V>> = match options.notifier {
            Some(notifier) => Arc::new(Relay::new(env.events().clone(), notifier)),
            None => env.events().clone(),
        };
        let history = History {
            inner: Arc::new(Inner {
                id: env.allocate_instance(),
                name: options.name,
                env: env.clone(),
                notifier,
                custom_notifier,
            }),
        };
        if let Some(initial) = options.initial_state {
            history.add(initial)?;
        }
        Ok(history)
    }

    pub fn id(&self) -> InstanceId {
        self.inner.id
    }

    pub fn name(&self) -> &str {
        &self.inner.name
    }

    pub fn env(&self) -> &Arc<HistoryEnv<V>> {
        &self.inner.env
    }

    pub fn downgrade(&self) -> WeakHistory<V> {
        WeakHistory {
            inner: Arc::downgrade(&self.inner),
        }
    }

    /// Merge `state` into the shared state and announce the change.
    ///
    /// Keys mapped to `None` are removed. A merge that changes nothing fires
    /// nothing.
    ///
    /// Called from a listener while a change is being dispatched, the
    /// mutation is queued and applied once that change has finished. It
    /// returns before the state is updated, so a `get` right after it still
    /// reads the old value.
    pub fn add(&self, state: impl Into<Patch<V>>) -> HistoryResult<&Self> {
        self.mutate(state.into(), DispatchMode::Notify)
    }

    /// Same state update as [`add`](Self::add), without any events.
    ///
    /// Queued the same way as `add` when called from a listener.
    pub fn replace(&self, state: impl Into<Patch<V>>) -> HistoryResult<&Self> {
        self.mutate(state.into(), DispatchMode::Silent)
    }

    /// Single key form of [`add`](Self::add).
    pub fn add_item(&self, key: impl Into<String>, value: Option<V>) -> HistoryResult<&Self> {
        self.add(Patch::single(key, value))
    }

    /// Single key form of [`replace`](Self::replace).
    pub fn replace_item(&self, key: impl Into<String>, value: Option<V>) -> HistoryResult<&Self> {
        self.replace(Patch::single(key, value))
    }

    /// Current value of `key`.
    pub fn get(&self, key: &str) -> Option<V> {
        self.inner.env.store().read(key)
    }

    /// Copy of the whole current state.
    pub fn state(&self) -> State<V> {
        self.inner.env.store().snapshot()
    }

    fn mutate(&self, patch: Patch<V>, mode: DispatchMode) -> HistoryResult<&Self> {
        patch.validate()?;
        self.inner.env.reconcile(Reconciliation {
            source: self.inner.id,
            notifier: self.inner.notifier.clone(),
            patch,
            mode,
        });
        Ok(self)
    }

    /// Listen to this instance's events before default handling.
    pub fn on<F>(&self, filter: EventFilter, listener: F) -> SubscriptionId
    where
        F: Fn(&Notification<'_, V>) + Send + Sync + 'static,
    {
        self.subscribe(Scope::Instance(self.inner.id), Phase::On, filter, listener)
    }

    /// Listen to this instance's events after default handling.
    pub fn after<F>(&self, filter: EventFilter, listener: F) -> SubscriptionId
    where
        F: Fn(&Notification<'_, V>) + Send + Sync + 'static,
    {
        self.subscribe(Scope::Instance(self.inner.id), Phase::After, filter, listener)
    }

    /// Listen to global change events from every instance of the
    /// environment, before they are committed.
    pub fn on_global<F>(&self, listener: F) -> SubscriptionId
    where
        F: Fn(&Notification<'_, V>) + Send + Sync + 'static,
    {
        self.subscribe(Scope::Process, Phase::On, EventFilter::Change, listener)
    }

    /// Listen to global change events from every instance of the
    /// environment, after they are committed.
    pub fn after_global<F>(&self, listener: F) -> SubscriptionId
    where
        F: Fn(&Notification<'_, V>) + Send + Sync + 'static,
    {
        self.subscribe(Scope::Process, Phase::After, EventFilter::Change, listener)
    }

    pub fn detach(&self, id: SubscriptionId) -> bool {
        self.inner.env.events().unsubscribe(id)
    }

    /// Drop every subscription made through this instance.
    pub fn detach_all(&self) -> usize {
        self.inner.env.events().unsubscribe_instance(self.inner.id)
    }

    fn subscribe<F>(&self, scope: Scope, phase: Phase, filter: EventFilter, listener: F) -> SubscriptionId
    where
        F: Fn(&Notification<'_, V>) + Send + Sync + 'static,
    {
        if self.inner.custom_notifier && scope != Scope::Process {
            warn!(
                instance = %self.inner.id,
                "instance events go to a custom notifier; hub listeners on this instance will not fire"
            );
        }
        self.inner
            .env
            .events()
            .subscribe_owned(self.inner.id, scope, phase, filter, listener)
    }
}
