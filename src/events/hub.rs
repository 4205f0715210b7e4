//! In-process event hub.
//!
//! Subscriptions are scoped either to one history instance or to the whole
//! process. The global change event is broadcast to process-scoped
//! listeners no matter which instance fired it; item events only reach the
//! listeners of the instance that fired them. Listeners run synchronously in
//! subscription order, with no hub lock held.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use parking_lot::RwLock;
use tracing::trace;

use crate::events::{HistoryEvent, InstanceId, ItemChange, Notifier};

/// Callback invoked for each delivered event.
pub type Listener<V> = Arc<dyn Fn(&Notification<'_, V>) + Send + Sync>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SubscriptionId(u64);

/// Which emitters a subscription hears.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Scope {
    /// Events fired by one instance.
    Instance(InstanceId),
    /// Global change events fired by any instance.
    Process,
}

/// When a listener runs relative to the event's default handling.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    /// Before default handling; state is not committed yet.
    On,
    /// After default handling; state is committed.
    After,
}

/// Which events a subscription wants.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EventFilter {
    Any,
    /// Global change event.
    Change,
    /// Changes and removals of one key.
    Item(String),
    /// `<key>Change`
    ItemChanged(String),
    /// `<key>Remove`
    ItemRemoved(String),
}

impl EventFilter {
    pub fn matches<V>(&self, event: &HistoryEvent<V>) -> bool {
        match (self, event) {
            (EventFilter::Any, _) => true,
            (EventFilter::Change, HistoryEvent::Change(_)) => true,
            (EventFilter::Item(key), HistoryEvent::Item(item)) => item.key == *key,
            (EventFilter::ItemChanged(key), HistoryEvent::Item(item)) => {
                item.key == *key && matches!(item.change, ItemChange::Changed { .. })
            }
            (EventFilter::ItemRemoved(key), HistoryEvent::Item(item)) => {
                item.key == *key && matches!(item.change, ItemChange::Removed { .. })
            }
            _ => false,
        }
    }
}

/// An event as seen by a listener.
#[derive(Debug)]
pub struct Notification<'a, V> {
    pub source: InstanceId,
    pub phase: Phase,
    pub event: &'a HistoryEvent<V>,
}

struct Subscription<V> {
    id: SubscriptionId,
    /// Instance that registered it, released with that instance.
    owner: Option<InstanceId>,
    scope: Scope,
    phase: Phase,
    filter: EventFilter,
    listener: Listener<V>,
}

impl<V> Subscription<V> {
    fn wants(&self, source: InstanceId, phase: Phase, event: &HistoryEvent<V>) -> bool {
        if self.phase != phase || !self.filter.matches(event) {
            return false;
        }
        match self.scope {
            Scope::Instance(owner) => owner == source,
            Scope::Process => matches!(event, HistoryEvent::Change(_)),
        }
    }
}

pub struct EventHub<V> {
    subscriptions: RwLock<Vec<Subscription<V>>>,
    next_id: AtomicU64,
}

impl<V> Default for EventHub<V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<V> EventHub<V> {
    pub fn new() -> Self {
        EventHub {
            subscriptions: RwLock::new(Vec::new()),
            next_id: AtomicU64::new(1),
        }
    }

    /// Subscribe. Instance-scoped subscriptions are owned by that instance;
    /// process-scoped ones have no owner and live until unsubscribed.
    pub fn subscribe<F>(
        &self,
        scope: Scope,
        phase: Phase,
        filter: EventFilter,
        listener: F,
    ) -> SubscriptionId
    where
        F: Fn(&Notification<'_, V>) + Send + Sync + 'static,
    {
        let owner = match scope {
            Scope::Instance(instance) => Some(instance),
            Scope::Process => None,
        };
        self.insert(owner, scope, phase, filter, Arc::new(listener))
    }

    /// Subscribe on behalf of `owner`, whatever the scope.
    pub fn subscribe_owned<F>(
        &self,
        owner: InstanceId,
        scope: Scope,
        phase: Phase,
        filter: EventFilter,
        listener: F,
    ) -> SubscriptionId
    where
        F: Fn(&Notification<'_, V>) + Send + Sync + 'static,
    {
        self.insert(Some(owner), scope, phase, filter, Arc::new(listener))
    }

    fn insert(
        &self,
        owner: Option<InstanceId>,
        scope: Scope,
        phase: Phase,
        filter: EventFilter,
        listener: Listener<V>,
    ) -> SubscriptionId {
        let id = SubscriptionId(self.next_id.fetch_add(1, Ordering::Relaxed));
        trace!(subscription = id.0, ?owner, ?scope, ?phase, ?filter, "subscribed");
        self.subscriptions.write().push(Subscription {
            id,
            owner,
            scope,
            phase,
            filter,
            listener,
        });
        id
    }

    /// Remove one subscription. Returns whether it existed.
    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        let removed = self.remove_where(|s| s.id == id);
        if !removed.is_empty() {
            trace!(subscription = id.0, "unsubscribed");
        }
        !removed.is_empty()
    }

    /// Remove every subscription owned by `instance`.
    pub fn unsubscribe_instance(&self, instance: InstanceId) -> usize {
        self.remove_where(|s| s.owner == Some(instance)).len()
    }

    // Removed listeners are returned so they drop after the lock is released;
    // a listener may own the last handle of another instance.
    fn remove_where(&self, pred: impl Fn(&Subscription<V>) -> bool) -> Vec<Subscription<V>> {
        let mut subscriptions = self.subscriptions.write();
        let (removed, kept): (Vec<_>, Vec<_>) = std::mem::take(&mut *subscriptions)
            .into_iter()
            .partition(|s| pred(s));
        *subscriptions = kept;
        removed
    }

    pub fn listener_count(&self) -> usize {
        self.subscriptions.read().len()
    }

    fn deliver(&self, source: InstanceId, phase: Phase, event: &HistoryEvent<V>, process_only: bool) {
        // Collect first so listeners may (un)subscribe while being called.
        let listeners: Vec<Listener<V>> = self
            .subscriptions
            .read()
            .iter()
            .filter(|s| !process_only || s.scope == Scope::Process)
            .filter(|s| s.wants(source, phase, event))
            .map(|s| s.listener.clone())
            .collect();

        let notification = Notification {
            source,
            phase,
            event,
        };
        for listener in listeners {
            listener(&notification);
        }
    }
}

impl<V: Send + Sync> Notifier<V> for EventHub<V> {
    fn fire(&self, source: InstanceId, event: &HistoryEvent<V>, default_fn: &mut dyn FnMut()) {
        self.deliver(source, Phase::On, event, false);
        default_fn();
        self.deliver(source, Phase::After, event, false);
    }
}

/// Notifier that hands events to an injected substrate while still
/// broadcasting the global change event to the hub's process-scoped
/// listeners.
pub struct Relay<V> {
    hub: Arc<EventHub<V>>,
    inner: Arc<dyn Notifier<V>>,
}

impl<V> Relay<V> {
    pub fn new(hub: Arc<EventHub<V>>, inner: Arc<dyn Notifier<V>>) -> Self {
        Relay { hub, inner }
    }
}

impl<V: Send + Sync> Notifier<V> for Relay<V> {
    fn fire(&self, source: InstanceId, event: &HistoryEvent<V>, default_fn: &mut dyn FnMut()) {
        if !matches!(event, HistoryEvent::Change(_)) {
            self.inner.fire(source, event, default_fn);
            return;
        }

        self.hub.deliver(source, Phase::On, event, true);
        let mut ran = false;
        let mut wrapped = || {
            ran = true;
            default_fn();
        };
        self.inner.fire(source, event, &mut wrapped);
        // Process listeners in the after phase must see the commit.
        if !ran {
            default_fn();
        }
        self.hub.deliver(source, Phase::After, event, true);
    }
}
