//! Shared history environment.
//!
//! Owns the one state store, the default event hub and the reconciliation
//! guard that every attached instance goes through. Reconciliations never
//! interleave: other threads wait on the guard, and a mutation issued from
//! inside a listener on the dispatching thread is queued until the current
//! reconciliation has finished.

use std::cell::RefCell;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use parking_lot::ReentrantMutex;
use tracing::{debug, trace};

use crate::change::{resolve, DispatchMode, Dispatcher};
use crate::events::{EventHub, InstanceId, Notifier};
use crate::state::{shallow_merge, HistoryStore, Patch, State, StrictEq, ValueEq};

/// A mutation waiting for its turn.
pub(crate) struct Reconciliation<V> {
    pub source: InstanceId,
    pub notifier: Arc<dyn Notifier<V>>,
    pub patch: Patch<V>,
    pub mode: DispatchMode,
}

struct GuardState<V> {
    active: bool,
    queue: VecDeque<Reconciliation<V>>,
}

pub struct HistoryEnv<V> {
    store: HistoryStore<V>,
    events: Arc<EventHub<V>>,
    equality: Arc<dyn ValueEq<V>>,
    guard: ReentrantMutex<RefCell<GuardState<V>>>,
    next_instance: AtomicU64,
}

impl<V> HistoryEnv<V>
where
    V: PartialEq + Clone + Send + Sync + 'static,
{
    /// Environment comparing values with `PartialEq`.
    pub fn new() -> Self {
        Self::with_equality(StrictEq)
    }

    pub fn shared() -> Arc<Self> {
        Arc::new(Self::new())
    }
}

impl<V> Default for HistoryEnv<V>
where
    V: PartialEq + Clone + Send + Sync + 'static,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<V> HistoryEnv<V> {
    pub fn store(&self) -> &HistoryStore<V> {
        &self.store
    }

    /// Default event hub shared by all instances of this environment.
    pub fn events(&self) -> &Arc<EventHub<V>> {
        &self.events
    }

    pub(crate) fn allocate_instance(&self) -> InstanceId {
        InstanceId::new(self.next_instance.fetch_add(1, Ordering::Relaxed))
    }
}

impl<V> HistoryEnv<V>
where
    V: Clone + Send + Sync + 'static,
{
    /// Environment with a custom value comparator.
    pub fn with_equality(equality: impl ValueEq<V> + 'static) -> Self {
        HistoryEnv {
            store: HistoryStore::new(),
            events: Arc::new(EventHub::new()),
            equality: Arc::new(equality),
            guard: ReentrantMutex::new(RefCell::new(GuardState {
                active: false,
                queue: VecDeque::new(),
            })),
            next_instance: AtomicU64::new(1),
        }
    }

    pub fn state(&self) -> State<V> {
        self.store.snapshot()
    }

    /// Run `request` now, or queue it behind the reconciliation already in
    /// progress on this thread.
    pub(crate) fn reconcile(&self, request: Reconciliation<V>) {
        let guard = self.guard.lock();
        {
            let mut state = guard.borrow_mut();
            if state.active {
                trace!(source = %request.source, "queueing nested mutation");
                state.queue.push_back(request);
                return;
            }
            state.active = true;
        }

        let _reset = ActiveReset(&*guard);
        let mut next = Some(request);
        while let Some(request) = next {
            self.run(request);
            next = guard.borrow_mut().queue.pop_front();
        }
    }

    fn run(&self, request: Reconciliation<V>) {
        let prev = self.store.current();
        let candidate = shallow_merge(&prev, request.patch);
        let Some(changes) = resolve(candidate, &prev, self.equality.as_ref()) else {
            trace!(source = %request.source, "no state change");
            return;
        };

        debug!(
            source = %request.source,
            keys = ?changes.affected_keys().collect::<Vec<_>>(),
            "state change resolved"
        );
        Dispatcher::new(&self.store, request.notifier.as_ref(), request.source)
            .dispatch(changes, request.mode);
    }
}

/// Clears the active flag when the drain loop ends, including on unwind.
struct ActiveReset<'a, V>(&'a RefCell<GuardState<V>>);

impl<V> Drop for ActiveReset<'_, V> {
    fn drop(&mut self) {
        let mut state = self.0.borrow_mut();
        state.active = false;
        state.queue.clear();
    }
}
