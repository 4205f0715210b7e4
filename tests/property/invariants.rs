//! Invariants that hold after any sequence of mutations

use histate::change::resolve;
use histate::state::{shallow_merge, State, StrictEq};
use histate::{EventFilter, History, HistoryEnv, HistoryEvent, Patch};
use parking_lot::Mutex;
use proptest::prelude::*;
use std::sync::Arc;

#[derive(Debug, Clone)]
enum Op {
    Add(Vec<(String, Option<u8>)>),
    Replace(Vec<(String, Option<u8>)>),
}

fn entries() -> impl Strategy<Value = Vec<(String, Option<u8>)>> {
    // Small key and value spaces so repeats, no-ops and removals are common.
    prop::collection::vec(("[a-e]", prop::option::of(0u8..4)), 0..5)
}

fn ops() -> impl Strategy<Value = Vec<Op>> {
    prop::collection::vec(
        prop_oneof![entries().prop_map(Op::Add), entries().prop_map(Op::Replace)],
        1..20,
    )
}

fn patch(entries: &[(String, Option<u8>)]) -> Patch<u8> {
    entries.iter().cloned().collect()
}

/// After every call the state holds no absent values and every reported
/// change is a real change.
#[test]
fn test_state_and_event_invariants() {
    let mut runner = proptest::test_runner::TestRunner::default();

    runner
        .run(&ops(), |ops| {
            let env: Arc<HistoryEnv<u8>> = HistoryEnv::shared();
            let history = History::new(&env);
            let events = Arc::new(Mutex::new(Vec::<HistoryEvent<u8>>::new()));
            let sink = events.clone();
            history.after(EventFilter::Any, move |n| sink.lock().push(n.event.clone()));

            for op in &ops {
                let (entries, notify) = match op {
                    Op::Add(entries) => (entries, true),
                    Op::Replace(entries) => (entries, false),
                };
                let before = history.state();
                events.lock().clear();

                if notify {
                    history.add(patch(entries)).unwrap();
                } else {
                    history.replace(patch(entries)).unwrap();
                }

                // Last write per key wins inside one patch.
                let mut expected = before.clone();
                for (key, value) in patch(entries).into_entries() {
                    match value {
                        Some(value) => expected.insert(key, value),
                        None => expected.remove(&key),
                    };
                }
                prop_assert_eq!(&history.state(), &expected);

                let events = events.lock();
                if !notify || before == expected {
                    prop_assert!(events.is_empty());
                    continue;
                }

                let change = events[0].as_change().unwrap();
                for (key, value) in &change.changed {
                    prop_assert_ne!(value.prev_val.as_ref(), Some(&value.new_val));
                    prop_assert!(!change.removed.contains_key(key));
                    prop_assert_eq!(expected.get(key), Some(&value.new_val));
                }
                for (key, prev) in &change.removed {
                    prop_assert_eq!(before.get(key), Some(prev));
                    prop_assert!(!expected.contains_key(key));
                }
                prop_assert_eq!(
                    events.len(),
                    1 + change.changed.len() + change.removed.len()
                );
            }
            Ok(())
        })
        .unwrap();
}

proptest! {
    /// Notifying and silent mutations leave identical state behind.
    #[test]
    fn add_and_replace_agree_on_state(ops in ops()) {
        let notifying = History::new(&HistoryEnv::<u8>::shared());
        let silent = History::new(&HistoryEnv::<u8>::shared());

        for op in &ops {
            let entries = match op {
                Op::Add(entries) | Op::Replace(entries) => entries,
            };
            notifying.add(patch(entries)).unwrap();
            silent.replace(patch(entries)).unwrap();
        }
        prop_assert_eq!(notifying.state(), silent.state());
    }

    /// Resolving a merge against the state it was built from is a no-op
    /// exactly when the merge changes nothing.
    #[test]
    fn resolve_is_none_iff_state_unchanged(
        start in prop::collection::btree_map("[a-e]", 0u8..4, 0..5),
        entries in entries(),
    ) {
        let prev: State<u8> = start;
        let candidate = shallow_merge(&prev, patch(&entries));
        let mut expected = prev.clone();
        for (key, value) in patch(&entries).into_entries() {
            match value {
                Some(value) => expected.insert(key, value),
                None => expected.remove(&key),
            };
        }

        match resolve(candidate, &prev, &StrictEq) {
            None => prop_assert_eq!(&prev, &expected),
            Some(changes) => {
                prop_assert_ne!(&prev, &expected);
                prop_assert_eq!(&changes.new_state, &expected);
                prop_assert_eq!(&changes.prev_state, &prev);
            }
        }
    }
}
