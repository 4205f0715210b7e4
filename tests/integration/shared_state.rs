//! Mutation and read behavior across instances sharing one environment

use histate::{History, HistoryEnv, HistoryError, HistoryOptions, Patch};
use parking_lot::Mutex;
use std::collections::BTreeMap;
use std::sync::Arc;

fn env() -> Arc<HistoryEnv<String>> {
    HistoryEnv::shared()
}

fn s(value: &str) -> String {
    value.to_string()
}

#[test]
fn test_add_then_get() {
    let env = env();
    let history = History::new(&env);
    history.add(Patch::new().set("a", s("1"))).unwrap();

    assert_eq!(history.get("a"), Some(s("1")));
    let state = history.state();
    assert_eq!(state.get("a"), Some(&s("1")));
    assert_eq!(state.len(), 1);
}

#[test]
fn test_null_removes_key() {
    let env = env();
    let history = History::new(&env);
    history
        .add(Patch::new().set("a", s("1")).set("b", s("2")))
        .unwrap()
        .add(Patch::<String>::new().unset("a"))
        .unwrap();

    assert_eq!(history.get("a"), None);
    assert_eq!(history.get("b"), Some(s("2")));
    assert!(!history.state().contains_key("a"));
}

#[test]
fn test_replace_updates_state() {
    let env = env();
    let history = History::new(&env);
    history.add_item("a", Some(s("1"))).unwrap();
    history.replace_item("a", Some(s("2"))).unwrap();
    assert_eq!(history.get("a"), Some(s("2")));

    history.replace_item("a", None).unwrap();
    assert_eq!(history.get("a"), None);
}

#[test]
fn test_instances_share_state() {
    let env = env();
    let first = History::new(&env);
    let second = History::new(&env);

    first.add_item("x", Some(s("v"))).unwrap();
    assert_eq!(second.get("x"), Some(s("v")));

    second.replace_item("x", Some(s("w"))).unwrap();
    assert_eq!(first.get("x"), Some(s("w")));
}

#[test]
fn test_separate_environments_are_isolated() {
    let first = History::new(&env());
    let second = History::new(&env());

    first.add_item("x", Some(s("v"))).unwrap();
    assert_eq!(second.get("x"), None);
}

#[test]
fn test_single_key_form_matches_mapping_form() {
    let by_item = History::new(&env());
    let by_map = History::new(&env());

    by_item
        .add_item("k", Some(s("v1")))
        .unwrap()
        .add_item("j", Some(s("v2")))
        .unwrap()
        .add_item("k", None)
        .unwrap();

    let mut first = BTreeMap::new();
    first.insert(s("k"), s("v1"));
    let mut second = BTreeMap::new();
    second.insert(s("j"), s("v2"));
    by_map
        .add(first)
        .unwrap()
        .add(second)
        .unwrap()
        .add(Patch::<String>::new().unset("k"))
        .unwrap();

    assert_eq!(by_item.state(), by_map.state());
}

#[test]
fn test_empty_key_rejected_before_merge() {
    let env = env();
    let history = History::new(&env);
    history.add_item("a", Some(s("1"))).unwrap();

    let err = history
        .add(Patch::new().set("b", s("2")).set("", s("x")))
        .unwrap_err();
    assert!(matches!(err, HistoryError::InvalidArgument(_)));
    // Nothing from the rejected patch was applied.
    assert_eq!(history.get("b"), None);
}

#[test]
fn test_initial_state_applied_at_construction() {
    let env = env();
    let history = History::with_options(
        &env,
        HistoryOptions::<String>::new()
            .name("nav")
            .initial_state(Patch::new().set("tab", s("inbox"))),
    )
    .unwrap();

    assert_eq!(history.name(), "nav");
    assert_eq!(History::new(&env).get("tab"), Some(s("inbox")));
}

#[test]
fn test_initial_state_broadcasts_to_existing_global_listeners() {
    let env = env();
    let observer = History::new(&env);
    let seen = Arc::new(Mutex::new(Vec::new()));
    let sink = seen.clone();
    observer.after_global(move |n| {
        let change = n.event.as_change().unwrap();
        sink.lock().push(change.changed.keys().cloned().collect::<Vec<_>>());
    });

    History::with_options(
        &env,
        HistoryOptions::<String>::new().initial_state(Patch::new().set("tab", s("inbox"))),
    )
    .unwrap();

    assert_eq!(*seen.lock(), vec![vec![s("tab")]]);
}

#[test]
fn test_concurrent_writers_all_land() {
    let env: Arc<HistoryEnv<usize>> = HistoryEnv::shared();
    let handles: Vec<_> = (0..8)
        .map(|i| {
            let env = env.clone();
            std::thread::spawn(move || {
                let history = History::new(&env);
                for j in 0..25 {
                    history.add_item(format!("k{}-{}", i, j), Some(j)).unwrap();
                }
            })
        })
        .collect();
    for handle in handles {
        handle.join().unwrap();
    }

    assert_eq!(History::new(&env).state().len(), 8 * 25);
}
