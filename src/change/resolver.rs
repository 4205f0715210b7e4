//! Change resolver: classifies every key of a candidate as added/changed
//! or removed relative to the previous state.

use std::collections::BTreeMap;

use tracing::trace;

use crate::change::{ChangeSet, ValueChange};
use crate::state::{Candidate, State, ValueEq};

/// Diff `candidate` against `prev`.
///
/// Returns `None` when nothing changed; the caller must then neither commit
/// nor notify. Keys cleared with `None` land in `removed` only, and keys
/// cleared without ever being present vanish without a trace.
pub fn resolve<V, E>(candidate: Candidate<V>, prev: &State<V>, eq: &E) -> Option<ChangeSet<V>>
where
    V: Clone,
    E: ValueEq<V> + ?Sized,
{
    let mut changed = BTreeMap::new();
    let mut removed = BTreeMap::new();
    let mut new_state = State::new();

    for (key, value) in candidate {
        match value {
            Some(new_val) => {
                let prev_val = prev.get(&key);
                let same = prev_val.map_or(false, |p| eq.same(p, &new_val));
                if !same {
                    changed.insert(
                        key.clone(),
                        ValueChange {
                            new_val: new_val.clone(),
                            prev_val: prev_val.cloned(),
                        },
                    );
                }
                new_state.insert(key, new_val);
            }
            None => {
                if let Some(prev_val) = prev.get(&key) {
                    removed.insert(key, prev_val.clone());
                }
            }
        }
    }

    // Keys dropped from the candidate altogether are removals too.
    for (key, prev_val) in prev {
        if !new_state.contains_key(key) && !removed.contains_key(key) {
            removed.insert(key.clone(), prev_val.clone());
        }
    }

    if changed.is_empty() && removed.is_empty() {
        trace!("reconciliation is a no-op");
        return None;
    }

    Some(ChangeSet {
        changed,
        removed,
        new_state,
        prev_state: prev.clone(),
    })
}
