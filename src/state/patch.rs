//! Partial state updates and candidate construction.

use std::collections::{BTreeMap, HashMap};

use crate::error::{HistoryError, HistoryResult};
use crate::state::State;

/// Merged state before removal-stripping. `None` marks a key that the
/// update explicitly cleared.
pub type Candidate<V> = BTreeMap<String, Option<V>>;

/// A proposed partial update. `None` means "remove this key".
#[derive(Debug, Clone, PartialEq)]
pub struct Patch<V> {
    entries: BTreeMap<String, Option<V>>,
}

impl<V> Default for Patch<V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<V> Patch<V> {
    pub fn new() -> Self {
        Patch {
            entries: BTreeMap::new(),
        }
    }

    /// One-entry patch; the single key form of `add` and `replace`.
    pub fn single(key: impl Into<String>, value: Option<V>) -> Self {
        let mut patch = Patch::new();
        patch.insert(key, value);
        patch
    }

    /// Builder: set `key` to `value`.
    pub fn set(mut self, key: impl Into<String>, value: V) -> Self {
        self.insert(key, Some(value));
        self
    }

    /// Builder: remove `key`.
    pub fn unset(mut self, key: impl Into<String>) -> Self {
        self.insert(key, None);
        self
    }

    pub fn insert(&mut self, key: impl Into<String>, value: Option<V>) {
        self.entries.insert(key.into(), value);
    }

    pub fn get(&self, key: &str) -> Option<&Option<V>> {
        self.entries.get(key)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &Option<V>)> {
        self.entries.iter()
    }

    /// Reject keys that cannot be addressed: an empty key reads as "no key".
    pub fn validate(&self) -> HistoryResult<()> {
        if self.entries.keys().any(|k| k.is_empty()) {
            return Err(HistoryError::InvalidArgument(
                "state keys must be non-empty".to_string(),
            ));
        }
        Ok(())
    }

    pub fn into_entries(self) -> BTreeMap<String, Option<V>> {
        self.entries
    }
}

impl<V> From<BTreeMap<String, V>> for Patch<V> {
    fn from(map: BTreeMap<String, V>) -> Self {
        map.into_iter().map(|(k, v)| (k, Some(v))).collect()
    }
}

impl<V> From<HashMap<String, V>> for Patch<V> {
    fn from(map: HashMap<String, V>) -> Self {
        map.into_iter().map(|(k, v)| (k, Some(v))).collect()
    }
}

impl<V> From<BTreeMap<String, Option<V>>> for Patch<V> {
    fn from(entries: BTreeMap<String, Option<V>>) -> Self {
        Patch { entries }
    }
}

impl<K: Into<String>, V> FromIterator<(K, Option<V>)> for Patch<V> {
    fn from_iter<I: IntoIterator<Item = (K, Option<V>)>>(iter: I) -> Self {
        Patch {
            entries: iter.into_iter().map(|(k, v)| (k.into(), v)).collect(),
        }
    }
}

/// Overlay `patch` on `state`.
///
/// Every key of `state` survives unless the patch overwrites it; every key
/// of the patch lands in the candidate, including explicit `None` entries.
/// Nothing is stripped here.
pub fn shallow_merge<V: Clone>(state: &State<V>, patch: Patch<V>) -> Candidate<V> {
    let mut candidate: Candidate<V> = state
        .iter()
        .map(|(k, v)| (k.clone(), Some(v.clone())))
        .collect();
    candidate.extend(patch.into_entries());
    candidate
}
