//! Value equality used by change resolution.
//!
//! Equality is strict and shallow. Two values count as unchanged only when
//! the comparator says they are the same value; there is no structural
//! deep comparison beyond what the comparator itself does.

use std::sync::Arc;

/// Pluggable comparator deciding whether a proposed value differs from the
/// stored one.
pub trait ValueEq<V>: Send + Sync {
    fn same(&self, a: &V, b: &V) -> bool;
}

/// `PartialEq` comparison. Matches strict equality for scalar values.
#[derive(Debug, Clone, Copy, Default)]
pub struct StrictEq;

impl<V: PartialEq> ValueEq<V> for StrictEq {
    fn same(&self, a: &V, b: &V) -> bool {
        a == b
    }
}

/// Pointer identity for shared values.
///
/// Two structurally identical composites held in different `Arc`s are
/// different values.
#[derive(Debug, Clone, Copy, Default)]
pub struct Identity;

impl<T: ?Sized + Send + Sync> ValueEq<Arc<T>> for Identity {
    fn same(&self, a: &Arc<T>, b: &Arc<T>) -> bool {
        Arc::ptr_eq(a, b)
    }
}

/// Comparator backed by a closure.
pub struct FnEq<F>(pub F);

impl<V, F> ValueEq<V> for FnEq<F>
where
    F: Fn(&V, &V) -> bool + Send + Sync,
{
    fn same(&self, a: &V, b: &V) -> bool {
        (self.0)(a, b)
    }
}
