//! Property-based tests for reconciliation invariants

mod invariants;
