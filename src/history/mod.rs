//! History instances and the environment they share.

pub mod env;
pub mod facade;

pub use env::HistoryEnv;
pub use facade::{History, HistoryOptions, WeakHistory, DEFAULT_NAME};
