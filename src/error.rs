//! Error types for the history state container.

use thiserror::Error;

/// Errors surfaced by history operations, configuration and tooling.
///
/// Reconciliation itself never fails: removal through `None`, unknown keys
/// on read and ignored initial state are not errors.
#[derive(Debug, Error)]
pub enum HistoryError {
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Script error on line {line}: {message}")]
    Script { line: usize, message: String },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<config::ConfigError> for HistoryError {
    fn from(err: config::ConfigError) -> Self {
        HistoryError::Config(err.to_string())
    }
}

/// Result type for history operations
pub type HistoryResult<T> = Result<T, HistoryError>;
