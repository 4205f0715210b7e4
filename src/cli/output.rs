//! CLI output: error mapping from domain errors to stable CLI surface.

use crate::error::HistoryError;

/// Map domain errors to a string for CLI output.
pub fn map_error(e: &HistoryError) -> String {
    match e {
        HistoryError::Script { line, message } => {
            format!("error: script line {}: {}", line, message)
        }
        other => format!("error: {}", other),
    }
}
