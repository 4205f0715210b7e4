//! Operation scripts
//!
//! Replays newline-delimited JSON operations against a `History<Value>` and
//! records every event the instance fires:
//!
//! ```text
//! {"op": "add", "state": {"page": 1, "tab": "inbox"}}
//! {"op": "replace", "key": "page", "value": 2}
//! {"op": "add", "key": "tab", "value": null}
//! {"op": "get", "key": "page"}
//! ```
//!
//! Blank lines and lines starting with `#` are skipped.

use std::io::BufRead;
use std::sync::Arc;

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, info};

use crate::error::{HistoryError, HistoryResult};
use crate::events::{EventFilter, HistoryEvent};
use crate::history::History;
use crate::json::{json_kind, state_to_json};
use crate::state::{Patch, State};

#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "op", rename_all = "lowercase")]
pub enum ScriptOp {
    Add(Mutation),
    Replace(Mutation),
    Get {
        #[serde(default)]
        key: Option<String>,
    },
}

/// Either a full `state` object or a single `key` with its `value`.
#[derive(Debug, Clone, Deserialize)]
pub struct Mutation {
    #[serde(default)]
    pub state: Option<Value>,
    #[serde(default)]
    pub key: Option<String>,
    #[serde(default)]
    pub value: Value,
}

impl Mutation {
    fn into_patch(self, line: usize) -> HistoryResult<Patch<Value>> {
        let patch = match (self.state, self.key) {
            (Some(state), None) => {
                let kind = json_kind(&state);
                Patch::<Value>::from_json(state).ok_or_else(|| HistoryError::Script {
                    line,
                    message: format!("state must be an object, got {}", kind),
                })?
            }
            (None, Some(key)) => {
                let value = if self.value.is_null() {
                    None
                } else {
                    Some(self.value)
                };
                Patch::single(key, value)
            }
            _ => {
                return Err(HistoryError::Script {
                    line,
                    message: "expected exactly one of `state` or `key`".to_string(),
                })
            }
        };
        patch.validate().map_err(|e| HistoryError::Script {
            line,
            message: e.to_string(),
        })?;
        Ok(patch)
    }
}

/// An event observed while replaying.
#[derive(Debug, Clone, Serialize)]
pub struct RecordedEvent {
    pub line: usize,
    pub name: String,
    #[serde(flatten)]
    pub event: HistoryEvent<Value>,
}

/// Result of a `get` operation.
#[derive(Debug, Clone, Serialize)]
pub struct RecordedRead {
    pub line: usize,
    pub key: Option<String>,
    pub value: Option<Value>,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct ScriptReport {
    pub operations: usize,
    pub events: Vec<RecordedEvent>,
    pub reads: Vec<RecordedRead>,
    pub final_state: State<Value>,
}

pub fn parse_line(line: &str, number: usize) -> HistoryResult<Option<ScriptOp>> {
    let trimmed = line.trim();
    if trimmed.is_empty() || trimmed.starts_with('#') {
        return Ok(None);
    }
    serde_json::from_str(trimmed)
        .map(Some)
        .map_err(|e| HistoryError::Script {
            line: number,
            message: e.to_string(),
        })
}

/// Replay every operation from `reader` against `history`.
///
/// Stops at the first malformed line; operations before it stay applied.
pub fn run_script<R: BufRead>(history: &History<Value>, reader: R) -> HistoryResult<ScriptReport> {
    let recorded = Arc::new(Mutex::new(Vec::new()));
    let current_line = Arc::new(Mutex::new(0usize));

    let sink = recorded.clone();
    let line_ref = current_line.clone();
    let subscription = history.after(EventFilter::Any, move |n| {
        sink.lock().push(RecordedEvent {
            line: *line_ref.lock(),
            name: n.event.name(),
            event: n.event.clone(),
        });
    });

    let result = replay(history, reader, &current_line);
    history.detach(subscription);

    let mut report = result?;
    report.events = std::mem::take(&mut *recorded.lock());
    report.final_state = history.state();
    info!(
        operations = report.operations,
        events = report.events.len(),
        "script replayed"
    );
    Ok(report)
}

fn replay<R: BufRead>(
    history: &History<Value>,
    reader: R,
    current_line: &Mutex<usize>,
) -> HistoryResult<ScriptReport> {
    let mut report = ScriptReport::default();

    for (index, line) in reader.lines().enumerate() {
        let number = index + 1;
        let line = line?;
        let Some(op) = parse_line(&line, number)? else {
            continue;
        };
        *current_line.lock() = number;
        debug!(line = number, ?op, "applying operation");

        match op {
            ScriptOp::Add(mutation) => {
                history.add(mutation.into_patch(number)?)?;
            }
            ScriptOp::Replace(mutation) => {
                history.replace(mutation.into_patch(number)?)?;
            }
            ScriptOp::Get { key } => {
                let value = match &key {
                    Some(key) => history.get(key),
                    None => Some(state_to_json(&history.state())),
                };
                report.reads.push(RecordedRead {
                    line: number,
                    key,
                    value,
                });
            }
        }
        report.operations += 1;
    }

    Ok(report)
}
