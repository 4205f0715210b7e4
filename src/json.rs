//! JSON bridge for `serde_json::Value` state.
//!
//! JSON `null` is the removal marker. Only JSON objects describe state;
//! arrays and scalars are not state shapes.

use serde_json::{Map, Value};
use tracing::warn;

use crate::history::HistoryOptions;
use crate::state::{Patch, State};

impl Patch<Value> {
    /// Patch from a JSON object, or `None` when `value` is not an object.
    pub fn from_json(value: Value) -> Option<Self> {
        match value {
            Value::Object(map) => Some(
                map.into_iter()
                    .map(|(k, v)| {
                        let v = if v.is_null() { None } else { Some(v) };
                        (k, v)
                    })
                    .collect(),
            ),
            _ => None,
        }
    }
}

impl HistoryOptions<Value> {
    /// Use `value` as initial state if it is a JSON object. Anything else is
    /// ignored.
    pub fn initial_json(mut self, value: Value) -> Self {
        let kind = json_kind(&value);
        match Patch::<Value>::from_json(value) {
            Some(patch) => self.initial_state = Some(patch),
            None => warn!(kind, "ignoring initial state that is not an object"),
        }
        self
    }
}

pub fn state_to_json(state: &State<Value>) -> Value {
    Value::Object(
        state
            .iter()
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect::<Map<String, Value>>(),
    )
}

pub(crate) fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
