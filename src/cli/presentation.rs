//! CLI presentation: render replay reports as tables or JSON.

use comfy_table::presets::UTF8_FULL;
use comfy_table::Table;
use serde_json::Value;

use crate::error::HistoryError;
use crate::events::{HistoryEvent, ItemChange};
use crate::script::ScriptReport;

pub fn format_replay_json(report: &ScriptReport) -> Result<String, HistoryError> {
    serde_json::to_string_pretty(report)
        .map_err(|e| HistoryError::Config(format!("Failed to render report: {}", e)))
}

pub fn format_replay_text(report: &ScriptReport) -> String {
    let mut out = String::new();

    if report.events.is_empty() {
        out.push_str("No events.\n");
    } else {
        let mut events = Table::new();
        events.load_preset(UTF8_FULL);
        events.set_header(vec!["Line", "Event", "Details"]);
        for recorded in &report.events {
            events.add_row(vec![
                recorded.line.to_string(),
                recorded.name.clone(),
                describe(&recorded.event),
            ]);
        }
        out.push_str(&events.to_string());
        out.push('\n');
    }

    for read in &report.reads {
        let key = read.key.as_deref().unwrap_or("*");
        out.push_str(&format!(
            "get {} (line {}) = {}\n",
            key,
            read.line,
            render(read.value.as_ref())
        ));
    }

    let mut state = Table::new();
    state.load_preset(UTF8_FULL);
    state.set_header(vec!["Key", "Value"]);
    for (key, value) in &report.final_state {
        state.add_row(vec![key.clone(), value.to_string()]);
    }
    out.push_str(&format!(
        "{} operation(s), {} event(s)\n",
        report.operations,
        report.events.len()
    ));
    out.push_str(&state.to_string());
    out
}

fn describe(event: &HistoryEvent<Value>) -> String {
    match event {
        HistoryEvent::Change(change) => {
            let changed: Vec<&str> = change.changed.keys().map(String::as_str).collect();
            let removed: Vec<&str> = change.removed.keys().map(String::as_str).collect();
            format!(
                "changed [{}] removed [{}]",
                changed.join(", "),
                removed.join(", ")
            )
        }
        HistoryEvent::Item(item) => match &item.change {
            ItemChange::Changed { new_val, prev_val } => {
                format!("{} -> {}", render(prev_val.as_ref()), new_val)
            }
            ItemChange::Removed { prev_val } => format!("{} -> (removed)", prev_val),
        },
    }
}

fn render(value: Option<&Value>) -> String {
    value.map_or_else(|| "(absent)".to_string(), |v| v.to_string())
}
