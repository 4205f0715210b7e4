//! Configuration System
//!
//! Hierarchical configuration for the history tooling: built-in defaults,
//! a user-level file, workspace files and `HISTATE__*` environment
//! overrides, merged with the `config` crate.

use crate::history::{HistoryOptions, DEFAULT_NAME};
use crate::logging::LoggingConfig;
use serde::{Deserialize, Serialize};
use serde_json::Value;

mod loader;
mod merge;
mod sources;

pub use loader::ConfigLoader;

/// Root configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct HistateConfig {
    /// History instance settings
    #[serde(default)]
    pub history: HistorySettings,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Settings applied when constructing a history instance
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HistorySettings {
    /// Instance name
    #[serde(default = "default_name")]
    pub name: String,

    /// Initial state; only a table/object is used, anything else is ignored
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub initial_state: Option<Value>,
}

fn default_name() -> String {
    DEFAULT_NAME.to_string()
}

impl Default for HistorySettings {
    fn default() -> Self {
        Self {
            name: default_name(),
            initial_state: None,
        }
    }
}

impl HistorySettings {
    /// Construction options for a `History<Value>`.
    pub fn options(&self) -> HistoryOptions<Value> {
        let options = HistoryOptions::<Value>::new().name(self.name.clone());
        match &self.initial_state {
            Some(state) => options.initial_json(state.clone()),
            None => options,
        }
    }
}

/// Configuration validation errors
#[derive(Debug, Clone)]
pub enum ValidationError {
    History(String),
    Logging(String),
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ValidationError::History(msg) => write!(f, "History: {}", msg),
            ValidationError::Logging(msg) => write!(f, "Logging: {}", msg),
        }
    }
}

impl std::error::Error for ValidationError {}

impl HistateConfig {
    /// Validate the entire configuration
    pub fn validate(&self) -> Result<(), Vec<ValidationError>> {
        let mut errors = Vec::new();

        if self.history.name.trim().is_empty() {
            errors.push(ValidationError::History(
                "name cannot be empty".to_string(),
            ));
        }

        if let Err(e) = self.logging.validate() {
            errors.push(ValidationError::Logging(e));
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }

    /// Render as TOML
    pub fn to_toml(&self) -> Result<String, toml::ser::Error> {
        toml::to_string_pretty(self)
    }
}
