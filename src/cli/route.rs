//! CLI route: single route table and run context. Dispatches to the history
//! container and presentation.

use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;

use serde_json::Value;
use tracing::{info, warn};

use crate::cli::parse::{Commands, OutputFormat};
use crate::cli::presentation::{format_replay_json, format_replay_text};
use crate::config::{ConfigLoader, HistateConfig};
use crate::error::HistoryError;
use crate::history::{History, HistoryEnv};
use crate::script::run_script;

/// Runtime context for CLI execution: workspace and the loaded configuration.
pub struct RunContext {
    workspace_root: PathBuf,
    config: HistateConfig,
}

impl RunContext {
    /// Create run context from workspace root and optional config path. Uses ConfigLoader only.
    pub fn new(workspace_root: PathBuf, config_path: Option<PathBuf>) -> Result<Self, HistoryError> {
        let config = if let Some(ref cfg_path) = config_path {
            ConfigLoader::load_from_file(cfg_path)?
        } else {
            ConfigLoader::load(&workspace_root)?
        };

        if let Err(errors) = config.validate() {
            let joined = errors
                .iter()
                .map(ToString::to_string)
                .collect::<Vec<_>>()
                .join("; ");
            return Err(HistoryError::Config(joined));
        }

        Ok(Self {
            workspace_root,
            config,
        })
    }

    pub fn config(&self) -> &HistateConfig {
        &self.config
    }

    pub fn execute(&self, command: &Commands) -> Result<String, HistoryError> {
        let started = Instant::now();
        let result = match command {
            Commands::Replay { script, format } => self.replay(script, *format),
            Commands::Config => self
                .config
                .to_toml()
                .map_err(|e| HistoryError::Config(format!("Failed to render config: {}", e))),
        };
        info!(
            command = command_name(command),
            ok = result.is_ok(),
            duration_ms = started.elapsed().as_millis() as u64,
            "command finished"
        );
        result
    }

    fn replay(&self, script: &Path, format: OutputFormat) -> Result<String, HistoryError> {
        let path = if script.is_absolute() {
            script.to_path_buf()
        } else {
            self.workspace_root.join(script)
        };
        let file = File::open(&path).map_err(|e| {
            warn!(path = %path.display(), error = %e, "cannot open script");
            HistoryError::Io(e)
        })?;

        let env: Arc<HistoryEnv<Value>> = HistoryEnv::shared();
        let history = History::with_options(&env, self.config.history.options())?;
        let report = run_script(&history, BufReader::new(file))?;

        match format {
            OutputFormat::Text => Ok(format_replay_text(&report)),
            OutputFormat::Json => format_replay_json(&report),
        }
    }
}

fn command_name(command: &Commands) -> &'static str {
    match command {
        Commands::Replay { .. } => "replay",
        Commands::Config => "config",
    }
}
