//! Config loading: defaults, files and environment merged in precedence order.

use std::path::Path;

use config::{Environment, File};
use tracing::debug;

use crate::config::merge::merge_policy;
use crate::config::sources::{global_file, workspace_file};
use crate::config::HistateConfig;
use crate::error::HistoryError;

/// Prefix of environment overrides, e.g. `HISTATE__HISTORY__NAME`.
pub const ENV_PREFIX: &str = "HISTATE";

pub struct ConfigLoader;

impl ConfigLoader {
    /// Load configuration for a workspace.
    ///
    /// Precedence (lowest to highest): defaults, global file, workspace
    /// `config/config.toml`, workspace `config/{HISTATE_ENV}.toml`,
    /// environment.
    pub fn load(workspace_root: &Path) -> Result<HistateConfig, HistoryError> {
        let builder = merge_policy::builder_with_defaults()?;
        let builder = global_file::add_to_builder(builder)?;
        let builder = workspace_file::add_to_builder(builder, workspace_root)?;
        let builder = builder.add_source(environment());

        let config: HistateConfig = builder.build()?.try_deserialize()?;
        debug!(workspace = %workspace_root.display(), "configuration loaded");
        Ok(config)
    }

    /// Load a single file on top of the defaults; environment still applies.
    pub fn load_from_file(path: &Path) -> Result<HistateConfig, HistoryError> {
        if !path.exists() {
            return Err(HistoryError::Config(format!(
                "config file not found: {}",
                path.display()
            )));
        }
        let config: HistateConfig = merge_policy::builder_with_defaults()?
            .add_source(File::from(path).required(true))
            .add_source(environment())
            .build()?
            .try_deserialize()?;
        debug!(path = %path.display(), "configuration loaded from file");
        Ok(config)
    }

    /// Defaults only.
    pub fn defaults() -> Result<HistateConfig, HistoryError> {
        let config: HistateConfig = merge_policy::builder_with_defaults()?
            .build()?
            .try_deserialize()?;
        Ok(config)
    }
}

fn environment() -> Environment {
    Environment::with_prefix(ENV_PREFIX)
        .prefix_separator("__")
        .separator("__")
}
