//! Workspace config files under `<workspace>/config/`.
//!
//! `config.toml` is the base layer. When `HISTATE_ENV` names a profile,
//! `<profile>.toml` is layered on top of it.

use config::builder::DefaultState;
use config::ConfigBuilder;
use config::ConfigError;
use config::File;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Selects the profile file layered over `config.toml`.
pub const PROFILE_VAR: &str = "HISTATE_ENV";

const BASE_FILE: &str = "config.toml";

/// Existing workspace config files, lowest precedence first.
pub fn workspace_config_files(workspace_root: &Path, profile: Option<&str>) -> Vec<PathBuf> {
    let dir = workspace_root.join("config");
    let profile_file = profile
        .map(str::trim)
        .filter(|p| !p.is_empty())
        .map(|p| format!("{}.toml", p));

    std::iter::once(BASE_FILE.to_string())
        .chain(profile_file)
        .map(|name| dir.join(name))
        .filter(|path| path.is_file())
        .collect()
}

/// Layer the workspace files onto `builder`.
pub fn add_to_builder(
    builder: ConfigBuilder<DefaultState>,
    workspace_root: &Path,
) -> Result<ConfigBuilder<DefaultState>, ConfigError> {
    let profile = std::env::var(PROFILE_VAR).ok();
    let files = workspace_config_files(workspace_root, profile.as_deref());
    debug!(
        workspace = %workspace_root.display(),
        profile = profile.as_deref().unwrap_or("-"),
        files = files.len(),
        "workspace configuration files"
    );

    Ok(files.into_iter().fold(builder, |builder, path| {
        builder.add_source(File::from(path).required(true))
    }))
}
