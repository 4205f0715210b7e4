//! Integration tests for Configuration System

use crate::integration::test_utils::with_isolated_env;
use histate::config::ConfigLoader;
use histate::{History, HistoryEnv};
use serde_json::{json, Value};
use std::fs;
use std::sync::Arc;
use tempfile::TempDir;

fn write(path: &std::path::Path, content: &str) {
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(path, content).unwrap();
}

#[test]
fn test_defaults_without_any_files() {
    let temp_dir = TempDir::new().unwrap();
    with_isolated_env(&temp_dir, || {
        let config = ConfigLoader::load(&temp_dir.path().join("ws")).unwrap();
        assert_eq!(config.history.name, "historyBase");
        assert!(config.history.initial_state.is_none());
        assert!(config.logging.enabled);
        assert_eq!(config.logging.output, "stderr");
    });
}

#[test]
fn test_precedence_global_workspace_env_file_and_variables() {
    let temp_dir = TempDir::new().unwrap();
    let workspace = temp_dir.path().join("ws");

    write(
        &temp_dir.path().join("xdg/histate/config.toml"),
        "[history]\nname = \"global\"\n\n[logging]\nlevel = \"warn\"\nformat = \"json\"\n",
    );
    write(
        &workspace.join("config/config.toml"),
        "[history]\nname = \"workspace\"\n\n[logging]\nlevel = \"debug\"\n",
    );
    write(
        &workspace.join("config/staging.toml"),
        "[history]\nname = \"staging\"\n",
    );

    with_isolated_env(&temp_dir, || {
        let config = ConfigLoader::load(&workspace).unwrap();
        assert_eq!(config.history.name, "workspace");
        assert_eq!(config.logging.level, "debug");
        assert_eq!(config.logging.format, "json");

        std::env::set_var("HISTATE_ENV", "staging");
        let config = ConfigLoader::load(&workspace).unwrap();
        assert_eq!(config.history.name, "staging");

        std::env::set_var("HISTATE__HISTORY__NAME", "from-env");
        let config = ConfigLoader::load(&workspace).unwrap();
        assert_eq!(config.history.name, "from-env");
    });
}

#[test]
fn test_configured_initial_state_seeds_history() {
    let temp_dir = TempDir::new().unwrap();
    let config_file = temp_dir.path().join("histate.toml");
    write(
        &config_file,
        r#"
[history]
name = "navigation"

[history.initial_state]
page = 2
filters = ["unread"]
"#,
    );

    let config = with_isolated_env(&temp_dir, || ConfigLoader::load_from_file(&config_file))
        .unwrap();
    assert!(config.validate().is_ok());

    let env: Arc<HistoryEnv<Value>> = HistoryEnv::shared();
    let history = History::with_options(&env, config.history.options()).unwrap();
    assert_eq!(history.name(), "navigation");
    assert_eq!(history.get("page"), Some(json!(2)));
    assert_eq!(history.get("filters"), Some(json!(["unread"])));
}

#[test]
fn test_invalid_logging_settings_fail_validation() {
    let temp_dir = TempDir::new().unwrap();
    let config_file = temp_dir.path().join("histate.toml");
    write(&config_file, "[logging]\noutput = \"syslog\"\n");

    let config = with_isolated_env(&temp_dir, || ConfigLoader::load_from_file(&config_file))
        .unwrap();
    let errors = config.validate().unwrap_err();
    assert_eq!(errors.len(), 1);
    assert!(errors[0].to_string().contains("syslog"));
}
