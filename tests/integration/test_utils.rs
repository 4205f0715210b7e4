//! Shared test utilities for integration tests
//!
//! Serializes access to process-wide environment variables so config tests
//! can point the loader at isolated directories.

use std::sync::Mutex;
use tempfile::TempDir;

/// Global mutex to serialize environment variable access across all tests
static ENV_MUTEX: Mutex<()> = Mutex::new(());

const VARS: [&str; 4] = ["HOME", "XDG_CONFIG_HOME", "HISTATE_ENV", "HISTATE__HISTORY__NAME"];

/// Environment variable state to restore after test
struct EnvState(Vec<(&'static str, Option<String>)>);

impl EnvState {
    fn capture() -> Self {
        Self(VARS.iter().map(|v| (*v, std::env::var(v).ok())).collect())
    }

    fn restore(self) {
        for (name, value) in self.0 {
            match value {
                Some(orig) => std::env::set_var(name, orig),
                None => std::env::remove_var(name),
            }
        }
    }
}

/// Run `f` with HOME and XDG_CONFIG_HOME pointed into `test_dir` and any
/// histate overrides cleared. The original environment is restored after.
pub fn with_isolated_env<F, R>(test_dir: &TempDir, f: F) -> R
where
    F: FnOnce() -> R,
{
    let _guard = ENV_MUTEX.lock().unwrap_or_else(|e| e.into_inner());
    let env_state = EnvState::capture();

    let test_home = test_dir.path().join("home");
    std::fs::create_dir_all(&test_home).unwrap();

    std::env::set_var("HOME", test_home.to_str().unwrap());
    std::env::set_var("XDG_CONFIG_HOME", test_dir.path().join("xdg").to_str().unwrap());
    std::env::remove_var("HISTATE_ENV");
    std::env::remove_var("HISTATE__HISTORY__NAME");

    let result = f();

    env_state.restore();

    result
}
