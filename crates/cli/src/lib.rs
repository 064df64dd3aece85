use std::env;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

pub mod commands;
pub mod logging;

/// Environment variable naming an explicit config file.
pub const CONFIG_ENV: &str = "IDBGEN_CONFIG";

/// Canonicalize a user-supplied path if possible, falling back to the given
/// string relative to the current working directory.
pub fn canonicalize_or_current(path: &str) -> Result<PathBuf> {
    let path = Path::new(path);
    if path == Path::new(".") {
        return env::current_dir().context("Failed to get current directory");
    }
    // Paths that do not exist yet (e.g., a fresh output dir) are made absolute.
    match path.canonicalize() {
        Ok(p) => Ok(p),
        Err(_) if path.is_absolute() => Ok(path.to_path_buf()),
        Err(_) => {
            let cwd = env::current_dir().context("Failed to get current directory")?;
            Ok(cwd.join(path))
        }
    }
}

/// The user's home directory (`HOME`, or `USERPROFILE` on Windows).
pub fn home_dir() -> Option<PathBuf> {
    let var = if cfg!(windows) { "USERPROFILE" } else { "HOME" };
    env::var_os(var).filter(|v| !v.is_empty()).map(PathBuf::from)
}

/// `<home>/.idbgen/config.json`.
pub fn default_config_path() -> Option<PathBuf> {
    home_dir().map(|home| home.join(".idbgen").join("config.json"))
}
