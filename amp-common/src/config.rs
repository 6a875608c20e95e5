//! Configuration file resolution and TOML loading

use crate::{Error, Result};
use serde::de::DeserializeOwned;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Directory name under the platform config directory
pub const CONFIG_DIR_NAME: &str = "musicamp";

/// File name of the TOML configuration
pub const CONFIG_FILE_NAME: &str = "config.toml";

/// Config file resolution following priority order:
/// 1. Command-line argument (highest priority)
/// 2. Environment variable
/// 3. `<config_dir>/musicamp/config.toml`, if it exists
///
/// Explicit paths (1 and 2) are returned even when the file does not exist,
/// so that loading reports the mistake. Returns `None` when nothing applies.
pub fn resolve_config_file(cli_arg: Option<&Path>, env_var_name: &str) -> Option<PathBuf> {
    // Priority 1: Command-line argument
    if let Some(path) = cli_arg {
        debug!("Using config file from command line: {}", path.display());
        return Some(path.to_path_buf());
    }

    // Priority 2: Environment variable
    if let Ok(path) = std::env::var(env_var_name) {
        if !path.trim().is_empty() {
            debug!("Using config file from {}: {}", env_var_name, path);
            return Some(PathBuf::from(path));
        }
    }

    // Priority 3: platform default, only when present
    default_config_file().filter(|path| path.exists())
}

/// Platform default location of the config file
///
/// - Linux: `~/.config/musicamp/config.toml`
/// - macOS: `~/Library/Application Support/musicamp/config.toml`
/// - Windows: `%APPDATA%\musicamp\config.toml`
pub fn default_config_file() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join(CONFIG_DIR_NAME).join(CONFIG_FILE_NAME))
}

/// Read and parse a TOML file into `T`
pub fn load_toml<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let content = std::fs::read_to_string(path).map_err(|e| {
        Error::Config(format!("Failed to read config file {}: {}", path.display(), e))
    })?;

    toml::from_str(&content).map_err(|e| {
        Error::Config(format!("Invalid config file {}: {}", path.display(), e))
    })
}
