use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use crate::model::config::Config;

pub const CONFIG_FILE: &str = "config.toml";

/// Error type for reading config.toml
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("could not read {path}: {source}")]
    ReadError { path: PathBuf, source: io::Error },
    #[error("could not parse {path}: {source}")]
    ParseError {
        path: PathBuf,
        source: toml::de::Error,
    },
}

/// Read config.toml from the data directory. A missing file yields defaults.
pub fn read_config(data_dir: &Path) -> Result<Config, ConfigError> {
    let path = data_dir.join(CONFIG_FILE);
    let text = match fs::read_to_string(&path) {
        Ok(text) => text,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Config::default()),
        Err(e) => return Err(ConfigError::ReadError { path, source: e }),
    };
    toml::from_str(&text).map_err(|e| ConfigError::ParseError { path, source: e })
}

/// Resolve the data directory: `$LISTMACHINE_DIR`, else
/// `$XDG_DATA_HOME/listmachine`, else `~/.local/share/listmachine`.
pub fn default_data_dir() -> PathBuf {
    if let Ok(dir) = std::env::var("LISTMACHINE_DIR") {
        return PathBuf::from(dir);
    }
    let data_home = std::env::var("XDG_DATA_HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|_| dirs_home().join(".local").join("share"));
    data_home.join("listmachine")
}

/// Get the user's home directory
fn dirs_home() -> PathBuf {
    std::env::var("HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from("/"))
}
