use serde::{Deserialize, Serialize};

/// Configuration from config.toml in the data directory
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub undo: UndoConfig,
    #[serde(default)]
    pub export: ExportConfig,
    #[serde(default)]
    pub remote: RemoteConfig,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UndoConfig {
    /// Oldest deletions are dropped past this many entries
    #[serde(default = "default_undo_limit")]
    pub limit: usize,
}

impl Default for UndoConfig {
    fn default() -> Self {
        UndoConfig {
            limit: default_undo_limit(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExportConfig {
    /// Wrap width in display cells
    #[serde(default = "default_export_width")]
    pub width: usize,
    #[serde(default = "default_lines_per_page")]
    pub lines_per_page: usize,
}

impl Default for ExportConfig {
    fn default() -> Self {
        ExportConfig {
            width: default_export_width(),
            lines_per_page: default_lines_per_page(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemoteConfig {
    #[serde(default = "default_base_url")]
    pub base_url: String,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    /// Total attempts per request, including the first
    #[serde(default = "default_attempts")]
    pub attempts: u32,
    /// Delay before the first retry; doubles on each further retry
    #[serde(default = "default_backoff_ms")]
    pub backoff_ms: u64,
}

impl Default for RemoteConfig {
    fn default() -> Self {
        RemoteConfig {
            base_url: default_base_url(),
            timeout_secs: default_timeout_secs(),
            attempts: default_attempts(),
            backoff_ms: default_backoff_ms(),
        }
    }
}

fn default_undo_limit() -> usize {
    500
}

fn default_export_width() -> usize {
    72
}

fn default_lines_per_page() -> usize {
    40
}

fn default_base_url() -> String {
    "http://localhost:3000".to_string()
}

fn default_timeout_secs() -> u64 {
    10
}

fn default_attempts() -> u32 {
    3
}

fn default_backoff_ms() -> u64 {
    200
}
