//! Configuration file loading and data folder resolution
//!
//! The data folder (database, default audio directories) is resolved in
//! priority order:
//! 1. Command-line argument (highest priority)
//! 2. Environment variable
//! 3. TOML config file
//! 4. OS-dependent compiled default (fallback)

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// Environment variable naming the data folder
pub const ROOT_FOLDER_ENV: &str = "ANNOUNCE_ROOT_FOLDER";

/// Name of the folder under the platform config/data directories
const APP_DIR_NAME: &str = "announce";

/// Bootstrap configuration loaded from the TOML file
///
/// Every field is optional; anything missing falls back to environment
/// variables or compiled defaults.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TomlConfig {
    /// Data folder holding the database and default audio directories
    #[serde(default)]
    pub root_folder: Option<PathBuf>,

    /// Path to the SQLite entity store
    #[serde(default)]
    pub database_path: Option<PathBuf>,

    /// Directory of stop announcement recordings
    #[serde(default)]
    pub stops_dir: Option<PathBuf>,

    /// Directory of destination announcement recordings
    #[serde(default)]
    pub destinations_dir: Option<PathBuf>,

    /// Audio file extensions (without the dot) treated as candidates
    #[serde(default)]
    pub audio_extensions: Option<Vec<String>>,

    /// Minimum similarity score (0-100) accepted by automatic matching
    #[serde(default)]
    pub min_score: Option<u8>,

    /// Upstream transit API settings
    #[serde(default)]
    pub tfl: TflConfig,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Upstream transit API settings
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TflConfig {
    /// API base URL (default `https://api.tfl.gov.uk`)
    #[serde(default)]
    pub api_base: Option<String>,

    /// Public website base URL used for operator lookup links
    #[serde(default)]
    pub web_base: Option<String>,

    /// Application id sent with every API request
    #[serde(default)]
    pub app_id: Option<String>,

    /// Application key sent with every API request
    #[serde(default)]
    pub app_key: Option<String>,
}

/// Logging configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

/// Default config file location: `<config_dir>/announce/announce.toml`
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join(APP_DIR_NAME).join("announce.toml"))
}

/// Load the TOML config file
///
/// A missing file is not an error: a warning is logged and defaults are
/// returned. A file that exists but cannot be read or parsed is an error.
pub fn load_toml_config(path: &Path) -> Result<TomlConfig> {
    if !path.exists() {
        warn!(
            "Config file not found at {}, using defaults",
            path.display()
        );
        return Ok(TomlConfig::default());
    }

    let content = std::fs::read_to_string(path)
        .map_err(|e| Error::Config(format!("Read {} failed: {}", path.display(), e)))?;
    let config: TomlConfig = toml::from_str(&content)
        .map_err(|e| Error::Config(format!("Parse {} failed: {}", path.display(), e)))?;

    info!("Loaded config file: {}", path.display());
    Ok(config)
}

/// Resolve the data folder
///
/// Priority: CLI argument, then `env_var_name`, then the TOML value, then the
/// OS-dependent default.
pub fn resolve_root_folder(
    cli_arg: Option<&Path>,
    env_var_name: &str,
    toml_value: Option<&Path>,
) -> PathBuf {
    // Priority 1: Command-line argument
    if let Some(path) = cli_arg {
        return path.to_path_buf();
    }

    // Priority 2: Environment variable
    if let Ok(path) = std::env::var(env_var_name) {
        if !path.trim().is_empty() {
            return PathBuf::from(path);
        }
    }

    // Priority 3: TOML config file
    if let Some(path) = toml_value {
        return path.to_path_buf();
    }

    // Priority 4: OS-dependent compiled default
    default_root_folder()
}

/// OS-dependent default data folder
pub fn default_root_folder() -> PathBuf {
    if cfg!(target_os = "windows") {
        // %LOCALAPPDATA%\announce
        dirs::data_local_dir()
            .map(|d| d.join(APP_DIR_NAME))
            .unwrap_or_else(|| PathBuf::from("C:\\ProgramData\\announce"))
    } else if cfg!(target_os = "macos") {
        // ~/Library/Application Support/announce
        dirs::data_dir()
            .map(|d| d.join(APP_DIR_NAME))
            .unwrap_or_else(|| PathBuf::from("/Library/Application Support/announce"))
    } else {
        // ~/.local/share/announce
        dirs::data_local_dir()
            .map(|d| d.join(APP_DIR_NAME))
            .unwrap_or_else(|| PathBuf::from("./announce_data"))
    }
}
