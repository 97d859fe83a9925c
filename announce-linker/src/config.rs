//! Configuration resolution for announce-linker
//!
//! Every setting resolves CLI → ENV → TOML → default, first non-empty value
//! wins. Paths not set anywhere are derived from the data folder.

use crate::services::fuzzy_matcher::DEFAULT_MIN_SCORE;
use crate::services::manual_resolver::DEFAULT_WEB_BASE;
use crate::services::tfl_client::{TflSettings, DEFAULT_API_BASE};
use announce_common::config::{resolve_root_folder, TomlConfig, ROOT_FOLDER_ENV};
use announce_common::{Error, Result};
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// Environment variable overriding the database path
pub const DATABASE_ENV: &str = "ANNOUNCE_DATABASE";
/// Environment variable holding the TfL application id
pub const TFL_APP_ID_ENV: &str = "TFL_APP_ID";
/// Environment variable holding the TfL application key
pub const TFL_APP_KEY_ENV: &str = "TFL_APP_KEY";

const DATABASE_FILE: &str = "tfl.db";

/// Values given on the command line
#[derive(Debug, Clone, Default)]
pub struct CliOverrides {
    pub root_folder: Option<PathBuf>,
    pub database: Option<PathBuf>,
    pub stops_dir: Option<PathBuf>,
    pub destinations_dir: Option<PathBuf>,
    pub min_score: Option<u8>,
}

/// Fully resolved linker configuration
#[derive(Debug, Clone, PartialEq)]
pub struct LinkerConfig {
    pub root_folder: PathBuf,
    pub database_path: PathBuf,
    pub stops_dir: PathBuf,
    pub destinations_dir: PathBuf,
    pub audio_extensions: Vec<String>,
    pub min_score: u8,
    pub tfl: TflSettings,
    /// Base URL for operator lookup pages
    pub web_base: String,
    pub log_level: String,
}

impl LinkerConfig {
    /// Resolve the configuration from CLI values and the loaded TOML file
    pub fn resolve(cli: &CliOverrides, toml: &TomlConfig) -> Result<Self> {
        let root_folder = resolve_root_folder(
            cli.root_folder.as_deref(),
            ROOT_FOLDER_ENV,
            toml.root_folder.as_deref(),
        );

        let database_path = cli
            .database
            .clone()
            .or_else(|| env_value(DATABASE_ENV).map(PathBuf::from))
            .or_else(|| toml.database_path.clone())
            .unwrap_or_else(|| root_folder.join(DATABASE_FILE));

        let stops_dir = cli
            .stops_dir
            .clone()
            .or_else(|| toml.stops_dir.clone())
            .unwrap_or_else(|| default_recordings_dir(&root_folder, "Stops"));

        let destinations_dir = cli
            .destinations_dir
            .clone()
            .or_else(|| toml.destinations_dir.clone())
            .unwrap_or_else(|| default_recordings_dir(&root_folder, "Destinations"));

        let audio_extensions = match &toml.audio_extensions {
            Some(extensions) if !extensions.is_empty() => extensions.clone(),
            _ => vec!["mp3".to_string()],
        };

        let min_score = cli.min_score.or(toml.min_score).unwrap_or(DEFAULT_MIN_SCORE);
        if min_score > 100 {
            return Err(Error::Config(format!(
                "min_score must be between 0 and 100, got {}",
                min_score
            )));
        }

        let tfl = TflSettings {
            api_base: toml
                .tfl
                .api_base
                .clone()
                .unwrap_or_else(|| DEFAULT_API_BASE.to_string()),
            app_id: resolve_secret("TfL app id", TFL_APP_ID_ENV, toml.tfl.app_id.as_deref()),
            app_key: resolve_secret("TfL app key", TFL_APP_KEY_ENV, toml.tfl.app_key.as_deref()),
        };

        let web_base = toml
            .tfl
            .web_base
            .clone()
            .unwrap_or_else(|| DEFAULT_WEB_BASE.to_string());

        Ok(Self {
            root_folder,
            database_path,
            stops_dir,
            destinations_dir,
            audio_extensions,
            min_score,
            tfl,
            web_base,
            log_level: toml.logging.level.clone(),
        })
    }
}

/// `<root>/Renamed/<class>`, where the renamed recording set is kept
fn default_recordings_dir(root_folder: &Path, class: &str) -> PathBuf {
    root_folder.join("Renamed").join(class)
}

fn env_value(name: &str) -> Option<String> {
    std::env::var(name)
        .ok()
        .filter(|value| !value.trim().is_empty())
}

/// Resolve a credential from ENV, then TOML
///
/// Warns when both are set, since the TOML value is then ignored.
fn resolve_secret(label: &str, env_var_name: &str, toml_value: Option<&str>) -> Option<String> {
    let env = env_value(env_var_name);
    let toml = toml_value.filter(|v| !v.trim().is_empty());

    match (env, toml) {
        (Some(env), Some(_)) => {
            warn!(
                "{} set in both {} and TOML config. Using environment variable.",
                label, env_var_name
            );
            Some(env)
        }
        (Some(env), None) => {
            info!("{} loaded from environment variable", label);
            Some(env)
        }
        (None, Some(toml)) => {
            info!("{} loaded from TOML config", label);
            Some(toml.to_string())
        }
        (None, None) => None,
    }
}
