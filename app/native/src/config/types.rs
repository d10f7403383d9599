//! Configuration types and file discovery.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::animation::{DEFAULT_FPS, FrameFormat};
use crate::storage::DEFAULT_PREFIX;

/// Errors that can occur while loading the configuration file.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// No configuration file exists in any of the expected locations.
    #[error(
        "No configuration file found. Expected at ~/.config/gifpaper/config.jsonc or \
         <config dir>/gifpaper/config.jsonc"
    )]
    NotFound,
    /// The configuration file exists but could not be read.
    #[error("Failed to read configuration file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    /// The configuration file contains invalid JSON.
    #[error("Failed to parse configuration file {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

/// Startup configuration. Runtime changes (such as a new frame rate picked
/// from the console) are never written back.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct GifpaperConfig {
    /// Initial frames per second. Zero is rejected at startup.
    pub fps: u32,

    /// Image format used for the frame files.
    pub frame_format: FrameFormat,

    /// Name prefix of the temp directory holding frames and the backup.
    pub temp_prefix: String,

    /// Parent directory for the temp directory. Empty means the system temp dir.
    /// Relative paths are resolved against the configuration file's directory.
    pub temp_dir: String,
}

impl Default for GifpaperConfig {
    fn default() -> Self {
        Self {
            fps: DEFAULT_FPS,
            frame_format: FrameFormat::default(),
            temp_prefix: DEFAULT_PREFIX.to_string(),
            temp_dir: String::new(),
        }
    }
}

/// Configuration file names to search for (in priority order).
const CONFIG_FILE_NAMES: &[&str] = &["config.jsonc", "config.json"];

/// Returns the possible configuration file paths in priority order.
///
/// 1. `$XDG_CONFIG_HOME/gifpaper/` when the variable is set
/// 2. `~/.config/gifpaper/`
/// 3. The platform config dir (`dirs::config_dir()`), e.g. `%APPDATA%` or
///    `~/Library/Application Support`
#[must_use]
pub fn config_paths() -> Vec<PathBuf> {
    let mut dirs_to_check = Vec::new();

    if let Ok(xdg_config) = std::env::var("XDG_CONFIG_HOME")
        && !xdg_config.is_empty()
    {
        dirs_to_check.push(PathBuf::from(xdg_config).join("gifpaper"));
    }
    if let Some(home) = dirs::home_dir() {
        dirs_to_check.push(home.join(".config").join("gifpaper"));
    }
    if let Some(config_dir) = dirs::config_dir() {
        dirs_to_check.push(config_dir.join("gifpaper"));
    }

    let mut paths = Vec::new();
    for dir in dirs_to_check {
        for filename in CONFIG_FILE_NAMES {
            let path = dir.join(filename);
            if !paths.contains(&path) {
                paths.push(path);
            }
        }
    }
    paths
}

/// Loads the first configuration file found in [`config_paths`].
///
/// # Errors
///
/// Returns [`ConfigError::NotFound`] if no file exists, or the errors of
/// [`load_config_from_path`].
pub fn load_config() -> Result<(GifpaperConfig, PathBuf), ConfigError> {
    for path in config_paths() {
        if path.exists() {
            return load_config_from_path(&path);
        }
    }

    Err(ConfigError::NotFound)
}

/// Loads a configuration file, accepting JSON with comments.
///
/// # Errors
///
/// Returns [`ConfigError::Io`] or [`ConfigError::Parse`].
pub fn load_config_from_path(path: &Path) -> Result<(GifpaperConfig, PathBuf), ConfigError> {
    let file = fs::File::open(path)
        .map_err(|source| ConfigError::Io { path: path.to_path_buf(), source })?;

    // Strip comments from JSONC before parsing
    let reader = json_comments::StripComments::new(file);
    let config: GifpaperConfig = serde_json::from_reader(reader)
        .map_err(|source| ConfigError::Parse { path: path.to_path_buf(), source })?;

    Ok((config, path.to_path_buf()))
}
