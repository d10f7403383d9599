//! Configuration for gifpaper.
//!
//! Settings come from an optional JSONC file (JSON with `//` and `/* */`
//! comments) and are then overridden by command-line flags and environment
//! variables. The file is only read, never written.

pub mod types;

use std::path::{Path, PathBuf};

pub use types::{ConfigError, GifpaperConfig, config_paths, load_config, load_config_from_path};

use crate::platform::path::expand_and_resolve;

/// A loaded configuration together with where it came from.
#[derive(Debug, Clone, Default)]
pub struct LoadedConfig {
    pub config: GifpaperConfig,
    /// File the configuration was read from, if any.
    pub path: Option<PathBuf>,
}

impl LoadedConfig {
    /// Parent directory for the temp directory, resolved against the
    /// configuration file's directory. `None` means the system temp dir.
    #[must_use]
    pub fn temp_parent(&self) -> Option<PathBuf> {
        if self.config.temp_dir.trim().is_empty() {
            return None;
        }

        let base = self
            .path
            .as_deref()
            .and_then(Path::parent)
            .map_or_else(|| PathBuf::from("."), Path::to_path_buf);
        Some(expand_and_resolve(&self.config.temp_dir, &base))
    }
}

/// Loads the configuration from `custom_path` or the default search paths.
///
/// A missing file yields the defaults silently. An unreadable or invalid file
/// is logged and also yields the defaults.
#[must_use]
pub fn load(custom_path: Option<&Path>) -> LoadedConfig {
    let result = custom_path.map_or_else(load_config, load_config_from_path);

    match result {
        Ok((config, path)) => {
            tracing::debug!(path = %path.display(), "loaded configuration");
            LoadedConfig { config, path: Some(path) }
        }
        Err(ConfigError::NotFound) => LoadedConfig::default(),
        Err(err) => {
            tracing::warn!(error = %err, "failed to load configuration, using defaults");
            LoadedConfig::default()
        }
    }
}
