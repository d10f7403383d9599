//! Command-line arguments.

use std::path::PathBuf;

use clap::Parser;

use crate::animation::{FrameFormat, FrameRate};
use crate::app::AppOptions;
use crate::config::{self, LoadedConfig};
use crate::platform::path::expand;

/// Application version from Cargo.toml.
const APP_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Animate the desktop wallpaper with the frames of a GIF.
///
/// While running, type commands on stdin to change the animation:
/// `gif <path>`, `fps <n>`, `quit`. The original wallpaper is restored on
/// exit, including Ctrl-C.
#[derive(Parser, Debug)]
#[command(name = "gifpaper")]
#[command(version = APP_VERSION, about, long_about)]
pub struct Cli {
    /// GIF to start playing right away.
    #[arg(value_name = "GIF")]
    pub gif: Option<String>,

    /// Frames per second (positive whole number).
    #[arg(long, short, env = "GIFPAPER_FPS")]
    pub fps: Option<FrameRate>,

    /// Image format used for the frame files.
    #[arg(long, value_enum, env = "GIFPAPER_FORMAT")]
    pub format: Option<FrameFormat>,

    /// Path to a configuration file (JSON with comments).
    #[arg(long, short, env = "GIFPAPER_CONFIG", value_name = "PATH")]
    pub config: Option<String>,
}

impl Cli {
    /// The GIF given on the command line, with `~` expanded.
    #[must_use]
    pub fn gif_path(&self) -> Option<PathBuf> {
        self.gif.as_deref().map(expand).filter(|path| !path.as_os_str().is_empty())
    }

    /// Loads the configuration file and applies command-line overrides.
    #[must_use]
    pub fn options(&self) -> AppOptions {
        let config_path = self.config.as_deref().map(expand);
        let loaded = config::load(config_path.as_deref());
        self.merge(&loaded)
    }

    fn merge(&self, loaded: &LoadedConfig) -> AppOptions {
        let rate = self.fps.unwrap_or_else(|| {
            FrameRate::new(i64::from(loaded.config.fps)).unwrap_or_else(|err| {
                tracing::warn!(error = %err, "ignoring configured fps");
                FrameRate::default()
            })
        });

        AppOptions {
            rate,
            format: self.format.unwrap_or(loaded.config.frame_format),
            temp_prefix: loaded.config.temp_prefix.clone(),
            temp_parent: loaded.temp_parent(),
        }
    }
}
