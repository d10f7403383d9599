//! Access to the desktop wallpaper.
//!
//! The rest of the crate only talks to the desktop through [`WallpaperSink`],
//! so playback and backup logic can run against a recording double in tests.

mod backup;
mod system;

use std::path::{Path, PathBuf};

pub use backup::{BackupError, BackupManager, BackupState};
pub use system::SystemWallpaper;
use thiserror::Error;

/// Errors reported by a wallpaper sink.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum SinkError {
    /// The image to apply does not exist.
    #[error("wallpaper file not found: {0}")]
    FileNotFound(String),
    /// Reading the current wallpaper failed.
    #[error("failed to read current wallpaper: {0}")]
    GetFailed(String),
    /// Applying the wallpaper failed.
    #[error("failed to set wallpaper: {0}")]
    SetFailed(String),
}

/// Reads and writes the desktop wallpaper.
///
/// Implementations are shared between the intent thread and the player
/// thread, hence `Send + Sync`.
pub trait WallpaperSink: Send + Sync {
    /// Returns the path of the image currently used as wallpaper.
    ///
    /// # Errors
    ///
    /// Returns [`SinkError::GetFailed`] when the desktop cannot be queried.
    fn get(&self) -> Result<PathBuf, SinkError>;

    /// Applies the image at `path` as wallpaper.
    ///
    /// # Errors
    ///
    /// Returns [`SinkError`] when the image is missing or the desktop refuses it.
    fn set(&self, path: &Path) -> Result<(), SinkError>;
}
