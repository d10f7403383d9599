//! Backup and restore of the wallpaper that was active before playback.

use std::fs;
use std::path::{Path, PathBuf};

use thiserror::Error;

use super::{SinkError, WallpaperSink};
use crate::storage::EphemeralStorage;

/// Extension used when the original wallpaper has none.
const FALLBACK_EXTENSION: &str = "jpg";

/// Reasons a backup could not be taken. Never fatal.
#[derive(Debug, Error)]
pub enum BackupError {
    /// The desktop did not report its current wallpaper.
    #[error(transparent)]
    Sink(#[from] SinkError),
    /// The wallpaper file could not be copied into the temp directory.
    #[error("failed to copy {from} to {to}: {source}")]
    Copy {
        from: PathBuf,
        to: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Location of the backup copy, if one was taken.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BackupState {
    path: Option<PathBuf>,
}

impl BackupState {
    /// Path of the copied wallpaper.
    #[must_use]
    pub fn path(&self) -> Option<&Path> { self.path.as_deref() }

    /// Whether a backup is available.
    #[must_use]
    pub const fn is_present(&self) -> bool { self.path.is_some() }
}

/// Captures the wallpaper once at startup and puts it back at shutdown.
#[derive(Debug, Default)]
pub struct BackupManager {
    state: BackupState,
}

impl BackupManager {
    /// Copies the current wallpaper into `storage`.
    ///
    /// Failures are logged and leave the backup empty, turning
    /// [`Self::restore`] into a no-op.
    pub fn capture(sink: &dyn WallpaperSink, storage: &EphemeralStorage) -> Self {
        match copy_current(sink, storage) {
            Ok(path) => {
                tracing::info!(path = %path.display(), "backed up current wallpaper");
                Self { state: BackupState { path: Some(path) } }
            }
            Err(err) => {
                tracing::warn!(error = %err, "could not back up current wallpaper, it will not be restored");
                Self::default()
            }
        }
    }

    /// The captured state.
    #[must_use]
    pub const fn state(&self) -> &BackupState { &self.state }

    /// Re-applies the backed-up wallpaper.
    ///
    /// Returns `true` if the sink accepted it. Safe to call repeatedly; each
    /// call repeats the same set operation.
    pub fn restore(&self, sink: &dyn WallpaperSink) -> bool {
        let Some(path) = self.state.path() else {
            tracing::debug!("no wallpaper backup, skipping restore");
            return false;
        };

        tracing::info!(path = %path.display(), "restoring wallpaper");
        match sink.set(path) {
            Ok(()) => true,
            Err(err) => {
                tracing::warn!(error = %err, "failed to restore wallpaper");
                false
            }
        }
    }
}

fn copy_current(sink: &dyn WallpaperSink, storage: &EphemeralStorage) -> Result<PathBuf, BackupError> {
    let current = sink.get()?;

    let extension = current
        .extension()
        .and_then(|ext| ext.to_str())
        .filter(|ext| !ext.is_empty())
        .unwrap_or(FALLBACK_EXTENSION)
        .to_ascii_lowercase();
    let target = storage.backup_path(&extension);

    fs::copy(&current, &target).map_err(|source| BackupError::Copy {
        from: current.clone(),
        to: target.clone(),
        source,
    })?;

    Ok(target)
}
