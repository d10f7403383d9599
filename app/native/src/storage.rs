//! Process-scoped scratch directory for decoded frames and the wallpaper backup.
//!
//! Layout:
//!
//! ```text
//! <tmp>/live-wallpaperXXXXXX/
//!   old-bg.<ext>       backup of the wallpaper found at startup
//!   frame-<index>.<ext> one file per decoded frame
//! ```
//!
//! The directory is removed by [`EphemeralStorage::destroy`] on a clean
//! shutdown, or when the value is dropped. A process that is killed leaves it
//! behind.

use std::path::{Path, PathBuf};

use tempfile::TempDir;
use thiserror::Error;

/// Default prefix for the scratch directory name.
pub const DEFAULT_PREFIX: &str = "live-wallpaper";

/// Errors raised while managing the scratch directory.
#[derive(Debug, Error)]
pub enum StorageError {
    /// The scratch directory could not be created. Fatal at startup.
    #[error("failed to create temp directory under {parent}: {source}")]
    Create {
        parent: PathBuf,
        #[source]
        source: std::io::Error,
    },
    /// The scratch directory could not be removed.
    #[error("failed to remove temp directory {path}: {source}")]
    Cleanup {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Owns the scratch directory for the lifetime of the process.
#[derive(Debug)]
pub struct EphemeralStorage {
    dir: TempDir,
}

impl EphemeralStorage {
    /// Creates the scratch directory under the system temp directory.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::Create`] if the directory cannot be created.
    pub fn create(prefix: &str) -> Result<Self, StorageError> {
        Self::create_in(&std::env::temp_dir(), prefix)
    }

    /// Creates the scratch directory under `parent`.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::Create`] if the directory cannot be created.
    pub fn create_in(parent: &Path, prefix: &str) -> Result<Self, StorageError> {
        let prefix = if prefix.trim().is_empty() { DEFAULT_PREFIX } else { prefix };

        let dir = tempfile::Builder::new().prefix(prefix).tempdir_in(parent).map_err(|source| {
            StorageError::Create { parent: parent.to_path_buf(), source }
        })?;

        tracing::info!(path = %dir.path().display(), "created temp directory");
        Ok(Self { dir })
    }

    /// Root of the scratch directory.
    #[must_use]
    pub fn path(&self) -> &Path { self.dir.path() }

    /// Location of the frame with the given index.
    #[must_use]
    pub fn frame_path(&self, index: usize, extension: &str) -> PathBuf {
        frame_path_in(self.path(), index, extension)
    }

    /// Location of the wallpaper backup copy.
    #[must_use]
    pub fn backup_path(&self, extension: &str) -> PathBuf {
        self.path().join(format!("old-bg.{extension}"))
    }

    /// Recursively removes the scratch directory.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::Cleanup`] if removal fails. Callers log it;
    /// there is nothing left to retry during shutdown.
    pub fn destroy(self) -> Result<(), StorageError> {
        let path = self.dir.path().to_path_buf();
        tracing::info!(path = %path.display(), "removing temp directory");
        self.dir.close().map_err(|source| StorageError::Cleanup { path, source })
    }
}

/// Builds `frame-<index>.<ext>` under `root`.
pub(crate) fn frame_path_in(root: &Path, index: usize, extension: &str) -> PathBuf {
    root.join(format!("frame-{index}.{extension}"))
}
