//! Desktop wallpaper access through the `wallpaper` crate.
//!
//! Supports the desktops that crate knows about (Windows, macOS, GNOME, KDE,
//! XFCE and friends). Only the primary wallpaper is touched.

use std::path::{Path, PathBuf};

use super::{SinkError, WallpaperSink};

/// The real desktop.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemWallpaper;

impl WallpaperSink for SystemWallpaper {
    fn get(&self) -> Result<PathBuf, SinkError> {
        let current = ::wallpaper::get().map_err(|e| SinkError::GetFailed(e.to_string()))?;

        // Some desktops report a file:// URI instead of a path
        let current = current.trim();
        let current = current.strip_prefix("file://").unwrap_or(current);

        if current.is_empty() {
            return Err(SinkError::GetFailed("desktop reported no wallpaper".to_string()));
        }

        Ok(PathBuf::from(current))
    }

    fn set(&self, path: &Path) -> Result<(), SinkError> {
        if !path.exists() {
            return Err(SinkError::FileNotFound(path.display().to_string()));
        }

        let path_str = path.display().to_string();

        ::wallpaper::set_from_path(&path_str).map_err(|e| SinkError::SetFailed(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_set_rejects_missing_file() {
        let result = SystemWallpaper.set(Path::new("/nonexistent/path/to/frame-0.png"));
        assert!(matches!(result, Err(SinkError::FileNotFound(_))));
    }

    #[test]
    fn test_sink_error_display() {
        let err = SinkError::SetFailed("permission denied".to_string());
        let msg = err.to_string();
        assert!(msg.contains("failed to set wallpaper"));
        assert!(msg.contains("permission denied"));

        let err = SinkError::FileNotFound("/missing.png".to_string());
        assert!(err.to_string().contains("/missing.png"));
    }
}
