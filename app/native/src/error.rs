//! Error types for gifpaper.
//!
//! Only startup failures travel up to `main`; every other error is logged
//! where it happens so the animation keeps running.

use thiserror::Error;

use crate::animation::{DecodeError, FrameStoreError, InvalidFrameRate, PlaybackError};
use crate::storage::StorageError;

/// Errors surfaced by the application.
#[derive(Debug, Error)]
pub enum GifpaperError {
    /// The temp directory could not be created or removed.
    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),
    /// A GIF could not be read or decoded.
    #[error("Decode error: {0}")]
    Decode(#[from] DecodeError),
    /// Frames could not be replaced.
    #[error("Frame store error: {0}")]
    FrameStore(#[from] FrameStoreError),
    /// The player thread failed.
    #[error("Playback error: {0}")]
    Playback(#[from] PlaybackError),
    /// Invalid frame rate.
    #[error("{0}")]
    InvalidFrameRate(#[from] InvalidFrameRate),
    /// The intent listener thread could not be started.
    #[error("failed to start the intent listener")]
    Listener,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_storage_error_display() {
        let err = GifpaperError::from(StorageError::Create {
            parent: "/tmp/missing".into(),
            source: std::io::Error::new(std::io::ErrorKind::NotFound, "no such directory"),
        });
        let msg = err.to_string();
        assert!(msg.contains("Storage error"));
        assert!(msg.contains("/tmp/missing"));
    }

    #[test]
    fn test_decode_error_display() {
        let err = GifpaperError::from(DecodeError::Empty);
        assert!(err.to_string().contains("GIF contains no frames"));
    }

    #[test]
    fn test_playback_error_display() {
        let err = GifpaperError::from(PlaybackError::SendFailed);
        assert!(err.to_string().contains("Playback error"));
    }

    #[test]
    fn test_invalid_frame_rate_display() {
        let err = GifpaperError::from(InvalidFrameRate("0".to_string()));
        assert_eq!(err.to_string(), "invalid frame rate '0': expected a positive whole number");
    }

    #[test]
    fn test_error_is_debug() {
        let err = GifpaperError::from(FrameStoreError::InUse);
        assert!(format!("{err:?}").contains("InUse"));
    }
}
