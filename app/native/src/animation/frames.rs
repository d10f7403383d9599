//! GIF decoding and frame persistence.
//!
//! Decoding happens fully in memory first, so a malformed GIF never disturbs
//! the frames currently on disk. Persisting re-encodes each frame into the
//! scratch directory as `frame-<index>.<ext>`.

use std::fmt;
use std::fs;
use std::io::Cursor;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

use image::codecs::gif::GifDecoder;
use image::{AnimationDecoder, DynamicImage, ImageFormat, RgbaImage};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::storage::frame_path_in;

/// Frame rate used when nothing else is configured.
pub const DEFAULT_FPS: u32 = 30;

/// Errors raised while decoding a GIF.
#[derive(Debug, Error)]
pub enum DecodeError {
    /// The GIF file could not be read.
    #[error("failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    /// The data is not a GIF the decoder understands.
    #[error("malformed GIF: {0}")]
    Malformed(#[from] image::ImageError),
    /// The GIF decoded to zero frames.
    #[error("GIF contains no frames")]
    Empty,
}

/// Errors raised by [`FrameStore`].
#[derive(Debug, Error)]
pub enum FrameStoreError {
    /// The GIF could not be decoded.
    #[error(transparent)]
    Decode(#[from] DecodeError),
    /// Frames were about to be deleted while playback still reads them.
    #[error("frames are still in use by a running playback session")]
    InUse,
    /// A new animation was persisted before the previous one was cleared.
    #[error("previous frames must be cleared before persisting new ones")]
    NotCleared,
}

/// Rejected frame rate.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("invalid frame rate '{0}': expected a positive whole number")]
pub struct InvalidFrameRate(pub String);

/// Frames per second. Always positive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct FrameRate(u32);

impl FrameRate {
    /// Validates a frame rate.
    ///
    /// # Errors
    ///
    /// Returns [`InvalidFrameRate`] for zero, negative or out of range values.
    pub fn new(fps: i64) -> Result<Self, InvalidFrameRate> {
        u32::try_from(fps)
            .ok()
            .filter(|fps| *fps > 0)
            .map(Self)
            .ok_or_else(|| InvalidFrameRate(fps.to_string()))
    }

    #[must_use]
    pub const fn get(self) -> u32 { self.0 }

    /// Time between two frames: one second divided by the rate.
    #[must_use]
    pub fn period(self) -> Duration { Duration::from_secs(1) / self.0 }
}

impl Default for FrameRate {
    fn default() -> Self { Self(DEFAULT_FPS) }
}

impl FromStr for FrameRate {
    type Err = InvalidFrameRate;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        let trimmed = trimmed
            .strip_suffix("fps")
            .or_else(|| trimmed.strip_suffix("FPS"))
            .unwrap_or(trimmed)
            .trim();

        trimmed.parse::<i64>().map_err(|_| InvalidFrameRate(s.to_string())).and_then(Self::new)
    }
}

impl fmt::Display for FrameRate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { write!(f, "{}fps", self.0) }
}

/// Image format frames are re-encoded to before being handed to the desktop.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum,
)]
#[serde(rename_all = "lowercase")]
pub enum FrameFormat {
    /// Lossless, keeps transparency.
    #[default]
    Png,
    /// Smaller files; transparency is flattened.
    Jpeg,
    /// Same container the frames came from.
    Gif,
}

impl FrameFormat {
    /// File extension for frames in this format.
    #[must_use]
    pub const fn extension(self) -> &'static str {
        match self {
            Self::Png => "png",
            Self::Jpeg => "jpg",
            Self::Gif => "gif",
        }
    }

    const fn image_format(self) -> ImageFormat {
        match self {
            Self::Png => ImageFormat::Png,
            Self::Jpeg => ImageFormat::Jpeg,
            Self::Gif => ImageFormat::Gif,
        }
    }
}

/// A GIF decoded into full-canvas frames, not yet written anywhere.
#[derive(Debug)]
pub struct DecodedGif {
    frames: Vec<RgbaImage>,
}

impl DecodedGif {
    #[must_use]
    pub fn len(&self) -> usize { self.frames.len() }

    #[must_use]
    pub fn is_empty(&self) -> bool { self.frames.is_empty() }
}

/// Decodes every frame of a GIF, preserving order.
///
/// Frames are composited onto the full logical screen, so each one is a
/// complete picture even when the GIF stores only deltas.
///
/// # Errors
///
/// Returns [`DecodeError::Malformed`] for data the decoder rejects and
/// [`DecodeError::Empty`] when no frames come out.
pub fn decode(bytes: &[u8]) -> Result<DecodedGif, DecodeError> {
    let decoder = GifDecoder::new(Cursor::new(bytes))?;
    let frames = decoder.into_frames().collect_frames()?;

    if frames.is_empty() {
        return Err(DecodeError::Empty);
    }

    let frames: Vec<RgbaImage> = frames.into_iter().map(image::Frame::into_buffer).collect();
    tracing::debug!(frames = frames.len(), "decoded GIF");

    Ok(DecodedGif { frames })
}

/// Reads and decodes the GIF at `path`.
///
/// # Errors
///
/// Returns [`DecodeError::Read`] if the file cannot be read, otherwise the
/// errors of [`decode`].
pub fn decode_file(path: &Path) -> Result<DecodedGif, DecodeError> {
    let bytes = fs::read(path)
        .map_err(|source| DecodeError::Read { path: path.to_path_buf(), source })?;
    decode(&bytes)
}

/// One persisted frame.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    index: usize,
    path: PathBuf,
    width: u32,
    height: u32,
}

impl Frame {
    /// Position of the frame in the source GIF.
    #[must_use]
    pub const fn index(&self) -> usize { self.index }

    /// File the frame was written to.
    #[must_use]
    pub fn path(&self) -> &Path { &self.path }

    #[must_use]
    pub const fn dimensions(&self) -> (u32, u32) { (self.width, self.height) }
}

/// The frames of one GIF, in playback order.
///
/// Frames that failed to encode are absent; the remaining ones keep their
/// source index, so playback simply skips the gaps.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Animation {
    frames: Vec<Frame>,
    source_frames: usize,
}

impl Animation {
    #[must_use]
    pub fn frames(&self) -> &[Frame] { &self.frames }

    #[must_use]
    pub fn len(&self) -> usize { self.frames.len() }

    #[must_use]
    pub fn is_empty(&self) -> bool { self.frames.is_empty() }

    /// Number of frames in the source GIF, including skipped ones.
    #[must_use]
    pub const fn source_frames(&self) -> usize { self.source_frames }

    /// A single-frame animation is shown as a still image.
    #[must_use]
    pub fn is_static(&self) -> bool { self.frames.len() == 1 }

    #[cfg(test)]
    pub(crate) const fn empty_for_tests() -> Self { Self { frames: Vec::new(), source_frames: 0 } }
}

/// Owns the frame files inside the scratch directory.
#[derive(Debug)]
pub struct FrameStore {
    root: PathBuf,
    format: FrameFormat,
    current: Option<Arc<Animation>>,
}

impl FrameStore {
    #[must_use]
    pub fn new(root: &Path, format: FrameFormat) -> Self {
        Self { root: root.to_path_buf(), format, current: None }
    }

    /// The animation currently on disk, if any.
    #[must_use]
    pub const fn current(&self) -> Option<&Arc<Animation>> { self.current.as_ref() }

    #[must_use]
    pub const fn format(&self) -> FrameFormat { self.format }

    /// Writes every frame of `decoded` to disk and publishes the result.
    ///
    /// A frame that fails to encode is logged and skipped. The batch is
    /// published as a whole once all frames were attempted.
    ///
    /// # Errors
    ///
    /// Returns [`FrameStoreError::NotCleared`] if the previous animation is
    /// still on disk.
    pub fn persist(&mut self, decoded: DecodedGif) -> Result<Arc<Animation>, FrameStoreError> {
        if self.current.is_some() {
            return Err(FrameStoreError::NotCleared);
        }

        let source_frames = decoded.len();
        let frames: Vec<Frame> = decoded
            .frames
            .into_par_iter()
            .enumerate()
            .filter_map(|(index, image)| match self.write_frame(index, image) {
                Ok(frame) => Some(frame),
                Err(err) => {
                    tracing::warn!(index, error = %err, "failed to encode frame, skipping it");
                    None
                }
            })
            .collect();

        tracing::info!(
            folder = %self.root.display(),
            frames = frames.len(),
            skipped = source_frames - frames.len(),
            "stored animation frames"
        );

        let animation = Arc::new(Animation { frames, source_frames });
        self.current = Some(Arc::clone(&animation));
        Ok(animation)
    }

    /// Deletes the frames of the current animation.
    ///
    /// `playback_active` is the caller's promise about the player: frames are
    /// only removed once no session can still be reading them.
    ///
    /// # Errors
    ///
    /// Returns [`FrameStoreError::InUse`] when `playback_active` is set.
    pub fn clear(&mut self, playback_active: bool) -> Result<(), FrameStoreError> {
        if playback_active {
            return Err(FrameStoreError::InUse);
        }

        let Some(animation) = self.current.take() else {
            return Ok(());
        };

        for frame in animation.frames() {
            if let Err(err) = fs::remove_file(frame.path()) {
                tracing::warn!(path = %frame.path().display(), error = %err, "failed to remove frame");
            }
        }

        tracing::debug!(frames = animation.len(), "removed previous frames");
        Ok(())
    }

    /// Decodes `bytes`, replaces the current frames and returns the new animation.
    ///
    /// Nothing on disk changes if decoding fails.
    ///
    /// # Errors
    ///
    /// Returns [`FrameStoreError::Decode`] for bad input and
    /// [`FrameStoreError::InUse`] when `playback_active` is set.
    pub fn load(
        &mut self,
        bytes: &[u8],
        playback_active: bool,
    ) -> Result<Arc<Animation>, FrameStoreError> {
        let decoded = decode(bytes)?;
        self.clear(playback_active)?;
        self.persist(decoded)
    }

    fn write_frame(&self, index: usize, image: RgbaImage) -> Result<Frame, image::ImageError> {
        let (width, height) = image.dimensions();
        let path = frame_path_in(&self.root, index, self.format.extension());

        let image = match self.format {
            FrameFormat::Jpeg => DynamicImage::ImageRgb8(DynamicImage::ImageRgba8(image).to_rgb8()),
            FrameFormat::Png | FrameFormat::Gif => DynamicImage::ImageRgba8(image),
        };
        image.save_with_format(&path, self.format.image_format())?;

        Ok(Frame { index, path, width, height })
    }
}
