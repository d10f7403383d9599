//! Shared fixtures for unit tests.

use std::io::Cursor;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Instant;

use image::codecs::gif::GifEncoder;
use image::{Frame, Rgba, RgbaImage};

use crate::wallpaper::{SinkError, WallpaperSink};

/// Sink that records every `set` call instead of touching the desktop.
#[derive(Debug, Default)]
pub struct RecordingSink {
    current: Option<PathBuf>,
    calls: Mutex<Vec<(Instant, PathBuf)>>,
    fail_sets: AtomicBool,
}

impl RecordingSink {
    pub fn new() -> Self { Self::default() }

    pub fn with_current(path: &Path) -> Self {
        Self { current: Some(path.to_path_buf()), ..Self::default() }
    }

    pub fn fail_sets(&self, fail: bool) { self.fail_sets.store(fail, Ordering::SeqCst); }

    pub fn calls(&self) -> Vec<PathBuf> {
        self.calls.lock().unwrap().iter().map(|(_, path)| path.clone()).collect()
    }

    pub fn timed_calls(&self) -> Vec<(Instant, PathBuf)> { self.calls.lock().unwrap().clone() }
}

impl WallpaperSink for RecordingSink {
    fn get(&self) -> Result<PathBuf, SinkError> {
        self.current.clone().ok_or_else(|| SinkError::GetFailed("no wallpaper".to_string()))
    }

    fn set(&self, path: &Path) -> Result<(), SinkError> {
        self.calls.lock().unwrap().push((Instant::now(), path.to_path_buf()));
        if self.fail_sets.load(Ordering::SeqCst) {
            return Err(SinkError::SetFailed("simulated failure".to_string()));
        }
        Ok(())
    }
}

/// Solid color used for frame `index`, so tests can tell frames apart on disk.
pub fn frame_color(index: usize) -> Rgba<u8> {
    let shade = u8::try_from((index * 40) % 250).unwrap();
    Rgba([shade, 255 - shade, 100, 255])
}

/// Encodes an animated GIF with `count` solid 4x4 frames.
pub fn gif_bytes(count: usize) -> Vec<u8> {
    let mut bytes = Vec::new();
    {
        let mut encoder = GifEncoder::new(Cursor::new(&mut bytes));
        let frames = (0..count).map(|i| Frame::new(RgbaImage::from_pixel(4, 4, frame_color(i))));
        encoder.encode_frames(frames).unwrap();
    }
    bytes
}
