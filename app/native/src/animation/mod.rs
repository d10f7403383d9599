//! Animated wallpaper playback.
//!
//! - [`frames`] - GIF decoding and frame files
//! - [`playback`] - The player thread and its controller

pub mod frames;
pub mod playback;

pub use frames::{
    Animation, DEFAULT_FPS, DecodeError, DecodedGif, FrameFormat, FrameRate, FrameStore,
    FrameStoreError, InvalidFrameRate, decode, decode_file,
};
pub use playback::{PlaybackController, PlaybackError, PlaybackState};
