//! Application lifecycle: startup, user intents and shutdown.
//!
//! [`App`] owns every long-lived resource (temp directory, wallpaper backup,
//! frame files and the player thread) and is passed around explicitly.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use tokio::sync::mpsc;

use crate::animation::{
    FrameFormat, FrameRate, FrameStore, PlaybackController, PlaybackState, decode_file,
};
use crate::error::GifpaperError;
use crate::storage::{DEFAULT_PREFIX, EphemeralStorage};
use crate::wallpaper::{BackupManager, WallpaperSink};

/// Something the user asked for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Intent {
    /// Change the playback rate.
    SelectFrameRate(FrameRate),
    /// Decode a GIF and play it, replacing the current animation.
    SelectAnimation(PathBuf),
    /// Restore the wallpaper and exit.
    Quit,
}

/// What the intent loop should do after handling an intent.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Continue,
    Exit,
}

/// Settings needed to start the application.
#[derive(Debug, Clone)]
pub struct AppOptions {
    pub rate: FrameRate,
    pub format: FrameFormat,
    pub temp_prefix: String,
    /// Parent of the temp directory; the system temp dir when `None`.
    pub temp_parent: Option<PathBuf>,
}

impl Default for AppOptions {
    fn default() -> Self {
        Self {
            rate: FrameRate::default(),
            format: FrameFormat::default(),
            temp_prefix: DEFAULT_PREFIX.to_string(),
            temp_parent: None,
        }
    }
}

/// The running application.
pub struct App {
    sink: Arc<dyn WallpaperSink>,
    storage: EphemeralStorage,
    backup: BackupManager,
    frames: FrameStore,
    player: PlaybackController,
    rate: FrameRate,
}

impl App {
    /// Creates the temp directory, backs up the wallpaper and starts the
    /// player thread (idle).
    ///
    /// # Errors
    ///
    /// Returns an error if the temp directory or the player thread cannot be
    /// created. A failed backup is not an error.
    pub fn start(options: &AppOptions, sink: Arc<dyn WallpaperSink>) -> Result<Self, GifpaperError> {
        let storage = match options.temp_parent.as_deref() {
            Some(parent) => EphemeralStorage::create_in(parent, &options.temp_prefix)?,
            None => EphemeralStorage::create(&options.temp_prefix)?,
        };

        let backup = BackupManager::capture(sink.as_ref(), &storage);
        let frames = FrameStore::new(storage.path(), options.format);
        let player = PlaybackController::spawn(Arc::clone(&sink), options.rate)?;

        Ok(Self { sink, storage, backup, frames, player, rate: options.rate })
    }

    /// Handles one intent. Errors are logged, never propagated.
    pub fn handle(&mut self, intent: Intent) -> Flow {
        match intent {
            Intent::SelectFrameRate(rate) => self.select_frame_rate(rate),
            Intent::SelectAnimation(path) => {
                if let Err(err) = self.select_animation(&path) {
                    tracing::warn!(path = %path.display(), error = %err, "could not play GIF");
                }
            }
            Intent::Quit => {
                tracing::info!("quitting");
                return Flow::Exit;
            }
        }
        Flow::Continue
    }

    /// Changes the playback rate, effective from the next frame.
    pub fn select_frame_rate(&mut self, rate: FrameRate) {
        tracing::info!(%rate, "frame rate selected");
        self.rate = rate;
        if let Err(err) = self.player.set_frame_rate(rate) {
            tracing::warn!(error = %err, "failed to update frame rate");
        }
    }

    /// Replaces the current animation with the GIF at `path`.
    ///
    /// The GIF is decoded before anything else happens, so a malformed file
    /// leaves the current animation playing. Otherwise the running session is
    /// stopped and acknowledged before its frames are removed.
    ///
    /// Returns the number of frames now playing.
    ///
    /// # Errors
    ///
    /// Returns an error if the GIF cannot be decoded or the player fails.
    pub fn select_animation(&mut self, path: &Path) -> Result<usize, GifpaperError> {
        tracing::info!(path = %path.display(), "GIF selected");
        let decoded = decode_file(path)?;

        self.player.stop()?;
        self.frames.clear(self.player.is_active())?;
        let animation = self.frames.persist(decoded)?;
        let count = animation.len();

        self.player.play(animation)?;
        Ok(count)
    }

    /// Current playback rate.
    #[must_use]
    pub const fn frame_rate(&self) -> FrameRate { self.rate }

    /// Current player state.
    #[must_use]
    pub fn playback_state(&self) -> PlaybackState { self.player.state() }

    /// Root of the temp directory.
    #[must_use]
    pub fn storage_path(&self) -> &Path { self.storage.path() }

    /// Path of the wallpaper backup, if one was taken.
    #[must_use]
    pub fn backup_path(&self) -> Option<&Path> { self.backup.state().path() }

    /// Handles intents in arrival order until one asks to exit or every
    /// sender is gone, then shuts down.
    ///
    /// A quit queued ahead of other intents wins: nothing after it is played.
    pub fn run_until_exit(mut self, intents: &mut mpsc::Receiver<Intent>) {
        while let Some(intent) = intents.blocking_recv() {
            if self.handle(intent) == Flow::Exit {
                break;
            }
        }

        self.shutdown();
    }

    /// Stops playback, restores the original wallpaper and removes the temp
    /// directory. Failures are logged.
    pub fn shutdown(self) {
        let Self { sink, storage, backup, frames, player, .. } = self;

        tracing::info!("cleaning up");
        if let Err(err) = player.shutdown() {
            tracing::warn!(error = %err, "player did not stop cleanly");
        }

        backup.restore(sink.as_ref());

        // Frame files go away with the directory
        drop(frames);
        if let Err(err) = storage.destroy() {
            tracing::warn!(error = %err, "failed to remove temp directory");
        }
    }
}
