//! The player: a background thread that cycles animation frames onto the desktop.
//!
//! The player thread owns the only [`PlaybackSession`]. Other threads reach it
//! exclusively through [`PlaybackController`], which sends commands over a
//! channel. Commands that must complete before frames are deleted (`stop`,
//! `play`, `shutdown`) wait for an acknowledgement from the player.
//!
//! Each iteration of the player loop:
//! 1. handles every pending command,
//! 2. renders the current frame,
//! 3. advances the frame index (wrapping),
//! 4. sleeps for one frame period.
//!
//! The sleep is not interrupted, so a stop request is observed at most one
//! frame period after it was sent.

use std::sync::Arc;
use std::sync::atomic::{AtomicU8, Ordering};
use std::thread::{self, JoinHandle};

use thiserror::Error;
use tokio::sync::mpsc::error::TryRecvError;
use tokio::sync::{mpsc, oneshot};

use super::frames::{Animation, FrameRate};
use crate::platform::thread::spawn_named_thread;
use crate::wallpaper::WallpaperSink;

/// Channel buffer size for player commands.
const CHANNEL_BUFFER_SIZE: usize = 32;

/// Errors talking to the player thread.
#[derive(Debug, Error)]
pub enum PlaybackError {
    /// The player thread could not be started.
    #[error("failed to start the player thread")]
    Spawn,
    /// The player thread is gone.
    #[error("failed to send command to player: channel closed")]
    SendFailed,
    /// The player dropped the acknowledgement.
    #[error("player exited before acknowledging the command")]
    AckFailed,
}

/// Observable player state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum PlaybackState {
    /// No session, or the animation has no frames.
    Idle = 0,
    /// A session is cycling frames.
    Playing = 1,
    /// Cancellation was requested; the in-flight frame period is finishing.
    Stopping = 2,
}

impl PlaybackState {
    const fn from_u8(value: u8) -> Self {
        match value {
            1 => Self::Playing,
            2 => Self::Stopping,
            _ => Self::Idle,
        }
    }
}

/// Commands understood by the player thread.
#[derive(Debug)]
enum PlayerCommand {
    /// End the current session (if any) and start one for `animation`.
    Play { animation: Arc<Animation>, ack: oneshot::Sender<()> },
    /// End the current session.
    Stop { ack: oneshot::Sender<()> },
    /// Change the rate used for the next sleep.
    SetFrameRate(FrameRate),
    /// End the current session and exit the thread.
    Shutdown { ack: Option<oneshot::Sender<()>> },
}

/// One run of the animation loop.
#[derive(Debug)]
struct PlaybackSession {
    animation: Arc<Animation>,
    position: usize,
    rate: FrameRate,
    rendered: bool,
}

impl PlaybackSession {
    const fn new(animation: Arc<Animation>, rate: FrameRate) -> Self {
        Self { animation, position: 0, rate, rendered: false }
    }

    /// A still image only needs to be shown once per session.
    fn needs_tick(&self) -> bool { !(self.animation.is_static() && self.rendered) }
}

/// Whether the player loop keeps running after a command.
enum Flow {
    Continue,
    Exit,
}

/// State owned by the player thread.
struct Player {
    sink: Arc<dyn WallpaperSink>,
    receiver: mpsc::Receiver<PlayerCommand>,
    state: Arc<AtomicU8>,
    rate: FrameRate,
    session: Option<PlaybackSession>,
}

impl Player {
    fn run(mut self) {
        tracing::debug!(rate = %self.rate, "player loop starting");

        loop {
            let ticking = self.session.as_ref().is_some_and(PlaybackSession::needs_tick);

            let command = if ticking {
                match self.receiver.try_recv() {
                    Ok(command) => Some(command),
                    Err(TryRecvError::Empty) => None,
                    Err(TryRecvError::Disconnected) => break,
                }
            } else {
                match self.receiver.blocking_recv() {
                    Some(command) => Some(command),
                    None => break,
                }
            };

            if let Some(command) = command {
                match self.handle(command) {
                    Flow::Continue => continue,
                    Flow::Exit => return,
                }
            }

            self.tick();
        }

        self.end_session();
        tracing::debug!("player channel closed, exiting");
    }

    fn handle(&mut self, command: PlayerCommand) -> Flow {
        match command {
            PlayerCommand::Play { animation, ack } => {
                self.end_session();
                self.start_session(animation);
                let _ = ack.send(());
            }
            PlayerCommand::Stop { ack } => {
                self.end_session();
                let _ = ack.send(());
            }
            PlayerCommand::SetFrameRate(rate) => {
                tracing::debug!(%rate, "frame rate changed");
                self.rate = rate;
                if let Some(session) = self.session.as_mut() {
                    session.rate = rate;
                }
            }
            PlayerCommand::Shutdown { ack } => {
                self.end_session();
                if let Some(ack) = ack {
                    let _ = ack.send(());
                }
                tracing::debug!("player received shutdown");
                return Flow::Exit;
            }
        }
        Flow::Continue
    }

    fn start_session(&mut self, animation: Arc<Animation>) {
        if animation.is_empty() {
            tracing::warn!("animation has no frames, staying idle");
            return;
        }

        tracing::info!(frames = animation.len(), rate = %self.rate, "starting playback");
        self.session = Some(PlaybackSession::new(animation, self.rate));
        self.state.store(PlaybackState::Playing as u8, Ordering::SeqCst);
    }

    fn end_session(&mut self) {
        if self.session.take().is_some() {
            tracing::info!("playback stopped");
        }
        self.state.store(PlaybackState::Idle as u8, Ordering::SeqCst);
    }

    fn tick(&mut self) {
        let Some(session) = self.session.as_mut() else {
            return;
        };

        let frames = session.animation.frames();
        let frame = &frames[session.position % frames.len()];

        tracing::trace!(index = frame.index(), "setting wallpaper to frame");
        if let Err(err) = self.sink.set(frame.path()) {
            tracing::warn!(index = frame.index(), error = %err, "failed to set wallpaper frame");
        }

        session.rendered = true;
        session.position = (session.position + 1) % frames.len();

        if session.needs_tick() {
            thread::sleep(session.rate.period());
        }
    }
}

/// Handle to the player thread.
pub struct PlaybackController {
    sender: mpsc::Sender<PlayerCommand>,
    state: Arc<AtomicU8>,
    handle: Option<JoinHandle<()>>,
}

impl PlaybackController {
    /// Starts the player thread in the idle state.
    ///
    /// # Errors
    ///
    /// Returns [`PlaybackError::Spawn`] if the thread cannot be created.
    pub fn spawn(sink: Arc<dyn WallpaperSink>, rate: FrameRate) -> Result<Self, PlaybackError> {
        let (sender, receiver) = mpsc::channel(CHANNEL_BUFFER_SIZE);
        let state = Arc::new(AtomicU8::new(PlaybackState::Idle as u8));

        let player = Player {
            sink,
            receiver,
            state: Arc::clone(&state),
            rate,
            session: None,
        };

        let handle = spawn_named_thread("player", move || player.run()).ok_or(PlaybackError::Spawn)?;

        Ok(Self { sender, state, handle: Some(handle) })
    }

    /// Current player state.
    #[must_use]
    pub fn state(&self) -> PlaybackState {
        PlaybackState::from_u8(self.state.load(Ordering::SeqCst))
    }

    /// Whether a session may still render frames.
    #[must_use]
    pub fn is_active(&self) -> bool { self.state() != PlaybackState::Idle }

    /// Replaces any running session with one for `animation`.
    ///
    /// Blocks until the previous session has stopped rendering and the new
    /// one is set up. An empty animation leaves the player idle.
    ///
    /// # Errors
    ///
    /// Returns an error if the player thread is gone.
    pub fn play(&self, animation: Arc<Animation>) -> Result<(), PlaybackError> {
        self.mark_stopping();
        let (ack, done) = oneshot::channel();
        self.send(PlayerCommand::Play { animation, ack })?;
        done.blocking_recv().map_err(|_| PlaybackError::AckFailed)
    }

    /// Stops the running session and waits until the player confirms it.
    ///
    /// Once this returns, no further frame of the old session is rendered,
    /// so its files may be deleted.
    ///
    /// # Errors
    ///
    /// Returns an error if the player thread is gone.
    pub fn stop(&self) -> Result<(), PlaybackError> {
        self.mark_stopping();
        let (ack, done) = oneshot::channel();
        self.send(PlayerCommand::Stop { ack })?;
        done.blocking_recv().map_err(|_| PlaybackError::AckFailed)
    }

    /// Changes the frame rate. Takes effect from the next sleep.
    ///
    /// # Errors
    ///
    /// Returns an error if the player thread is gone.
    pub fn set_frame_rate(&self, rate: FrameRate) -> Result<(), PlaybackError> {
        self.send(PlayerCommand::SetFrameRate(rate))
    }

    /// Stops playback and joins the player thread.
    ///
    /// # Errors
    ///
    /// Returns an error if the player thread exited before acknowledging.
    pub fn shutdown(mut self) -> Result<(), PlaybackError> {
        self.mark_stopping();
        let (ack, done) = oneshot::channel();
        self.send(PlayerCommand::Shutdown { ack: Some(ack) })?;
        let result = done.blocking_recv().map_err(|_| PlaybackError::AckFailed);

        if let Some(handle) = self.handle.take()
            && handle.join().is_err()
        {
            tracing::error!("player thread panicked");
        }

        result
    }

    fn mark_stopping(&self) {
        let _ = self.state.compare_exchange(
            PlaybackState::Playing as u8,
            PlaybackState::Stopping as u8,
            Ordering::SeqCst,
            Ordering::SeqCst,
        );
    }

    fn send(&self, command: PlayerCommand) -> Result<(), PlaybackError> {
        self.sender.blocking_send(command).map_err(|_| PlaybackError::SendFailed)
    }
}

impl Drop for PlaybackController {
    fn drop(&mut self) {
        let Some(handle) = self.handle.take() else {
            return;
        };

        let _ = self.sender.blocking_send(PlayerCommand::Shutdown { ack: None });
        if handle.join().is_err() {
            tracing::error!("player thread panicked");
        }
    }
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;
    use std::time::{Duration, Instant};

    use tempfile::TempDir;

    use super::*;
    use crate::animation::frames::{FrameFormat, FrameStore};
    use crate::test_support::{RecordingSink, gif_bytes};

    fn rate(fps: i64) -> FrameRate { FrameRate::new(fps).unwrap() }

    fn animation(dir: &TempDir, frames: usize) -> Arc<Animation> {
        let mut store = FrameStore::new(dir.path(), FrameFormat::Png);
        store.load(&gif_bytes(frames), false).unwrap()
    }

    fn frame_indices(calls: &[PathBuf]) -> Vec<usize> {
        calls
            .iter()
            .map(|path| {
                let stem = path.file_stem().unwrap().to_string_lossy();
                stem.trim_start_matches("frame-").parse().unwrap()
            })
            .collect()
    }

    fn wait_for_calls(sink: &RecordingSink, count: usize) {
        let deadline = Instant::now() + Duration::from_secs(5);
        while sink.calls().len() < count {
            assert!(Instant::now() < deadline, "timed out waiting for {count} renders");
            thread::sleep(Duration::from_millis(5));
        }
    }

    #[test]
    fn test_starts_idle() {
        let sink = Arc::new(RecordingSink::new());
        let controller = PlaybackController::spawn(sink.clone(), rate(30)).unwrap();

        assert_eq!(controller.state(), PlaybackState::Idle);
        assert!(!controller.is_active());
        controller.shutdown().unwrap();
        assert!(sink.calls().is_empty());
    }

    #[test]
    fn test_cycles_frames_in_order_and_wraps() {
        let dir = TempDir::new().unwrap();
        let sink = Arc::new(RecordingSink::new());
        let controller = PlaybackController::spawn(sink.clone(), rate(200)).unwrap();

        controller.play(animation(&dir, 3)).unwrap();
        assert_eq!(controller.state(), PlaybackState::Playing);
        wait_for_calls(&sink, 8);
        controller.stop().unwrap();

        let indices = frame_indices(&sink.calls());
        for (i, index) in indices.iter().enumerate() {
            assert_eq!(*index, i % 3);
        }
        controller.shutdown().unwrap();
    }

    #[test]
    fn test_stop_acknowledges_after_last_render() {
        let dir = TempDir::new().unwrap();
        let sink = Arc::new(RecordingSink::new());
        let controller = PlaybackController::spawn(sink.clone(), rate(100)).unwrap();

        controller.play(animation(&dir, 2)).unwrap();
        wait_for_calls(&sink, 2);
        controller.stop().unwrap();
        assert_eq!(controller.state(), PlaybackState::Idle);

        let after_stop = sink.calls().len();
        thread::sleep(Duration::from_millis(50));
        assert_eq!(sink.calls().len(), after_stop);
        controller.shutdown().unwrap();
    }

    #[test]
    fn test_stop_when_idle_is_noop() {
        let sink = Arc::new(RecordingSink::new());
        let controller = PlaybackController::spawn(sink.clone(), rate(30)).unwrap();

        controller.stop().unwrap();
        controller.stop().unwrap();
        assert_eq!(controller.state(), PlaybackState::Idle);
        controller.shutdown().unwrap();
    }

    #[test]
    fn test_sink_failures_do_not_stop_the_loop() {
        let dir = TempDir::new().unwrap();
        let sink = Arc::new(RecordingSink::new());
        sink.fail_sets(true);
        let controller = PlaybackController::spawn(sink.clone(), rate(200)).unwrap();

        controller.play(animation(&dir, 2)).unwrap();
        wait_for_calls(&sink, 4);
        assert_eq!(controller.state(), PlaybackState::Playing);
        controller.shutdown().unwrap();
    }

    #[test]
    fn test_rate_change_applies_to_following_sleeps() {
        let dir = TempDir::new().unwrap();
        let sink = Arc::new(RecordingSink::new());
        let controller = PlaybackController::spawn(sink.clone(), rate(20)).unwrap();

        controller.play(animation(&dir, 3)).unwrap();
        wait_for_calls(&sink, 2);
        controller.set_frame_rate(rate(100)).unwrap();
        let changed = sink.calls().len();
        wait_for_calls(&sink, changed + 6);
        controller.stop().unwrap();

        let calls = sink.timed_calls();
        // Every pair of renders is separated by at least the fastest period
        for pair in calls.windows(2) {
            assert!(pair[1].0.duration_since(pair[0].0) >= Duration::from_millis(9));
        }
        // The tail of the run is paced by the new, faster rate
        let tail = &calls[calls.len() - 4..];
        let span = tail[3].0.duration_since(tail[0].0);
        assert!(span < Duration::from_millis(150), "tail took {span:?}");
        controller.shutdown().unwrap();
    }

    #[test]
    fn test_play_replaces_running_session() {
        let dir_a = TempDir::new().unwrap();
        let dir_b = TempDir::new().unwrap();
        let sink = Arc::new(RecordingSink::new());
        let controller = PlaybackController::spawn(sink.clone(), rate(200)).unwrap();

        controller.play(animation(&dir_a, 3)).unwrap();
        wait_for_calls(&sink, 3);
        controller.play(animation(&dir_b, 2)).unwrap();
        let before = sink.calls().len();
        wait_for_calls(&sink, before + 4);
        controller.stop().unwrap();

        let calls = sink.calls();
        let first_b = calls.iter().position(|path| path.starts_with(dir_b.path())).unwrap();
        assert!(calls[first_b..].iter().all(|path| path.starts_with(dir_b.path())));
        assert_eq!(&frame_indices(&calls[first_b..])[..4], &[0, 1, 0, 1]);
        controller.shutdown().unwrap();
    }

    #[test]
    fn test_single_frame_renders_once() {
        let dir = TempDir::new().unwrap();
        let sink = Arc::new(RecordingSink::new());
        let controller = PlaybackController::spawn(sink.clone(), rate(200)).unwrap();

        controller.play(animation(&dir, 1)).unwrap();
        wait_for_calls(&sink, 1);
        thread::sleep(Duration::from_millis(50));

        assert_eq!(sink.calls().len(), 1);
        assert_eq!(controller.state(), PlaybackState::Playing);
        controller.stop().unwrap();
        assert_eq!(controller.state(), PlaybackState::Idle);
        controller.shutdown().unwrap();
    }

    #[test]
    fn test_empty_animation_stays_idle() {
        let sink = Arc::new(RecordingSink::new());
        let controller = PlaybackController::spawn(sink.clone(), rate(30)).unwrap();

        let empty = Arc::new(Animation::empty_for_tests());
        controller.play(empty).unwrap();

        assert_eq!(controller.state(), PlaybackState::Idle);
        controller.shutdown().unwrap();
        assert!(sink.calls().is_empty());
    }

    #[test]
    fn test_drop_joins_player() {
        let dir = TempDir::new().unwrap();
        let sink = Arc::new(RecordingSink::new());
        {
            let controller = PlaybackController::spawn(sink.clone(), rate(200)).unwrap();
            controller.play(animation(&dir, 2)).unwrap();
            wait_for_calls(&sink, 1);
        }
        let after_drop = sink.calls().len();
        thread::sleep(Duration::from_millis(30));
        assert_eq!(sink.calls().len(), after_drop);
    }
}
