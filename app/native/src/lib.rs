//! Gifpaper - plays animated GIFs as the desktop wallpaper.
//!
//! Frames are decoded once, written to a private temp directory and handed
//! to the desktop one after another at a fixed rate. The wallpaper that was
//! active at startup is backed up and restored on exit.

pub mod animation;
pub mod app;
pub mod cli;
pub mod config;
pub mod error;
pub mod platform;
pub mod storage;
pub mod wallpaper;

#[cfg(test)]
mod test_support;

use std::sync::Arc;

use clap::Parser;
use tokio::sync::{mpsc, oneshot};
use tracing_subscriber::EnvFilter;

use crate::app::{App, Intent};
use crate::cli::Cli;
use crate::error::GifpaperError;
use crate::wallpaper::SystemWallpaper;

/// Capacity of the intent channel between the console and the app.
const INTENT_BUFFER_SIZE: usize = 16;

/// Runs the application until the user quits.
///
/// # Errors
///
/// Returns an error if startup fails. Once running, failures are logged and
/// the original wallpaper is restored on the way out.
pub fn run() -> Result<(), GifpaperError> {
    init_tracing();

    let cli = Cli::parse();
    let options = cli.options();
    tracing::debug!(?options, "starting");

    // Signal handlers go in before anything that needs cleaning up
    let (sender, mut intents) = mpsc::channel::<Intent>(INTENT_BUFFER_SIZE);
    let (ready, listening) = oneshot::channel();
    let listener = sender.clone();
    // Detached: it may be parked on stdin when the app exits
    if platform::thread::spawn_named_thread("intents", move || cli::listen(listener, ready)).is_none() {
        return Err(GifpaperError::Listener);
    }
    if listening.blocking_recv().is_err() {
        tracing::warn!("intent listener exited before installing signal handlers");
    }

    let app = App::start(&options, Arc::new(SystemWallpaper))?;
    tracing::info!(storage = %app.storage_path().display(), rate = %app.frame_rate(), "ready");

    // Queued behind any quit that arrived during startup
    if let Some(path) = cli.gif_path() {
        let _ = sender.blocking_send(Intent::SelectAnimation(path));
    }
    drop(sender);

    app.run_until_exit(&mut intents);
    Ok(())
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}
