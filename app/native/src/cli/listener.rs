//! Forwards console commands and termination signals to the intent loop.
//!
//! Runs a single-threaded tokio runtime on its own thread. Ctrl-C and SIGTERM
//! turn into [`Intent::Quit`], so every way out goes through the same
//! shutdown path. Closing stdin only stops the console; the process keeps
//! playing until it is told to quit or receives a signal.

use std::future::Future;

use tokio::io::{AsyncBufRead, AsyncBufReadExt, BufReader, Lines};
use tokio::sync::{mpsc, oneshot};

use super::console::{self, ConsoleCommand, HELP};
use crate::app::Intent;

/// Blocks the calling thread, sending intents until the user quits or the
/// receiving side goes away.
///
/// `ready` fires once the signal handlers are installed. Until then a
/// termination signal still kills the process outright.
pub fn listen(intents: mpsc::Sender<Intent>, ready: oneshot::Sender<()>) {
    let runtime = match tokio::runtime::Builder::new_current_thread().enable_all().build() {
        Ok(runtime) => runtime,
        Err(err) => {
            tracing::error!(error = %err, "failed to start intent runtime");
            let _ = intents.blocking_send(Intent::Quit);
            return;
        }
    };

    runtime.block_on(async move {
        let mut termination = Termination::register();
        let _ = ready.send(());

        let lines = BufReader::new(tokio::io::stdin()).lines();
        forward(lines, intents, termination.recv()).await;
    });
    // stdin reads may still be parked on a blocking thread
    runtime.shutdown_background();
}

/// Sends an intent for every console line, and [`Intent::Quit`] once
/// `termination` resolves.
///
/// Returns after a quit was sent or when the receiver is gone.
async fn forward<R, T>(mut lines: Lines<R>, intents: mpsc::Sender<Intent>, termination: T)
where
    R: AsyncBufRead + Unpin,
    T: Future<Output = ()>,
{
    tokio::pin!(termination);
    let mut console_open = true;

    loop {
        let intent = tokio::select! {
            line = lines.next_line(), if console_open => match line {
                Ok(Some(line)) => match console::parse_line(&line) {
                    Ok(ConsoleCommand::Intent(intent)) => intent,
                    Ok(ConsoleCommand::Help) => {
                        println!("{HELP}");
                        continue;
                    }
                    Ok(ConsoleCommand::Empty) => continue,
                    Err(err) => {
                        eprintln!("gifpaper: {err}");
                        continue;
                    }
                },
                Ok(None) => {
                    tracing::info!("stdin closed, console disabled until exit");
                    console_open = false;
                    continue;
                }
                Err(err) => {
                    tracing::warn!(error = %err, "failed to read stdin, console disabled");
                    console_open = false;
                    continue;
                }
            },
            () = &mut termination => Intent::Quit,
        };

        let quit = intent == Intent::Quit;
        if intents.send(intent).await.is_err() || quit {
            return;
        }
    }
}

/// Process termination signals, registered up front so none slips through
/// while the app is starting.
#[cfg(unix)]
struct Termination {
    interrupt: Option<tokio::signal::unix::Signal>,
    terminate: Option<tokio::signal::unix::Signal>,
}

#[cfg(unix)]
impl Termination {
    /// Must run inside the runtime.
    fn register() -> Self {
        use tokio::signal::unix::SignalKind;

        Self {
            interrupt: install(SignalKind::interrupt(), "SIGINT"),
            terminate: install(SignalKind::terminate(), "SIGTERM"),
        }
    }

    async fn recv(&mut self) {
        tokio::select! {
            Some(()) = next_signal(self.interrupt.as_mut()) => {
                tracing::info!("received interrupt signal");
            }
            Some(()) = next_signal(self.terminate.as_mut()) => {
                tracing::info!("received termination signal");
            }
            else => std::future::pending::<()>().await,
        }
    }
}

#[cfg(unix)]
fn install(kind: tokio::signal::unix::SignalKind, name: &str) -> Option<tokio::signal::unix::Signal> {
    match tokio::signal::unix::signal(kind) {
        Ok(signal) => Some(signal),
        Err(err) => {
            tracing::warn!(signal = name, error = %err, "failed to install signal handler");
            None
        }
    }
}

#[cfg(unix)]
async fn next_signal(signal: Option<&mut tokio::signal::unix::Signal>) -> Option<()> {
    match signal {
        Some(signal) => signal.recv().await,
        None => None,
    }
}

#[cfg(not(unix))]
struct Termination;

#[cfg(not(unix))]
impl Termination {
    const fn register() -> Self { Self }

    async fn recv(&mut self) {
        if let Err(err) = tokio::signal::ctrl_c().await {
            tracing::warn!(error = %err, "failed to listen for Ctrl-C");
            std::future::pending::<()>().await;
        }
        tracing::info!("received interrupt signal");
    }
}
