use std::thread::{self, JoinHandle};

/// Spawns a background thread named `gifpaper-{name}`.
///
/// Returns `None` (after logging) if the OS refuses to create the thread.
pub fn spawn_named_thread<F>(name: &str, task: F) -> Option<JoinHandle<()>>
where F: FnOnce() + Send + 'static {
    let thread_name = format!("gifpaper-{name}");

    match thread::Builder::new().name(thread_name.clone()).spawn(task) {
        Ok(handle) => Some(handle),
        Err(err) => {
            tracing::error!(thread = %thread_name, error = %err, "failed to spawn thread");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::mpsc::channel;
    use std::time::Duration;

    use super::*;

    #[test]
    fn test_spawn_named_thread_executes_task() {
        let executed = Arc::new(AtomicBool::new(false));
        let executed_clone = Arc::clone(&executed);

        let handle = spawn_named_thread("test-task", move || {
            executed_clone.store(true, Ordering::SeqCst);
        })
        .unwrap();

        handle.join().unwrap();
        assert!(executed.load(Ordering::SeqCst));
    }

    #[test]
    fn test_spawn_named_thread_uses_prefix() {
        let (tx, rx) = channel();

        spawn_named_thread("player", move || {
            let name = thread::current().name().unwrap_or("").to_string();
            tx.send(name).unwrap();
        });

        let thread_name = rx.recv_timeout(Duration::from_secs(1)).unwrap();
        assert_eq!(thread_name, "gifpaper-player");
    }
}
