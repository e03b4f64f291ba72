// Signal handling module
//
// SIGTERM and SIGINT stop the accept loop; in-flight connections finish
// on their own tasks.

use std::sync::Arc;

use tokio::sync::Notify;

use crate::logger;

/// Shutdown coordination between the signal task and the accept loop
pub struct SignalHandler {
    pub shutdown: Arc<Notify>,
}

impl SignalHandler {
    pub fn new() -> Self {
        Self {
            shutdown: Arc::new(Notify::new()),
        }
    }
}

impl Default for SignalHandler {
    fn default() -> Self {
        Self::new()
    }
}

/// Register signal handlers (Unix)
#[cfg(unix)]
pub fn start_signal_handler(handler: &SignalHandler) {
    use tokio::signal::unix::{signal, SignalKind};

    let shutdown = Arc::clone(&handler.shutdown);
    tokio::spawn(async move {
        let mut sigterm = match signal(SignalKind::terminate()) {
            Ok(s) => s,
            Err(e) => {
                logger::log_error(&format!("Failed to register SIGTERM handler: {e}"));
                return;
            }
        };
        let mut sigint = match signal(SignalKind::interrupt()) {
            Ok(s) => s,
            Err(e) => {
                logger::log_error(&format!("Failed to register SIGINT handler: {e}"));
                return;
            }
        };

        tokio::select! {
            _ = sigterm.recv() => {}
            _ = sigint.recv() => {}
        }
        shutdown.notify_waiters();
    });
}

/// Fallback for non-Unix targets: Ctrl+C only
#[cfg(not(unix))]
pub fn start_signal_handler(handler: &SignalHandler) {
    let shutdown = Arc::clone(&handler.shutdown);
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            shutdown.notify_waiters();
        }
    });
}
