//! Termination signal handling.
//!
//! Translates SIGINT (Ctrl-C) and SIGTERM into a cancelled
//! [`CancellationToken`], so the poller stops at its next check whether
//! the process is stopped interactively or by a process manager.

use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

/// Wait for SIGINT or, on Unix, SIGTERM.
///
/// If a handler cannot be installed, that signal is logged and ignored.
pub async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to install Ctrl-C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {
            tracing::info!("Received SIGINT (Ctrl-C), starting graceful shutdown");
        }
        () = terminate => {
            tracing::info!("Received SIGTERM, starting graceful shutdown");
        }
    }
}

/// Spawn a task that cancels `cancel` on the first termination signal.
pub fn spawn_listener(cancel: CancellationToken) -> JoinHandle<()> {
    tokio::spawn(async move {
        tokio::select! {
            _ = cancel.cancelled() => {}
            _ = shutdown_signal() => cancel.cancel(),
        }
    })
}

/// Wait for the listener spawned by [`spawn_listener`] to finish.
///
/// Returns `false` (and logs) if the task panicked or was aborted.
pub async fn join_listener(handle: JoinHandle<()>) -> bool {
    match handle.await {
        Ok(()) => true,
        Err(e) => {
            tracing::warn!(error = %e, "Signal listener task failed");
            false
        }
    }
}
