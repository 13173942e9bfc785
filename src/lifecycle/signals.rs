//! OS signal handling.
//!
//! SIGINT and SIGTERM both trigger graceful shutdown. There is no reload
//! signal; configuration is read once at startup.

use crate::lifecycle::Shutdown;

/// Wait for the first termination signal, then trigger `shutdown`.
pub async fn watch_signals(shutdown: Shutdown) {
    let signal = tokio::select! {
        res = tokio::signal::ctrl_c() => match res {
            Ok(()) => "SIGINT",
            Err(e) => {
                tracing::error!(error = %e, "Failed to listen for Ctrl+C");
                std::future::pending::<&'static str>().await
            }
        },
        name = terminate() => name,
    };
    tracing::info!(signal, "Shutdown signal received");
    shutdown.trigger();
}

#[cfg(unix)]
async fn terminate() -> &'static str {
    use tokio::signal::unix::{signal, SignalKind};
    match signal(SignalKind::terminate()) {
        Ok(mut term) => {
            term.recv().await;
            "SIGTERM"
        }
        Err(e) => {
            tracing::warn!(error = %e, "Failed to register SIGTERM handler");
            std::future::pending().await
        }
    }
}

#[cfg(not(unix))]
async fn terminate() -> &'static str {
    std::future::pending().await
}
