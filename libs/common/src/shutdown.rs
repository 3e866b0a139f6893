//! Shutdown signal handling

use std::fmt;

use tracing::warn;

/// Signal that ended the wait
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShutdownSignal {
    Interrupt,
    Terminate,
}

impl fmt::Display for ShutdownSignal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ShutdownSignal::Interrupt => f.write_str("Ctrl+C"),
            ShutdownSignal::Terminate => f.write_str("SIGTERM"),
        }
    }
}

/// Wait for Ctrl+C, or SIGTERM on Unix
pub async fn wait_for_shutdown() -> ShutdownSignal {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{signal, SignalKind};

        let mut term = match signal(SignalKind::terminate()) {
            Ok(sig) => Some(sig),
            Err(e) => {
                warn!("Failed to install SIGTERM handler: {}. Only Ctrl+C will stop the monitor", e);
                None
            },
        };

        tokio::select! {
            _ = interrupt() => ShutdownSignal::Interrupt,
            _ = async {
                match term.as_mut() {
                    Some(sig) => { sig.recv().await; },
                    None => std::future::pending::<()>().await,
                }
            } => ShutdownSignal::Terminate,
        }
    }
    #[cfg(not(unix))]
    {
        interrupt().await;
        ShutdownSignal::Interrupt
    }
}

async fn interrupt() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!("Failed to listen for Ctrl+C: {}", e);
        std::future::pending::<()>().await;
    }
}
