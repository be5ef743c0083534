//! # Cross-platform OS shutdown signals.
//!
//! Provides [`ShutdownSignals`], listeners registered up front that complete when the
//! supervisor receives a termination request.
//!
//! ## Signals
//! **Unix platforms:**
//! - `SIGINT` (Ctrl-C in terminal)
//! - `SIGTERM` (default kill signal, used by systemd/Kubernetes)
//!
//! Any other signal keeps its default disposition.
//!
//! **Windows platforms:**
//! - `Ctrl-C` via [`tokio::signal::ctrl_c`]

use std::io;

/// Registered termination signal listeners.
///
/// Registration happens in [`register`](ShutdownSignals::register), so a signal delivered
/// before [`recv`](ShutdownSignals::recv) is first awaited is not lost.
pub struct ShutdownSignals {
    #[cfg(unix)]
    sigint: tokio::signal::unix::Signal,
    #[cfg(unix)]
    sigterm: tokio::signal::unix::Signal,
}

impl ShutdownSignals {
    /// Installs the listeners.
    ///
    /// Returns `Err` if signal registration fails.
    #[cfg(unix)]
    pub fn register() -> io::Result<Self> {
        use tokio::signal::unix::{SignalKind, signal};

        Ok(Self {
            sigint: signal(SignalKind::interrupt())?,
            sigterm: signal(SignalKind::terminate())?,
        })
    }

    /// Installs the listeners.
    #[cfg(not(unix))]
    pub fn register() -> io::Result<Self> {
        Ok(Self {})
    }

    /// Waits for the next termination signal and returns its name.
    #[cfg(unix)]
    pub async fn recv(&mut self) -> &'static str {
        tokio::select! {
            Some(()) = self.sigint.recv() => "SIGINT",
            Some(()) = self.sigterm.recv() => "SIGTERM",
            else => "signal-stream-closed",
        }
    }

    /// Waits for the next termination signal and returns its name.
    #[cfg(not(unix))]
    pub async fn recv(&mut self) -> &'static str {
        if let Err(err) = tokio::signal::ctrl_c().await {
            tracing::warn!(error = %err, "ctrl-c listener failed");
        }
        "ctrl_c"
    }
}
