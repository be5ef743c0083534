//! # Coordinator: runs one activity and sequences its shutdown.
//!
//! The [`Coordinator`] starts the activity through the [runner](super::runner), then races
//! a termination signal against the activity finishing on its own.
//!
//! ## State machine
//! ```text
//! Running ──signal──► Stopping ──completion within grace──► Stopped   (Ok)
//!    │                    │
//!    │                    └──grace elapsed──► Terminating ─► kill()   (GraceExceeded)
//!    │
//!    └──completion before any signal──► Stopped                       (UnexpectedExit)
//! ```
//!
//! ## Shutdown path
//! ```text
//! signal received
//!   └─► token.cancel()          → runner issues activity.stop()
//!   └─► timeout(grace, completion):
//!          ├─ completed   → Ok(Shutdown)
//!          └─ elapsed     → activity.kill(), Err(GraceExceeded)
//! ```
//!
//! - The escalation is a bounded wait on the completion, so a kill can never follow a
//!   completed shutdown.
//! - On `GraceExceeded` the coordinator returns without awaiting the completion; the binary
//!   exits immediately with a non-zero status.
//! - On `UnexpectedExit` neither `stop` nor `kill` is issued.

use std::future::Future;
use std::sync::Arc;

use tokio::sync::watch;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use crate::activities::ActivityRef;
use crate::core::{
    config::Config,
    runner::{self, Completion},
    shutdown::ShutdownSignals,
};
use crate::error::{RuntimeError, StartError};

/// Coordinator lifecycle phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    /// Activity started, no stop requested.
    Running,
    /// Shutdown signal received; waiting for the activity within the grace period.
    Stopping,
    /// Grace period elapsed; the activity is being killed.
    Terminating,
    /// Completion signal delivered.
    Stopped,
}

impl Phase {
    /// Returns a short stable label (snake_case) for use in logs.
    pub fn as_label(self) -> &'static str {
        match self {
            Phase::Running => "running",
            Phase::Stopping => "stopping",
            Phase::Terminating => "terminating",
            Phase::Stopped => "stopped",
        }
    }
}

/// Result of a shutdown that completed within the grace period.
#[derive(Debug)]
pub struct Shutdown {
    /// Name of the signal that requested the shutdown.
    pub signal: &'static str,
    /// What the activity's run returned.
    pub result: Result<(), StartError>,
}

/// Supervises a single activity from start to shutdown.
pub struct Coordinator {
    /// Runtime configuration.
    pub cfg: Config,
    activity: ActivityRef,
    phase: watch::Sender<Phase>,
}

impl Coordinator {
    /// Creates a coordinator for `activity`. Nothing runs until [`run`](Self::run).
    pub fn new(cfg: Config, activity: ActivityRef) -> Self {
        let (phase, _rx) = watch::channel(Phase::Running);
        Self {
            cfg,
            activity,
            phase,
        }
    }

    /// Current lifecycle phase.
    pub fn phase(&self) -> Phase {
        *self.phase.borrow()
    }

    /// Receiver observing every phase transition.
    pub fn subscribe(&self) -> watch::Receiver<Phase> {
        self.phase.subscribe()
    }

    /// Registers SIGINT/SIGTERM listeners, then runs until shutdown.
    pub async fn run(&self) -> Result<Shutdown, RuntimeError> {
        let mut signals =
            ShutdownSignals::register().map_err(|source| RuntimeError::Signals { source })?;
        self.run_until(signals.recv()).await
    }

    /// Runs the activity until `shutdown` resolves (with the signal name) or the
    /// activity finishes on its own.
    pub async fn run_until<F>(&self, shutdown: F) -> Result<Shutdown, RuntimeError>
    where
        F: Future<Output = &'static str>,
    {
        let token = CancellationToken::new();

        info!(activity = self.activity.name(), "starting activity");
        let mut done = runner::spawn(Arc::clone(&self.activity), token.clone());
        self.set_phase(Phase::Running);

        let signal = tokio::select! {
            signal = shutdown => signal,
            res = &mut done => {
                self.set_phase(Phase::Stopped);
                let error = res.err();
                error!(
                    activity = self.activity.name(),
                    error = ?error,
                    launch_failure = error.as_ref().is_some_and(StartError::is_launch_failure),
                    "activity exited before a stop was requested"
                );
                return Err(RuntimeError::UnexpectedExit { error });
            }
        };

        info!(signal, "caught signal, stopping activity");
        self.set_phase(Phase::Stopping);
        token.cancel();

        let result = self.wait_with_grace(&mut done).await?;
        self.set_phase(Phase::Stopped);

        if let Err(err) = &result {
            warn!(error = %err, label = err.as_label(), "activity stopped with an error");
        }
        info!(activity = self.activity.name(), "activity stopped successfully");
        Ok(Shutdown { signal, result })
    }

    /// Waits for the completion up to the grace period, killing the activity if it elapses.
    async fn wait_with_grace(
        &self,
        done: &mut Completion,
    ) -> Result<Result<(), StartError>, RuntimeError> {
        let grace = self.cfg.grace;

        match tokio::time::timeout(grace, done).await {
            Ok(res) => Ok(res),
            Err(_elapsed) => {
                self.set_phase(Phase::Terminating);
                error!(?grace, "took too long stopping, sending kill signal");
                if let Err(err) = self.activity.kill().await {
                    error!(error = %err, label = err.as_label(), "failed to kill activity");
                }
                Err(RuntimeError::GraceExceeded { grace })
            }
        }
    }

    fn set_phase(&self, phase: Phase) {
        let prev = self.phase.send_replace(phase);
        if prev != phase {
            debug!(from = prev.as_label(), to = phase.as_label(), "phase changed");
        }
    }
}
