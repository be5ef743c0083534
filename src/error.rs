//! Error types used by the supervisor runtime and its activities.
//!
//! One enum per activity capability plus one for the coordinator:
//!
//! - [`StartError`] - the activity could not start, or its run ended in failure.
//! - [`StopError`] - the cooperative stop request could not be delivered.
//! - [`KillError`] - the forced termination request could not be issued.
//! - [`RuntimeError`] - the supervisor itself ended abnormally.
//!
//! Every type provides `as_label` (a stable snake_case label for log fields).

use std::io;
use std::path::PathBuf;
use std::process::ExitStatus;
use std::time::Duration;
use thiserror::Error;

/// # Errors produced by [`Activity::start`](crate::Activity::start).
///
/// `start` blocks for the lifetime of the activity, so this type covers both
/// launch failures and an unsuccessful run-to-completion.
#[non_exhaustive]
#[derive(Error, Debug)]
pub enum StartError {
    /// `start` was already called on this instance.
    #[error("process appears to already be started")]
    AlreadyStarted,

    /// The supervisor's own executable location could not be determined.
    #[error("unable to get current executable location: {source}")]
    Executable {
        /// Underlying OS error.
        source: io::Error,
    },

    /// A standard stream pipe was not available after spawning.
    #[error("failed to get {pipe} pipe")]
    Pipe {
        /// Stream name (`stdin`, `stdout` or `stderr`).
        pipe: &'static str,
    },

    /// The OS refused to spawn the child.
    #[error("failed to start {}: {source}", .program.display())]
    Spawn {
        /// Program that was being spawned.
        program: PathBuf,
        /// Underlying OS error.
        source: io::Error,
    },

    /// Waiting on the child failed.
    #[error("failed waiting for process exit: {source}")]
    Wait {
        /// Underlying OS error.
        source: io::Error,
    },

    /// The child exited unsuccessfully (non-zero code or killed by a signal).
    #[error("process exited unsuccessfully: {status}")]
    Exited {
        /// Exit status reported by the OS.
        status: ExitStatus,
    },

    /// The run ended without reporting a result (panic or runtime shutdown).
    #[error("activity run aborted before reporting a result")]
    Aborted,
}

impl StartError {
    /// Returns a short stable label (snake_case) for use in logs.
    ///
    /// # Example
    /// ```
    /// use bedrockd::StartError;
    ///
    /// assert_eq!(StartError::AlreadyStarted.as_label(), "start_already_started");
    /// ```
    pub fn as_label(&self) -> &'static str {
        match self {
            StartError::AlreadyStarted => "start_already_started",
            StartError::Executable { .. } => "start_executable",
            StartError::Pipe { .. } => "start_pipe",
            StartError::Spawn { .. } => "start_spawn",
            StartError::Wait { .. } => "start_wait",
            StartError::Exited { .. } => "start_exited",
            StartError::Aborted => "start_aborted",
        }
    }

    /// Returns `true` if the error was raised before any child was spawned.
    pub fn is_launch_failure(&self) -> bool {
        matches!(
            self,
            StartError::AlreadyStarted
                | StartError::Executable { .. }
                | StartError::Pipe { .. }
                | StartError::Spawn { .. }
        )
    }
}

/// # Errors produced by [`Activity::stop`](crate::Activity::stop).
#[non_exhaustive]
#[derive(Error, Debug)]
pub enum StopError {
    /// The activity is not running (never started, or already exited).
    #[error("process is not running")]
    NotRunning,

    /// Writing the stop command to the child's stdin failed.
    #[error("failed to send stop command: {source}")]
    Write {
        /// Underlying I/O error.
        source: io::Error,
    },
}

impl StopError {
    /// Returns a short stable label (snake_case) for use in logs.
    pub fn as_label(&self) -> &'static str {
        match self {
            StopError::NotRunning => "stop_not_running",
            StopError::Write { .. } => "stop_write",
        }
    }
}

/// # Errors produced by [`Activity::kill`](crate::Activity::kill).
#[non_exhaustive]
#[derive(Error, Debug)]
pub enum KillError {
    /// The OS rejected the kill signal.
    #[error("failed to kill process: {source}")]
    Signal {
        /// Underlying OS error.
        source: io::Error,
    },
}

impl KillError {
    /// Returns a short stable label (snake_case) for use in logs.
    pub fn as_label(&self) -> &'static str {
        match self {
            KillError::Signal { .. } => "kill_signal",
        }
    }
}

/// # Errors produced by the shutdown coordinator.
///
/// Any of these means the supervisor should exit with a non-zero status.
#[non_exhaustive]
#[derive(Error, Debug)]
pub enum RuntimeError {
    /// Termination signal listeners could not be installed.
    #[error("failed to register shutdown signals: {source}")]
    Signals {
        /// Underlying OS error.
        source: io::Error,
    },

    /// The activity finished while no stop had been requested.
    #[error("activity exited without a stop request{}", cause(.error))]
    UnexpectedExit {
        /// Error reported by the activity, `None` if it exited cleanly.
        error: Option<StartError>,
    },

    /// The activity outlived the grace period and was killed.
    #[error("activity did not stop within {grace:?}; killed")]
    GraceExceeded {
        /// The configured grace duration.
        grace: Duration,
    },
}

impl RuntimeError {
    /// Returns a short stable label (snake_case) for use in logs.
    ///
    /// # Example
    /// ```
    /// use bedrockd::RuntimeError;
    /// use std::time::Duration;
    ///
    /// let err = RuntimeError::GraceExceeded { grace: Duration::from_secs(10) };
    /// assert_eq!(err.as_label(), "runtime_grace_exceeded");
    /// ```
    pub fn as_label(&self) -> &'static str {
        match self {
            RuntimeError::Signals { .. } => "runtime_signals",
            RuntimeError::UnexpectedExit { .. } => "runtime_unexpected_exit",
            RuntimeError::GraceExceeded { .. } => "runtime_grace_exceeded",
        }
    }

    /// Process exit status the supervisor should terminate with.
    pub fn exit_code(&self) -> i32 {
        1
    }
}

fn cause(error: &Option<StartError>) -> String {
    error.as_ref().map(|e| format!(": {e}")).unwrap_or_default()
}
