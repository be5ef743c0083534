//! # Activity capability.
//!
//! This module defines the [`Activity`] trait: the minimal {start, stop, kill} contract the
//! runner and coordinator are written against. The common handle type is [`ActivityRef`],
//! an `Arc<dyn Activity>` shared between the runner task and the coordinator.

use std::sync::Arc;

use async_trait::async_trait;

use crate::error::{KillError, StartError, StopError};

/// Shared handle to an activity.
pub type ActivityRef = Arc<dyn Activity>;

/// # Long-running, externally stoppable unit of work.
///
/// - [`start`](Activity::start) runs for the activity's whole lifetime and returns only once it
///   has finished (or failed to launch).
/// - [`stop`](Activity::stop) and [`kill`](Activity::kill) return quickly; they *request*
///   termination, which is observed when `start` returns.
///
/// `stop` and `kill` may be called while `start` is still running on another task.
///
/// # Example
/// ```
/// use async_trait::async_trait;
/// use bedrockd::{Activity, KillError, StartError, StopError};
/// use tokio::sync::Notify;
///
/// struct Idle(Notify);
///
/// #[async_trait]
/// impl Activity for Idle {
///     fn name(&self) -> &str { "idle" }
///
///     async fn start(&self) -> Result<(), StartError> {
///         self.0.notified().await;
///         Ok(())
///     }
///
///     async fn stop(&self) -> Result<(), StopError> {
///         self.0.notify_one();
///         Ok(())
///     }
///
///     async fn kill(&self) -> Result<(), KillError> {
///         self.0.notify_one();
///         Ok(())
///     }
/// }
/// ```
#[async_trait]
pub trait Activity: Send + Sync + 'static {
    /// Returns a stable, human-readable activity name used in log fields.
    fn name(&self) -> &str;

    /// Runs the activity to completion.
    ///
    /// The returned value is the outcome of the whole run, not only of the launch.
    async fn start(&self) -> Result<(), StartError>;

    /// Asks the activity to shut itself down cooperatively. Does not wait.
    async fn stop(&self) -> Result<(), StopError>;

    /// Forces the activity to terminate. Does not wait.
    async fn kill(&self) -> Result<(), KillError>;
}
