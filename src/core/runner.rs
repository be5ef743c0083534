//! # Run an activity in the background.
//!
//! [`spawn`] turns the blocking [`Activity::start`] call into a [`Completion`] signal the
//! caller can await or race without blocking its own task.
//!
//! ## Flow
//!
//! ```text
//! spawn(activity, token)
//!   └─► tokio::spawn ──► activity.start() ─────────────────────┐
//!                  └─► token cancelled? ─► activity.stop()     │
//!                                          (once, then keep    │
//!                                           awaiting start)    ▼
//!                                              Completion ◄── send(result)
//! ```
//!
//! ## Rules
//! - Delivers **exactly one** result per spawn, after `start` has fully returned
//! - A run that ends without reporting (panic) is delivered as [`StartError::Aborted`]
//! - Cancellation is forwarded as a single `stop` request; it never aborts `start`
//! - No retries, no restarts, no interpretation of the result

use std::future::Future;
use std::pin::Pin;
use std::task::{Context, Poll};

use tokio::sync::oneshot;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::activities::{Activity, ActivityRef};
use crate::error::StartError;

/// One-shot completion signal of a background activity.
///
/// Resolves to the result of [`Activity::start`]. After it has resolved once, polling it
/// again stays pending forever: no further value is ever delivered.
#[derive(Debug)]
#[must_use = "dropping the completion discards the activity's outcome"]
pub struct Completion {
    rx: Option<oneshot::Receiver<Result<(), StartError>>>,
}

impl Completion {
    /// Returns `true` once the result has been delivered to this handle.
    pub fn is_terminated(&self) -> bool {
        self.rx.is_none()
    }
}

impl Future for Completion {
    type Output = Result<(), StartError>;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        let Some(rx) = self.rx.as_mut() else {
            return Poll::Pending;
        };
        match Pin::new(rx).poll(cx) {
            Poll::Ready(res) => {
                self.rx = None;
                Poll::Ready(res.unwrap_or(Err(StartError::Aborted)))
            }
            Poll::Pending => Poll::Pending,
        }
    }
}

/// Starts `activity` on a new task and returns its [`Completion`] immediately.
///
/// When `token` is cancelled while the activity runs, [`Activity::stop`] is called once;
/// a stop failure is logged and the run keeps being awaited.
pub fn spawn(activity: ActivityRef, token: CancellationToken) -> Completion {
    let (tx, rx) = oneshot::channel();

    tokio::spawn(async move {
        let res = run_to_completion(&*activity, &token).await;
        if tx.send(res).is_err() {
            debug!(activity = activity.name(), "completion dropped before delivery");
        }
    });

    Completion { rx: Some(rx) }
}

async fn run_to_completion(
    activity: &dyn Activity,
    token: &CancellationToken,
) -> Result<(), StartError> {
    let mut run = activity.start();

    tokio::select! {
        biased;
        res = &mut run => res,
        () = token.cancelled() => {
            debug!(activity = activity.name(), "cancellation requested, stopping activity");
            if let Err(err) = activity.stop().await {
                warn!(
                    activity = activity.name(),
                    error = %err,
                    label = err.as_label(),
                    "failed to stop activity"
                );
            }
            run.await
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::time::Duration;

    use super::*;
    use crate::activities::testing::{Behavior, FakeActivity};

    #[tokio::test]
    async fn delivers_success_exactly_once() {
        let fake = Arc::new(FakeActivity::new(Behavior::ExitClean));
        let mut done = spawn(fake.clone(), CancellationToken::new());

        assert!((&mut done).await.is_ok());
        assert!(done.is_terminated());
        assert!(tokio::time::timeout(Duration::from_millis(50), &mut done).await.is_err());
        assert_eq!(fake.starts(), 1);
    }

    #[tokio::test]
    async fn delivers_failure() {
        let fake = Arc::new(FakeActivity::new(Behavior::Crash));
        let done = spawn(fake.clone(), CancellationToken::new());

        assert!(matches!(done.await, Err(StartError::Wait { .. })));
        assert_eq!(fake.stops(), 0);
    }

    #[tokio::test]
    async fn panic_is_delivered_as_aborted() {
        let fake = Arc::new(FakeActivity::new(Behavior::Panic));
        let done = spawn(fake, CancellationToken::new());

        assert!(matches!(done.await, Err(StartError::Aborted)));
    }

    #[tokio::test]
    async fn spawn_does_not_block_caller() {
        let fake = Arc::new(FakeActivity::new(Behavior::Graceful));
        let token = CancellationToken::new();
        let mut done = spawn(fake.clone(), token.clone());

        assert!(tokio::time::timeout(Duration::from_millis(50), &mut done).await.is_err());
        assert!(!done.is_terminated());

        fake.kill().await.unwrap();
        assert!(done.await.is_ok());
    }

    #[tokio::test]
    async fn cancellation_requests_one_stop() {
        let fake = Arc::new(FakeActivity::new(Behavior::Graceful));
        let token = CancellationToken::new();
        let done = spawn(fake.clone(), token.clone());

        token.cancel();

        assert!(done.await.is_ok());
        assert_eq!(fake.stops(), 1);
        assert_eq!(fake.kills(), 0);
    }

    #[tokio::test]
    async fn no_stop_after_activity_finished() {
        let fake = Arc::new(FakeActivity::new(Behavior::ExitClean));
        let token = CancellationToken::new();
        let done = spawn(fake.clone(), token.clone());

        assert!(done.await.is_ok());
        token.cancel();
        tokio::task::yield_now().await;

        assert_eq!(fake.stops(), 0);
    }
}
