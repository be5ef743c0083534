//! Test doubles shared by the unit tests of this crate.

use std::io;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use parking_lot::Mutex;
use tokio::sync::Notify;

use crate::activities::{Activity, LineSink};
use crate::error::{KillError, StartError, StopError};

/// How a [`FakeActivity`] reacts to the capability calls.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Behavior {
    /// Runs until `stop` (or `kill`), then returns `Ok`.
    Graceful,
    /// Ignores `stop`; only `kill` ends the run.
    Stubborn,
    /// `stop` returns an error; only `kill` ends the run.
    StopFails,
    /// Returns an error right away, as if the process crashed.
    Crash,
    /// Returns `Ok` right away.
    ExitClean,
    /// Panics inside `start`.
    Panic,
}

pub(crate) struct FakeActivity {
    behavior: Behavior,
    release: Notify,
    starts: AtomicUsize,
    stops: AtomicUsize,
    kills: AtomicUsize,
}

impl FakeActivity {
    pub(crate) fn new(behavior: Behavior) -> Self {
        Self {
            behavior,
            release: Notify::new(),
            starts: AtomicUsize::new(0),
            stops: AtomicUsize::new(0),
            kills: AtomicUsize::new(0),
        }
    }

    pub(crate) fn starts(&self) -> usize {
        self.starts.load(Ordering::SeqCst)
    }

    pub(crate) fn stops(&self) -> usize {
        self.stops.load(Ordering::SeqCst)
    }

    pub(crate) fn kills(&self) -> usize {
        self.kills.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Activity for FakeActivity {
    fn name(&self) -> &str {
        "fake"
    }

    async fn start(&self) -> Result<(), StartError> {
        self.starts.fetch_add(1, Ordering::SeqCst);
        match self.behavior {
            Behavior::Graceful | Behavior::Stubborn | Behavior::StopFails => {
                self.release.notified().await;
                Ok(())
            }
            Behavior::Crash => Err(StartError::Wait {
                source: io::Error::other("crashed"),
            }),
            Behavior::ExitClean => Ok(()),
            Behavior::Panic => panic!("fake activity panicked"),
        }
    }

    async fn stop(&self) -> Result<(), StopError> {
        self.stops.fetch_add(1, Ordering::SeqCst);
        match self.behavior {
            Behavior::Graceful => self.release.notify_one(),
            Behavior::StopFails => {
                return Err(StopError::Write {
                    source: io::Error::from(io::ErrorKind::BrokenPipe),
                });
            }
            _ => {}
        }
        Ok(())
    }

    async fn kill(&self) -> Result<(), KillError> {
        self.kills.fetch_add(1, Ordering::SeqCst);
        self.release.notify_one();
        Ok(())
    }
}

/// Sink that records every relayed line.
#[derive(Default)]
pub(crate) struct CollectSink(Mutex<Vec<(&'static str, String)>>);

impl CollectSink {
    pub(crate) fn lines(&self) -> Vec<(&'static str, String)> {
        self.0.lock().clone()
    }
}

impl LineSink for CollectSink {
    fn line(&self, pipe: &'static str, line: &str) {
        self.0.lock().push((pipe, line.to_owned()));
    }
}
