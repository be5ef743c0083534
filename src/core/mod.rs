//! Runtime core: background execution and shutdown coordination.
//!
//! Internal modules:
//! - [`config`]: coordinator settings (grace period);
//! - [`runner`]: runs an activity as a background task and exposes its completion;
//! - [`shutdown`]: cross-platform termination signal listeners;
//! - [`coordinator`]: races signals against completion and escalates to kill.

mod config;
mod coordinator;
mod runner;
mod shutdown;

pub use config::{Config, DEFAULT_GRACE};
pub use coordinator::{Coordinator, Phase, Shutdown};
pub use runner::{Completion, spawn};
pub use shutdown::ShutdownSignals;
