//! # Activities supervised by the runtime.
//!
//! - [`Activity`] - the {start, stop, kill} capability trait
//! - [`ActivityRef`] - shared handle (`Arc<dyn Activity>`)
//! - [`ManagedProcess`] - activity wrapping one OS child process
//! - [`ProcessSpec`] / [`Program`] - how the child is located and launched
//! - [`LineSink`] / [`TracingSink`] - destination of relayed child output

mod activity;
mod process;
mod relay;

#[cfg(test)]
pub(crate) mod testing;

pub use activity::{Activity, ActivityRef};
pub use process::{ManagedProcess, ProcessSpec, Program};
pub use relay::{LineSink, TracingSink};
