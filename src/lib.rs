//! # bedrockd
//!
//! **bedrockd** supervises a single long-running child process: it starts the child,
//! relays its output streams into the unified log, and sequences a graceful-then-forced
//! shutdown driven by the supervisor's own termination signals.
//!
//! ## Architecture
//! ### Overview
//! ```text
//!        SIGINT / SIGTERM
//!               │
//!               ▼
//! ┌───────────────────────────────────────────────────────────────┐
//! │  Coordinator (control loop)                                   │
//! │  - races ShutdownSignals against the Completion               │
//! │  - cancels the shared CancellationToken                       │
//! │  - bounded wait (Config::grace), then Activity::kill()        │
//! └──────┬───────────────────────────────────────────▲────────────┘
//!        │ runner::spawn(activity, token)            │ Completion (one result)
//!        ▼                                           │
//! ┌───────────────────────────────────────────────────────────────┐
//! │  Runner task                                                  │
//! │  - awaits Activity::start() to completion                     │
//! │  - token cancelled ─► Activity::stop() (once)                 │
//! └──────┬────────────────────────────────────────────────────────┘
//!        ▼
//! ┌───────────────────────────────────────────────────────────────┐
//! │  ManagedProcess (Activity)                                    │
//! │  - spawns the child in its own process group                  │
//! │  - stop: writes "stop\n" to stdin      kill: SIGKILL          │
//! │  - relay(stdout) ──┐                                          │
//! │  - relay(stderr) ──┴──► LineSink (tracing, field `pipe`)      │
//! └───────────────────────────────────────────────────────────────┘
//! ```
//!
//! ### Lifecycle
//! ```text
//! Running ──signal──► Stopping ──completion within grace──► Stopped   → exit 0
//!    │                    └──grace elapsed──► Terminating ─► kill     → exit 1
//!    └──completion before any signal──► Stopped (unexpected)          → exit 1
//! ```
//!
//! ## Features
//! | Area            | Description                                              | Key types / traits                       |
//! |-----------------|----------------------------------------------------------|------------------------------------------|
//! | **Activities**  | Capability contract and the child-process implementation | [`Activity`], [`ManagedProcess`]         |
//! | **Runner**      | Blocking run turned into a one-shot completion signal    | [`spawn`], [`Completion`]                |
//! | **Shutdown**    | Signal-driven stop with escalation to kill               | [`Coordinator`], [`Phase`], [`Config`]   |
//! | **Output**      | Child stdout/stderr lines forwarded to the log           | [`LineSink`], [`TracingSink`]            |
//! | **Errors**      | Typed errors per capability and for the runtime          | [`StartError`], [`RuntimeError`]         |
//!
//! ## Example
//! ```rust,no_run
//! use std::sync::Arc;
//! use bedrockd::{ActivityRef, Config, Coordinator, ManagedProcess, ProcessSpec};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let process: ActivityRef = Arc::new(ManagedProcess::new(ProcessSpec::bedrock()));
//!     let coordinator = Coordinator::new(Config::default(), process);
//!
//!     // Blocks until SIGINT/SIGTERM, then stops the server (or kills it after 10s).
//!     coordinator.run().await?;
//!     Ok(())
//! }
//! ```
mod activities;
mod core;
mod error;

// ---- Public re-exports ----

pub use self::activities::{
    Activity, ActivityRef, LineSink, ManagedProcess, ProcessSpec, Program, TracingSink,
};
pub use self::core::{
    Completion, Config, Coordinator, DEFAULT_GRACE, Phase, Shutdown, ShutdownSignals, spawn,
};
pub use self::error::{KillError, RuntimeError, StartError, StopError};
