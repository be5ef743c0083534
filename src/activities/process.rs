//! # Managed process: an [`Activity`] wrapping one OS child process.
//!
//! [`ManagedProcess`] owns the child's standard streams and drives one output relay per
//! output stream.
//!
//! ## Lifecycle
//! ```text
//! Idle ──start()──► Running ──(exit / stop / kill)──► Exited
//!   │                                                   ▲
//!   └──────────── start() launch failure ───────────────┘
//! ```
//!
//! ## Rules
//! - `start` succeeds at most once per instance; any later call fails with
//!   [`StartError::AlreadyStarted`] without spawning anything.
//! - The state lock is held exclusively only while launching; `stop` and `kill`
//!   take it shared and may run concurrently with a running `start`.
//! - The [`Child`] is owned by the running `start`; `kill` asks it to deliver the signal,
//!   so a reaped pid is never signalled.
//! - The child runs in its own process group, so terminal signals aimed at the
//!   supervisor are not forwarded to it.
//! - The child environment is cleared and replaced by [`ProcessSpec::env`].

use std::path::PathBuf;
use std::process::Stdio;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::RwLock;
use tokio::io::{AsyncRead, AsyncWriteExt};
use tokio::process::{Child, ChildStdin, Command};
use tokio::sync::{Mutex, mpsc, oneshot};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use crate::activities::Activity;
use crate::activities::relay::{LineSink, TracingSink, relay};
use crate::error::{KillError, StartError, StopError};

/// How long `start` waits for the relays to flush buffered output after the child exits.
const RELAY_DRAIN: Duration = Duration::from_millis(250);

/// Location of the child executable.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Program {
    /// File name resolved in the directory of the current executable.
    Beside(String),
    /// Explicit path, used as-is.
    Path(PathBuf),
}

/// Launch description of a managed child process.
///
/// ## Field semantics
/// - `dir`: working directory; `None` means the current executable's directory
///   for [`Program::Beside`] and the inherited one for [`Program::Path`].
/// - `env`: the complete child environment (nothing is inherited).
/// - `stop_command`: line written to stdin by [`Activity::stop`], without the newline.
#[derive(Clone, Debug)]
pub struct ProcessSpec {
    /// Executable to spawn.
    pub program: Program,
    /// Arguments passed to the executable.
    pub args: Vec<String>,
    /// Working directory override.
    pub dir: Option<PathBuf>,
    /// Environment of the child.
    pub env: Vec<(String, String)>,
    /// Cooperative shutdown command.
    pub stop_command: String,
}

impl ProcessSpec {
    /// The bedrock server: `bedrock_server` next to the supervisor binary.
    pub fn bedrock() -> Self {
        Self::beside("bedrock_server")
    }

    /// Spawns `name` from the directory of the current executable, in that directory,
    /// with `LD_LIBRARY_PATH=.` as its only environment variable.
    pub fn beside(name: impl Into<String>) -> Self {
        Self::with_program(Program::Beside(name.into()))
    }

    /// Spawns the executable at `path`.
    pub fn path(path: impl Into<PathBuf>) -> Self {
        Self::with_program(Program::Path(path.into()))
    }

    fn with_program(program: Program) -> Self {
        Self {
            program,
            args: Vec::new(),
            dir: None,
            env: vec![("LD_LIBRARY_PATH".to_owned(), ".".to_owned())],
            stop_command: "stop".to_owned(),
        }
    }

    /// Replaces the argument list.
    #[must_use]
    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args = args.into_iter().map(Into::into).collect();
        self
    }

    /// Adds one environment variable.
    #[must_use]
    pub fn env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.env.push((key.into(), value.into()));
        self
    }

    /// Sets the working directory.
    #[must_use]
    pub fn dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.dir = Some(dir.into());
        self
    }

    /// Sets the command written on stop.
    #[must_use]
    pub fn stop_command(mut self, command: impl Into<String>) -> Self {
        self.stop_command = command.into();
        self
    }

    /// Resolves the program path and working directory.
    fn resolve(&self) -> Result<(PathBuf, Option<PathBuf>), StartError> {
        match &self.program {
            Program::Path(path) => Ok((path.clone(), self.dir.clone())),
            Program::Beside(name) => {
                let exe =
                    std::env::current_exe().map_err(|source| StartError::Executable { source })?;
                let dir = exe.parent().ok_or_else(|| StartError::Executable {
                    source: std::io::Error::other("executable has no parent directory"),
                })?;
                let cwd = self.dir.clone().unwrap_or_else(|| dir.to_path_buf());
                Ok((dir.join(name), Some(cwd)))
            }
        }
    }
}

enum State {
    Idle,
    Running(Running),
    Exited,
}

/// Reply slot of one kill request.
type KillReply = oneshot::Sender<Result<(), KillError>>;

struct Running {
    pid: Option<u32>,
    stdin: Arc<Mutex<ChildStdin>>,
    kills: mpsc::Sender<KillReply>,
}

/// Everything `start` needs after the state lock is released.
struct Launched {
    child: Child,
    kills: mpsc::Receiver<KillReply>,
    token: CancellationToken,
    relays: [JoinHandle<()>; 2],
}

/// OS child process supervised as an [`Activity`].
pub struct ManagedProcess {
    name: String,
    spec: ProcessSpec,
    sink: Arc<dyn LineSink>,
    state: RwLock<State>,
}

impl ManagedProcess {
    /// Creates an idle process that relays output through [`TracingSink`].
    pub fn new(spec: ProcessSpec) -> Self {
        let name = match &spec.program {
            Program::Beside(name) => name.clone(),
            Program::Path(path) => path
                .file_name()
                .map_or_else(|| path.display().to_string(), |n| n.to_string_lossy().into_owned()),
        };
        Self {
            name,
            spec,
            sink: Arc::new(TracingSink),
            state: RwLock::new(State::Idle),
        }
    }

    /// Replaces the destination of relayed output lines.
    #[must_use]
    pub fn with_sink(mut self, sink: Arc<dyn LineSink>) -> Self {
        self.sink = sink;
        self
    }

    /// Returns the child's pid while it is running.
    pub fn pid(&self) -> Option<u32> {
        match &*self.state.read() {
            State::Running(running) => running.pid,
            State::Idle | State::Exited => None,
        }
    }

    /// Spawns the child and wires its relays under the exclusive state lock.
    ///
    /// Any failure after the idle check still consumes the single start.
    fn launch(&self) -> Result<Launched, StartError> {
        let mut state = self.state.write();
        if !matches!(*state, State::Idle) {
            return Err(StartError::AlreadyStarted);
        }
        *state = State::Exited;

        let (program, cwd) = self.spec.resolve()?;

        let mut cmd = Command::new(&program);
        cmd.args(&self.spec.args)
            .env_clear()
            .envs(self.spec.env.iter().map(|(k, v)| (k.as_str(), v.as_str())))
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);
        if let Some(cwd) = cwd {
            cmd.current_dir(cwd);
        }
        #[cfg(unix)]
        cmd.process_group(0);

        let mut child = cmd
            .spawn()
            .map_err(|source| StartError::Spawn { program, source })?;

        let stdin = child.stdin.take().ok_or(StartError::Pipe { pipe: "stdin" })?;
        let stdout = child.stdout.take().ok_or(StartError::Pipe { pipe: "stdout" })?;
        let stderr = child.stderr.take().ok_or(StartError::Pipe { pipe: "stderr" })?;

        let token = CancellationToken::new();
        let relays = [
            self.spawn_relay(stdout, "stdout", token.clone()),
            self.spawn_relay(stderr, "stderr", token.clone()),
        ];
        let (kill_tx, kills) = mpsc::channel(1);

        *state = State::Running(Running {
            pid: child.id(),
            stdin: Arc::new(Mutex::new(stdin)),
            kills: kill_tx,
        });

        Ok(Launched {
            child,
            kills,
            token,
            relays,
        })
    }

    fn spawn_relay<R>(
        &self,
        reader: R,
        pipe: &'static str,
        token: CancellationToken,
    ) -> JoinHandle<()>
    where
        R: AsyncRead + Unpin + Send + 'static,
    {
        let sink = Arc::clone(&self.sink);
        tokio::spawn(async move { relay(reader, pipe, token, &*sink).await })
    }

    fn stdin(&self) -> Option<Arc<Mutex<ChildStdin>>> {
        match &*self.state.read() {
            State::Running(running) => Some(Arc::clone(&running.stdin)),
            State::Idle | State::Exited => None,
        }
    }

    fn kill_requests(&self) -> Option<mpsc::Sender<KillReply>> {
        match &*self.state.read() {
            State::Running(running) => Some(running.kills.clone()),
            State::Idle | State::Exited => None,
        }
    }

    fn mark_exited(&self) {
        *self.state.write() = State::Exited;
    }

    /// Sends SIGKILL to a child that has not been reaped yet.
    fn signal(&self, child: &mut Child) -> Result<(), KillError> {
        info!(process = %self.name, pid = ?child.id(), "killing process");
        child
            .start_kill()
            .map_err(|source| KillError::Signal { source })
    }
}

#[async_trait]
impl Activity for ManagedProcess {
    fn name(&self) -> &str {
        &self.name
    }

    async fn start(&self) -> Result<(), StartError> {
        let Launched {
            mut child,
            mut kills,
            token,
            relays,
        } = self.launch()?;
        info!(process = %self.name, pid = ?child.id(), "started process");

        let waited = loop {
            let reply = tokio::select! {
                waited = child.wait() => break waited,
                Some(reply) = kills.recv() => reply,
            };
            let _ = reply.send(self.signal(&mut child));
        };
        self.mark_exited();
        drop(kills);

        let drain = async {
            for handle in relays {
                let _ = handle.await;
            }
        };
        if tokio::time::timeout(RELAY_DRAIN, drain).await.is_err() {
            debug!(process = %self.name, "output relays still open after exit");
        }
        token.cancel();

        let status = waited.map_err(|source| StartError::Wait { source })?;
        info!(process = %self.name, %status, "process exited");
        if status.success() {
            Ok(())
        } else {
            Err(StartError::Exited { status })
        }
    }

    async fn stop(&self) -> Result<(), StopError> {
        let stdin = self.stdin().ok_or(StopError::NotRunning)?;
        let command = format!("{}\n", self.spec.stop_command);

        let mut stdin = stdin.lock().await;
        stdin
            .write_all(command.as_bytes())
            .await
            .map_err(|source| StopError::Write { source })?;
        stdin
            .flush()
            .await
            .map_err(|source| StopError::Write { source })?;

        info!(process = %self.name, command = %self.spec.stop_command, "sent stop command");
        Ok(())
    }

    async fn kill(&self) -> Result<(), KillError> {
        let Some(requests) = self.kill_requests() else {
            return Ok(());
        };
        let (reply, outcome) = oneshot::channel();
        if requests.send(reply).await.is_err() {
            debug!(process = %self.name, "process already exited");
            return Ok(());
        }
        // A dropped reply means the child was reaped before the request was served.
        outcome.await.unwrap_or(Ok(()))
    }
}
