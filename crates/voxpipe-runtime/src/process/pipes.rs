//! The synthesizer child and its three pipes.

use std::ffi::OsStr;
use std::io;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::Duration;

use tokio::process::{Child, ChildStderr, ChildStdin, ChildStdout, Command};
use tracing::debug;
use voxpipe_core::{ProcessExit, SynthError, SynthResult};

use super::probe;
use super::shutdown;

/// Resolve the synthesizer executable.
///
/// Values containing a path separator are used as-is; bare names are looked
/// up on `PATH`.
pub fn resolve_program(program: &str) -> SynthResult<PathBuf> {
    let path = Path::new(program);
    if path.components().count() > 1 {
        return Ok(path.to_path_buf());
    }
    which::which(program).map_err(|e| SynthError::Spawn {
        program: program.to_string(),
        source: io::Error::new(io::ErrorKind::NotFound, e),
    })
}

/// An owned synthesizer process with piped stdin, stdout and stderr.
///
/// The parent-side pipe ends are registered with the tokio reactor, which
/// puts them in non-blocking mode. Dropping a `PipeSet` kills the child.
#[derive(Debug)]
pub struct PipeSet {
    child: Child,
    pid: u32,
    /// Command channel. `None` once closed.
    pub(crate) stdin: Option<ChildStdin>,
    /// Audio channel.
    pub(crate) stdout: ChildStdout,
    /// Diagnostic channel.
    pub(crate) stderr: ChildStderr,
    exit: Option<ProcessExit>,
}

impl PipeSet {
    /// Spawn `program` with `args`, wiring all three standard streams to pipes.
    ///
    /// On failure nothing is left behind: a child that was created but could
    /// not be fully wired is killed when it is dropped.
    pub fn spawn<I, S>(program: &Path, args: I) -> SynthResult<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<OsStr>,
    {
        let spawn_error = |source: io::Error| SynthError::Spawn {
            program: program.display().to_string(),
            source,
        };

        let mut child = Command::new(program)
            .args(args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(spawn_error)?;

        let missing = |name: &str| spawn_error(io::Error::other(format!("{name} was not captured")));
        let stdin = child.stdin.take().ok_or_else(|| missing("stdin"))?;
        let stdout = child.stdout.take().ok_or_else(|| missing("stdout"))?;
        let stderr = child.stderr.take().ok_or_else(|| missing("stderr"))?;
        let pid = child
            .id()
            .ok_or_else(|| spawn_error(io::Error::other("child exited before it could be tracked")))?;

        debug!(pid, program = %program.display(), "Spawned synthesizer");

        Ok(Self {
            child,
            pid,
            stdin: Some(stdin),
            stdout,
            stderr,
            exit: None,
        })
    }

    pub const fn pid(&self) -> u32 {
        self.pid
    }

    /// Exit status, once the child has been reaped.
    pub const fn exit(&self) -> Option<ProcessExit> {
        self.exit
    }

    /// Non-blocking, non-reaping liveness check.
    pub fn is_alive(&self) -> bool {
        self.exit.is_none() && probe::is_alive(self.pid)
    }

    /// Close the command channel, signalling end of input to the child.
    pub fn close_stdin(&mut self) {
        self.stdin = None;
    }

    /// Collect the exit status if the child has already terminated.
    pub fn try_reap(&mut self) -> io::Result<Option<ProcessExit>> {
        if self.exit.is_none() {
            self.exit = self.child.try_wait()?.map(ProcessExit::from);
        }
        Ok(self.exit)
    }

    /// Block until the child terminates and return how it ended.
    pub async fn reap(&mut self) -> io::Result<ProcessExit> {
        if let Some(exit) = self.exit {
            return Ok(exit);
        }
        let exit = ProcessExit::from(self.child.wait().await?);
        debug!(pid = self.pid, %exit, "Reaped synthesizer");
        self.exit = Some(exit);
        Ok(exit)
    }

    /// Close stdin, then SIGTERM, escalate to SIGKILL after `grace`, and reap.
    ///
    /// Idempotent.
    pub async fn terminate(&mut self, grace: Duration) -> io::Result<ProcessExit> {
        self.close_stdin();
        if let Some(exit) = self.exit {
            return Ok(exit);
        }
        let exit = ProcessExit::from(shutdown::terminate(&mut self.child, grace).await?);
        debug!(pid = self.pid, %exit, "Terminated synthesizer");
        self.exit = Some(exit);
        Ok(exit)
    }
}
