//! Readiness loop over the synthesizer's three pipes.
//!
//! A single task waits on stderr, stdin (only while commands are backlogged)
//! and stdout, always preferring them in that order. Diagnostics are seen
//! before the audio they may explain, and backlogged commands reach the
//! process before we wait on the audio they will produce.
//!
//! How long to wait depends on what the process is doing. A process asleep
//! on its input has finished the current utterance, so a short grace poll
//! is enough. Otherwise the wait escalates along a backoff ladder; when the
//! ladder runs out the drain either ends (audio already arrived) or the
//! process is declared wedged.

use std::io;
use std::sync::Arc;
use std::time::Duration;

use futures_util::FutureExt;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::process::ChildStdin;
use tokio::time::{Instant, sleep, timeout, timeout_at};
use tracing::{debug, trace, warn};
use voxpipe_core::{BackoffConfig, ProcessExit, ProcessState, SynthConfig, SynthError, SynthResult};

use crate::backoff::Backoff;
use crate::pending::PendingWriteQueue;
use crate::process::{ActivityProbe, PipeSet};
use crate::stderr::ErrorStreamClassifier;

/// Read size for stderr.
const ERROR_CHUNK: usize = 512;

/// How long stderr gets to hit EOF after stdout closes or stdin breaks.
const EXIT_CONFIRM: Duration = Duration::from_millis(50);

enum Event {
    Error(io::Result<usize>),
    Command(io::Result<usize>),
    Audio(io::Result<usize>),
    Timeout,
}

/// Owns the pipes and pending queue of one synthesizer process.
#[derive(Debug)]
pub struct Multiplexer {
    pipes: PipeSet,
    pending: PendingWriteQueue,
    errors: ErrorStreamClassifier,
    probe: Arc<dyn ActivityProbe>,
    backoff: BackoffConfig,
    idle_poll: Duration,
    reap_timeout: Duration,
    state: ProcessState,
    audio_closed: bool,
    error_closed: bool,
    /// Whether any audio arrived since `begin_utterance`.
    audio_seen: bool,
    /// Set once a fatal error has been reported; the process is not spoken to again.
    failed: bool,
}

impl Multiplexer {
    pub fn new(pipes: PipeSet, probe: Arc<dyn ActivityProbe>, config: &SynthConfig) -> Self {
        let pid = pipes.pid();
        Self {
            pipes,
            pending: PendingWriteQueue::new(),
            errors: ErrorStreamClassifier::new(pid),
            probe,
            backoff: config.backoff,
            idle_poll: config.idle_poll(),
            reap_timeout: config.shutdown_grace(),
            state: ProcessState::Idle,
            audio_closed: false,
            error_closed: false,
            audio_seen: false,
            failed: false,
        }
    }

    pub const fn pid(&self) -> u32 {
        self.pipes.pid()
    }

    pub const fn state(&self) -> ProcessState {
        self.state
    }

    pub const fn set_state(&mut self, state: ProcessState) {
        self.state = state;
    }

    /// Non-blocking, non-reaping liveness check.
    pub fn is_alive(&self) -> bool {
        self.pipes.is_alive()
    }

    /// True once the process has been reaped, declared wedged, or has
    /// failed fatally.
    pub const fn is_finished(&self) -> bool {
        self.failed || self.pipes.exit().is_some() || self.state.is_terminal()
    }

    /// Stop using the process after a fatal error. Anything still queued
    /// belongs to the failed utterance and is dropped.
    pub fn mark_failed(&mut self) {
        self.failed = true;
        self.pending.clear();
    }

    /// Bytes waiting in the pending-write queue.
    pub const fn pending_bytes(&self) -> usize {
        self.pending.len()
    }

    /// Start tracking a new utterance for stall detection.
    pub const fn begin_utterance(&mut self) {
        self.audio_seen = false;
    }

    /// Hand command bytes to the process without waiting.
    ///
    /// Writes what the pipe accepts right now and queues the remainder.
    /// Anything already queued goes first, so bytes always reach the
    /// process in submission order. Returns the number of bytes accepted,
    /// which is all of them.
    pub async fn submit(&mut self, bytes: &[u8]) -> SynthResult<usize> {
        if bytes.is_empty() {
            return Ok(0);
        }
        if !self.pending.is_empty() {
            self.pending.push(bytes.to_vec());
            trace!(
                pid = self.pid(),
                queued = self.pending.len(),
                blocks = self.pending.block_count(),
                "Queued behind backlog"
            );
            return Ok(bytes.len());
        }

        let Some(stdin) = self.pipes.stdin.as_mut() else {
            return Err(SynthError::NotRunning);
        };
        let written = match stdin.write(bytes).now_or_never() {
            Some(Ok(n)) => n,
            None => 0,
            Some(Err(e)) if e.kind() == io::ErrorKind::WouldBlock => 0,
            Some(Err(e)) if e.kind() == io::ErrorKind::BrokenPipe => {
                return Err(self.collect_death().await);
            }
            Some(Err(e)) => return Err(e.into()),
        };

        if written < bytes.len() {
            self.pending.push(bytes[written..].to_vec());
            trace!(
                pid = self.pid(),
                written,
                queued = self.pending.len(),
                "Command pipe full, queued remainder"
            );
        }
        Ok(bytes.len())
    }

    /// Read audio into `dest` while servicing stderr and the pending queue.
    ///
    /// Returns when `dest` is full, when the process goes quiet (state
    /// becomes `Idle`), or when stdout reaches end of stream. A short count
    /// with state `Idle` means the utterance is complete.
    pub async fn fill(&mut self, dest: &mut [u8]) -> SynthResult<usize> {
        let mut filled = 0;
        let mut backoff = Backoff::new(&self.backoff);
        let mut err_buf = [0u8; ERROR_CHUNK];

        while filled < dest.len() {
            if self.audio_closed {
                self.state = ProcessState::Idle;
                break;
            }

            let idle = self.pending.is_empty() && self.probe.activity(self.pid()).is_idle();
            let wait = if idle { self.idle_poll } else { backoff.current() };

            let head = self.pending.head();
            let writing = head.is_some() && self.pipes.stdin.is_some();
            let reading_errors = !self.error_closed;

            let event = tokio::select! {
                biased;
                r = self.pipes.stderr.read(&mut err_buf), if reading_errors => Event::Error(r),
                r = write_head(self.pipes.stdin.as_mut(), head), if writing => Event::Command(r),
                r = self.pipes.stdout.read(&mut dest[filled..]) => Event::Audio(r),
                () = sleep(wait) => Event::Timeout,
            };

            match event {
                Event::Error(Ok(0)) => {
                    self.error_closed = true;
                    return Err(self.collect_death().await);
                }
                Event::Error(Ok(n)) => {
                    self.errors.feed(&err_buf[..n]);
                    backoff.reset();
                }
                Event::Error(Err(e)) => return Err(e.into()),

                Event::Command(Ok(0)) => {
                    return Err(io::Error::from(io::ErrorKind::WriteZero).into());
                }
                Event::Command(Ok(n)) => {
                    self.pending.advance(n);
                    trace!(pid = self.pid(), bytes = n, remaining = self.pending.len(), "Flushed backlog");
                    backoff.reset();
                }
                Event::Command(Err(e)) if e.kind() == io::ErrorKind::BrokenPipe => {
                    return Err(self.collect_death().await);
                }
                Event::Command(Err(e)) => return Err(e.into()),

                Event::Audio(Ok(0)) => {
                    debug!(pid = self.pid(), "Synthesizer closed its audio output");
                    self.audio_closed = true;
                    if let Some(err) = self.confirm_exit().await {
                        return Err(err);
                    }
                }
                Event::Audio(Ok(n)) => {
                    trace!(pid = self.pid(), bytes = n, "Audio");
                    filled += n;
                    self.audio_seen = true;
                    self.state = ProcessState::Audio;
                    backoff.reset();
                }
                Event::Audio(Err(e)) => return Err(e.into()),

                Event::Timeout if idle => {
                    trace!(pid = self.pid(), filled, "Synthesizer idle");
                    self.state = ProcessState::Idle;
                    break;
                }
                Event::Timeout => {
                    if backoff.escalate().is_none() {
                        if self.audio_seen {
                            trace!(pid = self.pid(), filled, "Silence past backoff ceiling, ending drain");
                            self.state = ProcessState::Idle;
                            break;
                        }
                        let waited = backoff.waited();
                        warn!(
                            pid = self.pid(),
                            waited_ms = waited.as_millis(),
                            pending = self.pending.len(),
                            "Synthesizer stalled"
                        );
                        self.state = ProcessState::Wedged;
                        return Err(SynthError::Wedged { waited });
                    }
                }
            }
        }

        Ok(filled)
    }

    /// Discard the backlog, terminate the process and reap it.
    pub async fn shutdown(&mut self, grace: Duration) -> io::Result<ProcessExit> {
        if !self.pending.is_empty() {
            debug!(pid = self.pid(), discarded = self.pending.len(), "Discarding unsent commands");
            self.pending.clear();
        }
        let exit = self.pipes.terminate(grace).await;
        self.state = ProcessState::Inactive;
        exit
    }

    /// Stdout closing usually means the process is exiting. Give stderr a
    /// moment to confirm before treating it as a plain end of stream.
    async fn confirm_exit(&mut self) -> Option<SynthError> {
        if self.error_closed {
            return None;
        }
        let mut buf = [0u8; ERROR_CHUNK];
        let deadline = Instant::now() + EXIT_CONFIRM;
        loop {
            match timeout_at(deadline, self.pipes.stderr.read(&mut buf)).await {
                Err(_) => return None,
                Ok(Ok(0)) => {
                    self.error_closed = true;
                    return Some(self.collect_death().await);
                }
                Ok(Ok(n)) => self.errors.feed(&buf[..n]),
                Ok(Err(e)) => return Some(e.into()),
            }
        }
    }

    /// Drain the last of stderr, reap, and describe how the process ended.
    pub async fn collect_death(&mut self) -> SynthError {
        if !self.error_closed {
            let mut buf = [0u8; ERROR_CHUNK];
            let stderr = &mut self.pipes.stderr;
            let errors = &mut self.errors;
            let drained = timeout(EXIT_CONFIRM, async {
                loop {
                    match stderr.read(&mut buf).await {
                        Ok(0) | Err(_) => break,
                        Ok(n) => errors.feed(&buf[..n]),
                    }
                }
            })
            .await;
            self.error_closed = drained.is_ok();
        }

        self.failed = true;
        self.pending.clear();
        self.pipes.close_stdin();
        let exit = match timeout(self.reap_timeout, self.pipes.reap()).await {
            Ok(Ok(exit)) => exit,
            Ok(Err(e)) => {
                warn!(pid = self.pid(), error = %e, "Failed to reap synthesizer");
                ProcessExit::Unknown
            }
            Err(_) => ProcessExit::Unknown,
        };
        self.state = ProcessState::Inactive;
        self.errors.finish();
        debug!(
            pid = self.pid(),
            %exit,
            diagnostic = self.errors.diagnostic(),
            "Synthesizer process died"
        );
        self.errors.died(exit)
    }
}

async fn write_head(stdin: Option<&mut ChildStdin>, head: Option<&[u8]>) -> io::Result<usize> {
    match (stdin, head) {
        (Some(stdin), Some(head)) => stdin.write(head).await,
        _ => std::future::pending().await,
    }
}
