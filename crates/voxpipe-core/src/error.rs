//! Error types for the synthesizer driver.
//!
//! Every failure surfaced by a session maps onto one `SynthError` variant.
//! Partial writes and would-block conditions never appear here: they are
//! absorbed by the pending-write queue.

use std::fmt;
use std::io;
use std::process::ExitStatus;
use std::time::Duration;

use thiserror::Error;

/// How the synthesizer process ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProcessExit {
    /// Exited normally with the given status code.
    Exited(i32),
    /// Terminated by the given signal number.
    Signaled(i32),
    /// The process is gone but its status could not be collected.
    Unknown,
}

impl ProcessExit {
    /// True for `Exited(0)`.
    pub const fn is_success(self) -> bool {
        matches!(self, Self::Exited(0))
    }
}

impl From<ExitStatus> for ProcessExit {
    fn from(status: ExitStatus) -> Self {
        if let Some(code) = status.code() {
            return Self::Exited(code);
        }

        #[cfg(unix)]
        {
            use std::os::unix::process::ExitStatusExt;
            if let Some(signal) = status.signal() {
                return Self::Signaled(signal);
            }
        }

        Self::Unknown
    }
}

impl fmt::Display for ProcessExit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Exited(code) => write!(f, "exited with code {code}"),
            Self::Signaled(signal) => write!(f, "killed by signal {signal}"),
            Self::Unknown => f.write_str("exit status unknown"),
        }
    }
}

fn diagnostic_suffix(message: &Option<String>) -> String {
    message
        .as_deref()
        .map(|m| format!(": {m}"))
        .unwrap_or_default()
}

/// Errors that can occur while driving the synthesizer subprocess.
#[derive(Debug, Error)]
pub enum SynthError {
    // === Lifecycle ===
    /// Pipe or process creation failed. No session is produced.
    #[error("Failed to spawn synthesizer '{program}': {source}")]
    Spawn {
        program: String,
        #[source]
        source: io::Error,
    },

    /// The handshake response was short or malformed.
    #[error("Synthesizer handshake failed: {0}")]
    Init(String),

    /// The subprocess exited or was signalled.
    #[error("Synthesizer process {exit}{}", diagnostic_suffix(.message))]
    ProcessDied {
        exit: ProcessExit,
        /// Last diagnostic the process printed on stderr, if any.
        message: Option<String>,
    },

    /// The subprocess is alive but made no progress within the backoff ceiling.
    #[error("Synthesizer stalled: no output after {waited:?}")]
    Wedged { waited: Duration },

    /// The session has no live process to talk to.
    #[error("Synthesizer process is not running")]
    NotRunning,

    /// The session was closed.
    #[error("Synthesizer session is closed")]
    Closed,

    // === Voice data ===
    /// The voice identifier is malformed or its data is not installed.
    #[error("Voice not found: {0}")]
    VoiceNotFound(String),

    /// The voice table could not be loaded.
    #[error("Invalid voice table: {0}")]
    VoiceTable(String),

    /// A phoneme symbol cannot be carried by the line protocol.
    #[error("Invalid phoneme symbol: {0:?}")]
    InvalidPhoneme(String),

    /// An envelope contour violated its invariants.
    #[error("Invalid envelope: {0}")]
    InvalidEnvelope(String),

    // === Configuration & IO ===
    /// Configuration value out of range or unreadable.
    #[error("Configuration error: {0}")]
    Config(String),

    /// Unexpected syscall failure on a pipe.
    #[error("IO error: {0}")]
    Io(#[from] io::Error),
}

impl SynthError {
    /// Create an `Init` error from any displayable reason.
    pub fn init(reason: impl fmt::Display) -> Self {
        Self::Init(reason.to_string())
    }

    /// Create a `ProcessDied` error without a diagnostic.
    pub const fn died(exit: ProcessExit) -> Self {
        Self::ProcessDied {
            exit,
            message: None,
        }
    }

    /// Whether the session can keep being used after this error.
    ///
    /// All process-level failures are fatal; only data errors raised
    /// before touching the process leave the session intact.
    pub const fn is_fatal(&self) -> bool {
        !matches!(
            self,
            Self::VoiceTable(_)
                | Self::InvalidPhoneme(_)
                | Self::InvalidEnvelope(_)
                | Self::Config(_)
        )
    }
}

/// Result type alias for synthesizer operations
pub type SynthResult<T> = Result<T, SynthError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn process_died_includes_diagnostic() {
        let err = SynthError::ProcessDied {
            exit: ProcessExit::Exited(1),
            message: Some("Fatal error: cannot open database".to_string()),
        };
        assert_eq!(
            err.to_string(),
            "Synthesizer process exited with code 1: Fatal error: cannot open database"
        );
    }

    #[test]
    fn process_died_without_diagnostic() {
        let err = SynthError::died(ProcessExit::Signaled(9));
        assert_eq!(err.to_string(), "Synthesizer process killed by signal 9");
    }

    #[test]
    fn data_errors_are_not_fatal() {
        assert!(!SynthError::VoiceTable("bad".into()).is_fatal());
        assert!(SynthError::Wedged {
            waited: Duration::from_millis(5)
        }
        .is_fatal());
        assert!(SynthError::init("short header").is_fatal());
    }

    #[test]
    fn io_errors_convert() {
        let err: SynthError = io::Error::new(io::ErrorKind::BrokenPipe, "pipe").into();
        assert!(matches!(err, SynthError::Io(_)));
    }

    #[cfg(unix)]
    #[test]
    fn exit_status_classification() {
        use std::os::unix::process::ExitStatusExt;

        assert_eq!(
            ProcessExit::from(ExitStatus::from_raw(3 << 8)),
            ProcessExit::Exited(3)
        );
        assert_eq!(
            ProcessExit::from(ExitStatus::from_raw(15)),
            ProcessExit::Signaled(15)
        );
        assert!(ProcessExit::Exited(0).is_success());
    }
}
