//! CLI-specific error types and mappings.
//!
//! Maps [`SynthError`] onto exit codes and user-facing messages.

use thiserror::Error;
use voxpipe_core::SynthError;

/// CLI-specific error type.
#[derive(Debug, Error)]
pub enum CliError {
    /// Driver error without a more specific category.
    #[error("{0}")]
    Core(String),

    /// Argument or input error.
    #[error("Invalid arguments: {0}")]
    Arguments(String),

    /// IO error (file not found, permission denied, etc.).
    #[error("IO error: {0}")]
    Io(String),

    /// Configuration error.
    #[error("Configuration error: {0}")]
    Config(String),

    /// Synthesizer process failure.
    #[error("Process error: {0}")]
    Process(String),
}

impl CliError {
    /// Map error to appropriate exit code.
    ///
    /// Exit codes follow Unix conventions:
    /// - 1: General error
    /// - 2: Misuse of shell command (invalid arguments)
    /// - 64-78: Specific error categories (see sysexits.h)
    pub const fn exit_code(&self) -> i32 {
        match self {
            Self::Core(_) => 1,
            Self::Arguments(_) => 2, // EX_USAGE
            Self::Io(_) => 74,       // EX_IOERR
            Self::Config(_) => 78,   // EX_CONFIG
            Self::Process(_) => 71,  // EX_OSERR
        }
    }
}

impl From<SynthError> for CliError {
    fn from(err: SynthError) -> Self {
        match err {
            SynthError::Spawn { .. }
            | SynthError::Init(_)
            | SynthError::ProcessDied { .. }
            | SynthError::Wedged { .. }
            | SynthError::NotRunning => Self::Process(err.to_string()),
            SynthError::VoiceNotFound(_)
            | SynthError::InvalidPhoneme(_)
            | SynthError::InvalidEnvelope(_) => Self::Arguments(err.to_string()),
            SynthError::VoiceTable(_) | SynthError::Config(_) => Self::Config(err.to_string()),
            SynthError::Io(e) => Self::Io(e.to_string()),
            SynthError::Closed => Self::Core(err.to_string()),
        }
    }
}

impl From<std::io::Error> for CliError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err.to_string())
    }
}

impl From<hound::Error> for CliError {
    fn from(err: hound::Error) -> Self {
        match err {
            hound::Error::IoError(e) => Self::Io(e.to_string()),
            other => Self::Io(format!("WAV: {other}")),
        }
    }
}
