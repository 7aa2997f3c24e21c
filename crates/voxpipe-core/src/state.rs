//! Conversation state of a synthesizer process.

use serde::Serialize;
use std::fmt;

/// Where the synthesizer conversation currently stands.
///
/// ```text
/// Inactive -> Idle <-> NewData <-> Audio
///                        |           |
///                        +-> Wedged <+
/// ```
///
/// `Inactive` is both the state before spawn and the state after a clean
/// teardown. `Wedged` is terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ProcessState {
    /// No process, either not yet spawned or torn down.
    #[default]
    Inactive,
    /// Process is waiting for the next command.
    Idle,
    /// Commands were sent that have not yet been flushed into audio.
    NewData,
    /// Audio is being drained from the process.
    Audio,
    /// Process stopped making progress past the backoff ceiling.
    Wedged,
}

impl ProcessState {
    /// True when the state admits no further protocol traffic.
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Wedged)
    }

    /// True while an utterance has data the process has not yet rendered.
    pub const fn has_pending_utterance(self) -> bool {
        matches!(self, Self::NewData | Self::Audio)
    }

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Inactive => "inactive",
            Self::Idle => "idle",
            Self::NewData => "new-data",
            Self::Audio => "audio",
            Self::Wedged => "wedged",
        }
    }
}

impl fmt::Display for ProcessState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
