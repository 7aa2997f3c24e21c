//! OS-facing half of voxpipe.
//!
//! Spawns the synthesizer, speaks its line protocol over three pipes and
//! drains the audio it produces. [`SynthesizerSession`] is the entry point;
//! the other modules are its parts and are public for reuse and testing.

#![deny(unsafe_code)]

pub mod backoff;
pub mod multiplexer;
pub mod pending;
pub mod process;
pub mod session;
pub mod stderr;
pub mod voices;

pub use multiplexer::Multiplexer;
pub use pending::PendingWriteQueue;
pub use process::{ActivityProbe, PipeSet, ProcStatProbe, ProcessActivity};
pub use session::SynthesizerSession;
pub use stderr::ErrorStreamClassifier;
pub use voices::{installed_voices, record_voices};
