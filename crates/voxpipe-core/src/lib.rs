//! Core types for voxpipe, a driver for external diphone synthesizers.
//!
//! This crate is pure: it encodes the line protocol, parses the handshake
//! header, models voice data and session state, and defines the ports
//! (audio sink, metadata recorder) a session talks to. Process and pipe
//! handling lives in `voxpipe-runtime`.

#![deny(unused_crate_dependencies)]

pub mod config;
pub mod envelope;
pub mod error;
pub mod metadata;
pub mod protocol;
pub mod sink;
pub mod state;
pub mod voice;

pub use config::{BackoffConfig, SynthConfig};
pub use envelope::{Envelope, EnvelopePoint};
pub use error::{ProcessExit, SynthError, SynthResult};
pub use metadata::{AudioInfo, MetadataGraph, MetadataRecorder, SampleFormat, Triple, Value};
pub use protocol::{EncodedCommand, WavHeader, encode_command};
pub use sink::{AudioSink, WriterSink};
pub use state::ProcessState;
pub use voice::{PhonemeEntry, VoiceDescriptor, VoiceGender, VoiceId, VoicePitch, VoiceTable};
