//! Audio provenance metadata.
//!
//! Sessions describe the audio they produce as `(subject, predicate, value)`
//! triples handed to a [`MetadataRecorder`]. Serialization of the resulting
//! graph belongs to the recorder.

use std::fmt;

use serde::Serialize;

/// Namespace prefix for predicates and class names emitted by this crate.
pub const TTS_NS: &str = "urn:voxpipe:tts#";

/// Sample encoding of the raw audio stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub enum SampleFormat {
    /// Signed 16-bit little-endian PCM.
    #[default]
    #[serde(rename = "s16le")]
    S16Le,
}

impl SampleFormat {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::S16Le => "s16le",
        }
    }

    pub const fn bytes_per_sample(self) -> u16 {
        match self {
            Self::S16Le => 2,
        }
    }

    pub const fn bits_per_sample(self) -> u16 {
        self.bytes_per_sample() * 8
    }
}

impl fmt::Display for SampleFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Parameters of the audio a session produces.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct AudioInfo {
    pub channels: u16,
    pub sample_rate: u32,
    pub format: SampleFormat,
}

impl AudioInfo {
    /// Mono s16le at `sample_rate`, the only layout the synthesizer emits.
    pub const fn mono(sample_rate: u32) -> Self {
        Self {
            channels: 1,
            sample_rate,
            format: SampleFormat::S16Le,
        }
    }

    /// Record `frequency`, `channels` and `audio-format` for `subject`.
    pub fn record(&self, recorder: &mut dyn MetadataRecorder, subject: &str) {
        recorder.record(
            subject,
            &predicate("frequency"),
            Value::Integer(i64::from(self.sample_rate)),
        );
        recorder.record(
            subject,
            &predicate("channels"),
            Value::Integer(i64::from(self.channels)),
        );
        recorder.record(
            subject,
            &predicate("audio-format"),
            Value::Literal(self.format.as_str().to_string()),
        );
    }
}

/// Object position of a triple.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum Value {
    /// Reference to another resource.
    Resource(String),
    Literal(String),
    Integer(i64),
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Resource(uri) => write!(f, "<{uri}>"),
            Self::Literal(text) => write!(f, "{text:?}"),
            Self::Integer(n) => write!(f, "{n}"),
        }
    }
}

/// Expand a local name into a predicate in [`TTS_NS`].
pub fn predicate(local: &str) -> String {
    format!("{TTS_NS}{local}")
}

/// One recorded statement.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Triple {
    pub subject: String,
    pub predicate: String,
    pub value: Value,
}

/// Port for a metadata store that accepts declarative triples.
pub trait MetadataRecorder {
    fn record(&mut self, subject: &str, predicate: &str, value: Value);
}

/// In-memory recorder keeping triples in insertion order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct MetadataGraph {
    triples: Vec<Triple>,
}

impl MetadataGraph {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn triples(&self) -> &[Triple] {
        &self.triples
    }

    pub fn len(&self) -> usize {
        self.triples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.triples.is_empty()
    }

    /// First value recorded for `(subject, predicate)`.
    pub fn value(&self, subject: &str, predicate: &str) -> Option<&Value> {
        self.triples
            .iter()
            .find(|t| t.subject == subject && t.predicate == predicate)
            .map(|t| &t.value)
    }

    /// All subjects with the given predicate/value pair.
    pub fn subjects_with(&self, predicate: &str, value: &Value) -> Vec<&str> {
        self.triples
            .iter()
            .filter(|t| t.predicate == predicate && &t.value == value)
            .map(|t| t.subject.as_str())
            .collect()
    }
}

impl MetadataRecorder for MetadataGraph {
    fn record(&mut self, subject: &str, predicate: &str, value: Value) {
        self.triples.push(Triple {
            subject: subject.to_string(),
            predicate: predicate.to_string(),
            value,
        });
    }
}

impl fmt::Display for MetadataGraph {
    /// One N-Triples-like statement per line.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for t in &self.triples {
            writeln!(f, "<{}> <{}> {} .", t.subject, t.predicate, t.value)?;
        }
        Ok(())
    }
}
