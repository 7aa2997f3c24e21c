//! Per-voice phoneme table.
//!
//! Maps each phoneme symbol to its articulation duration and whether the
//! session's pitch envelope applies to it, and carries the voice's pitch
//! register. The table is immutable after load and may be shared across
//! sessions of the same voice.

use std::collections::HashMap;
use std::ops::RangeInclusive;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{SynthError, SynthResult};

/// Articulation data for one phoneme symbol.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct PhonemeEntry {
    /// Duration in milliseconds.
    pub duration: f32,
    /// Whether the envelope contour is emitted for this phoneme.
    #[serde(default, rename = "envelope")]
    pub has_envelope: bool,
}

impl PhonemeEntry {
    pub const fn new(duration: f32, has_envelope: bool) -> Self {
        Self {
            duration,
            has_envelope,
        }
    }
}

/// Pitch register of a voice, in Hz. Every field is optional.
#[derive(Debug, Clone, Copy, PartialEq, Default, Deserialize)]
pub struct VoicePitch {
    #[serde(default, rename = "base_pitch")]
    pub base: Option<f32>,
    #[serde(default, rename = "min_pitch")]
    pub min: Option<f32>,
    #[serde(default, rename = "max_pitch")]
    pub max: Option<f32>,
}

impl VoicePitch {
    fn validate(&self) -> SynthResult<()> {
        for (name, value) in [("base_pitch", self.base), ("min_pitch", self.min), ("max_pitch", self.max)] {
            if let Some(v) = value {
                if !(v.is_finite() && v > 0.0) {
                    return Err(SynthError::VoiceTable(format!("{name} must be positive, got {v}")));
                }
            }
        }
        if let (Some(min), Some(max)) = (self.min, self.max) {
            if min > max {
                return Err(SynthError::VoiceTable(format!(
                    "min_pitch ({min}) is above max_pitch ({max})"
                )));
            }
            if let Some(base) = self.base {
                if !(min..=max).contains(&base) {
                    return Err(SynthError::VoiceTable(format!(
                        "base_pitch ({base}) is outside {min}..={max}"
                    )));
                }
            }
        }
        Ok(())
    }
}

#[derive(Debug, Default, Deserialize)]
struct VoiceTableFile {
    #[serde(flatten)]
    pitch: VoicePitch,
    #[serde(default)]
    phonemes: HashMap<String, PhonemeEntry>,
}

/// Case-sensitive symbol → entry mapping.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct VoiceTable {
    entries: HashMap<String, PhonemeEntry>,
    pitch: VoicePitch,
}

impl VoiceTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse the JSON table format:
    /// `{ "base_pitch": 200, "phonemes": { "a": { "duration": 90, "envelope": true } } }`.
    pub fn from_json(json: &str) -> SynthResult<Self> {
        let file: VoiceTableFile =
            serde_json::from_str(json).map_err(|e| SynthError::VoiceTable(e.to_string()))?;
        file.pitch.validate()?;

        if let Some((symbol, _)) = file
            .phonemes
            .iter()
            .find(|(_, e)| !e.duration.is_finite() || e.duration < 0.0)
        {
            return Err(SynthError::VoiceTable(format!(
                "phoneme '{symbol}' has an invalid duration"
            )));
        }

        Ok(Self {
            entries: file.phonemes,
            pitch: file.pitch,
        })
    }

    /// Load a JSON table from disk.
    pub fn load(path: &Path) -> SynthResult<Self> {
        let json = std::fs::read_to_string(path).map_err(|e| {
            SynthError::VoiceTable(format!("cannot read {}: {e}", path.display()))
        })?;
        let table = Self::from_json(&json)?;
        debug!(path = %path.display(), phonemes = table.len(), "Loaded voice table");
        Ok(table)
    }

    /// Attach a pitch register to a table built in code.
    pub fn with_pitch(mut self, pitch: VoicePitch) -> SynthResult<Self> {
        pitch.validate()?;
        self.pitch = pitch;
        Ok(self)
    }

    /// Starting pitch for sessions of this voice, if the table names one.
    pub const fn base_pitch(&self) -> Option<f32> {
        self.pitch.base
    }

    /// Lowest to highest pitch the voice is meant to be driven at.
    pub fn pitch_range(&self) -> Option<RangeInclusive<f32>> {
        Some(self.pitch.min?..=self.pitch.max?)
    }

    pub fn insert(&mut self, symbol: impl Into<String>, entry: PhonemeEntry) {
        self.entries.insert(symbol.into(), entry);
    }

    /// Look up a symbol.
    ///
    /// Unknown symbols yield a zeroed entry (duration 0, no envelope), so
    /// their rendering may be inaudible.
    pub fn lookup(&self, symbol: &str) -> PhonemeEntry {
        self.entries.get(symbol).copied().unwrap_or_default()
    }

    pub fn contains(&self, symbol: &str) -> bool {
        self.entries.contains_key(symbol)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<S: Into<String>> FromIterator<(S, PhonemeEntry)> for VoiceTable {
    fn from_iter<I: IntoIterator<Item = (S, PhonemeEntry)>>(iter: I) -> Self {
        Self {
            entries: iter.into_iter().map(|(s, e)| (s.into(), e)).collect(),
            pitch: VoicePitch::default(),
        }
    }
}
