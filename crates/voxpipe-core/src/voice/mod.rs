//! Voice data: the static catalog and per-voice phoneme tables.

pub mod catalog;
mod table;

pub use catalog::{VOICES, VoiceDescriptor, VoiceGender, VoiceId, database_candidates, find, resolve_database};
pub use table::{PhonemeEntry, VoicePitch, VoiceTable};
