//! Discovery of installed voice databases.

use std::fs::File;
use std::path::Path;

use tracing::trace;
use voxpipe_core::metadata::{TTS_NS, Value, predicate};
use voxpipe_core::voice::VOICES;
use voxpipe_core::{MetadataRecorder, VoiceDescriptor};

/// `rdf:type`.
pub const RDF_TYPE: &str = "http://www.w3.org/1999/02/22-rdf-syntax-ns#type";

/// Subject URI for a voice. [`VoiceId::parse`](voxpipe_core::VoiceId::parse)
/// accepts it back.
pub fn voice_uri(name: &str) -> String {
    format!("urn:voxpipe:voice#{name}")
}

/// Whether the database for `voice` exists and can be opened.
pub fn is_installed(data_dir: &Path, voice: &VoiceDescriptor) -> bool {
    voice
        .database_path(data_dir)
        .is_some_and(|path| File::open(path).is_ok())
}

/// Catalog voices whose database is readable under `data_dir`.
pub fn installed_voices(data_dir: &Path) -> Vec<&'static VoiceDescriptor> {
    let installed: Vec<_> = VOICES.iter().filter(|v| is_installed(data_dir, v)).collect();
    trace!(data_dir = %data_dir.display(), count = installed.len(), "Scanned voice databases");
    installed
}

/// Describe every installed voice to `recorder`. Returns how many were found.
pub fn record_voices(data_dir: &Path, recorder: &mut dyn MetadataRecorder) -> usize {
    let voices = installed_voices(data_dir);
    for voice in &voices {
        let subject = voice_uri(voice.name);
        recorder.record(&subject, RDF_TYPE, Value::Resource(format!("{TTS_NS}Voice")));
        recorder.record(&subject, &predicate("name"), Value::Literal(voice.name.to_string()));
        recorder.record(
            &subject,
            &predicate("language"),
            Value::Literal(voice.language.to_string()),
        );
        recorder.record(
            &subject,
            &predicate("frequency"),
            Value::Integer(i64::from(voice.frequency)),
        );
        recorder.record(
            &subject,
            &predicate("gender"),
            Value::Resource(format!("{TTS_NS}{}", voice.gender.as_str())),
        );
    }
    voices.len()
}
