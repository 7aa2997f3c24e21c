//! Catalog of known synthesizer voices.
//!
//! The synthesizer does not report which voices exist, and a voice's data
//! may not be installed, so the known set lives here and installation is
//! checked against the data directory at runtime.

use std::fmt;
use std::path::{Path, PathBuf};

use serde::Serialize;

use crate::error::{SynthError, SynthResult};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum VoiceGender {
    Female,
    Male,
}

impl VoiceGender {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Female => "female",
            Self::Male => "male",
        }
    }
}

/// Static description of a voice database.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct VoiceDescriptor {
    /// Three-character voice name, e.g. `de5`.
    pub name: &'static str,
    /// BCP-47-ish language tag.
    pub language: &'static str,
    /// Native sample rate of the database.
    pub frequency: u32,
    pub gender: VoiceGender,
}

impl VoiceDescriptor {
    /// Installed database file under `data_dir`, if any.
    pub fn database_path(&self, data_dir: &Path) -> Option<PathBuf> {
        resolve_database(data_dir, self.name)
    }
}

const fn voice(
    name: &'static str,
    language: &'static str,
    frequency: u32,
    gender: VoiceGender,
) -> VoiceDescriptor {
    VoiceDescriptor {
        name,
        language,
        frequency,
        gender,
    }
}

use VoiceGender::{Female, Male};

/// Every voice known to the driver.
pub static VOICES: &[VoiceDescriptor] = &[
    voice("af1", "af", 16000, Male),
    voice("br1", "pt-br", 16000, Male),
    voice("br3", "pt-br", 22050, Male),
    voice("br4", "pt-br", 16000, Female),
    voice("cr1", "hr", 16000, Male),
    voice("cz2", "cs", 16000, Male),
    voice("de2", "de", 16000, Male),
    voice("de4", "de", 16000, Male),
    voice("de5", "de", 22050, Female),
    voice("de6", "de", 22050, Male),
    voice("de7", "de", 22050, Female),
    voice("ee1", "et", 16000, Male),
    voice("en1", "en-gb", 16000, Male),
    voice("es1", "es", 16000, Male),
    voice("es2", "es", 22050, Male),
    voice("fr1", "fr", 16000, Male),
    voice("fr4", "fr", 16000, Female),
    voice("gr2", "el", 22050, Male),
    voice("hu1", "hu", 16000, Female),
    voice("ic1", "is", 16000, Male),
    voice("id1", "id", 16000, Male),
    voice("it3", "it", 16000, Male),
    voice("it4", "it", 16000, Female),
    voice("la1", "la", 16000, Male),
    voice("mx1", "es-mx", 16000, Male),
    voice("mx2", "es-mx", 16000, Male),
    voice("nl2", "nl", 16000, Male),
    voice("pl1", "pl", 16000, Female),
    voice("pt1", "pt-pt", 22050, Female),
    voice("ro1", "ro", 16000, Male),
    voice("sw1", "sv", 16000, Male),
    voice("sw2", "sv", 16000, Female),
    voice("tr1", "tr", 16000, Male),
    voice("tr2", "tr", 22050, Female),
    voice("us1", "en-us", 16000, Female),
    voice("us2", "en-us", 16000, Male),
    voice("us3", "en-us", 16000, Male),
    voice("vz1", "es-ve", 16000, Male),
];

/// Find a catalog entry by voice name.
pub fn find(name: &str) -> Option<&'static VoiceDescriptor> {
    VOICES.iter().find(|v| v.name == name)
}

/// Where the database for `voice` may live, in lookup order:
/// `data_dir/<voice>/<voice>`, then the flat `data_dir/voices/<voice>`.
pub fn database_candidates(data_dir: &Path, voice: &str) -> [PathBuf; 2] {
    [
        data_dir.join(voice).join(voice),
        data_dir.join("voices").join(voice),
    ]
}

/// First candidate location holding a regular file.
pub fn resolve_database(data_dir: &Path, voice: &str) -> Option<PathBuf> {
    database_candidates(data_dir, voice)
        .into_iter()
        .find(|path| path.is_file())
}

/// Validated voice identifier.
///
/// Accepts a bare name (`de5`) or a URI-like token whose final fragment or
/// path segment is the name (`…/voices#de5`).
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct VoiceId(String);

impl VoiceId {
    pub fn parse(token: &str) -> SynthResult<Self> {
        let name = token
            .rsplit(['#', '/'])
            .next()
            .unwrap_or(token)
            .trim();

        if name.len() != 3 || !name.chars().all(|c| c.is_ascii_alphanumeric()) {
            return Err(SynthError::VoiceNotFound(format!(
                "'{token}' is not a three-character voice name"
            )));
        }

        Ok(Self(name.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Catalog entry, when the voice is a known one.
    pub fn descriptor(&self) -> Option<&'static VoiceDescriptor> {
        find(&self.0)
    }

    pub fn database_path(&self, data_dir: &Path) -> Option<PathBuf> {
        resolve_database(data_dir, &self.0)
    }
}

impl fmt::Display for VoiceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn finds_known_voice() {
        let de5 = find("de5").unwrap();
        assert_eq!(de5.language, "de");
        assert_eq!(de5.frequency, 22050);
        assert_eq!(de5.gender, VoiceGender::Female);
    }

    #[test]
    fn unknown_voice_is_none() {
        assert!(find("xx9").is_none());
    }

    #[test]
    fn catalog_names_are_unique_and_well_formed() {
        for (i, v) in VOICES.iter().enumerate() {
            assert!(VoiceId::parse(v.name).is_ok(), "{} malformed", v.name);
            assert!(
                VOICES[i + 1..].iter().all(|o| o.name != v.name),
                "{} duplicated",
                v.name
            );
        }
    }

    #[test]
    fn database_candidates_in_lookup_order() {
        let [nested, flat] = database_candidates(Path::new("/usr/share/mbrola"), "us1");
        assert_eq!(nested, PathBuf::from("/usr/share/mbrola/us1/us1"));
        assert_eq!(flat, PathBuf::from("/usr/share/mbrola/voices/us1"));
    }

    #[test]
    fn resolves_nested_layout() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir_all(dir.path().join("us1")).unwrap();
        std::fs::write(dir.path().join("us1").join("us1"), b"db").unwrap();

        assert_eq!(
            resolve_database(dir.path(), "us1"),
            Some(dir.path().join("us1").join("us1"))
        );
    }

    #[test]
    fn resolves_flat_voices_layout() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir_all(dir.path().join("voices")).unwrap();
        std::fs::write(dir.path().join("voices").join("us1"), b"db").unwrap();

        let id = VoiceId::parse("us1").unwrap();
        assert_eq!(
            id.database_path(dir.path()),
            Some(dir.path().join("voices").join("us1"))
        );
    }

    #[test]
    fn nested_layout_wins_over_flat() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir_all(dir.path().join("us1")).unwrap();
        std::fs::create_dir_all(dir.path().join("voices")).unwrap();
        std::fs::write(dir.path().join("us1").join("us1"), b"db").unwrap();
        std::fs::write(dir.path().join("voices").join("us1"), b"db").unwrap();

        assert_eq!(
            find("us1").unwrap().database_path(dir.path()),
            Some(dir.path().join("us1").join("us1"))
        );
    }

    #[test]
    fn directory_is_not_a_database() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir_all(dir.path().join("us1").join("us1")).unwrap();
        assert_eq!(resolve_database(dir.path(), "us1"), None);
    }

    #[test]
    fn voice_id_accepts_uri_tokens() {
        assert_eq!(VoiceId::parse("de5").unwrap().as_str(), "de5");
        assert_eq!(
            VoiceId::parse("http://example.org/voices#de5").unwrap().as_str(),
            "de5"
        );
        assert_eq!(VoiceId::parse("voices/en1").unwrap().as_str(), "en1");
    }

    #[test]
    fn voice_id_rejects_bad_names() {
        for bad in ["", "de", "de55", "d-5", "../"] {
            assert!(
                matches!(VoiceId::parse(bad), Err(SynthError::VoiceNotFound(_))),
                "{bad:?} accepted"
            );
        }
    }
}
