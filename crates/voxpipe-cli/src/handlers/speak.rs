//! Speak command handler.

use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use tokio::io::AsyncReadExt;
use tracing::{debug, info, warn};
use voxpipe_core::{AudioSink, SynthConfig, VoiceTable, WriterSink};
use voxpipe_runtime::SynthesizerSession;

use crate::error::CliError;
use crate::wav::WavSink;

/// Arguments of `voxpipe speak`.
#[derive(Debug, Clone)]
pub struct SpeakArgs {
    pub voice: String,
    pub table: PathBuf,
    pub pitch: Option<f32>,
    pub output: Option<PathBuf>,
    pub phonemes: Vec<String>,
}

/// Synthesize the phonemes into a WAV file, or raw samples on stdout.
pub async fn execute(config: &SynthConfig, args: SpeakArgs) -> Result<(), CliError> {
    let table = Arc::new(VoiceTable::load(&args.table)?);
    let phonemes = if args.phonemes.is_empty() {
        let mut text = String::new();
        tokio::io::stdin().read_to_string(&mut text).await?;
        split_phonemes(&text)
    } else {
        args.phonemes
    };
    if phonemes.is_empty() {
        return Err(CliError::Arguments("no phonemes to speak".into()));
    }
    if let Some(pitch) = args.pitch {
        check_pitch(&table, pitch)?;
    }

    let mut session = SynthesizerSession::open(&args.voice, table, config.clone()).await?;
    if let Some(pitch) = args.pitch {
        session.set_pitch(pitch);
    }

    let result = match &args.output {
        Some(path) => speak_to_wav(&mut session, &phonemes, path).await,
        None => speak_to_stdout(&mut session, &phonemes).await,
    };
    let exit = session.close().await;
    debug!(?exit, "Synthesizer finished");
    result
}

/// Reject non-positive pitches; warn when the voice is driven outside its
/// register.
fn check_pitch(table: &VoiceTable, pitch: f32) -> Result<(), CliError> {
    if !(pitch.is_finite() && pitch > 0.0) {
        return Err(CliError::Arguments(format!("pitch must be positive, got {pitch}")));
    }
    if let Some(range) = table.pitch_range() {
        if !range.contains(&pitch) {
            warn!(
                pitch,
                min = *range.start(),
                max = *range.end(),
                "Pitch is outside the voice's range"
            );
        }
    }
    Ok(())
}

async fn speak_to_wav(
    session: &mut SynthesizerSession,
    phonemes: &[String],
    path: &Path,
) -> Result<(), CliError> {
    let mut sink = WavSink::create(path, session.sample_rate())?;
    speak(session, phonemes, &mut sink).await?;
    let samples = sink.samples();
    sink.finalize()?;
    info!(path = %path.display(), samples, "Wrote WAV file");
    Ok(())
}

async fn speak_to_stdout(
    session: &mut SynthesizerSession,
    phonemes: &[String],
) -> Result<(), CliError> {
    let mut sink = WriterSink::new(std::io::stdout());
    speak(session, phonemes, &mut sink).await?;
    sink.into_inner().flush()?;
    Ok(())
}

async fn speak<S: AudioSink>(
    session: &mut SynthesizerSession,
    phonemes: &[String],
    sink: &mut S,
) -> Result<u64, CliError> {
    let bytes = session.synthesize(phonemes, sink).await?;
    debug!(phonemes = phonemes.len(), bytes, "Utterance complete");
    Ok(bytes)
}

/// Whitespace-separated phoneme symbols.
pub fn split_phonemes(text: &str) -> Vec<String> {
    text.split_whitespace().map(str::to_string).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn splits_on_any_whitespace() {
        assert_eq!(split_phonemes(" h  aI\n_\t"), ["h", "aI", "_"]);
        assert!(split_phonemes("  \n").is_empty());
    }

    #[test]
    fn pitch_must_be_positive() {
        let table = VoiceTable::new();
        assert!(check_pitch(&table, 120.0).is_ok());
        for bad in [0.0, -5.0, f32::NAN] {
            assert!(matches!(
                check_pitch(&table, bad),
                Err(CliError::Arguments(_))
            ));
        }
    }

    #[test]
    fn pitch_outside_voice_range_is_allowed() {
        let table =
            VoiceTable::from_json(r#"{"min_pitch": 150, "max_pitch": 250, "phonemes": {}}"#)
                .unwrap();
        assert!(check_pitch(&table, 100.0).is_ok());
        assert!(check_pitch(&table, 200.0).is_ok());
    }
}
