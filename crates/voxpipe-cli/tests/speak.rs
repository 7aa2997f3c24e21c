//! `voxpipe speak` against a fake synthesizer.

#![cfg(unix)]

use std::os::unix::fs::PermissionsExt;
use std::path::Path;
use std::time::Duration;

use tokio_test::{assert_err, assert_ok};
use voxpipe_cli::CliError;
use voxpipe_cli::handlers::speak::{SpeakArgs, execute};
use voxpipe_core::{BackoffConfig, SynthConfig, WavHeader};

/// Octal escapes for a `printf` builtin.
fn octal(bytes: &[u8]) -> String {
    bytes.iter().map(|b| format!("\\{b:03o}")).collect()
}

/// Answers the handshake, then emits samples 1 and 2 per utterance.
fn install_fake(dir: &Path) -> SynthConfig {
    let voices = dir.join("voices");
    std::fs::create_dir_all(voices.join("us1")).unwrap();
    std::fs::write(voices.join("us1").join("us1"), b"db").unwrap();

    let program = dir.join("fake-mbrola");
    let script = format!(
        "#!/bin/sh\nIFS= read -r line\nprintf '{}'\n\
         while IFS= read -r line; do\n\
           if [ \"$line\" = '#' ]; then printf '{}'; fi\n\
         done\n",
        octal(&WavHeader::minimal(16000)),
        octal(&[1, 0, 2, 0]),
    );
    std::fs::write(&program, script).unwrap();
    std::fs::set_permissions(&program, std::fs::Permissions::from_mode(0o755)).unwrap();

    SynthConfig {
        program: program.display().to_string(),
        data_dir: voices,
        backoff: BackoffConfig {
            initial_ms: 5,
            factor: 2.0,
            ceiling_ms: 320,
        },
        shutdown_grace_ms: 1000,
        ..SynthConfig::default()
    }
}

fn write_table(dir: &Path) -> std::path::PathBuf {
    let path = dir.join("us1.json");
    std::fs::write(
        &path,
        r#"{ "phonemes": { "h": { "duration": 60 }, "aI": { "duration": 150, "envelope": true } } }"#,
    )
    .unwrap();
    path
}

async fn run(config: &SynthConfig, args: SpeakArgs) -> Result<(), CliError> {
    // The script may still be open for writing in a sibling test's fork.
    for _ in 0..10 {
        match execute(config, args.clone()).await {
            Err(CliError::Process(msg)) if msg.contains("busy") => {
                tokio::time::sleep(Duration::from_millis(20)).await;
            }
            other => return other,
        }
    }
    execute(config, args).await
}

#[tokio::test]
async fn speak_writes_wav_at_announced_rate() {
    let dir = tempfile::tempdir().unwrap();
    let config = install_fake(dir.path());
    let output = dir.path().join("out.wav");

    assert_ok!(
        run(
            &config,
            SpeakArgs {
                voice: "us1".into(),
                table: write_table(dir.path()),
                pitch: Some(120.0),
                output: Some(output.clone()),
                phonemes: vec!["h".into(), "aI".into()],
            },
        )
        .await
    );

    let mut reader = hound::WavReader::open(&output).unwrap();
    assert_eq!(reader.spec().sample_rate, 16000);
    assert_eq!(reader.spec().channels, 1);
    let samples: Vec<i16> = reader.samples::<i16>().map(Result::unwrap).collect();
    assert_eq!(samples, [1, 2]);
}

#[tokio::test]
async fn speak_rejects_unknown_voice() {
    let dir = tempfile::tempdir().unwrap();
    let config = install_fake(dir.path());

    let err = assert_err!(
        run(
            &config,
            SpeakArgs {
                voice: "de5".into(),
                table: write_table(dir.path()),
                pitch: None,
                output: Some(dir.path().join("out.wav")),
                phonemes: vec!["h".into()],
            },
        )
        .await
    );

    assert_eq!(err.exit_code(), 2, "{err}");
}

#[tokio::test]
async fn speak_rejects_bad_pitch() {
    let dir = tempfile::tempdir().unwrap();
    let config = install_fake(dir.path());

    let err = run(
        &config,
        SpeakArgs {
            voice: "us1".into(),
            table: write_table(dir.path()),
            pitch: Some(-5.0),
            output: Some(dir.path().join("out.wav")),
            phonemes: vec!["h".into()],
        },
    )
    .await
    .unwrap_err();

    assert!(matches!(err, CliError::Arguments(_)), "{err}");
}

#[tokio::test]
async fn speak_accepts_voice_pitch_register() {
    let dir = tempfile::tempdir().unwrap();
    let config = install_fake(dir.path());
    let table = dir.path().join("us1-pitch.json");
    std::fs::write(
        &table,
        r#"{ "base_pitch": 180, "min_pitch": 150, "max_pitch": 250,
             "phonemes": { "h": { "duration": 60 }, "aI": { "duration": 150, "envelope": true } } }"#,
    )
    .unwrap();
    let output = dir.path().join("out.wav");

    // Out of the voice's range only warns.
    assert_ok!(
        run(
            &config,
            SpeakArgs {
                voice: "us1".into(),
                table,
                pitch: Some(300.0),
                output: Some(output.clone()),
                phonemes: vec!["aI".into()],
            },
        )
        .await
    );
    assert_eq!(hound::WavReader::open(&output).unwrap().len(), 2);
}

#[tokio::test]
async fn missing_table_is_config_error() {
    let dir = tempfile::tempdir().unwrap();
    let config = install_fake(dir.path());

    let err = run(
        &config,
        SpeakArgs {
            voice: "us1".into(),
            table: dir.path().join("missing.json"),
            pitch: None,
            output: None,
            phonemes: vec!["h".into()],
        },
    )
    .await
    .unwrap_err();

    assert_eq!(err.exit_code(), 78, "{err}");
}
