//! Fake synthesizer programs for session tests.
//!
//! Each fake is a POSIX `sh` script in a temp directory that also holds an
//! installed `de5` database, so sessions can be opened against it exactly as
//! against the real synthesizer.

#![allow(dead_code)]

use std::fmt::Write as _;
use std::os::unix::fs::PermissionsExt;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use tempfile::TempDir;
use voxpipe_core::protocol::WAV_HEADER_LEN;
use voxpipe_core::{BackoffConfig, PhonemeEntry, SynthConfig, SynthError, SynthResult, VoiceTable, WavHeader};
use voxpipe_runtime::{ActivityProbe, ProcessActivity, SynthesizerSession};

/// Sample rate announced by the fakes.
pub const SAMPLE_RATE: u32 = 22050;

/// Answers the handshake with a valid header.
pub fn handshake() -> String {
    format!("IFS= read -r line\n{}\n", printf_bytes(&WavHeader::minimal(SAMPLE_RATE)))
}

/// Answers the handshake with `header` instead.
pub fn handshake_with(header: &[u8]) -> String {
    format!("IFS= read -r line\n{}\n", printf_bytes(header))
}

/// Consume commands forever without answering.
pub const SWALLOW: &str = "while IFS= read -r line; do :; done\n";

/// Render each phoneme as `[symbol]` and emit the utterance on `#`.
pub const RENDER: &str = r#"buf=''
while IFS= read -r line; do
  case "$line" in
    '#') printf '%s' "$buf"; buf='' ;;
    '') ;;
    *) buf="$buf[${line%% *}]" ;;
  esac
done
"#;

/// A `printf` builtin call emitting `bytes` verbatim, so no child is forked.
pub fn printf_bytes(bytes: &[u8]) -> String {
    let mut cmd = String::from("printf '");
    for b in bytes {
        let _ = write!(cmd, "\\{b:03o}");
    }
    cmd.push('\'');
    cmd
}

/// Never reports idle, so drains end on the backoff ladder alone.
#[derive(Debug)]
pub struct Busy;

impl ActivityProbe for Busy {
    fn activity(&self, _pid: u32) -> ProcessActivity {
        ProcessActivity::Running
    }
}

pub struct FakeSynth {
    dir: TempDir,
    program: PathBuf,
}

impl FakeSynth {
    /// Write a fake whose body runs after `HERE` is set to its directory and
    /// its pid and arguments are recorded.
    pub fn new(body: &str) -> Self {
        let dir = tempfile::tempdir().unwrap();

        let db = dir.path().join("voices").join("de5");
        std::fs::create_dir_all(&db).unwrap();
        std::fs::write(db.join("de5"), b"diphone database").unwrap();

        let program = dir.path().join("fake-mbrola");
        let script = format!(
            "#!/bin/sh\nHERE='{}'\necho $$ > \"$HERE/pid\"\nprintf '%s\\n' \"$@\" > \"$HERE/args\"\n{body}",
            dir.path().display()
        );
        std::fs::write(&program, script).unwrap();
        std::fs::set_permissions(&program, std::fs::Permissions::from_mode(0o755)).unwrap();

        Self { dir, program }
    }

    pub fn path(&self, name: &str) -> PathBuf {
        self.dir.path().join(name)
    }

    pub fn data_dir(&self) -> PathBuf {
        self.dir.path().join("voices")
    }

    pub fn config(&self) -> SynthConfig {
        SynthConfig {
            program: self.program.display().to_string(),
            data_dir: self.data_dir(),
            backoff: BackoffConfig {
                initial_ms: 5,
                factor: 2.0,
                ceiling_ms: 320,
            },
            shutdown_grace_ms: 1000,
            ..SynthConfig::default()
        }
    }

    /// Pid written by the script at startup.
    pub fn pid(&self) -> u32 {
        std::fs::read_to_string(self.path("pid"))
            .unwrap()
            .trim()
            .parse()
            .unwrap()
    }

    pub fn args(&self) -> Vec<String> {
        std::fs::read_to_string(self.path("args"))
            .unwrap()
            .lines()
            .map(str::to_string)
            .collect()
    }

    pub async fn open(&self, table: Arc<VoiceTable>) -> SynthResult<SynthesizerSession> {
        self.open_with(table, self.config()).await
    }

    /// Open with the busy probe, retrying while another test's fork still
    /// holds the freshly written script open (ETXTBSY).
    pub async fn open_with(
        &self,
        table: Arc<VoiceTable>,
        config: SynthConfig,
    ) -> SynthResult<SynthesizerSession> {
        let mut attempts = 0;
        loop {
            let result =
                SynthesizerSession::open_with_probe("de5", Arc::clone(&table), config.clone(), Arc::new(Busy))
                    .await;
            match result {
                Err(SynthError::Spawn { ref source, .. })
                    if source.raw_os_error() == Some(26) && attempts < 10 =>
                {
                    attempts += 1;
                    tokio::time::sleep(Duration::from_millis(20)).await;
                }
                other => return other,
            }
        }
    }
}

/// Voice table for the `h aI _` scenario.
pub fn table() -> Arc<VoiceTable> {
    Arc::new(
        [
            ("h", PhonemeEntry::new(60.0, false)),
            ("aI", PhonemeEntry::new(150.0, true)),
            ("_", PhonemeEntry::new(100.0, false)),
        ]
        .into_iter()
        .collect(),
    )
}

pub fn short_header() -> Vec<u8> {
    WavHeader::minimal(SAMPLE_RATE)[..WAV_HEADER_LEN / 2].to_vec()
}
