//! Synthesizer driver configuration.
//!
//! All fields default, so an empty JSON object is a valid configuration.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{SynthError, SynthResult};
use crate::voice::VoiceId;

/// Default synthesizer executable name.
pub const DEFAULT_PROGRAM: &str = "mbrola";

/// Default voice data directory.
pub const DEFAULT_DATA_DIR: &str = "/usr/share/mbrola";

/// Environment variable overriding the voice data directory.
pub const DATA_DIR_ENV: &str = "VOXPIPE_DATA_DIR";

/// Environment variable overriding the synthesizer executable.
pub const PROGRAM_ENV: &str = "VOXPIPE_PROGRAM";

/// Escalating wait used while the process is busy but silent.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BackoffConfig {
    pub initial_ms: u64,
    /// Multiplier applied after each silent wait.
    pub factor: f64,
    /// Longest single wait; exceeding it ends the drain.
    pub ceiling_ms: u64,
}

impl Default for BackoffConfig {
    fn default() -> Self {
        Self {
            initial_ms: 10,
            factor: 2.0,
            ceiling_ms: 5000,
        }
    }
}

impl BackoffConfig {
    pub const fn initial(&self) -> Duration {
        Duration::from_millis(self.initial_ms)
    }

    pub const fn ceiling(&self) -> Duration {
        Duration::from_millis(self.ceiling_ms)
    }
}

/// Settings for spawning and driving one synthesizer process.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SynthConfig {
    /// Executable name or path. Bare names are looked up on `PATH`.
    pub program: String,
    /// Directory holding `<voice>/<voice>` database files.
    pub data_dir: PathBuf,
    /// Output volume passed with `-v`.
    pub volume_scale: f32,
    /// Pass `-e` so unknown diphones are skipped instead of aborting.
    pub ignore_unknown_diphones: bool,
    /// Initial pitch in Hz when the voice table names none.
    pub base_pitch: f32,
    /// Chunk size for draining audio into a sink.
    pub scratch_size: usize,
    pub backoff: BackoffConfig,
    /// Readiness grace on the idle fast path.
    pub idle_poll_ms: u64,
    /// Time between SIGTERM and SIGKILL on close.
    pub shutdown_grace_ms: u64,
}

impl Default for SynthConfig {
    fn default() -> Self {
        Self {
            program: DEFAULT_PROGRAM.to_string(),
            data_dir: default_data_dir(),
            volume_scale: 1.0,
            ignore_unknown_diphones: true,
            base_pitch: 100.0,
            scratch_size: 2048,
            backoff: BackoffConfig::default(),
            idle_poll_ms: 2,
            shutdown_grace_ms: 2000,
        }
    }
}

impl SynthConfig {
    /// Read a JSON configuration file and validate it.
    pub fn load(path: &Path) -> SynthResult<Self> {
        let json = std::fs::read_to_string(path)
            .map_err(|e| SynthError::Config(format!("cannot read {}: {e}", path.display())))?;
        let config: Self = serde_json::from_str(&json)
            .map_err(|e| SynthError::Config(format!("{}: {e}", path.display())))?;
        config.validate()?;
        Ok(config)
    }

    /// Check value ranges.
    pub fn validate(&self) -> SynthResult<()> {
        if self.program.trim().is_empty() {
            return Err(SynthError::Config("program must not be empty".into()));
        }
        // One s16 sample is the smallest meaningful chunk.
        if self.scratch_size < 2 {
            return Err(SynthError::Config(format!(
                "scratch_size must be at least 2 bytes, got {}",
                self.scratch_size
            )));
        }
        if self.backoff.initial_ms == 0 {
            return Err(SynthError::Config(
                "backoff.initial_ms must be positive".into(),
            ));
        }
        if !(self.backoff.factor.is_finite() && self.backoff.factor > 1.0) {
            return Err(SynthError::Config(format!(
                "backoff.factor must be greater than 1, got {}",
                self.backoff.factor
            )));
        }
        if self.backoff.ceiling_ms < self.backoff.initial_ms {
            return Err(SynthError::Config(format!(
                "backoff.ceiling_ms ({}) is below backoff.initial_ms ({})",
                self.backoff.ceiling_ms, self.backoff.initial_ms
            )));
        }
        if !(self.volume_scale.is_finite() && self.volume_scale > 0.0) {
            return Err(SynthError::Config(format!(
                "volume_scale must be positive, got {}",
                self.volume_scale
            )));
        }
        if !(self.base_pitch.is_finite() && self.base_pitch > 0.0) {
            return Err(SynthError::Config(format!(
                "base_pitch must be positive, got {}",
                self.base_pitch
            )));
        }
        Ok(())
    }

    pub const fn idle_poll(&self) -> Duration {
        Duration::from_millis(self.idle_poll_ms)
    }

    pub const fn shutdown_grace(&self) -> Duration {
        Duration::from_millis(self.shutdown_grace_ms)
    }

    /// Installed database file for `voice` under the configured data
    /// directory, if any.
    pub fn database_path(&self, voice: &VoiceId) -> Option<PathBuf> {
        voice.database_path(&self.data_dir)
    }
}

/// `$VOXPIPE_DATA_DIR` when set and non-empty, else [`DEFAULT_DATA_DIR`].
pub fn default_data_dir() -> PathBuf {
    match std::env::var(DATA_DIR_ENV) {
        Ok(dir) if !dir.trim().is_empty() => PathBuf::from(dir),
        _ => PathBuf::from(DEFAULT_DATA_DIR),
    }
}
