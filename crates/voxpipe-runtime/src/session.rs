//! Synthesizer session: one voice, one process, one sequential conversation.

use std::path::PathBuf;
use std::sync::Arc;

use tracing::{debug, warn};
use voxpipe_core::protocol::{self, FLUSH, HANDSHAKE, WAV_HEADER_LEN};
use voxpipe_core::voice::database_candidates;
use voxpipe_core::{
    AudioInfo, AudioSink, Envelope, MetadataRecorder, ProcessExit, ProcessState, SynthConfig,
    SynthError, SynthResult, VoiceId, VoiceTable, WavHeader,
};

use crate::multiplexer::Multiplexer;
use crate::process::{ActivityProbe, PipeSet, ProcStatProbe, resolve_program};

/// A running synthesizer speaking one voice.
///
/// Created by [`open`](Self::open), fed with [`write`](Self::write), drained
/// with [`read`](Self::read), and torn down with [`close`](Self::close).
/// Dropping a session without closing it kills the process.
#[derive(Debug)]
pub struct SynthesizerSession {
    voice: VoiceId,
    table: Arc<VoiceTable>,
    config: SynthConfig,
    pitch: f32,
    envelope: Envelope,
    sample_rate: u32,
    mux: Option<Multiplexer>,
}

impl SynthesizerSession {
    /// Spawn the synthesizer for `voice` and perform the handshake.
    ///
    /// `voice` is a three-character name or a URI whose last fragment is
    /// one. The voice database must exist under `config.data_dir`. The
    /// starting pitch is the table's `base_pitch`, else `config.base_pitch`.
    pub async fn open(voice: &str, table: Arc<VoiceTable>, config: SynthConfig) -> SynthResult<Self> {
        Self::open_with_probe(voice, table, config, Arc::new(ProcStatProbe)).await
    }

    /// [`open`](Self::open) with a custom activity probe.
    pub async fn open_with_probe(
        voice: &str,
        table: Arc<VoiceTable>,
        config: SynthConfig,
        probe: Arc<dyn ActivityProbe>,
    ) -> SynthResult<Self> {
        config.validate()?;
        let voice = VoiceId::parse(voice)?;
        let Some(database) = config.database_path(&voice) else {
            let [nested, flat] = database_candidates(&config.data_dir, voice.as_str());
            return Err(SynthError::VoiceNotFound(format!(
                "{voice}: no database at {} or {}",
                nested.display(),
                flat.display()
            )));
        };

        let program = resolve_program(&config.program)?;
        let pipes = PipeSet::spawn(&program, spawn_args(&config, database))?;
        let mut mux = Multiplexer::new(pipes, probe, &config);
        debug!(pid = mux.pid(), %voice, "Synthesizer started, sending handshake");

        let sample_rate = match handshake(&mut mux).await {
            Ok(header) => header.sample_rate,
            Err(e) => {
                if let Err(te) = mux.shutdown(config.shutdown_grace()).await {
                    warn!(error = %te, "Failed to tear down synthesizer after handshake error");
                }
                return Err(e);
            }
        };
        debug!(pid = mux.pid(), %voice, sample_rate, "Handshake complete");

        let pitch = table.base_pitch().unwrap_or(config.base_pitch);
        Ok(Self {
            voice,
            table,
            pitch,
            config,
            envelope: Envelope::flat(),
            sample_rate,
            mux: Some(mux),
        })
    }

    /// Queue one phoneme for the current utterance.
    ///
    /// Returns the number of command bytes accepted. The call never waits
    /// for the process to consume them.
    pub async fn write(&mut self, phoneme: &str) -> SynthResult<usize> {
        protocol::validate_symbol(phoneme)?;
        let entry = self.table.lookup(phoneme);
        let command = protocol::encode_command(phoneme, entry, self.pitch, &self.envelope);

        let mux = self.running()?;
        if !mux.is_alive() {
            return Err(mux.collect_death().await);
        }
        let accepted = mux.submit(command.line.as_bytes()).await.inspect_err(|e| {
            if e.is_fatal() {
                mux.mark_failed();
            }
        })?;
        mux.set_state(ProcessState::NewData);
        self.pitch = command.carried_pitch;
        Ok(accepted)
    }

    /// Flush the current utterance and forward its audio to `sink`.
    ///
    /// Returns the number of audio bytes delivered. If nothing was written
    /// since the last read this does nothing and returns 0.
    pub async fn read<S: AudioSink + ?Sized>(&mut self, sink: &mut S) -> SynthResult<u64> {
        let scratch_size = self.config.scratch_size;
        let mux = self.running()?;
        if !mux.state().has_pending_utterance() {
            return Ok(0);
        }

        match drain(mux, sink, scratch_size).await {
            Ok(total) => {
                mux.set_state(ProcessState::Idle);
                debug!(pid = mux.pid(), bytes = total, "Utterance drained");
                Ok(total)
            }
            Err(e) => {
                // A half-drained utterance would leak into the next read.
                if e.is_fatal() {
                    mux.mark_failed();
                }
                Err(e)
            }
        }
    }

    /// Write every phoneme, then drain the utterance into `sink`.
    pub async fn synthesize<I, P, S>(&mut self, phonemes: I, sink: &mut S) -> SynthResult<u64>
    where
        I: IntoIterator<Item = P>,
        P: AsRef<str>,
        S: AudioSink + ?Sized,
    {
        for phoneme in phonemes {
            self.write(phoneme.as_ref()).await?;
        }
        self.read(sink).await
    }

    /// Set the base pitch for the next phoneme, in Hz.
    pub const fn set_pitch(&mut self, pitch: f32) {
        self.pitch = pitch;
    }

    pub fn set_envelope(&mut self, envelope: Envelope) {
        self.envelope = envelope;
    }

    /// Terminate the process and discard anything still queued.
    ///
    /// Returns how the process ended, or `None` if the session was already
    /// closed.
    pub async fn close(&mut self) -> Option<ProcessExit> {
        let mut mux = self.mux.take()?;
        let pid = mux.pid();
        let exit = match mux.shutdown(self.config.shutdown_grace()).await {
            Ok(exit) => exit,
            Err(e) => {
                warn!(pid, error = %e, "Failed to terminate synthesizer");
                ProcessExit::Unknown
            }
        };
        self.pitch = self.table.base_pitch().unwrap_or(self.config.base_pitch);
        self.envelope = Envelope::flat();
        debug!(pid, voice = %self.voice, %exit, "Synthesizer session closed");
        Some(exit)
    }

    /// Record sample rate, channel count and sample format for `subject`.
    pub fn metadata(&self, recorder: &mut dyn MetadataRecorder, subject: &str) {
        self.audio_info().record(recorder, subject);
    }

    pub const fn audio_info(&self) -> AudioInfo {
        AudioInfo::mono(self.sample_rate)
    }

    /// Sample rate announced in the handshake.
    pub const fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    pub fn state(&self) -> ProcessState {
        self.mux.as_ref().map_or(ProcessState::Inactive, Multiplexer::state)
    }

    /// Process id, while the session is open.
    pub fn pid(&self) -> Option<u32> {
        self.mux.as_ref().map(Multiplexer::pid)
    }

    pub fn is_alive(&self) -> bool {
        self.mux.as_ref().is_some_and(Multiplexer::is_alive)
    }

    pub const fn voice(&self) -> &VoiceId {
        &self.voice
    }

    /// Current base pitch, including any carry from the last contour.
    pub const fn pitch(&self) -> f32 {
        self.pitch
    }

    pub const fn envelope(&self) -> &Envelope {
        &self.envelope
    }

    pub const fn is_closed(&self) -> bool {
        self.mux.is_none()
    }

    fn running(&mut self) -> SynthResult<&mut Multiplexer> {
        let mux = self.mux.as_mut().ok_or(SynthError::Closed)?;
        if mux.is_finished() {
            return Err(SynthError::NotRunning);
        }
        Ok(mux)
    }
}

/// `[-e] -v <volume> <database> - -.wav`
fn spawn_args(config: &SynthConfig, database: PathBuf) -> Vec<std::ffi::OsString> {
    let mut args = Vec::with_capacity(6);
    if config.ignore_unknown_diphones {
        args.push("-e".into());
    }
    args.push("-v".into());
    args.push(protocol::format_number(config.volume_scale).into());
    args.push(database.into_os_string());
    // Commands on stdin, WAV on stdout.
    args.push("-".into());
    args.push("-.wav".into());
    args
}

/// Flush the current utterance and forward its audio to `sink`.
async fn drain<S: AudioSink + ?Sized>(
    mux: &mut Multiplexer,
    sink: &mut S,
    scratch_size: usize,
) -> SynthResult<u64> {
    mux.begin_utterance();
    mux.submit(FLUSH).await?;

    let mut scratch = vec![0u8; scratch_size];
    let mut total = 0u64;
    loop {
        let n = mux.fill(&mut scratch).await?;
        if n > 0 {
            sink.write_all(&scratch[..n])?;
            total += n as u64;
        }
        if n == 0 || mux.state() == ProcessState::Idle {
            break;
        }
    }
    Ok(total)
}

/// Send `#` and read back the WAV header.
///
/// Every failure here is an `Init` error: the process was spawned but never
/// became usable.
async fn handshake(mux: &mut Multiplexer) -> SynthResult<WavHeader> {
    let mut header = [0u8; WAV_HEADER_LEN];
    let mut got = 0;

    let result = async {
        mux.begin_utterance();
        mux.submit(HANDSHAKE).await?;
        while got < WAV_HEADER_LEN {
            let n = mux.fill(&mut header[got..]).await?;
            if n == 0 {
                break;
            }
            got += n;
        }
        Ok::<(), SynthError>(())
    }
    .await;

    match result {
        Ok(()) => {}
        Err(e @ (SynthError::Init(_) | SynthError::Spawn { .. })) => return Err(e),
        Err(e) => return Err(SynthError::init(e)),
    }
    let header = WavHeader::parse(&header[..got])?;
    mux.set_state(ProcessState::Idle);
    Ok(header)
}
