//! Info command handler.
//!
//! Starts the voice so the reported parameters are the ones the synthesizer
//! actually announced, not the catalog's.

use std::sync::Arc;

use tracing::info;
use voxpipe_core::{SynthConfig, VoiceTable};
use voxpipe_runtime::SynthesizerSession;

use crate::error::CliError;

pub async fn execute(config: &SynthConfig, voice: &str) -> Result<(), CliError> {
    let mut session =
        SynthesizerSession::open(voice, Arc::new(VoiceTable::new()), config.clone()).await?;
    let audio = session.audio_info();
    info!(voice = %session.voice(), pid = ?session.pid(), "Voice started");

    println!("Voice:       {}", session.voice());
    if let Some(descriptor) = session.voice().descriptor() {
        println!("Language:    {}", descriptor.language);
        println!("Gender:      {}", descriptor.gender.as_str());
    }
    println!("Sample rate: {} Hz", audio.sample_rate);
    println!("Channels:    {}", audio.channels);
    println!("Format:      {}", audio.format.as_str());

    session.close().await;
    Ok(())
}
