//! Subcommand definitions.

use std::path::PathBuf;

use clap::Subcommand;

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// List known voices
    Voices {
        /// Only show voices whose database is installed
        #[arg(long)]
        installed: bool,
    },

    /// Start a voice and report the audio parameters it announces
    Info {
        /// Voice name, e.g. `de5`
        #[arg(long)]
        voice: String,
    },

    /// Synthesize a phoneme sequence
    ///
    /// Phonemes come from the arguments, or whitespace-separated from stdin
    /// when none are given. Without `--output`, raw s16le samples are written
    /// to stdout.
    Speak {
        /// Voice name, e.g. `de5`
        #[arg(long)]
        voice: String,

        /// Voice table JSON (phoneme durations and envelope flags)
        #[arg(long)]
        table: PathBuf,

        /// Base pitch in Hz
        #[arg(long)]
        pitch: Option<f32>,

        /// Write a WAV file here instead of raw samples to stdout
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Phoneme symbols
        phonemes: Vec<String>,
    },
}
