//! Command handlers.
//!
//! Handlers follow one pattern:
//! - Signature: `pub async fn execute(config: &SynthConfig, ...) -> Result<(), CliError>`
//! - Thin wrappers that validate CLI input, drive a session and format output
//!   for the terminal.

pub mod info;
pub mod speak;
pub mod voices;
