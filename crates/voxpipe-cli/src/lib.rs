//! `voxpipe` command-line front end.
//!
//! Argument parsing, configuration layering and command handlers live here so
//! they can be tested without spawning the binary.

#![deny(unsafe_code)]
#![deny(unused_crate_dependencies)]

#[cfg(test)]
use tempfile as _;
#[cfg(test)]
use tokio_test as _;

// Used by the binary target only.
use anyhow as _;
use dotenvy as _;
use tracing_subscriber as _;

pub mod commands;
pub mod config;
pub mod error;
pub mod handlers;
pub mod parser;
pub mod wav;

pub use commands::Commands;
pub use config::resolve_config;
pub use error::CliError;
pub use parser::Cli;
pub use wav::WavSink;
