//! Main CLI parser and top-level argument handling.

use std::path::PathBuf;

use clap::Parser;

use crate::commands::Commands;

/// Drive an MBROLA-compatible diphone synthesizer from the command line.
#[derive(Parser, Debug)]
#[command(name = "voxpipe")]
#[command(about = "Speak phoneme sequences through an external diphone synthesizer")]
#[command(version)]
pub struct Cli {
    /// JSON configuration file
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Synthesizer executable (name on PATH or a path)
    #[arg(long, global = true, env = "VOXPIPE_PROGRAM")]
    pub program: Option<String>,

    /// Directory holding `<voice>/<voice>` databases
    #[arg(long = "data-dir", global = true, env = "VOXPIPE_DATA_DIR")]
    pub data_dir: Option<PathBuf>,

    /// Enable verbose/debug output
    #[arg(short = 'v', long = "verbose", global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_parser_builds() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_global_args() {
        let cli = Cli::parse_from([
            "voxpipe",
            "--verbose",
            "--program",
            "/opt/mbrola/mbrola",
            "voices",
            "--data-dir",
            "/tmp/voices",
        ]);
        assert!(cli.verbose);
        assert_eq!(cli.program.as_deref(), Some("/opt/mbrola/mbrola"));
        assert_eq!(cli.data_dir, Some(PathBuf::from("/tmp/voices")));
        assert!(matches!(cli.command, Commands::Voices { installed: false }));
    }

    #[test]
    fn test_speak_args() {
        let cli = Cli::parse_from([
            "voxpipe", "speak", "--voice", "de5", "--table", "de5.json", "--pitch", "120",
            "--output", "out.wav", "h", "aI", "_",
        ]);
        match cli.command {
            Commands::Speak {
                voice,
                table,
                pitch,
                output,
                phonemes,
            } => {
                assert_eq!(voice, "de5");
                assert_eq!(table, PathBuf::from("de5.json"));
                assert_eq!(pitch, Some(120.0));
                assert_eq!(output, Some(PathBuf::from("out.wav")));
                assert_eq!(phonemes, ["h", "aI", "_"]);
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn test_speak_requires_voice_and_table() {
        assert!(Cli::try_parse_from(["voxpipe", "speak", "--voice", "de5"]).is_err());
        assert!(Cli::try_parse_from(["voxpipe", "speak", "--table", "t.json"]).is_err());
    }
}
