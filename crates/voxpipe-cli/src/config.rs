//! Configuration layering for CLI invocations.
//!
//! Precedence, lowest first: built-in defaults, the `--config` JSON file,
//! then `VOXPIPE_PROGRAM` / `VOXPIPE_DATA_DIR` or the matching flags (clap
//! folds the environment into the flag values).

use tracing::debug;
use voxpipe_core::SynthConfig;

use crate::error::CliError;
use crate::parser::Cli;

/// Build the effective synthesizer configuration for `cli`.
pub fn resolve_config(cli: &Cli) -> Result<SynthConfig, CliError> {
    let mut config = match &cli.config {
        Some(path) => SynthConfig::load(path)?,
        None => SynthConfig::default(),
    };

    if let Some(program) = &cli.program {
        config.program.clone_from(program);
    }
    if let Some(data_dir) = &cli.data_dir {
        config.data_dir.clone_from(data_dir);
    }
    config.validate()?;

    debug!(
        program = %config.program,
        data_dir = %config.data_dir.display(),
        "Resolved synthesizer configuration"
    );
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::Commands;
    use std::path::PathBuf;

    fn cli(config: Option<PathBuf>, program: Option<&str>) -> Cli {
        Cli {
            config,
            program: program.map(str::to_string),
            data_dir: Some(PathBuf::from("/srv/voices")),
            verbose: false,
            command: Commands::Voices { installed: false },
        }
    }

    #[test]
    fn flags_override_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("voxpipe.json");
        std::fs::write(
            &path,
            r#"{ "program": "/usr/bin/mbrola", "volume_scale": 0.5, "data_dir": "/nowhere" }"#,
        )
        .unwrap();

        let config = resolve_config(&cli(Some(path.clone()), None)).unwrap();
        assert_eq!(config.program, "/usr/bin/mbrola");
        assert!((config.volume_scale - 0.5).abs() < f32::EPSILON);
        assert_eq!(config.data_dir, PathBuf::from("/srv/voices"));

        let config = resolve_config(&cli(Some(path), Some("./mbrola"))).unwrap();
        assert_eq!(config.program, "./mbrola");
    }

    #[test]
    fn invalid_file_is_config_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("voxpipe.json");
        std::fs::write(&path, r#"{ "backoff": { "factor": 0.5 } }"#).unwrap();

        let err = resolve_config(&cli(Some(path), None)).unwrap_err();
        assert_eq!(err.exit_code(), 78);
    }

    #[test]
    fn empty_program_flag_is_rejected() {
        let err = resolve_config(&cli(None, Some(""))).unwrap_err();
        assert!(matches!(err, CliError::Config(_)));
    }
}
