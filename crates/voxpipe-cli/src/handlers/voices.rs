//! Voices command handler.

use voxpipe_core::SynthConfig;
use voxpipe_core::voice::VOICES;
use voxpipe_runtime::voices::is_installed;

use crate::error::CliError;

/// Print the voice catalog, optionally restricted to installed voices.
pub fn execute(config: &SynthConfig, installed_only: bool) -> Result<(), CliError> {
    let rows = rows(config, installed_only);
    if rows.is_empty() {
        println!(
            "No voices installed under {}.",
            config.data_dir.display()
        );
        return Ok(());
    }

    println!(
        "{:<6} {:<8} {:>9} {:<8} Installed",
        "Name", "Language", "Frequency", "Gender"
    );
    for row in rows {
        println!("{row}");
    }
    Ok(())
}

fn rows(config: &SynthConfig, installed_only: bool) -> Vec<String> {
    VOICES
        .iter()
        .filter_map(|voice| {
            let installed = is_installed(&config.data_dir, voice);
            (installed || !installed_only).then(|| {
                format!(
                    "{:<6} {:<8} {:>9} {:<8} {}",
                    voice.name,
                    voice.language,
                    voice.frequency,
                    voice.gender.as_str(),
                    if installed { "yes" } else { "no" }
                )
            })
        })
        .collect()
}
