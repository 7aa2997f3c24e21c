//! CLI entry point.

use clap::Parser;
use tracing_subscriber::EnvFilter;

use voxpipe_cli::handlers::{self, speak::SpeakArgs};
use voxpipe_cli::{Cli, CliError, Commands, resolve_config};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables before clap reads them
    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    let default_level = if cli.verbose { "debug" } else { "warn" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .with_writer(std::io::stderr)
        .init();

    if let Err(err) = run(cli).await {
        eprintln!("voxpipe: {err}");
        std::process::exit(err.exit_code());
    }
    Ok(())
}

async fn run(cli: Cli) -> Result<(), CliError> {
    let config = resolve_config(&cli)?;

    match cli.command {
        Commands::Voices { installed } => handlers::voices::execute(&config, installed),
        Commands::Info { voice } => handlers::info::execute(&config, &voice).await,
        Commands::Speak {
            voice,
            table,
            pitch,
            output,
            phonemes,
        } => {
            handlers::speak::execute(
                &config,
                SpeakArgs {
                    voice,
                    table,
                    pitch,
                    output,
                    phonemes,
                },
            )
            .await
        }
    }
}
