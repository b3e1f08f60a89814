/// Tracklist CLI - script-driven playback harness
use anyhow::Context;
use clap::{Parser, Subcommand};
use std::io::{self, Read};
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use tracklist_cli::{CliConfig, OutputFormat, ScriptRunner};

#[derive(Parser)]
#[command(name = "tracklist-cli")]
#[command(about = "Drive the Tracklist playback core from a command script", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a command script against a virtual engine
    Run {
        /// Script file (reads stdin when omitted)
        script: Option<PathBuf>,

        /// Configuration file path
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Print events as JSON lines
        #[arg(long)]
        json: bool,
    },
    /// Print the effective configuration
    Config {
        /// Configuration file path
        #[arg(short, long)]
        config: Option<PathBuf>,
    },
}

fn main() -> anyhow::Result<()> {
    // Logs go to stderr; stdout carries events
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "tracklist_cli=info,tracklist_playback=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(io::stderr))
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Run {
            script,
            config,
            json,
        } => {
            let config = CliConfig::load(config.as_deref())?;
            let format = if json {
                OutputFormat::Json
            } else {
                OutputFormat::Text
            };
            run(script, &config, format)?;
        }
        Commands::Config { config } => {
            let config = CliConfig::load(config.as_deref())?;
            config.validate()?;
            println!("{}", serde_json::to_string_pretty(&config)?);
        }
    }

    Ok(())
}

fn run(script: Option<PathBuf>, config: &CliConfig, format: OutputFormat) -> anyhow::Result<()> {
    let text = match &script {
        Some(path) => std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read script {}", path.display()))?,
        None => {
            let mut text = String::new();
            io::stdin().read_to_string(&mut text)?;
            text
        }
    };

    let mut runner = ScriptRunner::new(config, format, io::stdout().lock())?;
    runner.run(&text)?;

    let status = runner.status();
    tracing::info!(
        state = %status.state,
        position = status.current_time,
        track = status.track_id.as_deref().unwrap_or("-"),
        "Script finished"
    );
    Ok(())
}
