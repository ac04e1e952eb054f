//! Marquee CLI - Headless Playback Session Driver
//!
//! Features:
//! - Scripted playback sessions from JSON scenarios
//! - Start-time token parsing and formatting
//! - Player route inspection

use clap::{Parser, Subcommand};
use std::path::PathBuf;

mod commands;
mod output;
mod scenario;

/// Marquee CLI - Playback session toolkit
#[derive(Parser)]
#[command(name = "marquee")]
#[command(version)]
#[command(about = "Drive and inspect playback sessions", long_about = None)]
struct Cli {
    /// Enable verbose output
    #[arg(short, long)]
    verbose: bool,

    /// Output format (text, json, table)
    #[arg(short, long, default_value = "text")]
    format: String,

    /// Session configuration file (JSON)
    #[arg(short, long)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a scripted session
    Play {
        /// Scenario file (JSON)
        scenario: PathBuf,
    },

    /// Parse a start-time token
    Timestamp {
        /// Token such as 125, 2:05 or 1:02:03
        token: String,
    },

    /// Format an offset in seconds as a start-time token
    FormatTime {
        /// Offset in seconds
        seconds: f64,
    },

    /// Parse a player route
    Route {
        /// Path such as /media/95396/2/3?t=1:00
        path: String,
    },
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Initialize tracing
    let level = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(level)
        .with_writer(std::io::stderr)
        .init();
    marquee_core::init();

    let config = commands::load_config(cli.config.as_deref())?;

    match cli.command {
        Commands::Play { scenario } => {
            commands::play(&scenario, config, &cli.format).await?;
        }
        Commands::Timestamp { token } => {
            commands::timestamp(&token, &cli.format)?;
        }
        Commands::FormatTime { seconds } => {
            commands::format_time(seconds, &cli.format)?;
        }
        Commands::Route { path } => {
            commands::route(&path, &config, &cli.format)?;
        }
    }

    Ok(())
}
