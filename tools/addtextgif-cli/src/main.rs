//! AddTextGif CLI: command-line interface for captioning animated GIFs.
//!
//! Usage:
//!   addtextgif inspect <GIF>          Show frames, delays, and duration
//!   addtextgif templates              List caption templates
//!   addtextgif render <GIF> [OPTIONS] Burn captions in and export a new GIF
//!   addtextgif preview <GIF> --at MS  Write one captioned frame as PNG
//!   addtextgif play <GIF>             Simulate playback in the terminal

use std::path::PathBuf;

use clap::{Parser, Subcommand};

mod commands;

use commands::overlays::OverlayArgs;

#[derive(Parser)]
#[command(
    name = "addtextgif",
    about = "Add text captions to animated GIFs",
    version,
    author
)]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show frame count, dimensions, and per-frame delays
    Inspect {
        /// Path to the GIF
        input: PathBuf,
    },

    /// List the built-in caption templates
    Templates {
        /// Print the catalog as JSON
        #[arg(long)]
        json: bool,
    },

    /// Burn captions into a GIF and export the result
    Render {
        /// Path to the GIF
        input: PathBuf,

        #[command(flatten)]
        overlays: OverlayArgs,

        /// Output directory (defaults to the configured one)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Encoder worker count
        #[arg(long)]
        workers: Option<usize>,

        /// Quantisation speed, 1 (best) to 30 (fastest)
        #[arg(long, value_parser = clap::value_parser!(i32).range(1..=30))]
        quality: Option<i32>,
    },

    /// Write the frame shown at a point in time, with captions, as PNG
    Preview {
        /// Path to the GIF
        input: PathBuf,

        #[command(flatten)]
        overlays: OverlayArgs,

        /// Playback position in milliseconds
        #[arg(long, default_value = "0")]
        at: f64,

        /// Output PNG path
        #[arg(short, long, default_value = "preview.png")]
        output: PathBuf,
    },

    /// Play the GIF's timeline in real time and print frame changes
    Play {
        /// Path to the GIF
        input: PathBuf,

        #[command(flatten)]
        overlays: OverlayArgs,

        /// How long to play, in seconds
        #[arg(long, default_value = "3.0")]
        seconds: f64,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let mut config = addtextgif_common::config::AppConfig::load();
    if cli.verbose {
        config.logging.level = "debug".to_string();
    }
    addtextgif_common::logging::init_logging(&config.logging);

    match cli.command {
        Commands::Inspect { input } => commands::inspect::run(&config, input).await,
        Commands::Templates { json } => commands::templates::run(json),
        Commands::Render {
            input,
            overlays,
            output,
            workers,
            quality,
        } => commands::render::run(&config, input, overlays, output, workers, quality).await,
        Commands::Preview {
            input,
            overlays,
            at,
            output,
        } => commands::preview::run(&config, input, overlays, at, output).await,
        Commands::Play {
            input,
            overlays,
            seconds,
        } => commands::play::run(&config, input, overlays, seconds).await,
    }
}
