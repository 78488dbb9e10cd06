//! marblesnap CLI - Command-line interface
//!
//! Captures rectangular regions of the wplace.live map straight from its
//! tiles, once or on a schedule, and turns saved captures into timelapses.

mod commands;
mod error;
mod runner;

use clap::{Parser, Subcommand};

use commands::capture::CaptureArgs;
use commands::init::InitArgs;
use commands::timelapse::TimelapseArgs;
use commands::watch::WatchArgs;

#[derive(Parser)]
#[command(name = "marblesnap")]
#[command(version = marblesnap::VERSION)]
#[command(about = "Scheduled region snapshots of wplace.live", long_about = None)]
struct Cli {
    /// Verbose logging (debug level for marblesnap)
    #[arg(long, global = true)]
    debug: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create or refresh ~/.marblesnap/config.ini
    Init(InitArgs),

    /// Capture a region once and save it as PNG
    Capture(CaptureArgs),

    /// Capture a region repeatedly until Ctrl+C
    Watch(WatchArgs),

    /// Build an animated GIF from a directory of captures
    Timelapse(TimelapseArgs),
}

fn main() {
    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Init(args) => commands::init::run(args),
        Commands::Capture(args) => commands::capture::run(args, cli.debug),
        Commands::Watch(args) => commands::watch::run(args, cli.debug),
        Commands::Timelapse(args) => commands::timelapse::run(args, cli.debug),
    };

    if let Err(e) = result {
        e.exit();
    }
}
