//! Timelapse command - animated GIF from a directory of captures.

use std::path::PathBuf;

use clap::Args;
use console::style;
use indicatif::{ProgressBar, ProgressStyle};

use marblesnap::timelapse::{build_timelapse, TimelapseOptions};

use crate::error::CliError;
use crate::runner::CliRunner;

/// Arguments for the timelapse command.
#[derive(Debug, Args)]
pub struct TimelapseArgs {
    /// Directory containing the captures
    pub input_dir: PathBuf,

    /// GIF file to write
    pub output: PathBuf,

    /// How long each capture is shown
    #[arg(long, short, default_value_t = 1.0)]
    pub seconds_per_image: f64,
}

/// Run the timelapse command.
pub fn run(args: TimelapseArgs, debug: bool) -> Result<(), CliError> {
    let runner = CliRunner::with_debug(debug)?;
    runner.log_startup("timelapse");

    let progress = ProgressBar::new(0);
    progress.set_style(
        ProgressStyle::with_template("{spinner} [{bar:40.cyan/blue}] {pos}/{len} frames")
            .map_err(|e| CliError::Config(format!("Invalid progress template: {}", e)))?
            .progress_chars("=> "),
    );

    let result = build_timelapse(
        &args.input_dir,
        &args.output,
        TimelapseOptions {
            seconds_per_image: args.seconds_per_image,
        },
        |done, total| {
            progress.set_length(total as u64);
            progress.set_position(done as u64);
        },
    );
    progress.finish_and_clear();
    let summary = result?;

    println!(
        "{} Wrote {} frames ({}×{}) to {}",
        style("✓").green().bold(),
        summary.frames,
        summary.width,
        summary.height,
        args.output.display()
    );
    for path in &summary.skipped {
        println!("  {} skipped unreadable {}", style("!").yellow(), path.display());
    }
    Ok(())
}
