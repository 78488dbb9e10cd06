//! Capture command - one capture of a region, saved as PNG.

use std::path::PathBuf;

use clap::Args;
use console::style;
use tokio_util::sync::CancellationToken;
use tracing::info;

use marblesnap::coord::parse_region;
use marblesnap::output::{ensure_output_dir, save_capture};
use marblesnap::session::CaptureContext;

use super::common::{
    cancel_on_interrupt, note_custom_base_url, resolve_output_dir, resolve_viewer_url, NetworkArgs,
};
use crate::error::CliError;
use crate::runner::{build_runtime, CliRunner};

/// Arguments for the capture command.
#[derive(Debug, Args)]
pub struct CaptureArgs {
    /// First corner, e.g. "(Tl X: 1471, Tl Y: 923, Px X: 63, Px Y: 995)"
    #[arg(long)]
    pub start: String,

    /// Opposite corner, in the same form
    #[arg(long)]
    pub end: String,

    /// wplace.live URL used to pick the tile season
    #[arg(long)]
    pub url: Option<String>,

    /// Directory for the PNG (overrides config.ini)
    #[arg(long, short)]
    pub output: Option<PathBuf>,

    #[command(flatten)]
    pub network: NetworkArgs,
}

/// Run the capture command.
pub fn run(args: CaptureArgs, debug: bool) -> Result<(), CliError> {
    let runner = CliRunner::with_debug(debug)?;
    runner.log_startup("capture");
    let config = runner.config();

    let region = parse_region(&args.start, &args.end)?;
    let viewer_url = resolve_viewer_url(args.url, config);
    let output_dir = resolve_output_dir(args.output, config);
    note_custom_base_url(&args.network, config);

    ensure_output_dir(&output_dir)?;

    let runtime = build_runtime()?;
    let cancel = CancellationToken::new();
    cancel_on_interrupt(cancel.clone())?;
    let service = runner.create_service(&args.network, cancel)?;

    info!(region = %region, viewer_url = %viewer_url, "Capturing region");
    let capture = runtime.block_on(service.capture_once(
        &mut CaptureContext::new(),
        &region,
        &viewer_url,
    ))?;

    let path = save_capture(&capture.image, &output_dir)?;

    println!(
        "{} Saved {}×{} capture to {}",
        style("✓").green().bold(),
        capture.image.width(),
        capture.image.height(),
        path.display()
    );
    println!(
        "  Endpoint: {}  Tiles: {} present, {} empty, {} failed",
        capture.endpoint,
        capture.stats.tiles_present,
        capture.stats.tiles_absent,
        capture.stats.tiles_failed
    );
    Ok(())
}
