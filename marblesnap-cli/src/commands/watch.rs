//! Watch command - capture a region on a schedule until interrupted.
//!
//! Values missing from the command line and config.ini are asked for
//! interactively before the first capture.

use std::path::PathBuf;
use std::time::Duration;

use clap::Args;
use console::style;
use dialoguer::theme::ColorfulTheme;
use tokio_util::sync::CancellationToken;
use tracing::info;

use marblesnap::config::ConfigFile;
use marblesnap::coord::{parse_point, CaptureRegion, TilePoint};
use marblesnap::output::ensure_output_dir;
use marblesnap::schedule::{Scheduler, SnapshotJob};

use super::common::{
    cancel_on_interrupt, note_custom_base_url, resolve_interval, NetworkArgs, DEFAULT_VIEWER_URL,
};
use super::prompt;
use crate::error::CliError;
use crate::runner::{build_runtime, CliRunner};

/// Arguments for the watch command.
#[derive(Debug, Args)]
pub struct WatchArgs {
    /// First corner; prompted for when omitted
    #[arg(long)]
    pub start: Option<String>,

    /// Opposite corner; prompted for when omitted
    #[arg(long)]
    pub end: Option<String>,

    /// wplace.live URL used to pick the tile season
    #[arg(long)]
    pub url: Option<String>,

    /// Directory for the PNGs (overrides config.ini)
    #[arg(long, short)]
    pub output: Option<PathBuf>,

    /// Seconds between captures (overrides config.ini)
    #[arg(long, short)]
    pub interval: Option<u64>,

    /// Stop after this many captures
    #[arg(long, value_name = "N")]
    pub count: Option<u64>,

    /// Never prompt; use config.ini values for anything not given
    #[arg(long)]
    pub no_prompt: bool,

    #[command(flatten)]
    pub network: NetworkArgs,
}

/// Everything the schedule needs, after prompting.
struct WatchPlan {
    region: CaptureRegion,
    viewer_url: String,
    output_dir: PathBuf,
    interval: u64,
}

fn corner(
    text: Option<&str>,
    label: &str,
    theme: &ColorfulTheme,
    interactive: bool,
) -> Result<TilePoint, CliError> {
    match text {
        Some(text) => Ok(parse_point(text)?),
        None if interactive => prompt::point(theme, label),
        None => Err(CliError::Config(format!(
            "--{} is required with --no-prompt",
            label.to_lowercase()
        ))),
    }
}

fn plan(args: &WatchArgs, config: &ConfigFile) -> Result<WatchPlan, CliError> {
    let theme = ColorfulTheme::default();
    let interactive = !args.no_prompt;

    let start = corner(args.start.as_deref(), "Start", &theme, interactive)?;
    let end = corner(args.end.as_deref(), "End", &theme, interactive)?;

    let viewer_url = match (&args.url, &config.capture.viewer_url) {
        (Some(url), _) => url.clone(),
        (None, Some(url)) => url.clone(),
        (None, None) if interactive => prompt::viewer_url(&theme, DEFAULT_VIEWER_URL)?,
        (None, None) => DEFAULT_VIEWER_URL.to_string(),
    };

    let output_dir = match &args.output {
        Some(dir) => dir.clone(),
        None if interactive => prompt::output_dir(&theme, &config.capture.output_dir)?,
        None => config.capture.output_dir.clone(),
    };

    let interval = match args.interval {
        Some(_) => resolve_interval(args.interval, config)?,
        None if interactive => prompt::interval(&theme, config.capture.interval.max(1))?,
        None => resolve_interval(None, config)?,
    };

    Ok(WatchPlan {
        region: CaptureRegion::new(start, end),
        viewer_url,
        output_dir,
        interval,
    })
}

fn print_banner(plan: &WatchPlan) {
    let region = plan.region.normalized();
    println!();
    println!("{}", style("marblesnap watch").bold().cyan());
    println!("  Region:    {}", region);
    println!(
        "  Size:      {}×{} px",
        region.pixel_width(),
        region.pixel_height()
    );
    println!("  Viewer:    {}", plan.viewer_url);
    println!("  Output:    {}", plan.output_dir.display());
    println!("  Interval:  {}s", plan.interval);
    println!();
    println!("Press Ctrl+C to stop.");
    println!();
}

/// Run the watch command.
pub fn run(args: WatchArgs, debug: bool) -> Result<(), CliError> {
    let runner = CliRunner::with_debug(debug)?;
    runner.log_startup("watch");
    let config = runner.config();

    let plan = plan(&args, config)?;
    note_custom_base_url(&args.network, config);
    ensure_output_dir(&plan.output_dir)?;
    print_banner(&plan);

    let runtime = build_runtime()?;
    let cancel = CancellationToken::new();
    cancel_on_interrupt(cancel.clone())?;
    let service = runner.create_service(&args.network, cancel.clone())?;

    let mut scheduler = Scheduler::new(Duration::from_secs(plan.interval));
    if let Some(count) = args.count {
        scheduler = scheduler.max_ticks(count);
    }

    info!(
        region = %plan.region,
        interval_secs = plan.interval,
        output_dir = %plan.output_dir.display(),
        "Watch started"
    );

    let mut job = SnapshotJob::new(service, plan.region, plan.viewer_url, plan.output_dir);
    let summary = runtime.block_on(scheduler.run(&mut job, &cancel));

    println!();
    println!(
        "{} {} captures saved, {} failed",
        style("■").dim(),
        summary.successes,
        summary.failures
    );
    Ok(())
}
