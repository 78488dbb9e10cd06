//! Common types and utilities shared across CLI commands.

use std::path::PathBuf;

use clap::Args;
use tokio_util::sync::CancellationToken;
use tracing::warn;

use marblesnap::config::ConfigFile;
use marblesnap::provider::DEFAULT_BASE_URL;

use crate::error::CliError;

/// Viewer URL used when neither the CLI nor config.ini names one.
pub const DEFAULT_VIEWER_URL: &str = "https://wplace.live/";

/// Tile backend overrides accepted by every capturing command.
#[derive(Debug, Clone, Default, Args)]
pub struct NetworkArgs {
    /// Tile server base URL (overrides config.ini)
    #[arg(long, value_name = "URL")]
    pub base_url: Option<String>,

    /// Per-tile timeout in seconds (overrides config.ini)
    #[arg(long, value_name = "SECS")]
    pub timeout: Option<u64>,

    /// Tile fetches in flight per capture (overrides config.ini)
    #[arg(long, value_name = "N")]
    pub max_concurrent: Option<usize>,

    /// Retry missing tiles with x and y swapped
    #[arg(long)]
    pub probe_swapped_axes: bool,
}

/// Viewer URL: CLI first, then config, then the public map.
pub fn resolve_viewer_url(cli_url: Option<String>, config: &ConfigFile) -> String {
    cli_url
        .or_else(|| config.capture.viewer_url.clone())
        .unwrap_or_else(|| DEFAULT_VIEWER_URL.to_string())
}

/// Output directory: CLI first, then config.
pub fn resolve_output_dir(cli_dir: Option<PathBuf>, config: &ConfigFile) -> PathBuf {
    cli_dir.unwrap_or_else(|| config.capture.output_dir.clone())
}

/// Interval in seconds: CLI first, then config. Zero is rejected.
pub fn resolve_interval(cli_secs: Option<u64>, config: &ConfigFile) -> Result<u64, CliError> {
    match cli_secs.unwrap_or(config.capture.interval) {
        0 => Err(CliError::Config(
            "Interval must be at least 1 second".to_string(),
        )),
        secs => Ok(secs),
    }
}

/// Warns when the tile server differs from the public one.
pub fn note_custom_base_url(network: &NetworkArgs, config: &ConfigFile) {
    let base_url = network
        .base_url
        .as_deref()
        .unwrap_or(&config.network.base_url);
    if base_url != DEFAULT_BASE_URL {
        warn!(base_url, "Using a non-default tile server");
    }
}

/// Cancels `token` on Ctrl+C (SIGINT/SIGTERM).
pub fn cancel_on_interrupt(token: CancellationToken) -> Result<(), CliError> {
    ctrlc::set_handler(move || {
        if token.is_cancelled() {
            // Second interrupt: stop waiting for in-flight work.
            std::process::exit(130);
        }
        eprintln!();
        eprintln!("Stopping after the current step...");
        token.cancel();
    })
    .map_err(|e| CliError::Config(format!("Failed to set signal handler: {}", e)))
}
