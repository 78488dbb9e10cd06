//! CLI runner for common setup.
//!
//! Loads configuration, initializes logging and builds the capture service
//! so command handlers don't repeat it.

use std::time::Duration;

use tokio_util::sync::CancellationToken;
use tracing::info;

use marblesnap::compositor::Compositor;
use marblesnap::config::ConfigFile;
use marblesnap::logging::{init_logging, LoggingGuard};
use marblesnap::provider::{RegionResolver, ReqwestTileClient, TileFetcher};
use marblesnap::session::CaptureService;

use crate::commands::common::NetworkArgs;
use crate::error::CliError;

/// Runner that manages CLI lifecycle and common operations.
pub struct CliRunner {
    /// Keeps the log writer alive while the runner exists
    _logging_guard: LoggingGuard,
    config: ConfigFile,
}

impl CliRunner {
    /// Loads config.ini and starts logging to its log file and stdout.
    pub fn with_debug(debug_mode: bool) -> Result<Self, CliError> {
        let config = ConfigFile::load()?;

        let log_path = &config.logging.file;
        let log_dir = log_path
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .map(|p| p.to_path_buf())
            .unwrap_or_else(|| ".".into());
        let log_file = log_path
            .file_name()
            .map(|s| s.to_string_lossy().to_string())
            .unwrap_or_else(|| "marblesnap.log".to_string());

        let logging_guard = init_logging(&log_dir, &log_file, true, debug_mode)
            .map_err(|e| CliError::LoggingInit(e.to_string()))?;

        Ok(Self {
            _logging_guard: logging_guard,
            config,
        })
    }

    pub fn config(&self) -> &ConfigFile {
        &self.config
    }

    /// Log startup information for a command.
    pub fn log_startup(&self, command: &str) {
        info!("marblesnap v{}", marblesnap::VERSION);
        info!("marblesnap CLI: {} command", command);
    }

    /// Builds the production capture service; CLI flags override config.ini.
    pub fn create_service(
        &self,
        network: &NetworkArgs,
        cancel: CancellationToken,
    ) -> Result<CaptureService<ReqwestTileClient>, CliError> {
        let settings = &self.config.network;
        let mut http = self.config.http_settings();
        if let Some(secs) = network.timeout {
            http.timeout = Duration::from_secs(secs.max(1));
        }
        let timeout = http.timeout;
        let base_url = network
            .base_url
            .as_deref()
            .map(|url| url.trim_end_matches('/').to_string())
            .unwrap_or_else(|| settings.base_url.clone());
        let max_concurrent = network.max_concurrent.unwrap_or(settings.max_concurrent);
        let probe_swapped_axes = network.probe_swapped_axes || settings.probe_swapped_axes;

        let client = ReqwestTileClient::with_settings(&http)?;
        let fetcher = TileFetcher::new(client, timeout).with_swapped_axis_probe(probe_swapped_axes);

        info!(
            base_url = %base_url,
            timeout_secs = timeout.as_secs(),
            max_concurrent,
            probe_swapped_axes,
            max_tiles = settings.max_tiles,
            "Capture service configured"
        );

        Ok(CaptureService::new(fetcher, RegionResolver::new(base_url))
            .with_max_concurrent(max_concurrent)
            .with_compositor(Compositor::new(settings.max_tiles))
            .with_cancellation(cancel))
    }
}

/// Builds the multi-threaded tokio runtime the commands run on.
pub fn build_runtime() -> Result<tokio::runtime::Runtime, CliError> {
    tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .thread_name("marblesnap")
        .build()
        .map_err(|e| CliError::Runtime(e.to_string()))
}
