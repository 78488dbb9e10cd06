//! Default values and `ConfigFile::default()`.

use std::path::PathBuf;

use super::file::config_directory;
use super::settings::*;
use crate::compositor::DEFAULT_MAX_TILES;
use crate::provider::{DEFAULT_BASE_URL, DEFAULT_TIMEOUT_SECS, DEFAULT_USER_AGENT};
use crate::session::{DEFAULT_MAX_CONCURRENT, MAX_CONCURRENT_LIMIT};

/// Default capture output directory, relative to the working directory.
pub const DEFAULT_OUTPUT_DIR: &str = "screenshots";

/// Default capture interval: one hour.
pub const DEFAULT_INTERVAL_SECS: u64 = 3600;

pub const DEFAULT_PROBE_SWAPPED_AXES: bool = false;

/// Default log file (~/.marblesnap/logs/marblesnap.log).
pub fn default_log_file() -> PathBuf {
    config_directory().join("logs").join("marblesnap.log")
}

/// Clamps fetch concurrency to `1..=64`, logging when a value is changed.
pub fn clamp_max_concurrent(value: usize) -> usize {
    let clamped = value.clamp(1, MAX_CONCURRENT_LIMIT);
    if clamped != value {
        tracing::warn!(
            requested = value,
            min = 1,
            max = MAX_CONCURRENT_LIMIT,
            "max_concurrent out of range, clamping to {}",
            clamped
        );
    }
    clamped
}

impl Default for ConfigFile {
    fn default() -> Self {
        Self {
            capture: CaptureSettings {
                output_dir: PathBuf::from(DEFAULT_OUTPUT_DIR),
                interval: DEFAULT_INTERVAL_SECS,
                viewer_url: None,
            },
            network: NetworkSettings {
                base_url: DEFAULT_BASE_URL.to_string(),
                timeout: DEFAULT_TIMEOUT_SECS,
                max_concurrent: DEFAULT_MAX_CONCURRENT,
                user_agent: DEFAULT_USER_AGENT.to_string(),
                probe_swapped_axes: DEFAULT_PROBE_SWAPPED_AXES,
                max_tiles: DEFAULT_MAX_TILES,
            },
            logging: LoggingSettings {
                file: default_log_file(),
            },
        }
    }
}
