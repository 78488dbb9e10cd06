//! Settings structs, one per `[section]` of config.ini.

use std::path::PathBuf;

/// Complete application configuration loaded from config.ini.
#[derive(Debug, Clone, PartialEq)]
pub struct ConfigFile {
    /// What to capture and how often
    pub capture: CaptureSettings,
    /// Tile backend access
    pub network: NetworkSettings,
    /// Log output
    pub logging: LoggingSettings,
}

/// `[capture]` section.
#[derive(Debug, Clone, PartialEq)]
pub struct CaptureSettings {
    /// Directory that receives timestamped PNGs
    pub output_dir: PathBuf,
    /// Seconds between scheduled captures
    pub interval: u64,
    /// wplace.live URL used for season detection
    pub viewer_url: Option<String>,
}

/// `[network]` section.
#[derive(Debug, Clone, PartialEq)]
pub struct NetworkSettings {
    /// Tile server base URL, without the season segment
    pub base_url: String,
    /// Per-fetch timeout in seconds
    pub timeout: u64,
    /// Tile fetches in flight per capture
    pub max_concurrent: usize,
    pub user_agent: String,
    /// Retry 404 tiles with x and y swapped
    pub probe_swapped_axes: bool,
    /// Largest span (in tiles) a capture may cover
    pub max_tiles: u64,
}

/// `[logging]` section.
#[derive(Debug, Clone, PartialEq)]
pub struct LoggingSettings {
    /// Log file path
    pub file: PathBuf,
}
