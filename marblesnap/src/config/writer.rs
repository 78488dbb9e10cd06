//! INI serialization: `ConfigFile` → commented config.ini content.

use std::path::Path;

use super::settings::ConfigFile;

/// Convert a `ConfigFile` to a commented INI string for saving.
pub(super) fn to_config_string(config: &ConfigFile) -> String {
    let viewer_url = config.capture.viewer_url.as_deref().unwrap_or("");
    let probe_swapped_axes = if config.network.probe_swapped_axes {
        "true"
    } else {
        "false"
    };

    format!(
        r#"[capture]
; Directory for timestamped screenshots (created if missing)
output_dir = {}
; Seconds between captures in watch mode (default: 3600)
interval = {}
; wplace.live URL of the area, used to pick the tile season
; Example: https://wplace.live/?lat=52.52&lng=13.40&zoom=12
viewer_url = {}

[network]
; Tile server base URL; tiles are fetched from <base_url>/s<N>/tiles/<x>/<y>.png
base_url = {}
; Per-tile request timeout in seconds (default: 30)
timeout = {}
; Tile downloads in flight per capture, 1-64 (default: 8)
max_concurrent = {}
; User-Agent sent to the tile server
user_agent = {}
; Retry missing tiles with x and y swapped (default: false)
probe_swapped_axes = {}
; Largest region allowed, in tiles (default: 100)
max_tiles = {}

[logging]
; Log file, cleared at the start of each run
file = {}
"#,
        path_to_string(&config.capture.output_dir),
        config.capture.interval,
        viewer_url,
        config.network.base_url,
        config.network.timeout,
        config.network.max_concurrent,
        config.network.user_agent,
        probe_swapped_axes,
        config.network.max_tiles,
        path_to_string(&config.logging.file),
    )
}

fn path_to_string(path: &Path) -> String {
    path.to_string_lossy().into_owned()
}
