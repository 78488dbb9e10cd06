//! INI parsing: `Ini` → `ConfigFile`.
//!
//! The single place where INI key names are mapped to struct fields.

use std::path::PathBuf;

use ini::{Ini, Properties};
use reqwest::Url;

use super::defaults::clamp_max_concurrent;
use super::file::ConfigFileError;
use super::settings::ConfigFile;

/// Parse an `Ini` object into a `ConfigFile`.
///
/// Starts from `ConfigFile::default()` and overlays any values found.
pub(super) fn parse_ini(ini: &Ini) -> Result<ConfigFile, ConfigFileError> {
    let mut config = ConfigFile::default();

    // [capture] section
    if let Some(section) = ini.section(Some("capture")) {
        if let Some(v) = non_empty(section, "output_dir") {
            config.capture.output_dir = expand_tilde(v);
        }
        if let Some(v) = section.get("interval") {
            config.capture.interval = parse_positive(v, "capture", "interval", "seconds")?;
        }
        if let Some(v) = non_empty(section, "viewer_url") {
            config.capture.viewer_url = Some(v.to_string());
        }
    }

    // [network] section
    if let Some(section) = ini.section(Some("network")) {
        if let Some(v) = non_empty(section, "base_url") {
            config.network.base_url = parse_base_url(v)?;
        }
        if let Some(v) = section.get("timeout") {
            config.network.timeout = parse_positive(v, "network", "timeout", "seconds")?;
        }
        if let Some(v) = section.get("max_concurrent") {
            let value: usize = v
                .trim()
                .parse()
                .map_err(|_| invalid("network", "max_concurrent", v, "must be an integer"))?;
            config.network.max_concurrent = clamp_max_concurrent(value);
        }
        if let Some(v) = non_empty(section, "user_agent") {
            config.network.user_agent = v.to_string();
        }
        if let Some(v) = section.get("probe_swapped_axes") {
            config.network.probe_swapped_axes = parse_bool(v);
        }
        if let Some(v) = section.get("max_tiles") {
            config.network.max_tiles = parse_positive(v, "network", "max_tiles", "tiles")?;
        }
    }

    // [logging] section
    if let Some(section) = ini.section(Some("logging")) {
        if let Some(v) = non_empty(section, "file") {
            config.logging.file = expand_tilde(v);
        }
    }

    Ok(config)
}

fn non_empty<'a>(section: &'a Properties, key: &str) -> Option<&'a str> {
    section.get(key).map(str::trim).filter(|v| !v.is_empty())
}

fn invalid(section: &str, key: &str, value: &str, reason: &str) -> ConfigFileError {
    ConfigFileError::InvalidValue {
        section: section.to_string(),
        key: key.to_string(),
        value: value.to_string(),
        reason: reason.to_string(),
    }
}

fn parse_positive(value: &str, section: &str, key: &str, unit: &str) -> Result<u64, ConfigFileError> {
    match value.trim().parse::<u64>() {
        Ok(n) if n > 0 => Ok(n),
        _ => Err(invalid(
            section,
            key,
            value,
            &format!("must be a positive integer ({})", unit),
        )),
    }
}

fn parse_base_url(value: &str) -> Result<String, ConfigFileError> {
    match Url::parse(value) {
        Ok(url) if matches!(url.scheme(), "http" | "https") => {
            Ok(value.trim_end_matches('/').to_string())
        }
        _ => Err(invalid(
            "network",
            "base_url",
            value,
            "must be an http:// or https:// URL",
        )),
    }
}

/// `true`, `1`, `yes` and `on` (any case) are true; anything else is false.
pub(super) fn parse_bool(value: &str) -> bool {
    let v = value.trim().to_lowercase();
    v == "true" || v == "1" || v == "yes" || v == "on"
}

/// Expands a leading `~/` to the home directory.
pub(super) fn expand_tilde(path: &str) -> PathBuf {
    if let Some(stripped) = path.strip_prefix("~/") {
        if let Some(home) = dirs::home_dir() {
            return home.join(stripped);
        }
    }
    PathBuf::from(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn load(content: &str) -> Result<ConfigFile, ConfigFileError> {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("config.ini");
        std::fs::write(&config_path, content).unwrap();
        ConfigFile::load_from(&config_path)
    }

    #[test]
    fn test_partial_config() {
        let config = load(
            r#"
[capture]
interval = 600
"#,
        )
        .unwrap();

        assert_eq!(config.capture.interval, 600);
        assert_eq!(config.network, ConfigFile::default().network);
    }

    #[test]
    fn test_full_config() {
        let config = load(
            r#"
[capture]
output_dir = /tmp/shots
interval = 120
viewer_url = https://wplace.live/?lat=28.6&lng=77.2&zoom=11

[network]
base_url = http://127.0.0.1:8080/files/
timeout = 10
max_concurrent = 16
user_agent = marblesnap-test
probe_swapped_axes = yes
max_tiles = 25

[logging]
file = /tmp/marblesnap.log
"#,
        )
        .unwrap();

        assert_eq!(config.capture.output_dir, PathBuf::from("/tmp/shots"));
        assert_eq!(config.capture.interval, 120);
        assert_eq!(
            config.capture.viewer_url.as_deref(),
            Some("https://wplace.live/?lat=28.6&lng=77.2&zoom=11")
        );
        assert_eq!(config.network.base_url, "http://127.0.0.1:8080/files");
        assert_eq!(config.network.timeout, 10);
        assert_eq!(config.network.max_concurrent, 16);
        assert_eq!(config.network.user_agent, "marblesnap-test");
        assert!(config.network.probe_swapped_axes);
        assert_eq!(config.network.max_tiles, 25);
        assert_eq!(config.logging.file, PathBuf::from("/tmp/marblesnap.log"));
    }

    #[test]
    fn test_zero_interval_rejected() {
        let err = load("[capture]\ninterval = 0\n").unwrap_err();
        assert!(err.to_string().contains("[capture] interval"));
    }

    #[test]
    fn test_non_numeric_timeout_rejected() {
        let err = load("[network]\ntimeout = soon\n").unwrap_err();
        match err {
            ConfigFileError::InvalidValue { section, key, .. } => {
                assert_eq!(section, "network");
                assert_eq!(key, "timeout");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_max_concurrent_is_clamped() {
        let config = load("[network]\nmax_concurrent = 1000\n").unwrap();
        assert_eq!(config.network.max_concurrent, 64);

        let config = load("[network]\nmax_concurrent = 0\n").unwrap();
        assert_eq!(config.network.max_concurrent, 1);
    }

    #[test]
    fn test_invalid_base_url_rejected() {
        let err = load("[network]\nbase_url = ftp://example.com/files\n").unwrap_err();
        assert!(err.to_string().contains("base_url"));

        assert!(load("[network]\nbase_url = not a url\n").is_err());
    }

    #[test]
    fn test_empty_values_keep_defaults() {
        let config = load("[capture]\nviewer_url =\noutput_dir =\n").unwrap();
        assert!(config.capture.viewer_url.is_none());
        assert_eq!(config.capture.output_dir, ConfigFile::default().capture.output_dir);
    }

    #[test]
    fn test_parse_bool() {
        for v in ["true", "TRUE", "1", "yes", "on", " On "] {
            assert!(parse_bool(v), "{v} should be true");
        }
        for v in ["false", "0", "no", "off", "maybe"] {
            assert!(!parse_bool(v), "{v} should be false");
        }
    }

    #[test]
    fn test_expand_tilde() {
        let path = expand_tilde("~/test/path");
        if let Some(home) = dirs::home_dir() {
            assert_eq!(path, home.join("test/path"));
        }

        let path = expand_tilde("/absolute/path");
        assert_eq!(path, PathBuf::from("/absolute/path"));
    }
}
