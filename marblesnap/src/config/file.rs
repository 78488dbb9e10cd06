//! Configuration file handling for ~/.marblesnap/config.ini.

use std::path::{Path, PathBuf};
use std::time::Duration;

use ini::{Ini, ParseOption};
use thiserror::Error;

use super::settings::ConfigFile;
use crate::provider::HttpSettings;

/// Errors loading or saving config.ini.
#[derive(Debug, Error)]
pub enum ConfigFileError {
    /// Not readable, or not valid INI
    #[error("Cannot read config.ini: {0}")]
    ReadError(#[from] ini::Error),

    #[error("Cannot write config.ini: {0}")]
    WriteError(String),

    /// A key holds a value that cannot be used
    #[error("[{section}] {key} = '{value}' is invalid: {reason}")]
    InvalidValue {
        section: String,
        key: String,
        value: String,
        reason: String,
    },

    #[error("Cannot create the config directory: {0}")]
    DirectoryError(std::io::Error),
}

impl ConfigFile {
    /// Load configuration from the default path (~/.marblesnap/config.ini).
    pub fn load() -> Result<Self, ConfigFileError> {
        Self::load_from(&config_file_path())
    }

    /// Reads `path`; a missing file yields the defaults.
    pub fn load_from(path: &Path) -> Result<Self, ConfigFileError> {
        if !path.exists() {
            return Ok(Self::default());
        }

        // Escapes off: Windows paths keep their backslashes.
        let options = ParseOption {
            enabled_escape: false,
            ..ParseOption::default()
        };
        let ini = Ini::load_from_file_opt(path, options)?;
        super::parser::parse_ini(&ini)
    }

    /// Save configuration to the default path.
    pub fn save(&self) -> Result<(), ConfigFileError> {
        self.save_to(&config_file_path())
    }

    /// Save configuration to a specific path, creating parent directories.
    pub fn save_to(&self, path: &Path) -> Result<(), ConfigFileError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(ConfigFileError::DirectoryError)?;
        }

        std::fs::write(path, super::writer::to_config_string(self)).map_err(|e| ConfigFileError::WriteError(e.to_string()))
    }

    /// Per-fetch timeout.
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.network.timeout)
    }

    /// Capture interval.
    pub fn interval(&self) -> Duration {
        Duration::from_secs(self.capture.interval)
    }

    /// Settings for building the production HTTP client.
    pub fn http_settings(&self) -> HttpSettings {
        HttpSettings {
            timeout: self.timeout(),
            user_agent: self.network.user_agent.clone(),
        }
    }
}

/// Get the path to the config directory (~/.marblesnap).
pub fn config_directory() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".marblesnap")
}

/// Get the path to the config file (~/.marblesnap/config.ini).
pub fn config_file_path() -> PathBuf {
    config_directory().join("config.ini")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{DEFAULT_INTERVAL_SECS, DEFAULT_OUTPUT_DIR};
    use crate::provider::DEFAULT_BASE_URL;

    #[test]
    fn test_default_config() {
        let config = ConfigFile::default();

        assert_eq!(config.capture.output_dir, PathBuf::from(DEFAULT_OUTPUT_DIR));
        assert_eq!(config.capture.interval, DEFAULT_INTERVAL_SECS);
        assert!(config.capture.viewer_url.is_none());
        assert_eq!(config.network.base_url, DEFAULT_BASE_URL);
        assert_eq!(config.network.timeout, 30);
        assert_eq!(config.network.max_concurrent, 8);
        assert_eq!(config.network.max_tiles, 100);
        assert!(!config.network.probe_swapped_axes);
    }

    #[test]
    fn test_load_nonexistent_returns_defaults() {
        let temp_dir = tempfile::TempDir::new().unwrap();
        let config_path = temp_dir.path().join("nonexistent.ini");

        let config = ConfigFile::load_from(&config_path).unwrap();
        assert_eq!(config, ConfigFile::default());
    }

    #[test]
    fn test_save_and_reload() {
        let temp_dir = tempfile::TempDir::new().unwrap();
        let config_path = temp_dir.path().join("nested").join("config.ini");

        let mut config = ConfigFile::default();
        config.capture.interval = 900;
        config.capture.viewer_url = Some("https://wplace.live/?lat=52.5&lng=13.4".to_string());
        config.capture.output_dir = temp_dir.path().join("shots");
        config.network.max_concurrent = 4;
        config.network.probe_swapped_axes = true;
        config.logging.file = temp_dir.path().join("log.txt");

        config.save_to(&config_path).unwrap();
        let loaded = ConfigFile::load_from(&config_path).unwrap();

        assert_eq!(loaded, config);
    }

    #[test]
    fn test_windows_paths_survive_reload() {
        let temp_dir = tempfile::TempDir::new().unwrap();
        let config_path = temp_dir.path().join("config.ini");

        let mut config = ConfigFile::default();
        config.capture.output_dir = PathBuf::from(r"C:\Users\me\shots");
        config.logging.file = PathBuf::from(r"D:\logs\marblesnap.log");

        config.save_to(&config_path).unwrap();
        let loaded = ConfigFile::load_from(&config_path).unwrap();

        assert_eq!(loaded.capture.output_dir, PathBuf::from(r"C:\Users\me\shots"));
        assert_eq!(loaded.logging.file, PathBuf::from(r"D:\logs\marblesnap.log"));
        assert_eq!(loaded.network.user_agent, ConfigFile::default().network.user_agent);
        assert_eq!(loaded, config);
    }

    #[test]
    fn test_durations_and_http_settings() {
        let mut config = ConfigFile::default();
        config.network.timeout = 12;
        config.network.user_agent = "test-agent".to_string();

        assert_eq!(config.timeout(), Duration::from_secs(12));
        assert_eq!(config.interval(), Duration::from_secs(3600));

        let http = config.http_settings();
        assert_eq!(http.timeout, Duration::from_secs(12));
        assert_eq!(http.user_agent, "test-agent");
    }

    #[test]
    fn test_config_paths() {
        assert!(config_file_path().ends_with(".marblesnap/config.ini"));
    }
}
