//! Configuration for marblesnap.
//!
//! User settings live in `~/.marblesnap/config.ini`. A missing file means
//! defaults everywhere; a present file only needs the keys it overrides.
//!
//! - settings structs: [`settings`]
//! - defaults and constants: [`defaults`]
//! - INI → [`ConfigFile`]: `parser`
//! - [`ConfigFile`] → commented INI: `writer`

mod defaults;
mod file;
mod parser;
mod settings;
mod writer;

pub use defaults::{
    clamp_max_concurrent, default_log_file, DEFAULT_INTERVAL_SECS, DEFAULT_OUTPUT_DIR,
    DEFAULT_PROBE_SWAPPED_AXES,
};
pub use file::{config_directory, config_file_path, ConfigFileError};
pub use settings::{CaptureSettings, ConfigFile, LoggingSettings, NetworkSettings};
