//! CLI error handling with user-friendly messages.
//!
//! Centralizes error reporting for the CLI with consistent formatting and
//! exit codes.

use std::fmt;
use std::process;

use marblesnap::config::ConfigFileError;
use marblesnap::coord::ParseError;
use marblesnap::output::OutputError;
use marblesnap::provider::ClientBuildError;
use marblesnap::session::CaptureError;
use marblesnap::timelapse::TimelapseError;

/// Exit code used when the operator interrupted the run.
const EXIT_INTERRUPTED: i32 = 130;

/// CLI-specific errors with user-friendly messages.
#[derive(Debug)]
pub enum CliError {
    /// Failed to initialize logging
    LoggingInit(String),
    /// Configuration problem outside the config file itself
    Config(String),
    /// Config file could not be read, parsed or written
    ConfigFile(ConfigFileError),
    /// Coordinate text could not be parsed
    Coordinates(ParseError),
    /// HTTP client construction failed
    HttpClient(ClientBuildError),
    /// Capture failed
    Capture(CaptureError),
    /// Capture could not be saved
    Output(OutputError),
    /// Timelapse could not be built
    Timelapse(TimelapseError),
    /// Interactive prompt failed (no TTY, I/O error)
    Prompt(String),
    /// Async runtime could not be started
    Runtime(String),
}

impl CliError {
    /// Exit the process with an appropriate error message and code.
    pub fn exit(&self) -> ! {
        if let CliError::Capture(e) = self {
            if e.is_cancelled() {
                eprintln!("Interrupted.");
                process::exit(EXIT_INTERRUPTED);
            }
        }

        eprintln!("Error: {}", self);

        match self {
            CliError::Coordinates(_) => {
                eprintln!();
                eprintln!("Copy coordinates from the Blue Marble overlay, for example:");
                eprintln!("  \"(Tl X: 1471, Tl Y: 923, Px X: 63, Px Y: 995)\"");
            }
            CliError::Capture(CaptureError::NoEndpointWorked { .. }) => {
                eprintln!();
                eprintln!("Common issues:");
                eprintln!("  1. The region is blank in every season: check the coordinates");
                eprintln!("  2. The tile server is unreachable: check your connection");
                eprintln!("  3. A custom base_url in config.ini points to the wrong server");
            }
            CliError::Capture(CaptureError::Composite { .. }) => {
                eprintln!();
                eprintln!("Reduce the region or raise max_tiles in the [network] section of config.ini.");
            }
            CliError::ConfigFile(_) => {
                eprintln!();
                eprintln!(
                    "Fix the value in {} or regenerate it with: marblesnap init --force",
                    marblesnap::config::config_file_path().display()
                );
            }
            _ => {}
        }

        process::exit(1)
    }
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CliError::LoggingInit(msg) => write!(f, "Failed to initialize logging: {}", msg),
            CliError::Config(msg) => write!(f, "Configuration error: {}", msg),
            CliError::ConfigFile(e) => write!(f, "{}", e),
            CliError::Coordinates(e) => write!(f, "Invalid coordinates: {}", e),
            CliError::HttpClient(e) => write!(f, "{}", e),
            CliError::Capture(e) => write!(f, "Capture failed: {}", e),
            CliError::Output(e) => write!(f, "Could not save capture: {}", e),
            CliError::Timelapse(e) => write!(f, "Timelapse failed: {}", e),
            CliError::Prompt(msg) => write!(f, "Input error: {}", msg),
            CliError::Runtime(msg) => write!(f, "Failed to start async runtime: {}", msg),
        }
    }
}

impl std::error::Error for CliError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            CliError::ConfigFile(e) => Some(e),
            CliError::Coordinates(e) => Some(e),
            CliError::HttpClient(e) => Some(e),
            CliError::Capture(e) => Some(e),
            CliError::Output(e) => Some(e),
            CliError::Timelapse(e) => Some(e),
            _ => None,
        }
    }
}

impl From<ConfigFileError> for CliError {
    fn from(e: ConfigFileError) -> Self {
        CliError::ConfigFile(e)
    }
}

impl From<ParseError> for CliError {
    fn from(e: ParseError) -> Self {
        CliError::Coordinates(e)
    }
}

impl From<ClientBuildError> for CliError {
    fn from(e: ClientBuildError) -> Self {
        CliError::HttpClient(e)
    }
}

impl From<CaptureError> for CliError {
    fn from(e: CaptureError) -> Self {
        CliError::Capture(e)
    }
}

impl From<OutputError> for CliError {
    fn from(e: OutputError) -> Self {
        CliError::Output(e)
    }
}

impl From<TimelapseError> for CliError {
    fn from(e: TimelapseError) -> Self {
        CliError::Timelapse(e)
    }
}
