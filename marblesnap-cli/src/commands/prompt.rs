//! Interactive prompts for values missing from the command line.
//!
//! Each prompt re-asks until the input validates, so the watch loop never
//! starts with coordinates it cannot use.

use std::path::{Path, PathBuf};

use dialoguer::theme::ColorfulTheme;
use dialoguer::Input;

use marblesnap::coord::{parse_point, TilePoint};

use crate::error::CliError;

/// Host every viewer URL must point at.
pub const VIEWER_HOST: &str = "wplace.live";

/// Accepts any URL on the wplace.live host.
pub fn validate_viewer_url(input: &str) -> Result<(), String> {
    if input.trim().contains(VIEWER_HOST) {
        Ok(())
    } else {
        Err(format!("URL must be a {} link", VIEWER_HOST))
    }
}

/// Accepts text `parse_point` understands.
pub fn validate_point(input: &str) -> Result<(), String> {
    parse_point(input).map(|_| ()).map_err(|e| e.to_string())
}

/// Accepts a whole number of seconds greater than zero.
pub fn validate_interval(input: &str) -> Result<(), String> {
    match input.trim().parse::<u64>() {
        Ok(0) => Err("Interval must be at least 1 second".to_string()),
        Ok(_) => Ok(()),
        Err(_) => Err("Enter a whole number of seconds".to_string()),
    }
}

fn prompt_error(e: dialoguer::Error) -> CliError {
    CliError::Prompt(e.to_string())
}

/// Asks for the wplace.live URL used for season detection.
pub fn viewer_url(theme: &ColorfulTheme, default: &str) -> Result<String, CliError> {
    let url: String = Input::with_theme(theme)
        .with_prompt("wplace.live URL")
        .default(default.to_string())
        .validate_with(|input: &String| validate_viewer_url(input))
        .interact_text()
        .map_err(prompt_error)?;
    Ok(url.trim().to_string())
}

/// Asks for one corner of the region in Blue Marble text form.
pub fn point(theme: &ColorfulTheme, corner: &str) -> Result<TilePoint, CliError> {
    let text: String = Input::with_theme(theme)
        .with_prompt(format!("{} corner (Tl X, Tl Y, Px X, Px Y)", corner))
        .validate_with(|input: &String| validate_point(input))
        .interact_text()
        .map_err(prompt_error)?;
    Ok(parse_point(&text)?)
}

pub fn output_dir(theme: &ColorfulTheme, default: &Path) -> Result<PathBuf, CliError> {
    let dir: String = Input::with_theme(theme)
        .with_prompt("Output directory")
        .default(default.display().to_string())
        .interact_text()
        .map_err(prompt_error)?;
    Ok(PathBuf::from(dir.trim()))
}

pub fn interval(theme: &ColorfulTheme, default: u64) -> Result<u64, CliError> {
    let secs: String = Input::with_theme(theme)
        .with_prompt("Seconds between captures")
        .default(default.to_string())
        .validate_with(|input: &String| validate_interval(input))
        .interact_text()
        .map_err(prompt_error)?;
    secs.trim()
        .parse()
        .map_err(|_| CliError::Prompt(format!("Invalid interval '{}'", secs)))
}
