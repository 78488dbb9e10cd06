//! Capture persistence.
//!
//! Each capture is written as `screenshot_YYYY-MM-DD_HH-MM-SS.png` (local
//! time) into the output directory. The directory must already exist;
//! [`ensure_output_dir`] creates it.

use std::path::{Path, PathBuf};

use chrono::{DateTime, Local, TimeZone};
use image::{ImageFormat, RgbaImage};
use thiserror::Error;
use tracing::info;

/// Filename prefix of saved captures.
pub const SCREENSHOT_PREFIX: &str = "screenshot_";

/// strftime pattern of the timestamp part.
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d_%H-%M-%S";

/// Errors saving a capture.
#[derive(Debug, Error)]
pub enum OutputError {
    #[error("Output directory {path} does not exist")]
    MissingDirectory { path: PathBuf },

    #[error("Failed to create output directory {path}: {source}")]
    CreateDirectory {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to write {path}: {source}")]
    Encode {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },
}

/// Creates `dir` and its parents if missing.
pub fn ensure_output_dir(dir: &Path) -> Result<(), OutputError> {
    std::fs::create_dir_all(dir).map_err(|source| OutputError::CreateDirectory {
        path: dir.to_path_buf(),
        source,
    })
}

/// Filename for a capture taken at `timestamp`.
pub fn screenshot_filename<Tz: TimeZone>(timestamp: &DateTime<Tz>) -> String
where
    Tz::Offset: std::fmt::Display,
{
    format!(
        "{}{}.png",
        SCREENSHOT_PREFIX,
        timestamp.format(TIMESTAMP_FORMAT)
    )
}

/// Saves `image` into `dir` stamped with the current local time.
pub fn save_capture(image: &RgbaImage, dir: &Path) -> Result<PathBuf, OutputError> {
    save_capture_at(image, dir, &Local::now())
}

/// Saves `image` into `dir` stamped with `timestamp`.
///
/// A second capture within the same second gets a `_2`, `_3`, ... suffix
/// rather than overwriting the first.
pub fn save_capture_at<Tz: TimeZone>(
    image: &RgbaImage,
    dir: &Path,
    timestamp: &DateTime<Tz>,
) -> Result<PathBuf, OutputError>
where
    Tz::Offset: std::fmt::Display,
{
    if !dir.is_dir() {
        return Err(OutputError::MissingDirectory {
            path: dir.to_path_buf(),
        });
    }

    let path = unique_path(dir, &screenshot_filename(timestamp));
    image
        .save_with_format(&path, ImageFormat::Png)
        .map_err(|source| OutputError::Encode {
            path: path.clone(),
            source,
        })?;

    info!(
        path = %path.display(),
        width = image.width(),
        height = image.height(),
        "Screenshot saved"
    );
    Ok(path)
}

fn unique_path(dir: &Path, filename: &str) -> PathBuf {
    let candidate = dir.join(filename);
    if !candidate.exists() {
        return candidate;
    }

    let stem = filename.trim_end_matches(".png");
    (2..)
        .map(|n| dir.join(format!("{}_{}.png", stem, n)))
        .find(|p| !p.exists())
        .unwrap_or(candidate)
}
