//! Timelapse assembly.
//!
//! Turns a directory of captures into an animated GIF. Frames are taken in
//! filename order (the timestamped names sort chronologically), flattened
//! onto white, scaled to fit the first frame's size keeping aspect ratio
//! and centered.

use std::fs::File;
use std::io::BufWriter;
use std::path::{Path, PathBuf};
use std::time::Duration;

use image::codecs::gif::{GifEncoder, Repeat};
use image::imageops::{self, FilterType};
use image::{Delay, Frame, Rgba, RgbaImage};
use thiserror::Error;
use tracing::{debug, info, warn};

const FRAME_EXTENSIONS: [&str; 3] = ["png", "jpg", "jpeg"];

/// Errors building a timelapse.
#[derive(Debug, Error)]
pub enum TimelapseError {
    #[error("No .png/.jpg/.jpeg images found in {}", .dir.display())]
    NoImages { dir: PathBuf },

    #[error("Failed to read directory {}: {source}", .dir.display())]
    ReadDir {
        dir: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("seconds per image must be a positive number, got {0}")]
    InvalidDelay(f64),

    #[error("Failed to create {}: {source}", .path.display())]
    CreateOutput {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to encode timelapse: {0}")]
    Encode(#[from] image::ImageError),
}

/// Timelapse parameters.
#[derive(Debug, Clone, Copy)]
pub struct TimelapseOptions {
    /// How long each capture stays on screen
    pub seconds_per_image: f64,
}

impl Default for TimelapseOptions {
    fn default() -> Self {
        Self {
            seconds_per_image: 1.0,
        }
    }
}

/// What was written.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TimelapseSummary {
    pub frames: usize,
    pub skipped: Vec<PathBuf>,
    pub width: u32,
    pub height: u32,
}

/// Image files in `dir`, sorted by filename.
pub fn collect_frames(dir: &Path) -> Result<Vec<PathBuf>, TimelapseError> {
    let entries = std::fs::read_dir(dir).map_err(|source| TimelapseError::ReadDir {
        dir: dir.to_path_buf(),
        source,
    })?;

    let mut frames: Vec<PathBuf> = entries
        .filter_map(|entry| entry.ok().map(|e| e.path()))
        .filter(|path| path.is_file() && has_frame_extension(path))
        .collect();
    frames.sort_by(|a, b| a.file_name().cmp(&b.file_name()));
    Ok(frames)
}

fn has_frame_extension(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| FRAME_EXTENSIONS.contains(&e.to_ascii_lowercase().as_str()))
        .unwrap_or(false)
}

/// Flattens `img` onto white and scales it to fit a `width`×`height`
/// frame, centered.
pub fn fit_frame(img: &RgbaImage, width: u32, height: u32) -> RgbaImage {
    let mut canvas = RgbaImage::from_pixel(width, height, Rgba([255, 255, 255, 255]));
    if img.width() == 0 || img.height() == 0 {
        return canvas;
    }

    let scale = f64::min(
        width as f64 / img.width() as f64,
        height as f64 / img.height() as f64,
    );
    let new_w = ((img.width() as f64 * scale) as u32).clamp(1, width);
    let new_h = ((img.height() as f64 * scale) as u32).clamp(1, height);

    let resized;
    let scaled = if (new_w, new_h) == img.dimensions() {
        img
    } else {
        resized = imageops::resize(img, new_w, new_h, FilterType::Triangle);
        &resized
    };

    let x_offset = (width - new_w) / 2;
    let y_offset = (height - new_h) / 2;
    for (x, y, pixel) in scaled.enumerate_pixels() {
        let [r, g, b, a] = pixel.0;
        let alpha = a as u32;
        let blend = |c: u8| ((c as u32 * alpha + 255 * (255 - alpha) + 127) / 255) as u8;
        canvas.put_pixel(
            x + x_offset,
            y + y_offset,
            Rgba([blend(r), blend(g), blend(b), 255]),
        );
    }
    canvas
}

/// Builds an animated GIF from the images in `input_dir`.
///
/// Unreadable images are skipped. `progress` is called after each frame
/// with (frames done, frames total).
pub fn build_timelapse(
    input_dir: &Path,
    output: &Path,
    options: TimelapseOptions,
    mut progress: impl FnMut(usize, usize),
) -> Result<TimelapseSummary, TimelapseError> {
    let seconds = options.seconds_per_image;
    if !(seconds.is_finite() && seconds > 0.0) {
        return Err(TimelapseError::InvalidDelay(seconds));
    }
    let delay = Delay::from_saturating_duration(Duration::from_secs_f64(seconds));

    let paths = collect_frames(input_dir)?;
    if paths.is_empty() {
        return Err(TimelapseError::NoImages {
            dir: input_dir.to_path_buf(),
        });
    }
    info!(
        dir = %input_dir.display(),
        images = paths.len(),
        seconds_per_image = seconds,
        "Building timelapse"
    );

    let total = paths.len();
    // Created on the first readable frame so a failed run leaves no file.
    let mut encoder: Option<GifEncoder<BufWriter<File>>> = None;
    let mut size: Option<(u32, u32)> = None;
    let mut frames = 0;
    let mut skipped = Vec::new();

    for (index, path) in paths.into_iter().enumerate() {
        let img = match image::open(&path) {
            Ok(img) => img.to_rgba8(),
            Err(e) => {
                warn!(path = %path.display(), error = %e, "Skipping unreadable image");
                skipped.push(path);
                progress(index + 1, total);
                continue;
            }
        };

        if encoder.is_none() {
            encoder = Some(create_encoder(output)?);
        }
        let (width, height) = *size.get_or_insert(img.dimensions());
        let frame = fit_frame(&img, width, height);
        if let Some(encoder) = encoder.as_mut() {
            encoder.encode_frame(Frame::from_parts(frame, 0, 0, delay))?;
        }
        frames += 1;
        debug!(path = %path.display(), frame = frames, "Frame added");
        progress(index + 1, total);
    }

    let Some((width, height)) = size else {
        return Err(TimelapseError::NoImages {
            dir: input_dir.to_path_buf(),
        });
    };

    info!(
        output = %output.display(),
        frames,
        skipped = skipped.len(),
        width,
        height,
        "Timelapse saved"
    );
    Ok(TimelapseSummary {
        frames,
        skipped,
        width,
        height,
    })
}

fn create_encoder(output: &Path) -> Result<GifEncoder<BufWriter<File>>, TimelapseError> {
    let file = File::create(output).map_err(|source| TimelapseError::CreateOutput {
        path: output.to_path_buf(),
        source,
    })?;
    let mut encoder = GifEncoder::new(BufWriter::new(file));
    encoder.set_repeat(Repeat::Infinite)?;
    Ok(encoder)
}
