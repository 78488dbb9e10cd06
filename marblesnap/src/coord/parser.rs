//! Coordinate text parsing.
//!
//! Parses the coordinate strings that the Blue Marble overlay copies to the
//! clipboard:
//!
//! `(Tl X: 1471, Tl Y: 923, Px X: 63, Px Y: 995)`
//!
//! Bracket style, label order, label spelling (`Tl X`, `tile_x`, `PXY`)
//! and separators (commas or whitespace, optional `:`/`=`) are all
//! tolerated. Values are never clamped: a pixel value of 1000 or more is
//! rejected because it almost always means a tile index was pasted into a
//! pixel slot.

use regex::Regex;
use std::str::FromStr;
use std::sync::OnceLock;
use thiserror::Error;

use super::types::{CaptureRegion, CoordError, TilePoint};

/// Characters stripped before parsing.
const BRACKETS: &[char] = &['(', ')', '[', ']', '{', '}', '<', '>'];

/// Display names of the four fields, in storage order.
const FIELD_NAMES: [&str; 4] = ["Tl X", "Tl Y", "Px X", "Px Y"];

/// Error parsing coordinate text.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    /// Fewer than four labelled values were found
    #[error("Expected Tl X, Tl Y, Px X and Px Y; missing {}", .missing.join(", "))]
    MissingField { missing: Vec<&'static str> },

    /// A label did not name any known field
    #[error("Unrecognized coordinate label '{0}'")]
    UnknownLabel(String),

    /// A number appeared without a label in front of it
    #[error("Value '{0}' has no label (expected e.g. 'Tl X: {0}')")]
    UnlabeledValue(String),

    /// The same field was given twice
    #[error("Field '{0}' appears more than once")]
    DuplicateField(&'static str),

    /// Value is negative or does not fit the coordinate range
    #[error("Invalid value '{value}' for {field}")]
    InvalidNumber { field: &'static str, value: String },

    /// Pixel value outside the tile
    #[error(transparent)]
    OutOfRange(#[from] CoordError),
}

/// Label/value pair pattern.
///
/// - Group 1: optional label (letters, spaces, `_`, `.`)
/// - Group 2: signed integer value
fn field_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"(?i)([a-z][a-z _.]*)?[\s:=]*(-?\d+)").unwrap())
}

/// Maps a raw label to its field slot (0-3), or `None` if unrecognised.
fn field_index(label: &str) -> Option<usize> {
    let normalized: String = label
        .chars()
        .filter(|c| !matches!(c, ' ' | '_' | '.'))
        .flat_map(char::to_lowercase)
        .collect();

    let (base, axis) = if let Some(axis) = normalized
        .strip_prefix("tile")
        .or_else(|| normalized.strip_prefix("tl"))
    {
        (0, axis)
    } else if let Some(axis) = normalized
        .strip_prefix("pixel")
        .or_else(|| normalized.strip_prefix("px"))
    {
        (2, axis)
    } else {
        return None;
    };

    match axis {
        "x" => Some(base),
        "y" => Some(base + 1),
        _ => None,
    }
}

/// Parse one coordinate string into a [`TilePoint`].
///
/// # Examples
///
/// ```
/// use marblesnap::coord::parse_point;
///
/// let point = parse_point("(Tl X: 1471, Tl Y: 923, Px X: 63, Px Y: 995)").unwrap();
/// assert_eq!(point.tile_x, 1471);
/// assert_eq!(point.pixel_y, 995);
///
/// // Order and brackets don't matter
/// let same = parse_point("[Px Y: 995 Px X: 63 Tl Y: 923 Tl X: 1471]").unwrap();
/// assert_eq!(point, same);
/// ```
pub fn parse_point(text: &str) -> Result<TilePoint, ParseError> {
    let cleaned: String = text.chars().filter(|c| !BRACKETS.contains(c)).collect();

    let mut values: [Option<u64>; 4] = [None; 4];

    for captures in field_pattern().captures_iter(&cleaned) {
        let raw_value = &captures[2];

        let label = match captures.get(1) {
            Some(label) => label.as_str().trim(),
            None => return Err(ParseError::UnlabeledValue(raw_value.to_string())),
        };

        let index =
            field_index(label).ok_or_else(|| ParseError::UnknownLabel(label.to_string()))?;
        let field = FIELD_NAMES[index];

        if values[index].is_some() {
            return Err(ParseError::DuplicateField(field));
        }

        let value = raw_value
            .parse::<u64>()
            .map_err(|_| ParseError::InvalidNumber {
                field,
                value: raw_value.to_string(),
            })?;
        values[index] = Some(value);
    }

    let missing: Vec<&'static str> = values
        .iter()
        .zip(FIELD_NAMES)
        .filter(|(value, _)| value.is_none())
        .map(|(_, name)| name)
        .collect();
    if !missing.is_empty() {
        return Err(ParseError::MissingField { missing });
    }

    let [tile_x, tile_y, pixel_x, pixel_y] = values.map(Option::unwrap_or_default);

    // Pixel range is checked on the wide value so that e.g. 5_000_000_000
    // reports as out of range rather than as an overflow.
    for (axis, value) in [('x', pixel_x), ('y', pixel_y)] {
        if value > super::types::MAX_PIXEL as u64 {
            return Err(CoordError::PixelOutOfRange { axis, value }.into());
        }
    }

    let tile = |index: usize, value: u64| {
        u32::try_from(value).map_err(|_| ParseError::InvalidNumber {
            field: FIELD_NAMES[index],
            value: value.to_string(),
        })
    };

    Ok(TilePoint::new(
        tile(0, tile_x)?,
        tile(1, tile_y)?,
        pixel_x as u32,
        pixel_y as u32,
    )?)
}

/// Parse a start/end pair into a [`CaptureRegion`].
///
/// The corners are kept as given; the region is normalized where it is used.
pub fn parse_region(start: &str, end: &str) -> Result<CaptureRegion, ParseError> {
    Ok(CaptureRegion::new(parse_point(start)?, parse_point(end)?))
}

impl FromStr for TilePoint {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        parse_point(s)
    }
}
