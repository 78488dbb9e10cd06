//! Coordinate type definitions

use std::fmt;

use super::to_global;

/// Edge length of one map tile in pixels.
pub const TILE_SIZE: u32 = 1000;

/// Largest valid in-tile pixel offset.
pub const MAX_PIXEL: u32 = TILE_SIZE - 1;

/// An absolute pixel location on the tile grid.
///
/// Blue Marble reports positions as a tile index plus a pixel offset inside
/// that 1000×1000 tile. The pixel components are always in `0..=999`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TilePoint {
    /// Tile column (west to east)
    pub tile_x: u32,
    /// Tile row (north to south)
    pub tile_y: u32,
    /// Pixel column inside the tile (0-999)
    pub pixel_x: u32,
    /// Pixel row inside the tile (0-999)
    pub pixel_y: u32,
}

impl TilePoint {
    /// Creates a point, rejecting pixel offsets outside the tile.
    pub fn new(tile_x: u32, tile_y: u32, pixel_x: u32, pixel_y: u32) -> Result<Self, CoordError> {
        if pixel_x > MAX_PIXEL {
            return Err(CoordError::PixelOutOfRange {
                axis: 'x',
                value: pixel_x as u64,
            });
        }
        if pixel_y > MAX_PIXEL {
            return Err(CoordError::PixelOutOfRange {
                axis: 'y',
                value: pixel_y as u64,
            });
        }

        Ok(Self {
            tile_x,
            tile_y,
            pixel_x,
            pixel_y,
        })
    }

    /// Absolute horizontal pixel coordinate.
    #[inline]
    pub fn global_x(&self) -> u64 {
        to_global(self.tile_x, self.pixel_x)
    }

    /// Absolute vertical pixel coordinate.
    #[inline]
    pub fn global_y(&self) -> u64 {
        to_global(self.tile_y, self.pixel_y)
    }
}

impl fmt::Display for TilePoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "(Tl X: {}, Tl Y: {}, Px X: {}, Px Y: {})",
            self.tile_x, self.tile_y, self.pixel_x, self.pixel_y
        )
    }
}

/// A rectangular capture request between two corner points.
///
/// Both corners are inclusive. Use [`CaptureRegion::normalized`] before
/// doing geometry: users regularly paste the corners in the wrong order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CaptureRegion {
    pub start: TilePoint,
    pub end: TilePoint,
}

impl CaptureRegion {
    pub fn new(start: TilePoint, end: TilePoint) -> Self {
        Self { start, end }
    }

    /// Returns the region with corners swapped per axis so that `start` is
    /// the top-left and `end` the bottom-right pixel.
    pub fn normalized(&self) -> Self {
        let (left, right) = if self.start.global_x() <= self.end.global_x() {
            (self.start, self.end)
        } else {
            (self.end, self.start)
        };
        let (top, bottom) = if self.start.global_y() <= self.end.global_y() {
            (self.start, self.end)
        } else {
            (self.end, self.start)
        };

        Self {
            start: TilePoint {
                tile_x: left.tile_x,
                pixel_x: left.pixel_x,
                tile_y: top.tile_y,
                pixel_y: top.pixel_y,
            },
            end: TilePoint {
                tile_x: right.tile_x,
                pixel_x: right.pixel_x,
                tile_y: bottom.tile_y,
                pixel_y: bottom.pixel_y,
            },
        }
    }

    /// Returns true when the corners are already top-left / bottom-right.
    pub fn is_normalized(&self) -> bool {
        self.start.global_x() <= self.end.global_x() && self.start.global_y() <= self.end.global_y()
    }

    /// Width of the cropped output in pixels (inclusive of both corners).
    pub fn pixel_width(&self) -> u64 {
        let n = self.normalized();
        n.end.global_x() - n.start.global_x() + 1
    }

    /// Height of the cropped output in pixels (inclusive of both corners).
    pub fn pixel_height(&self) -> u64 {
        let n = self.normalized();
        n.end.global_y() - n.start.global_y() + 1
    }

    /// Tiles covering the normalized region.
    pub fn span(&self) -> TileGridSpan {
        let n = self.normalized();
        TileGridSpan {
            x_min: n.start.tile_x,
            x_max: n.end.tile_x,
            y_min: n.start.tile_y,
            y_max: n.end.tile_y,
        }
    }
}

impl fmt::Display for CaptureRegion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} to {}", self.start, self.end)
    }
}

/// Inclusive range of tile indices covering a region.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TileGridSpan {
    pub x_min: u32,
    pub x_max: u32,
    pub y_min: u32,
    pub y_max: u32,
}

impl TileGridSpan {
    /// Number of tile columns.
    #[inline]
    pub fn width(&self) -> u64 {
        (self.x_max - self.x_min) as u64 + 1
    }

    /// Number of tile rows.
    #[inline]
    pub fn height(&self) -> u64 {
        (self.y_max - self.y_min) as u64 + 1
    }

    #[inline]
    pub fn tile_count(&self) -> u64 {
        self.width() * self.height()
    }

    pub fn contains(&self, tile_x: u32, tile_y: u32) -> bool {
        (self.x_min..=self.x_max).contains(&tile_x) && (self.y_min..=self.y_max).contains(&tile_y)
    }

    /// Canvas dimensions in pixels, or `None` if they overflow `u32`.
    pub fn canvas_size(&self) -> Option<(u32, u32)> {
        let width = u32::try_from(self.width() * TILE_SIZE as u64).ok()?;
        let height = u32::try_from(self.height() * TILE_SIZE as u64).ok()?;
        Some((width, height))
    }

    /// Returns an iterator over all tiles in row-major order.
    pub fn tiles(&self) -> SpanTiles {
        SpanTiles {
            span: *self,
            next: Some((self.x_min, self.y_min)),
        }
    }
}

/// Iterator over the `(tile_x, tile_y)` pairs of a [`TileGridSpan`].
///
/// Yields row-major: every column of the first row, then the next row.
#[derive(Debug, Clone)]
pub struct SpanTiles {
    span: TileGridSpan,
    next: Option<(u32, u32)>,
}

impl Iterator for SpanTiles {
    type Item = (u32, u32);

    fn next(&mut self) -> Option<Self::Item> {
        let current = self.next?;
        let (x, y) = current;

        self.next = if x < self.span.x_max {
            Some((x + 1, y))
        } else if y < self.span.y_max {
            Some((self.span.x_min, y + 1))
        } else {
            None
        };

        Some(current)
    }
}

/// Errors that can occur when building coordinates.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CoordError {
    /// Pixel offset is outside the tile (0 to 999)
    PixelOutOfRange { axis: char, value: u64 },
}

impl fmt::Display for CoordError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CoordError::PixelOutOfRange { axis, value } => write!(
                f,
                "Pixel {} value {} is outside the tile (must be between 0 and {}); \
                 was a tile index pasted as a pixel value?",
                axis.to_ascii_uppercase(),
                value,
                MAX_PIXEL
            ),
        }
    }
}

impl std::error::Error for CoordError {}

#[cfg(test)]
mod tests {
    use super::*;

    fn point(tx: u32, ty: u32, px: u32, py: u32) -> TilePoint {
        TilePoint::new(tx, ty, px, py).unwrap()
    }

    #[test]
    fn test_global_coordinates() {
        let p = point(1470, 923, 900, 15);
        assert_eq!(p.global_x(), 1_470_900);
        assert_eq!(p.global_y(), 923_015);
    }

    #[test]
    fn test_new_rejects_pixel_x_1000() {
        let result = TilePoint::new(1, 1, 1000, 0);
        assert!(matches!(
            result,
            Err(CoordError::PixelOutOfRange {
                axis: 'x',
                value: 1000
            })
        ));
    }

    #[test]
    fn test_new_rejects_pixel_y_out_of_range() {
        let result = TilePoint::new(1, 1, 0, 1471);
        assert!(matches!(
            result,
            Err(CoordError::PixelOutOfRange { axis: 'y', .. })
        ));
    }

    #[test]
    fn test_display_matches_overlay_format() {
        let p = point(1471, 923, 63, 995);
        assert_eq!(p.to_string(), "(Tl X: 1471, Tl Y: 923, Px X: 63, Px Y: 995)");
    }

    #[test]
    fn test_normalized_keeps_ordered_region() {
        let region = CaptureRegion::new(point(1, 1, 10, 10), point(2, 2, 20, 20));
        assert!(region.is_normalized());
        assert_eq!(region.normalized(), region);
    }

    #[test]
    fn test_normalized_swaps_reversed_corners() {
        let start = point(2, 2, 20, 20);
        let end = point(1, 1, 10, 10);
        let normalized = CaptureRegion::new(start, end).normalized();

        assert_eq!(normalized.start, end);
        assert_eq!(normalized.end, start);
    }

    #[test]
    fn test_normalized_swaps_each_axis_independently() {
        // Top-right and bottom-left corners
        let region = CaptureRegion::new(point(5, 1, 100, 50), point(3, 4, 700, 900));
        let normalized = region.normalized();

        assert_eq!(normalized.start, point(3, 1, 700, 50));
        assert_eq!(normalized.end, point(5, 4, 100, 900));
        assert!(normalized.is_normalized());
    }

    #[test]
    fn test_pixel_size_is_inclusive() {
        let region = CaptureRegion::new(point(1470, 923, 900, 900), point(1470, 923, 999, 999));
        assert_eq!(region.pixel_width(), 100);
        assert_eq!(region.pixel_height(), 100);
    }

    #[test]
    fn test_single_point_region_is_one_pixel() {
        let p = point(7, 7, 7, 7);
        let region = CaptureRegion::new(p, p);
        assert_eq!(region.pixel_width(), 1);
        assert_eq!(region.pixel_height(), 1);
        assert_eq!(region.span().tile_count(), 1);
    }

    #[test]
    fn test_span_across_tiles() {
        let region = CaptureRegion::new(point(1470, 920, 500, 0), point(1472, 921, 10, 999));
        let span = region.span();

        assert_eq!(span.width(), 3);
        assert_eq!(span.height(), 2);
        assert_eq!(span.tile_count(), 6);
        assert_eq!(span.canvas_size(), Some((3000, 2000)));
    }

    #[test]
    fn test_span_of_reversed_region_matches_ordered() {
        let a = point(1470, 920, 500, 0);
        let b = point(1472, 921, 10, 999);
        assert_eq!(
            CaptureRegion::new(a, b).span(),
            CaptureRegion::new(b, a).span()
        );
    }

    #[test]
    fn test_span_tiles_row_major() {
        let span = TileGridSpan {
            x_min: 10,
            x_max: 11,
            y_min: 5,
            y_max: 6,
        };
        let tiles: Vec<_> = span.tiles().collect();
        assert_eq!(tiles, vec![(10, 5), (11, 5), (10, 6), (11, 6)]);
    }

    #[test]
    fn test_span_tiles_single() {
        let span = TileGridSpan {
            x_min: 3,
            x_max: 3,
            y_min: 9,
            y_max: 9,
        };
        assert_eq!(span.tiles().collect::<Vec<_>>(), vec![(3, 9)]);
    }

    #[test]
    fn test_span_contains() {
        let span = TileGridSpan {
            x_min: 10,
            x_max: 12,
            y_min: 5,
            y_max: 5,
        };
        assert!(span.contains(11, 5));
        assert!(!span.contains(13, 5));
        assert!(!span.contains(11, 6));
    }

    #[test]
    fn test_canvas_size_overflow() {
        let span = TileGridSpan {
            x_min: 0,
            x_max: 10_000_000,
            y_min: 0,
            y_max: 0,
        };
        assert_eq!(span.canvas_size(), None);
    }
}
