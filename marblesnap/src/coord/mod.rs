//! Tile-grid coordinate module
//!
//! Provides the Blue Marble coordinate model (tile index + in-tile pixel
//! offset), region normalization, tile span math, and parsing of the
//! `(Tl X: .., Tl Y: .., Px X: .., Px Y: ..)` text copied from the map.

mod parser;
mod types;

pub use parser::{parse_point, parse_region, ParseError};
pub use types::{
    CaptureRegion, CoordError, SpanTiles, TileGridSpan, TilePoint, MAX_PIXEL, TILE_SIZE,
};

/// Converts a tile index and in-tile pixel offset to an absolute pixel
/// coordinate on the infinite grid.
#[inline]
pub fn to_global(tile: u32, pixel: u32) -> u64 {
    tile as u64 * TILE_SIZE as u64 + pixel as u64
}
