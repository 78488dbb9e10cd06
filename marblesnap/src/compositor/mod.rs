//! Tile compositing and pixel-exact cropping
//!
//! Given a [`CaptureRegion`] and the tiles fetched for its span, the
//! compositor stitches every tile into one canvas covering the whole span
//! and crops the inclusive pixel rectangle between the two corners.
//!
//! ```text
//!   x_min*1000                         (x_max+1)*1000
//!   ┌────────────┬────────────┬────────────┐
//!   │ (x_min, y) │            │ (x_max, y) │
//!   │    ┌───────┼────────────┼──┐         │
//!   │    │ start │            │  │         │
//!   │    └───────┼────────────┼──┘ end     │
//!   └────────────┴────────────┴────────────┘
//! ```
//!
//! Absent tiles leave a transparent hole; they never shift neighbours.

use std::collections::HashMap;

use image::{imageops, RgbaImage};
use thiserror::Error;
use tracing::{debug, warn};

use crate::coord::{CaptureRegion, TileGridSpan, TILE_SIZE};
use crate::provider::TileImage;

/// Default upper bound on tiles per capture.
pub const DEFAULT_MAX_TILES: u64 = 100;

/// Errors that can occur while compositing a region.
#[derive(Debug, Error)]
pub enum CompositeError {
    /// No tile of the span was supplied at all
    #[error("No tiles available for region {region}")]
    EmptyRegion { region: CaptureRegion },

    /// The span exceeds the tile budget or the addressable canvas size
    #[error("Region {region} spans {tiles} tiles ({width}x{height}), limit is {max_tiles}")]
    RegionTooLarge {
        region: CaptureRegion,
        tiles: u64,
        width: u64,
        height: u64,
        max_tiles: u64,
    },
}

/// Stitches fetched tiles and crops to a region.
#[derive(Debug, Clone, Copy)]
pub struct Compositor {
    max_tiles: u64,
}

impl Default for Compositor {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_TILES)
    }
}

impl Compositor {
    pub fn new(max_tiles: u64) -> Self {
        Self {
            max_tiles: max_tiles.max(1),
        }
    }

    pub fn max_tiles(&self) -> u64 {
        self.max_tiles
    }

    /// Verifies that the region's span fits the tile budget and a `u32` canvas.
    ///
    /// Callers should check this before fetching anything.
    pub fn check_region(&self, region: &CaptureRegion) -> Result<TileGridSpan, CompositeError> {
        self.canvas_for(region).map(|(span, _, _)| span)
    }

    fn canvas_for(
        &self,
        region: &CaptureRegion,
    ) -> Result<(TileGridSpan, u32, u32), CompositeError> {
        let span = region.span();
        let too_large = || CompositeError::RegionTooLarge {
            region: *region,
            tiles: span.tile_count(),
            width: span.width(),
            height: span.height(),
            max_tiles: self.max_tiles,
        };

        if span.tile_count() > self.max_tiles {
            return Err(too_large());
        }
        let (width, height) = span.canvas_size().ok_or_else(too_large)?;
        Ok((span, width, height))
    }

    /// Places every tile of the region's span on one canvas.
    ///
    /// Tiles outside the span are ignored. Fails with `EmptyRegion` when
    /// `tiles` holds no entry for any tile of the span.
    pub fn assemble(
        &self,
        region: &CaptureRegion,
        tiles: &HashMap<(u32, u32), TileImage>,
    ) -> Result<CompositeCanvas, CompositeError> {
        let (span, width, height) = self.canvas_for(region)?;

        if !span.tiles().any(|key| tiles.contains_key(&key)) {
            return Err(CompositeError::EmptyRegion { region: *region });
        }

        let mut canvas = RgbaImage::new(width, height);

        let mut placed = 0usize;
        for (x, y) in span.tiles() {
            let Some(TileImage::Present(tile)) = tiles.get(&(x, y)) else {
                continue;
            };

            if tile.dimensions() != (TILE_SIZE, TILE_SIZE) {
                warn!(
                    tile_x = x,
                    tile_y = y,
                    width = tile.width(),
                    height = tile.height(),
                    "Tile has unexpected dimensions, placing clipped"
                );
            }

            let offset_x = (x - span.x_min) as i64 * TILE_SIZE as i64;
            let offset_y = (y - span.y_min) as i64 * TILE_SIZE as i64;
            imageops::replace(&mut canvas, tile, offset_x, offset_y);
            placed += 1;
        }

        debug!(
            region = %region,
            tiles = span.tile_count(),
            placed,
            width,
            height,
            "Canvas assembled"
        );

        Ok(CompositeCanvas {
            image: canvas,
            region: region.normalized(),
            span,
        })
    }

    /// Assembles and crops in one step.
    pub fn composite(
        &self,
        region: &CaptureRegion,
        tiles: &HashMap<(u32, u32), TileImage>,
    ) -> Result<RgbaImage, CompositeError> {
        Ok(self.assemble(region, tiles)?.crop())
    }
}

/// A full-span canvas produced by [`Compositor::assemble`].
#[derive(Debug, Clone)]
pub struct CompositeCanvas {
    image: RgbaImage,
    region: CaptureRegion,
    span: TileGridSpan,
}

impl CompositeCanvas {
    pub fn width(&self) -> u32 {
        self.image.width()
    }

    pub fn height(&self) -> u32 {
        self.image.height()
    }

    pub fn span(&self) -> TileGridSpan {
        self.span
    }

    pub fn image(&self) -> &RgbaImage {
        &self.image
    }

    /// Crops the inclusive pixel rectangle between the region's corners.
    pub fn crop(self) -> RgbaImage {
        let start = self.region.start;
        let left = start.global_x() - self.span.x_min as u64 * TILE_SIZE as u64;
        let top = start.global_y() - self.span.y_min as u64 * TILE_SIZE as u64;
        let width = self.region.pixel_width();
        let height = self.region.pixel_height();

        // The canvas covers the whole span, so all four fit in u32.
        imageops::crop_imm(
            &self.image,
            left as u32,
            top as u32,
            width as u32,
            height as u32,
        )
        .to_image()
    }
}

/// Composites `tiles` for `region` with the default tile budget.
pub fn composite(
    region: &CaptureRegion,
    tiles: &HashMap<(u32, u32), TileImage>,
) -> Result<RgbaImage, CompositeError> {
    Compositor::default().composite(region, tiles)
}
