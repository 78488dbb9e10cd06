//! marblesnap - periodic region captures of the wplace.live tile map
//!
//! The map is served as 1000×1000 PNG tiles addressed by the Blue Marble
//! coordinate scheme (tile index plus in-tile pixel). This library turns a
//! pair of copied coordinates into a pixel-exact image of the region between
//! them:
//!
//! 1. [`coord`] parses `(Tl X: .., Tl Y: .., Px X: .., Px Y: ..)` text
//! 2. [`provider`] picks the tile season and downloads tiles
//! 3. [`compositor`] stitches tiles and crops the region
//! 4. [`session`] ties these together with endpoint fallback
//!
//! [`schedule`], [`output`] and [`timelapse`] drive repeated captures,
//! persist them and turn them into an animation.
//!
//! ```ignore
//! use marblesnap::coord::parse_region;
//! use marblesnap::provider::{RegionResolver, ReqwestTileClient, TileFetcher};
//! use marblesnap::session::{CaptureContext, CaptureService};
//!
//! let region = parse_region(
//!     "(Tl X: 1471, Tl Y: 923, Px X: 63, Px Y: 995)",
//!     "(Tl X: 1472, Tl Y: 924, Px X: 10, Px Y: 40)",
//! )?;
//! let fetcher = TileFetcher::new(ReqwestTileClient::new()?, Duration::from_secs(30));
//! let service = CaptureService::new(fetcher, RegionResolver::default());
//! let capture = service
//!     .capture_once(&mut CaptureContext::new(), &region, "https://wplace.live/?lat=52.5&lng=13.4")
//!     .await?;
//! ```

pub mod compositor;
pub mod config;
pub mod coord;
pub mod logging;
pub mod output;
pub mod provider;
pub mod schedule;
pub mod session;
pub mod timelapse;

/// Version of the marblesnap library and CLI.
///
/// Defined in `Cargo.toml` and injected at compile time.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version_is_set() {
        assert!(!VERSION.is_empty());
        assert_eq!(VERSION.split('.').count(), 3);
    }
}
