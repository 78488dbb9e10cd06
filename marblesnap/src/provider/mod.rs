//! Tile server access
//!
//! This module resolves which tile dataset ("season") a capture should be
//! served from and downloads individual 1000×1000 map tiles.
//!
//! # Endpoint resolution
//!
//! The backend publishes several seasons under distinct path segments. The
//! [`RegionResolver`] turns a viewer URL into an ordered candidate list:
//!
//! ```
//! use marblesnap::provider::RegionResolver;
//!
//! let resolver = RegionResolver::default();
//! let endpoints = resolver.resolve_endpoints("https://wplace.live/?lat=48.85&lng=2.35&zoom=12");
//! assert_eq!(endpoints[0].season.to_string(), "s1"); // Europe
//! assert_eq!(endpoints.len(), 10);
//! ```
//!
//! # Fetching
//!
//! [`TileFetcher`] wraps a [`TileHttpClient`] and maps HTTP outcomes to
//! [`TileImage`] or [`FetchError`].

mod fetcher;
mod http;
mod resolver;
mod types;

pub use fetcher::TileFetcher;
pub use http::{
    HttpResponse, HttpSettings, ReqwestTileClient, TileHttpClient, DEFAULT_TIMEOUT_SECS,
    DEFAULT_USER_AGENT,
};
pub use resolver::{RegionResolver, DEFAULT_BASE_URL, KNOWN_SEASONS};
pub use types::{ClientBuildError, Endpoint, FetchError, FetchErrorKind, Season, TileImage};

#[cfg(test)]
pub use http::tests::{solid_png, MockReply, MockTileClient};
