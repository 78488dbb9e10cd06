//! Provider types and errors

use std::fmt;

use image::RgbaImage;
use thiserror::Error;

/// A tile dataset published under its own path segment (`s0`, `s1`, ...).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Season(pub u32);

impl fmt::Display for Season {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "s{}", self.0)
    }
}

impl std::str::FromStr for Season {
    type Err = std::num::ParseIntError;

    /// Accepts both `1` and `s1`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        let digits = s
            .strip_prefix('s')
            .or_else(|| s.strip_prefix('S'))
            .unwrap_or(s);
        digits.parse().map(Season)
    }
}

/// A concrete (base URL, season) pair identifying one fetchable tile set.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Endpoint {
    pub base_url: String,
    pub season: Season,
}

impl Endpoint {
    pub fn new(base_url: impl Into<String>, season: Season) -> Self {
        Self {
            base_url: base_url.into(),
            season,
        }
    }

    /// The path segment naming this endpoint's season (e.g. `s0`).
    pub fn season_id(&self) -> String {
        self.season.to_string()
    }

    /// URL of one tile: `{base}/{season}/tiles/{x}/{y}.png`.
    pub fn tile_url(&self, tile_x: u32, tile_y: u32) -> String {
        format!(
            "{}/{}/tiles/{}/{}.png",
            self.base_url.trim_end_matches('/'),
            self.season,
            tile_x,
            tile_y
        )
    }
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.base_url.trim_end_matches('/'), self.season)
    }
}

/// Result of fetching one tile.
#[derive(Debug, Clone, PartialEq)]
pub enum TileImage {
    /// Decoded tile bitmap (nominally 1000×1000)
    Present(RgbaImage),
    /// The server has no data for this tile; rendered as transparent
    Absent,
}

impl TileImage {
    pub fn is_present(&self) -> bool {
        matches!(self, TileImage::Present(_))
    }
}

/// Category of a tile fetch failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FetchErrorKind {
    /// Connection could not be made or was dropped
    Network,
    /// No response within the per-fetch timeout
    Timeout,
    /// Non-404 error status from the server
    ServerError,
    /// Response body was not a decodable image
    Malformed,
}

impl FetchErrorKind {
    /// Whether a failure of this kind is worth one more attempt.
    pub fn is_retryable(&self) -> bool {
        matches!(self, FetchErrorKind::Network | FetchErrorKind::Timeout)
    }
}

impl fmt::Display for FetchErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            FetchErrorKind::Network => "network error",
            FetchErrorKind::Timeout => "timeout",
            FetchErrorKind::ServerError => "server error",
            FetchErrorKind::Malformed => "malformed tile",
        };
        f.write_str(name)
    }
}

/// Error fetching a single tile.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{kind} for {url}: {detail}")]
pub struct FetchError {
    pub kind: FetchErrorKind,
    pub url: String,
    pub detail: String,
}

impl FetchError {
    pub fn new(kind: FetchErrorKind, url: impl Into<String>, detail: impl Into<String>) -> Self {
        Self {
            kind,
            url: url.into(),
            detail: detail.into(),
        }
    }

    pub fn server(url: impl Into<String>, status: u16) -> Self {
        Self::new(FetchErrorKind::ServerError, url, format!("HTTP {}", status))
    }

    pub fn is_retryable(&self) -> bool {
        self.kind.is_retryable()
    }
}

/// The HTTP client could not be constructed.
#[derive(Debug, Error)]
#[error("Failed to create HTTP client: {0}")]
pub struct ClientBuildError(pub String);
