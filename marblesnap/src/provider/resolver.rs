//! Season/endpoint resolution from a viewer URL.
//!
//! wplace.live serves several seasons of tiles and the same tile index can
//! be blank in one and painted in another. The viewer URL usually tells us
//! where the user was looking (`lat`/`lng`) and sometimes which season
//! (`s`/`season`); everything else is covered by trying the remaining
//! seasons in a fixed order.

use reqwest::Url;
use tracing::{debug, info, warn};

use super::types::{Endpoint, Season};

/// Default tile backend.
pub const DEFAULT_BASE_URL: &str = "https://backend.wplace.live/files";

/// All seasons known to the backend, in fallback order.
pub const KNOWN_SEASONS: [Season; 10] = [
    Season(0),
    Season(1),
    Season(2),
    Season(3),
    Season(4),
    Season(5),
    Season(6),
    Season(7),
    Season(8),
    Season(9),
];

/// A static lat/lng bounding box mapped to the season that usually serves it.
struct RegionBox {
    name: &'static str,
    lat_min: f64,
    lat_max: f64,
    lng_min: f64,
    lng_max: f64,
    season: Season,
}

impl RegionBox {
    fn contains(&self, lat: f64, lng: f64) -> bool {
        (self.lat_min..=self.lat_max).contains(&lat) && (self.lng_min..=self.lng_max).contains(&lng)
    }
}

/// Checked in order; the first match wins.
const REGION_BOXES: [RegionBox; 3] = [
    RegionBox {
        name: "India",
        lat_min: 6.0,
        lat_max: 37.0,
        lng_min: 68.0,
        lng_max: 97.0,
        season: Season(0),
    },
    RegionBox {
        name: "Europe",
        lat_min: 35.0,
        lat_max: 71.0,
        lng_min: -10.0,
        lng_max: 40.0,
        season: Season(1),
    },
    RegionBox {
        name: "North America",
        lat_min: 15.0,
        lat_max: 72.0,
        lng_min: -168.0,
        lng_max: -52.0,
        season: Season(2),
    },
];

/// Maps viewer URLs to an ordered list of candidate endpoints.
///
/// The ordering is deterministic: the primary guess first, then every other
/// known season in [`KNOWN_SEASONS`] order, without duplicates.
#[derive(Debug, Clone)]
pub struct RegionResolver {
    base_url: String,
    seasons: Vec<Season>,
}

impl Default for RegionResolver {
    fn default() -> Self {
        Self::new(DEFAULT_BASE_URL)
    }
}

impl RegionResolver {
    /// Creates a resolver for the given tile backend.
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            seasons: KNOWN_SEASONS.to_vec(),
        }
    }

    /// Replaces the fallback season list.
    ///
    /// The first entry becomes the default when nothing in the URL points
    /// elsewhere.
    pub fn with_seasons(mut self, seasons: Vec<Season>) -> Self {
        self.seasons = seasons;
        self
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Picks the most likely season for a viewer URL.
    pub fn primary_season(&self, viewer_url: &str) -> Season {
        let default = self.seasons.first().copied().unwrap_or(Season(0));

        let Some(url) = parse_viewer_url(viewer_url) else {
            warn!(url = viewer_url, season = %default, "Could not parse viewer URL, using default season");
            return default;
        };

        let mut short = None;
        let mut long = None;
        let mut lat = None;
        let mut lng = None;
        for (key, value) in url.query_pairs() {
            match &*key {
                "s" => short = Some(value.into_owned()),
                "season" => long = Some(value.into_owned()),
                "lat" => lat = value.trim().parse::<f64>().ok(),
                "lng" => lng = value.trim().parse::<f64>().ok(),
                _ => {}
            }
        }

        // `s` wins over `season` regardless of position.
        for value in [short, long].into_iter().flatten() {
            match value.parse::<Season>() {
                Ok(season) => {
                    info!(season = %season, "Using season from viewer URL");
                    return season;
                }
                Err(_) => warn!(value = %value, "Ignoring unparseable season parameter"),
            }
        }

        let (Some(lat), Some(lng)) = (lat, lng) else {
            debug!(season = %default, "No lat/lng in viewer URL, using default season");
            return default;
        };

        match REGION_BOXES.iter().find(|b| b.contains(lat, lng)) {
            Some(region) => {
                info!(
                    lat,
                    lng,
                    region = region.name,
                    season = %region.season,
                    "Detected region from viewer URL"
                );
                region.season
            }
            None => {
                info!(lat, lng, season = %default, "Unknown region, using default season");
                default
            }
        }
    }

    /// Returns every candidate endpoint, most likely first.
    pub fn resolve_endpoints(&self, viewer_url: &str) -> Vec<Endpoint> {
        let primary = self.primary_season(viewer_url);

        std::iter::once(primary)
            .chain(self.seasons.iter().copied().filter(|s| *s != primary))
            .map(|season| Endpoint::new(self.base_url.clone(), season))
            .collect()
    }
}

/// Parses a viewer URL, tolerating a missing scheme (`wplace.live/?lat=..`).
fn parse_viewer_url(viewer_url: &str) -> Option<Url> {
    let trimmed = viewer_url.trim();
    if trimmed.is_empty() {
        return None;
    }
    Url::parse(trimmed)
        .or_else(|_| Url::parse(&format!("https://{}", trimmed)))
        .ok()
}
