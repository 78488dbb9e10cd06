//! Single-tile fetching with status mapping and bounded retry.

use std::time::Duration;

use tracing::{debug, trace, warn};

use super::http::{HttpResponse, TileHttpClient};
use super::types::{Endpoint, FetchError, FetchErrorKind, TileImage};

/// Attempts per tile for retryable failures (first try plus one retry).
const MAX_ATTEMPTS: u32 = 2;

/// Fetches and decodes individual tiles from an [`Endpoint`].
///
/// HTTP outcomes map as follows:
///
/// | Response                | Result                      |
/// |-------------------------|-----------------------------|
/// | 2xx, decodable image    | `Ok(TileImage::Present)`    |
/// | 2xx, undecodable body   | `Err(Malformed)`            |
/// | 404                     | `Ok(TileImage::Absent)`     |
/// | other status            | `Err(ServerError)`          |
/// | transport error         | `Err(Network)` after retry  |
/// | no answer in `timeout`  | `Err(Timeout)` after retry  |
pub struct TileFetcher<C: TileHttpClient> {
    client: C,
    timeout: Duration,
    probe_swapped_axes: bool,
}

impl<C: TileHttpClient> TileFetcher<C> {
    /// Creates a fetcher bounding every request by `timeout`.
    pub fn new(client: C, timeout: Duration) -> Self {
        Self {
            client,
            timeout,
            probe_swapped_axes: false,
        }
    }

    /// On a 404, also try `{y}/{x}.png` before declaring the tile absent.
    ///
    /// Some older tile dumps were published with the axes transposed.
    pub fn with_swapped_axis_probe(mut self, enabled: bool) -> Self {
        self.probe_swapped_axes = enabled;
        self
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    pub fn client(&self) -> &C {
        &self.client
    }

    /// Fetches tile `(x, y)` from `endpoint`.
    pub async fn fetch_tile(
        &self,
        endpoint: &Endpoint,
        x: u32,
        y: u32,
    ) -> Result<TileImage, FetchError> {
        let url = endpoint.tile_url(x, y);
        match self.fetch_url(&url).await? {
            TileImage::Absent if self.probe_swapped_axes && x != y => {
                let swapped = endpoint.tile_url(y, x);
                debug!(url = %url, swapped = %swapped, "Tile absent, probing swapped axes");
                match self.fetch_url(&swapped).await {
                    Ok(image) => Ok(image),
                    Err(e) => {
                        debug!(url = %swapped, error = %e, "Swapped tile unavailable, keeping absent");
                        Ok(TileImage::Absent)
                    }
                }
            }
            image => Ok(image),
        }
    }

    async fn fetch_url(&self, url: &str) -> Result<TileImage, FetchError> {
        let mut attempt = 1;
        loop {
            match self.get_with_timeout(url).await {
                Ok(response) => return decode_response(url, response),
                Err(e) if e.is_retryable() && attempt < MAX_ATTEMPTS => {
                    warn!(url = url, attempt, error = %e, "Tile fetch failed, retrying");
                    attempt += 1;
                }
                Err(e) => return Err(e),
            }
        }
    }

    async fn get_with_timeout(&self, url: &str) -> Result<HttpResponse, FetchError> {
        trace!(url = url, timeout_ms = self.timeout.as_millis() as u64, "Fetching tile");
        match tokio::time::timeout(self.timeout, self.client.get(url)).await {
            Ok(result) => result,
            Err(_) => Err(FetchError::new(
                FetchErrorKind::Timeout,
                url,
                format!("no response within {}ms", self.timeout.as_millis()),
            )),
        }
    }
}

fn decode_response(url: &str, response: HttpResponse) -> Result<TileImage, FetchError> {
    match response.status {
        404 => {
            trace!(url = url, "Tile absent");
            Ok(TileImage::Absent)
        }
        status if response.is_success() => match image::load_from_memory(&response.body) {
            Ok(img) => {
                trace!(url = url, status, bytes = response.body.len(), "Tile decoded");
                Ok(TileImage::Present(img.to_rgba8()))
            }
            Err(e) => Err(FetchError::new(
                FetchErrorKind::Malformed,
                url,
                format!("undecodable body ({} bytes): {}", response.body.len(), e),
            )),
        },
        status => Err(FetchError::server(url, status)),
    }
}
