//! Capture orchestration: endpoint fallback, bounded concurrent fetching,
//! compositing.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Instant;

use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use super::types::{Capture, CaptureContext, CaptureError, CaptureStats, SessionState};
use crate::compositor::Compositor;
use crate::coord::{CaptureRegion, TileGridSpan};
use crate::provider::{
    Endpoint, FetchError, FetchErrorKind, RegionResolver, TileFetcher, TileHttpClient, TileImage,
};

/// Default number of tile fetches in flight per capture.
pub const DEFAULT_MAX_CONCURRENT: usize = 8;

/// Upper bound accepted for `max_concurrent`.
pub const MAX_CONCURRENT_LIMIT: usize = 64;

/// Long-lived capture service.
///
/// Owns the fetcher, the endpoint resolver and the fetch limiter. A new
/// [`CaptureSession`] is created from it for every capture.
pub struct CaptureService<C: TileHttpClient + 'static> {
    fetcher: Arc<TileFetcher<C>>,
    resolver: RegionResolver,
    compositor: Compositor,
    limiter: Arc<Semaphore>,
    max_concurrent: usize,
    cancel: CancellationToken,
}

impl<C: TileHttpClient + 'static> CaptureService<C> {
    pub fn new(fetcher: TileFetcher<C>, resolver: RegionResolver) -> Self {
        Self {
            fetcher: Arc::new(fetcher),
            resolver,
            compositor: Compositor::default(),
            limiter: Arc::new(Semaphore::new(DEFAULT_MAX_CONCURRENT)),
            max_concurrent: DEFAULT_MAX_CONCURRENT,
            cancel: CancellationToken::new(),
        }
    }

    /// Sets the fetch concurrency, clamped to `1..=64`.
    pub fn with_max_concurrent(mut self, max_concurrent: usize) -> Self {
        let bounded = max_concurrent.clamp(1, MAX_CONCURRENT_LIMIT);
        if bounded != max_concurrent {
            warn!(
                requested = max_concurrent,
                using = bounded,
                "max_concurrent out of range, clamping"
            );
        }
        self.max_concurrent = bounded;
        self.limiter = Arc::new(Semaphore::new(bounded));
        self
    }

    pub fn with_compositor(mut self, compositor: Compositor) -> Self {
        self.compositor = compositor;
        self
    }

    /// Uses `token` for cancellation instead of a private one.
    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancel = token;
        self
    }

    pub fn fetcher(&self) -> &TileFetcher<C> {
        &self.fetcher
    }

    pub fn resolver(&self) -> &RegionResolver {
        &self.resolver
    }

    pub fn max_concurrent(&self) -> usize {
        self.max_concurrent
    }

    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    /// Starts a session bound to `context`.
    pub fn session<'a>(&'a self, context: &'a mut CaptureContext) -> CaptureSession<'a, C> {
        CaptureSession {
            service: self,
            context,
            history: vec![SessionState::ResolvingEndpoint],
        }
    }

    /// Runs one capture in a fresh session.
    pub async fn capture_once(
        &self,
        context: &mut CaptureContext,
        region: &CaptureRegion,
        viewer_url: &str,
    ) -> Result<Capture, CaptureError> {
        self.session(context).capture_once(region, viewer_url).await
    }

    /// Cached endpoint first, then the resolver's order, without duplicates.
    fn candidates(&self, context: &CaptureContext, viewer_url: &str) -> Vec<Endpoint> {
        let mut candidates: Vec<Endpoint> = context.cached_endpoint().cloned().into_iter().collect();
        for endpoint in self.resolver.resolve_endpoints(viewer_url) {
            if !candidates.contains(&endpoint) {
                candidates.push(endpoint);
            }
        }
        candidates
    }
}

/// Outcome of fetching a whole span from one endpoint.
struct AttemptOutcome {
    tiles: HashMap<(u32, u32), TileImage>,
    present: usize,
    absent: usize,
    failed: usize,
}

/// One capture, from endpoint resolution to the cropped image.
///
/// ```text
/// ResolvingEndpoint ──► FetchingTiles ──► Compositing ──► Done
///        ▲                    │
///        └──── Retrying ◄─────┘  (span entirely absent or failed)
/// ```
pub struct CaptureSession<'a, C: TileHttpClient + 'static> {
    service: &'a CaptureService<C>,
    context: &'a mut CaptureContext,
    history: Vec<SessionState>,
}

impl<'a, C: TileHttpClient + 'static> CaptureSession<'a, C> {
    /// Current state.
    pub fn state(&self) -> &SessionState {
        // history always holds the initial state
        &self.history[self.history.len() - 1]
    }

    /// Every state visited so far, in order.
    pub fn history(&self) -> &[SessionState] {
        &self.history
    }

    fn transition(&mut self, next: SessionState) {
        debug!(from = %self.state(), to = %next, "Session state change");
        self.history.push(next);
    }

    /// Captures `region`, falling back across endpoints as needed.
    ///
    /// On success the serving endpoint is cached in the session's
    /// [`CaptureContext`]; when every endpoint fails the cache is cleared.
    pub async fn capture_once(
        &mut self,
        region: &CaptureRegion,
        viewer_url: &str,
    ) -> Result<Capture, CaptureError> {
        let started = Instant::now();
        let service = self.service;
        let mut tried: Vec<Endpoint> = Vec::new();

        let span = match service.compositor.check_region(region) {
            Ok(span) => span,
            Err(source) => {
                self.transition(SessionState::Failed);
                return Err(CaptureError::Composite {
                    region: *region,
                    tried,
                    source,
                });
            }
        };

        let candidates = service.candidates(self.context, viewer_url);
        info!(
            region = %region,
            tiles = span.tile_count(),
            candidates = candidates.len(),
            "Starting capture"
        );

        for endpoint in candidates {
            if service.cancel.is_cancelled() {
                self.transition(SessionState::Failed);
                return Err(CaptureError::Cancelled {
                    region: *region,
                    tried,
                });
            }

            if !matches!(self.state(), SessionState::ResolvingEndpoint) {
                self.transition(SessionState::ResolvingEndpoint);
            }
            tried.push(endpoint.clone());
            self.transition(SessionState::FetchingTiles {
                endpoint: endpoint.clone(),
            });

            let outcome = match self.fetch_span(&endpoint, span).await {
                Some(outcome) => outcome,
                None => {
                    self.transition(SessionState::Failed);
                    return Err(CaptureError::Cancelled {
                        region: *region,
                        tried,
                    });
                }
            };

            if outcome.present == 0 {
                info!(
                    endpoint = %endpoint,
                    absent = outcome.absent,
                    failed = outcome.failed,
                    "Endpoint has no tiles for region, trying next"
                );
                self.transition(SessionState::Retrying { endpoint });
                continue;
            }

            if outcome.failed > 0 {
                warn!(
                    endpoint = %endpoint,
                    failed = outcome.failed,
                    "Some tiles failed, leaving them transparent"
                );
            }

            self.transition(SessionState::Compositing);
            let image = match service.compositor.composite(region, &outcome.tiles) {
                Ok(image) => image,
                Err(source) => {
                    self.transition(SessionState::Failed);
                    return Err(CaptureError::Composite {
                        region: *region,
                        tried,
                        source,
                    });
                }
            };

            let stats = CaptureStats {
                tiles_total: span.tile_count() as usize,
                tiles_present: outcome.present,
                tiles_absent: outcome.absent,
                tiles_failed: outcome.failed,
                elapsed: started.elapsed(),
            };
            info!(
                endpoint = %endpoint,
                width = image.width(),
                height = image.height(),
                present = stats.tiles_present,
                absent = stats.tiles_absent,
                failed = stats.tiles_failed,
                elapsed_ms = stats.elapsed.as_millis() as u64,
                "Capture complete"
            );

            self.context.remember(endpoint.clone());
            self.transition(SessionState::Done);
            return Ok(Capture {
                image,
                endpoint,
                endpoints_tried: tried,
                stats,
            });
        }

        self.context.clear();
        self.transition(SessionState::Failed);
        Err(CaptureError::NoEndpointWorked {
            region: *region,
            tried,
        })
    }

    /// Fetches every tile of `span` concurrently.
    ///
    /// Returns `None` if cancelled; outstanding fetches are aborted.
    async fn fetch_span(&self, endpoint: &Endpoint, span: TileGridSpan) -> Option<AttemptOutcome> {
        let service = self.service;
        let mut set = JoinSet::new();

        for (x, y) in span.tiles() {
            let fetcher = Arc::clone(&service.fetcher);
            let limiter = Arc::clone(&service.limiter);
            let endpoint = endpoint.clone();
            set.spawn(async move {
                let result = match limiter.acquire_owned().await {
                    Ok(_permit) => fetcher.fetch_tile(&endpoint, x, y).await,
                    Err(_) => Err(FetchError::new(
                        FetchErrorKind::Network,
                        endpoint.tile_url(x, y),
                        "fetch limiter closed",
                    )),
                };
                ((x, y), result)
            });
        }

        let mut outcome = AttemptOutcome {
            tiles: HashMap::with_capacity(span.tile_count() as usize),
            present: 0,
            absent: 0,
            failed: 0,
        };

        loop {
            tokio::select! {
                biased;

                _ = service.cancel.cancelled() => {
                    info!(endpoint = %endpoint, "Capture cancelled, aborting outstanding fetches");
                    set.abort_all();
                    return None;
                }

                joined = set.join_next() => match joined {
                    None => break,
                    Some(Ok((key, Ok(tile)))) => {
                        if tile.is_present() {
                            outcome.present += 1;
                        } else {
                            outcome.absent += 1;
                        }
                        outcome.tiles.insert(key, tile);
                    }
                    Some(Ok(((x, y), Err(e)))) => {
                        warn!(tile_x = x, tile_y = y, error = %e, "Tile fetch failed");
                        outcome.failed += 1;
                    }
                    Some(Err(e)) => {
                        warn!(error = %e, "Tile fetch task failed");
                        outcome.failed += 1;
                    }
                },
            }
        }

        debug!(
            endpoint = %endpoint,
            present = outcome.present,
            absent = outcome.absent,
            failed = outcome.failed,
            "Span fetched"
        );
        Some(outcome)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::coord::TilePoint;
    use crate::provider::{MockReply, MockTileClient, Season};
    use std::time::Duration;

    const BASE: &str = "http://tiles.test/files";
    const DEFAULT_URL: &str = "https://wplace.live/";
    const EUROPE_URL: &str = "https://wplace.live/?lat=52.52&lng=13.40";

    fn point(tile_x: u32, tile_y: u32, pixel_x: u32, pixel_y: u32) -> TilePoint {
        TilePoint::new(tile_x, tile_y, pixel_x, pixel_y).unwrap()
    }

    fn single_tile_region() -> CaptureRegion {
        CaptureRegion::new(point(1470, 923, 100, 200), point(1470, 923, 199, 299))
    }

    fn prefix(season: u32) -> String {
        format!("{}/s{}/", BASE, season)
    }

    fn service(mock: MockTileClient, seasons: &[u32]) -> CaptureService<MockTileClient> {
        let resolver = RegionResolver::new(BASE)
            .with_seasons(seasons.iter().copied().map(Season).collect());
        CaptureService::new(TileFetcher::new(mock, Duration::from_secs(5)), resolver)
    }

    fn season_list(endpoints: &[Endpoint]) -> Vec<u32> {
        endpoints.iter().map(|e| e.season.0).collect()
    }

    #[tokio::test]
    async fn test_capture_from_primary_endpoint() {
        let mock = MockTileClient::new().route_prefix(&prefix(1), MockReply::png([50, 60, 70, 255]));
        let service = service(mock, &[0, 1, 2]);
        let mut ctx = CaptureContext::new();

        let mut session = service.session(&mut ctx);
        let capture = session
            .capture_once(&single_tile_region(), EUROPE_URL)
            .await
            .unwrap();

        assert_eq!(capture.image.dimensions(), (100, 100));
        assert_eq!(capture.image.get_pixel(0, 0).0, [50, 60, 70, 255]);
        assert_eq!(capture.endpoint.season, Season(1));
        assert_eq!(season_list(&capture.endpoints_tried), vec![1]);
        assert_eq!(capture.stats.tiles_total, 1);
        assert_eq!(capture.stats.tiles_present, 1);
        assert_eq!(
            session.history(),
            &[
                SessionState::ResolvingEndpoint,
                SessionState::FetchingTiles {
                    endpoint: capture.endpoint.clone()
                },
                SessionState::Compositing,
                SessionState::Done,
            ]
        );
        assert_eq!(ctx.cached_endpoint(), Some(&capture.endpoint));
    }

    #[tokio::test]
    async fn test_all_absent_endpoint_falls_back_to_next() {
        // s0 answers 404 for everything, s1 has the tiles.
        let mock = MockTileClient::new().route_prefix(&prefix(1), MockReply::png([1, 2, 3, 255]));
        let service = service(mock, &[0, 1, 2]);
        let mut ctx = CaptureContext::new();
        let region = CaptureRegion::new(point(10, 10, 0, 0), point(11, 10, 999, 999));

        let mut session = service.session(&mut ctx);
        let capture = session.capture_once(&region, DEFAULT_URL).await.unwrap();

        assert_eq!(capture.endpoint.season, Season(1));
        assert_eq!(season_list(&capture.endpoints_tried), vec![0, 1]);
        assert!(session
            .history()
            .iter()
            .any(|s| matches!(s, SessionState::Retrying { .. })));

        // Every s0 request happened before the first s1 request.
        let requests = service.fetcher().client().requests();
        let first_s1 = requests
            .iter()
            .position(|u| u.starts_with(&prefix(1)))
            .unwrap();
        assert_eq!(first_s1, 2);
        assert!(requests[..first_s1].iter().all(|u| u.starts_with(&prefix(0))));
        assert!(requests.iter().all(|u| !u.starts_with(&prefix(2))));
    }

    #[tokio::test]
    async fn test_all_failing_endpoint_falls_back_to_next() {
        let mock = MockTileClient::new()
            .route_prefix(&prefix(0), MockReply::Status(500, Vec::new()))
            .route_prefix(&prefix(1), MockReply::png([1, 2, 3, 255]));
        let service = service(mock, &[0, 1]);
        let mut ctx = CaptureContext::new();

        let capture = service
            .capture_once(&mut ctx, &single_tile_region(), DEFAULT_URL)
            .await
            .unwrap();
        assert_eq!(capture.endpoint.season, Season(1));
    }

    #[tokio::test]
    async fn test_no_endpoint_worked() {
        let service = service(MockTileClient::new(), &[0, 1]);
        let mut ctx = CaptureContext::new();
        ctx.remember(Endpoint::new(BASE, Season(1)));

        let err = service
            .capture_once(&mut ctx, &single_tile_region(), DEFAULT_URL)
            .await
            .unwrap_err();

        match &err {
            CaptureError::NoEndpointWorked { tried, .. } => {
                assert_eq!(season_list(tried), vec![1, 0]);
            }
            other => panic!("unexpected error: {other}"),
        }
        let msg = err.to_string();
        assert!(msg.contains("Tl X: 1470"));
        assert!(msg.contains("/s0"));
        assert!(ctx.cached_endpoint().is_none());
    }

    #[tokio::test]
    async fn test_cached_endpoint_tried_first() {
        let mock = MockTileClient::new()
            .route_prefix(&prefix(0), MockReply::png([0, 0, 0, 255]))
            .route_prefix(&prefix(2), MockReply::png([2, 2, 2, 255]));
        let service = service(mock, &[0, 1, 2]);
        let mut ctx = CaptureContext::new();
        ctx.remember(Endpoint::new(BASE, Season(2)));

        let capture = service
            .capture_once(&mut ctx, &single_tile_region(), DEFAULT_URL)
            .await
            .unwrap();

        assert_eq!(capture.endpoint.season, Season(2));
        assert_eq!(season_list(&capture.endpoints_tried), vec![2]);
        assert!(service.fetcher().client().requests()[0].starts_with(&prefix(2)));
    }

    #[tokio::test]
    async fn test_partial_failure_leaves_hole() {
        let region = CaptureRegion::new(point(0, 0, 0, 0), point(1, 0, 999, 0));
        let endpoint = Endpoint::new(BASE, Season(0));
        let mock = MockTileClient::new()
            .route(&endpoint.tile_url(0, 0), MockReply::png([9, 9, 9, 255]))
            .route(&endpoint.tile_url(1, 0), MockReply::Status(503, Vec::new()));
        let service = service(mock, &[0]);
        let mut ctx = CaptureContext::new();

        let capture = service
            .capture_once(&mut ctx, &region, DEFAULT_URL)
            .await
            .unwrap();

        assert_eq!(capture.stats.tiles_present, 1);
        assert_eq!(capture.stats.tiles_failed, 1);
        assert_eq!(capture.image.get_pixel(0, 0).0, [9, 9, 9, 255]);
        assert_eq!(capture.image.get_pixel(1500, 0).0, [0, 0, 0, 0]);
    }

    #[tokio::test]
    async fn test_region_too_large_fetches_nothing() {
        let region = CaptureRegion::new(point(0, 0, 0, 0), point(20, 20, 0, 0));
        let service = service(MockTileClient::new(), &[0]).with_compositor(Compositor::new(100));
        let mut ctx = CaptureContext::new();

        let err = service
            .capture_once(&mut ctx, &region, DEFAULT_URL)
            .await
            .unwrap_err();

        assert!(matches!(err, CaptureError::Composite { .. }));
        assert!(service.fetcher().client().requests().is_empty());
    }

    #[tokio::test]
    async fn test_cancelled_before_start() {
        let service = service(MockTileClient::new(), &[0, 1]);
        service.cancellation_token().cancel();
        let mut ctx = CaptureContext::new();

        let err = service
            .capture_once(&mut ctx, &single_tile_region(), DEFAULT_URL)
            .await
            .unwrap_err();

        assert!(err.is_cancelled());
        assert!(service.fetcher().client().requests().is_empty());
    }

    #[tokio::test]
    async fn test_cancelled_while_fetching() {
        let mock = MockTileClient::new().fallback(MockReply::Hang);
        let token = CancellationToken::new();
        let service = service(mock, &[0, 1]).with_cancellation(token.clone());
        let mut ctx = CaptureContext::new();

        let canceller = tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(50)).await;
            token.cancel();
        });

        let err = service
            .capture_once(&mut ctx, &single_tile_region(), DEFAULT_URL)
            .await
            .unwrap_err();
        canceller.await.unwrap();

        assert!(err.is_cancelled());
        assert_eq!(season_list(err.endpoints_tried()), vec![0]);
    }

    #[tokio::test]
    async fn test_concurrency_bound_still_fetches_everything() {
        let region = CaptureRegion::new(point(0, 0, 0, 0), point(3, 2, 999, 999));
        let mock = MockTileClient::new().route_prefix(&prefix(0), MockReply::png([4, 4, 4, 255]));
        let service = service(mock, &[0]).with_max_concurrent(2);
        let mut ctx = CaptureContext::new();

        let capture = service
            .capture_once(&mut ctx, &region, DEFAULT_URL)
            .await
            .unwrap();

        assert_eq!(capture.stats.tiles_total, 12);
        assert_eq!(capture.stats.tiles_present, 12);
        assert_eq!(service.fetcher().client().requests().len(), 12);
    }

    #[test]
    fn test_max_concurrent_is_clamped() {
        let low = service(MockTileClient::new(), &[0]).with_max_concurrent(0);
        assert_eq!(low.max_concurrent(), 1);
        let high = service(MockTileClient::new(), &[0]).with_max_concurrent(1000);
        assert_eq!(high.max_concurrent(), MAX_CONCURRENT_LIMIT);
    }
}
