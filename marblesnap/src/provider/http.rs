//! HTTP client abstraction for testability

use std::future::Future;
use std::time::Duration;

use bytes::Bytes;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, ACCEPT_LANGUAGE, ORIGIN, REFERER};
use tracing::{debug, trace, warn};

use super::types::{ClientBuildError, FetchError, FetchErrorKind};

/// Browser user agent; the tile backend rejects obvious bots.
pub const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) \
     AppleWebKit/537.36 (KHTML, like Gecko) Chrome/124.0.0.0 Safari/537.36";

/// Default per-request timeout in seconds.
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Raw HTTP response: status and body, whatever the status.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpResponse {
    pub status: u16,
    pub body: Bytes,
}

impl HttpResponse {
    pub fn new(status: u16, body: impl Into<Bytes>) -> Self {
        Self {
            status,
            body: body.into(),
        }
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Trait for HTTP GET operations against the tile backend.
///
/// Unlike a plain "bytes or error" client, implementations return every
/// response that arrives, including 404s: the caller decides what a status
/// means. Only transport failures are errors, and those must be reported as
/// [`FetchErrorKind::Network`] or [`FetchErrorKind::Timeout`].
pub trait TileHttpClient: Send + Sync {
    /// Performs an HTTP GET request.
    fn get(&self, url: &str) -> impl Future<Output = Result<HttpResponse, FetchError>> + Send;
}

/// Settings for the production HTTP client.
#[derive(Debug, Clone)]
pub struct HttpSettings {
    /// Per-request timeout
    pub timeout: Duration,
    /// User-Agent header value
    pub user_agent: String,
}

impl Default for HttpSettings {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            user_agent: DEFAULT_USER_AGENT.to_string(),
        }
    }
}

/// Real HTTP client implementation using reqwest.
///
/// Sends the browser-style `Referer`/`Origin`/`Accept` headers the backend
/// expects from the map page.
#[derive(Clone)]
pub struct ReqwestTileClient {
    client: reqwest::Client,
}

impl ReqwestTileClient {
    /// Creates a new client with default settings.
    pub fn new() -> Result<Self, ClientBuildError> {
        Self::with_settings(&HttpSettings::default())
    }

    /// Creates a new client with custom timeout and user agent.
    pub fn with_settings(settings: &HttpSettings) -> Result<Self, ClientBuildError> {
        let mut headers = HeaderMap::new();
        headers.insert(REFERER, HeaderValue::from_static("https://wplace.live/"));
        headers.insert(ORIGIN, HeaderValue::from_static("https://wplace.live"));
        headers.insert(
            ACCEPT,
            HeaderValue::from_static("image/avif,image/webp,image/apng,image/*,*/*;q=0.8"),
        );
        headers.insert(ACCEPT_LANGUAGE, HeaderValue::from_static("en-US,en;q=0.9"));

        let client = reqwest::Client::builder()
            .timeout(settings.timeout)
            .user_agent(settings.user_agent.as_str())
            .default_headers(headers)
            .pool_idle_timeout(Duration::from_secs(90))
            .build()
            .map_err(|e| ClientBuildError(e.to_string()))?;

        Ok(Self { client })
    }
}

fn transport_error(url: &str, error: &reqwest::Error) -> FetchError {
    let kind = if error.is_timeout() {
        FetchErrorKind::Timeout
    } else {
        FetchErrorKind::Network
    };
    FetchError::new(kind, url, error.to_string())
}

impl TileHttpClient for ReqwestTileClient {
    async fn get(&self, url: &str) -> Result<HttpResponse, FetchError> {
        trace!(url = url, "HTTP GET request starting");

        let response = match self.client.get(url).send().await {
            Ok(resp) => resp,
            Err(e) => {
                warn!(
                    url = url,
                    error = %e,
                    is_connect = e.is_connect(),
                    is_timeout = e.is_timeout(),
                    "HTTP request failed"
                );
                return Err(transport_error(url, &e));
            }
        };

        let status = response.status().as_u16();
        debug!(url = url, status = status, "HTTP response received");

        let body = response
            .bytes()
            .await
            .map_err(|e| transport_error(url, &e))?;

        Ok(HttpResponse { status, body })
    }
}

#[cfg(test)]
pub mod tests {
    use super::*;
    use image::{ImageFormat, Rgba, RgbaImage};
    use std::collections::{HashMap, VecDeque};
    use std::io::Cursor;
    use std::sync::Mutex;

    /// Encodes a solid-colour PNG.
    pub fn solid_png(width: u32, height: u32, color: [u8; 4]) -> Vec<u8> {
        let img = RgbaImage::from_pixel(width, height, Rgba(color));
        let mut buffer = Cursor::new(Vec::new());
        img.write_to(&mut buffer, ImageFormat::Png)
            .expect("Failed to encode PNG");
        buffer.into_inner()
    }

    /// Scripted reply of a [`MockTileClient`].
    #[derive(Debug, Clone)]
    pub enum MockReply {
        Status(u16, Vec<u8>),
        Fail(FetchErrorKind),
        /// Never answers; exercises the caller's timeout
        Hang,
    }

    impl MockReply {
        pub fn png(color: [u8; 4]) -> Self {
            MockReply::Status(200, solid_png(1000, 1000, color))
        }

        pub fn not_found() -> Self {
            MockReply::Status(404, Vec::new())
        }
    }

    /// Mock HTTP client with per-URL and per-prefix scripted replies.
    ///
    /// Exact routes hold a queue; the last reply repeats once the queue is
    /// down to one entry. Records every requested URL.
    pub struct MockTileClient {
        exact: Mutex<HashMap<String, VecDeque<MockReply>>>,
        prefixes: Vec<(String, MockReply)>,
        fallback: MockReply,
        requests: Mutex<Vec<String>>,
    }

    impl Default for MockTileClient {
        fn default() -> Self {
            Self::new()
        }
    }

    impl MockTileClient {
        /// Every URL answers 404 unless routed.
        pub fn new() -> Self {
            Self {
                exact: Mutex::new(HashMap::new()),
                prefixes: Vec::new(),
                fallback: MockReply::not_found(),
                requests: Mutex::new(Vec::new()),
            }
        }

        pub fn route(self, url: &str, reply: MockReply) -> Self {
            self.route_sequence(url, vec![reply])
        }

        pub fn route_sequence(self, url: &str, replies: Vec<MockReply>) -> Self {
            self.exact
                .lock()
                .unwrap()
                .insert(url.to_string(), replies.into());
            self
        }

        pub fn route_prefix(mut self, prefix: &str, reply: MockReply) -> Self {
            self.prefixes.push((prefix.to_string(), reply));
            self
        }

        pub fn fallback(mut self, reply: MockReply) -> Self {
            self.fallback = reply;
            self
        }

        pub fn requests(&self) -> Vec<String> {
            self.requests.lock().unwrap().clone()
        }

        pub fn request_count(&self, url: &str) -> usize {
            self.requests().iter().filter(|u| *u == url).count()
        }

        fn next_reply(&self, url: &str) -> MockReply {
            if let Some(queue) = self.exact.lock().unwrap().get_mut(url) {
                if queue.len() > 1 {
                    if let Some(reply) = queue.pop_front() {
                        return reply;
                    }
                }
                if let Some(reply) = queue.front() {
                    return reply.clone();
                }
            }
            self.prefixes
                .iter()
                .find(|(prefix, _)| url.starts_with(prefix.as_str()))
                .map(|(_, reply)| reply.clone())
                .unwrap_or_else(|| self.fallback.clone())
        }
    }

    impl TileHttpClient for MockTileClient {
        async fn get(&self, url: &str) -> Result<HttpResponse, FetchError> {
            self.requests.lock().unwrap().push(url.to_string());
            match self.next_reply(url) {
                MockReply::Status(status, body) => Ok(HttpResponse::new(status, body)),
                MockReply::Fail(kind) => Err(FetchError::new(kind, url, "mock failure")),
                MockReply::Hang => {
                    std::future::pending::<()>().await;
                    unreachable!("pending future never resolves")
                }
            }
        }
    }

    #[test]
    fn test_http_response_is_success() {
        assert!(HttpResponse::new(200, Vec::new()).is_success());
        assert!(HttpResponse::new(204, Vec::new()).is_success());
        assert!(!HttpResponse::new(404, Vec::new()).is_success());
        assert!(!HttpResponse::new(503, Vec::new()).is_success());
    }

    #[test]
    fn test_default_settings() {
        let settings = HttpSettings::default();
        assert_eq!(settings.timeout, Duration::from_secs(30));
        assert!(settings.user_agent.starts_with("Mozilla/5.0"));
    }

    #[test]
    fn test_reqwest_client_builds() {
        assert!(ReqwestTileClient::new().is_ok());
    }

    #[tokio::test]
    async fn test_mock_client_fallback_is_404() {
        let mock = MockTileClient::new();
        let response = mock.get("http://example.com/a.png").await.unwrap();
        assert_eq!(response.status, 404);
        assert_eq!(mock.requests(), vec!["http://example.com/a.png".to_string()]);
    }

    #[tokio::test]
    async fn test_mock_client_sequence_repeats_last() {
        let url = "http://example.com/a.png";
        let mock = MockTileClient::new().route_sequence(
            url,
            vec![
                MockReply::Fail(FetchErrorKind::Network),
                MockReply::Status(200, vec![1, 2, 3]),
            ],
        );

        assert!(mock.get(url).await.is_err());
        assert_eq!(mock.get(url).await.unwrap().body.as_ref(), &[1, 2, 3]);
        assert_eq!(mock.get(url).await.unwrap().status, 200);
        assert_eq!(mock.request_count(url), 3);
    }

    #[tokio::test]
    async fn test_mock_client_prefix_route() {
        let mock = MockTileClient::new().route_prefix("http://example.com/s1/", MockReply::png([1, 2, 3, 255]));
        assert_eq!(mock.get("http://example.com/s1/tiles/0/0.png").await.unwrap().status, 200);
        assert_eq!(mock.get("http://example.com/s0/tiles/0/0.png").await.unwrap().status, 404);
    }
}
