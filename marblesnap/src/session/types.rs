//! Session types: state, statistics, results and errors.

use std::fmt;
use std::time::Duration;

use image::RgbaImage;
use thiserror::Error;

use crate::compositor::CompositeError;
use crate::coord::CaptureRegion;
use crate::provider::Endpoint;

/// Phase of a capture session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionState {
    /// Picking the next candidate endpoint
    ResolvingEndpoint,
    /// Fetching the span's tiles from one endpoint
    FetchingTiles { endpoint: Endpoint },
    /// The endpoint served nothing for the span; moving to the next one
    Retrying { endpoint: Endpoint },
    /// Stitching and cropping
    Compositing,
    /// Capture produced an image
    Done,
    /// Capture ended without an image
    Failed,
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SessionState::ResolvingEndpoint => write!(f, "resolving endpoint"),
            SessionState::FetchingTiles { endpoint } => write!(f, "fetching tiles from {}", endpoint),
            SessionState::Retrying { endpoint } => write!(f, "retrying after {}", endpoint),
            SessionState::Compositing => write!(f, "compositing"),
            SessionState::Done => write!(f, "done"),
            SessionState::Failed => write!(f, "failed"),
        }
    }
}

/// Per-tile outcome counts of the successful endpoint attempt.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CaptureStats {
    pub tiles_total: usize,
    pub tiles_present: usize,
    pub tiles_absent: usize,
    pub tiles_failed: usize,
    pub elapsed: Duration,
}

/// A successful capture.
#[derive(Debug, Clone)]
pub struct Capture {
    /// Cropped region image
    pub image: RgbaImage,
    /// Endpoint that served the tiles
    pub endpoint: Endpoint,
    /// Every endpoint attempted, in order, including the successful one
    pub endpoints_tried: Vec<Endpoint>,
    pub stats: CaptureStats,
}

/// State carried between scheduled captures.
///
/// Remembers the last endpoint that worked so the next tick tries it first.
#[derive(Debug, Clone, Default)]
pub struct CaptureContext {
    endpoint: Option<Endpoint>,
    successes: u64,
}

impl CaptureContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cached_endpoint(&self) -> Option<&Endpoint> {
        self.endpoint.as_ref()
    }

    pub fn remember(&mut self, endpoint: Endpoint) {
        self.endpoint = Some(endpoint);
        self.successes += 1;
    }

    /// Forgets the cached endpoint.
    pub fn clear(&mut self) {
        self.endpoint = None;
    }

    /// Number of successful captures recorded in this context.
    pub fn successes(&self) -> u64 {
        self.successes
    }
}

/// Errors that end a capture session.
#[derive(Debug, Error)]
pub enum CaptureError {
    /// Every candidate endpoint was absent or failing for the whole span
    #[error("No endpoint served region {region} (tried: {})", endpoint_list(.tried))]
    NoEndpointWorked {
        region: CaptureRegion,
        tried: Vec<Endpoint>,
    },

    /// Geometry rejected before or during compositing
    #[error("Could not composite region {region} (tried: {}): {source}", endpoint_list(.tried))]
    Composite {
        region: CaptureRegion,
        tried: Vec<Endpoint>,
        #[source]
        source: CompositeError,
    },

    /// The cancellation token fired
    #[error("Capture of region {region} cancelled (tried: {})", endpoint_list(.tried))]
    Cancelled {
        region: CaptureRegion,
        tried: Vec<Endpoint>,
    },
}

impl CaptureError {
    /// Endpoints attempted before the failure.
    pub fn endpoints_tried(&self) -> &[Endpoint] {
        match self {
            CaptureError::NoEndpointWorked { tried, .. }
            | CaptureError::Composite { tried, .. }
            | CaptureError::Cancelled { tried, .. } => tried,
        }
    }

    pub fn is_cancelled(&self) -> bool {
        matches!(self, CaptureError::Cancelled { .. })
    }
}

fn endpoint_list(endpoints: &[Endpoint]) -> String {
    if endpoints.is_empty() {
        return "none".to_string();
    }
    endpoints
        .iter()
        .map(|e| e.to_string())
        .collect::<Vec<_>>()
        .join(", ")
}
