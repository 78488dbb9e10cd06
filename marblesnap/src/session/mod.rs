//! Capture sessions
//!
//! A [`CaptureService`] is built once at startup. Each scheduled tick opens a
//! [`CaptureSession`] on it which walks the candidate endpoints for the
//! viewer URL, fetches the region's tiles from each until one serves at
//! least one tile, then composites and crops.
//!
//! The endpoint that worked is kept in a [`CaptureContext`] owned by the
//! caller, so the next tick starts there.

mod service;
mod types;

pub use service::{CaptureService, CaptureSession, DEFAULT_MAX_CONCURRENT, MAX_CONCURRENT_LIMIT};
pub use types::{Capture, CaptureContext, CaptureError, CaptureStats, SessionState};
