//! Periodic capture scheduling.
//!
//! Ticks run strictly one after another: the next tick is only armed once
//! the previous capture has finished. Ticks missed while a capture overran
//! are delayed, never bursted.

use std::future::Future;
use std::path::PathBuf;
use std::time::Duration;

use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

use crate::coord::CaptureRegion;
use crate::output::save_capture;
use crate::provider::TileHttpClient;
use crate::session::{CaptureContext, CaptureService};

/// Result of one scheduled tick.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TickOutcome {
    /// The capture was written to this path
    Saved(PathBuf),
    /// The capture or the save failed; the loop continues
    Failed(String),
    /// Cancellation was observed during the tick
    Cancelled,
}

/// Work performed on every tick.
pub trait CaptureJob: Send {
    fn run_tick(&mut self) -> impl Future<Output = TickOutcome> + Send;
}

/// Totals reported when the scheduler stops.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ScheduleSummary {
    pub ticks: u64,
    pub successes: u64,
    pub failures: u64,
}

/// Runs a [`CaptureJob`] now and then every `interval`.
#[derive(Debug, Clone)]
pub struct Scheduler {
    interval: Duration,
    run_immediately: bool,
    max_ticks: Option<u64>,
}

impl Scheduler {
    /// A zero interval is raised to one millisecond.
    pub fn new(interval: Duration) -> Self {
        Self {
            interval: interval.max(Duration::from_millis(1)),
            run_immediately: true,
            max_ticks: None,
        }
    }

    /// Whether the first tick fires at start (default) or after one interval.
    pub fn run_immediately(mut self, enabled: bool) -> Self {
        self.run_immediately = enabled;
        self
    }

    /// Stop after `ticks` ticks.
    pub fn max_ticks(mut self, ticks: u64) -> Self {
        self.max_ticks = Some(ticks);
        self
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Drives `job` until `cancel` fires or the tick limit is reached.
    pub async fn run<J: CaptureJob>(&self, job: &mut J, cancel: &CancellationToken) -> ScheduleSummary {
        let mut summary = ScheduleSummary::default();
        let mut ticker = tokio::time::interval(self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        if !self.run_immediately {
            // The first tick of an interval completes immediately.
            ticker.tick().await;
        }

        info!(
            interval_secs = self.interval.as_secs_f64(),
            run_immediately = self.run_immediately,
            "Scheduler started"
        );

        loop {
            tokio::select! {
                biased;
                _ = cancel.cancelled() => break,
                _ = ticker.tick() => {}
            }

            summary.ticks += 1;
            match job.run_tick().await {
                TickOutcome::Saved(_) => summary.successes += 1,
                TickOutcome::Failed(_) => summary.failures += 1,
                TickOutcome::Cancelled => break,
            }

            if self.max_ticks.is_some_and(|max| summary.ticks >= max) {
                break;
            }
        }

        info!(
            ticks = summary.ticks,
            successes = summary.successes,
            failures = summary.failures,
            "Scheduler stopped"
        );
        summary
    }
}

/// Production job: capture the region and save it as a PNG.
pub struct SnapshotJob<C: TileHttpClient + 'static> {
    service: CaptureService<C>,
    context: CaptureContext,
    region: CaptureRegion,
    viewer_url: String,
    output_dir: PathBuf,
    successes: u64,
    failures: u64,
}

impl<C: TileHttpClient + 'static> SnapshotJob<C> {
    pub fn new(
        service: CaptureService<C>,
        region: CaptureRegion,
        viewer_url: impl Into<String>,
        output_dir: impl Into<PathBuf>,
    ) -> Self {
        Self {
            service,
            context: CaptureContext::new(),
            region,
            viewer_url: viewer_url.into(),
            output_dir: output_dir.into(),
            successes: 0,
            failures: 0,
        }
    }

    pub fn successes(&self) -> u64 {
        self.successes
    }

    pub fn failures(&self) -> u64 {
        self.failures
    }

    pub fn service(&self) -> &CaptureService<C> {
        &self.service
    }

    /// Captures and saves once.
    pub async fn snapshot(&mut self) -> TickOutcome {
        let capture = match self
            .service
            .capture_once(&mut self.context, &self.region, &self.viewer_url)
            .await
        {
            Ok(capture) => capture,
            Err(e) if e.is_cancelled() => {
                warn!(region = %self.region, "Capture cancelled");
                return TickOutcome::Cancelled;
            }
            Err(e) => {
                self.failures += 1;
                error!(error = %e, failures = self.failures, "Capture failed");
                return TickOutcome::Failed(e.to_string());
            }
        };

        match save_capture(&capture.image, &self.output_dir) {
            Ok(path) => {
                self.successes += 1;
                info!(
                    path = %path.display(),
                    endpoint = %capture.endpoint,
                    successes = self.successes,
                    "Screenshot job completed"
                );
                TickOutcome::Saved(path)
            }
            Err(e) => {
                self.failures += 1;
                error!(error = %e, failures = self.failures, "Saving capture failed");
                TickOutcome::Failed(e.to_string())
            }
        }
    }
}

impl<C: TileHttpClient + 'static> CaptureJob for SnapshotJob<C> {
    async fn run_tick(&mut self) -> TickOutcome {
        self.snapshot().await
    }
}
