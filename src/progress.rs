//! Progress and status reporting.
//!
//! Long-running operations (uploads, exports) report to a [`Reporter`]:
//! percentage snapshots through [`Reporter::on_progress`] and user-facing
//! notifications through [`Reporter::on_status`]. Reporters are purely
//! observational; nothing they do feeds back into the pipeline.
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//!
//! use flipbook::{ProgressInfo, Reporter, Session, StatusMessage};
//!
//! struct PrintProgress;
//!
//! impl Reporter for PrintProgress {
//!     fn on_progress(&self, info: &ProgressInfo) {
//!         println!("[{:?}] {:.0}%", info.operation, info.percent);
//!     }
//!
//!     fn on_status(&self, status: &StatusMessage) {
//!         println!("{:?}: {}", status.severity, status.message);
//!     }
//! }
//!
//! let session = Session::new().with_reporter(Arc::new(PrintProgress));
//! ```

use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::status::StatusMessage;

/// The kind of operation currently in progress.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[non_exhaustive]
pub enum OperationType {
    /// Decoding uploaded images into the frame store.
    Upload,
    /// Rendering and encoding the frame store into an artifact.
    Export,
}

/// A snapshot of operation progress.
#[derive(Debug, Clone)]
pub struct ProgressInfo {
    /// What kind of work is being performed.
    pub operation: OperationType,
    /// Completion percentage, 0.0 to 100.0.
    pub percent: f32,
    /// Items (frames / files) processed so far.
    pub current: u64,
    /// Total items expected.
    pub total: u64,
    /// Wall-clock time since the operation started.
    pub elapsed: Duration,
    /// Estimated time remaining, based on current throughput.
    pub estimated_remaining: Option<Duration>,
}

/// Observer for progress updates and status notifications.
///
/// Implementations must be [`Send`] and [`Sync`]; uploads report from the
/// async runtime. Both methods default to no-ops.
pub trait Reporter: Send + Sync {
    /// Called whenever an operation's completion percentage changes.
    fn on_progress(&self, _info: &ProgressInfo) {}

    /// Called for every user-facing notification.
    fn on_status(&self, _status: &StatusMessage) {}
}

/// Discards everything. The default reporter of a [`Session`](crate::Session).
pub(crate) struct NoOpReporter;

impl Reporter for NoOpReporter {}

/// Tracks item progress inside a percentage window and emits callbacks.
///
/// Exports map frame progress into the 20 to 90 % band, leaving the ends for
/// encoder start-up and finalisation.
pub(crate) struct ProgressTracker {
    reporter: Arc<dyn Reporter>,
    operation: OperationType,
    total: u64,
    current: u64,
    start_percent: f32,
    end_percent: f32,
    start_time: Instant,
}

impl ProgressTracker {
    pub(crate) fn new(
        reporter: Arc<dyn Reporter>,
        operation: OperationType,
        total: u64,
        start_percent: f32,
        end_percent: f32,
    ) -> Self {
        Self {
            reporter,
            operation,
            total,
            current: 0,
            start_percent,
            end_percent,
            start_time: Instant::now(),
        }
    }

    /// Report a fixed percentage outside the item window (e.g. "encoder
    /// started" or "done").
    pub(crate) fn set(&self, percent: f32) {
        self.emit(percent);
    }

    /// Record one completed item and report the interpolated percentage.
    pub(crate) fn advance(&mut self) {
        self.current = (self.current + 1).min(self.total);
        self.emit(self.window_percent());
    }

    fn window_percent(&self) -> f32 {
        if self.total == 0 {
            return self.end_percent;
        }
        let fraction = self.current as f32 / self.total as f32;
        self.start_percent + fraction * (self.end_percent - self.start_percent)
    }

    fn emit(&self, percent: f32) {
        let elapsed = self.start_time.elapsed();
        let estimated_remaining = if self.current > 0 {
            let remaining = self.total.saturating_sub(self.current);
            let per_item = elapsed / self.current as u32;
            Some(per_item * remaining as u32)
        } else {
            None
        };

        self.reporter.on_progress(&ProgressInfo {
            operation: self.operation,
            percent: percent.clamp(0.0, 100.0),
            current: self.current,
            total: self.total,
            elapsed,
            estimated_remaining,
        });
    }
}
