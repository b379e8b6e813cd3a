//! The editing session: frames, drag state, and the last exported artifact.
//!
//! [`Session`] is the single owner of everything a user edits. Every
//! mutating method takes `&mut self`, so the store cannot change underneath
//! an export; exports also render from their own snapshot.
//!
//! # Example
//!
//! ```no_run
//! use flipbook::{ExportOptions, FlipbookError, Session, UploadFile};
//!
//! # async fn example() -> Result<(), FlipbookError> {
//! let mut session = Session::new();
//! session
//!     .upload(vec![
//!         UploadFile::from_path("a.png")?,
//!         UploadFile::from_path("b.png")?,
//!         UploadFile::from_path("c.png")?,
//!     ])
//!     .await?;
//!
//! // Drag the first frame onto the last one: [b, c, a].
//! session.drag_start(0);
//! session.drop_on(2);
//!
//! session.export(&ExportOptions::new().with_fps(12)).await?;
//! if let Some(path) = session.download("out")? {
//!     println!("wrote {}", path.display());
//! }
//! # Ok(())
//! # }
//! ```

use std::fmt::{Debug, Formatter, Result as FmtResult};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use tokio::task::{JoinError, JoinSet};

use crate::capture::{Artifact, CaptureSink};
use crate::configuration::{ExportOptions, UploadOrder};
use crate::error::FlipbookError;
use crate::export::{ExportJob, sink_for};
use crate::frame::{Frame, UploadFile};
use crate::progress::{NoOpReporter, OperationType, ProgressTracker, Reporter};
use crate::reorder::{DragSession, DropOutcome};
use crate::status::StatusMessage;
use crate::store::FrameStore;

/// Outcome of one [`Session::upload`] call.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct UploadSummary {
    /// Files decoded and appended to the store.
    pub accepted: usize,
    /// Files skipped because their MIME type is not `image/*`.
    pub skipped: usize,
    /// Image files whose bytes failed to decode.
    pub failed: usize,
}

impl UploadSummary {
    /// Total files submitted.
    pub fn submitted(&self) -> usize {
        self.accepted + self.skipped + self.failed
    }
}

/// Frames, drag state, and the current artifact of one editing session.
pub struct Session {
    store: FrameStore,
    drag: DragSession,
    artifact: Option<Artifact>,
    reporter: Arc<dyn Reporter>,
    upload_order: UploadOrder,
}

impl Debug for Session {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.debug_struct("Session")
            .field("frames", &self.store.len())
            .field("drag", &self.drag.state())
            .field("artifact_bytes", &self.artifact.as_ref().map(Artifact::len))
            .field("upload_order", &self.upload_order)
            .finish()
    }
}

impl Default for Session {
    fn default() -> Self {
        Self::new()
    }
}

impl Session {
    /// Create an empty session that reports nothing.
    pub fn new() -> Self {
        Self {
            store: FrameStore::new(),
            drag: DragSession::new(),
            artifact: None,
            reporter: Arc::new(NoOpReporter),
            upload_order: UploadOrder::default(),
        }
    }

    /// Send progress and status notifications to `reporter`.
    #[must_use]
    pub fn with_reporter(mut self, reporter: Arc<dyn Reporter>) -> Self {
        self.reporter = reporter;
        self
    }

    /// Choose the order in which decoded uploads are appended.
    #[must_use]
    pub fn with_upload_order(mut self, order: UploadOrder) -> Self {
        self.upload_order = order;
        self
    }

    /// The frame store.
    pub fn store(&self) -> &FrameStore {
        &self.store
    }

    /// Frames in presentation order.
    pub fn frames(&self) -> &[Frame] {
        self.store.frames()
    }

    /// Number of frames.
    pub fn frame_count(&self) -> usize {
        self.store.len()
    }

    /// The drag gesture in progress.
    pub fn drag(&self) -> &DragSession {
        &self.drag
    }

    /// The last exported artifact.
    pub fn artifact(&self) -> Option<&Artifact> {
        self.artifact.as_ref()
    }

    /// Decode `files` and append them to the store.
    ///
    /// Files whose MIME type is not `image/*` are skipped. Files that fail
    /// to decode are dropped and logged. Neither produces a status message.
    ///
    /// # Errors
    ///
    /// Returns [`FlipbookError::DecodeTaskFailed`] if a decode task panics.
    /// Frames decoded before that point stay in the store.
    pub async fn upload(&mut self, files: Vec<UploadFile>) -> Result<UploadSummary, FlipbookError> {
        let submitted = files.len();
        let images: Vec<UploadFile> = files.into_iter().filter(UploadFile::is_image).collect();
        let mut summary = UploadSummary {
            skipped: submitted - images.len(),
            ..UploadSummary::default()
        };
        if summary.skipped > 0 {
            log::debug!("Skipped {} non-image file(s)", summary.skipped);
        }
        if images.is_empty() {
            return Ok(summary);
        }

        let mut tracker = ProgressTracker::new(
            Arc::clone(&self.reporter),
            OperationType::Upload,
            images.len() as u64,
            0.0,
            100.0,
        );
        tracker.set(0.0);

        match self.upload_order {
            UploadOrder::Submission => {
                let handles: Vec<_> = images
                    .into_iter()
                    .map(|file| tokio::task::spawn_blocking(move || decode(file)))
                    .collect();
                for handle in handles {
                    let decoded = handle.await.map_err(task_failed)?;
                    self.accept(decoded, &mut summary);
                    tracker.advance();
                }
            }
            UploadOrder::Completion => {
                let mut tasks = JoinSet::new();
                for file in images {
                    tasks.spawn_blocking(move || decode(file));
                }
                while let Some(joined) = tasks.join_next().await {
                    let decoded = joined.map_err(task_failed)?;
                    self.accept(decoded, &mut summary);
                    tracker.advance();
                }
            }
        }

        log::info!(
            "Upload: {} accepted, {} skipped, {} failed ({} frames total)",
            summary.accepted,
            summary.skipped,
            summary.failed,
            self.store.len(),
        );
        Ok(summary)
    }

    fn accept(&mut self, decoded: Option<Frame>, summary: &mut UploadSummary) {
        match decoded {
            Some(frame) => {
                self.store.append(frame);
                summary.accepted += 1;
            }
            None => summary.failed += 1,
        }
    }

    /// Remove the frame at `index`. Out of range is a no-op.
    ///
    /// Removing the last remaining frame also releases the artifact.
    pub fn remove_frame(&mut self, index: usize) -> Option<Frame> {
        let removed = self.store.remove_at(index);
        if removed.is_some() && self.store.is_empty() {
            self.release_artifact();
        }
        removed
    }

    /// Remove every frame and release the artifact.
    pub fn clear(&mut self) {
        self.store.clear();
        self.drag.end();
        self.release_artifact();
    }

    fn release_artifact(&mut self) {
        if self.artifact.take().is_some() {
            log::debug!("Released previous artifact");
        }
    }

    /// Begin dragging the frame at `index`.
    pub fn drag_start(&mut self, index: usize) {
        self.drag.start(index);
    }

    /// The pointer entered the frame at `index`.
    pub fn drag_enter(&mut self, index: usize) {
        self.drag.enter(index);
    }

    /// The pointer left the frame at `index`.
    pub fn drag_leave(&mut self, index: usize) {
        self.drag.leave(index);
    }

    /// Drop the dragged frame onto `target`.
    ///
    /// A successful move posts a "Frames reordered" notification.
    pub fn drop_on(&mut self, target: usize) -> DropOutcome {
        let outcome = self.drag.drop_on(target, &mut self.store);
        if let DropOutcome::Moved { .. } = outcome {
            self.notify(StatusMessage::success("Frames reordered"));
        }
        outcome
    }

    /// The drag ended without a drop.
    pub fn drag_end(&mut self) {
        self.drag.end();
    }

    /// Export the frames with the built-in sink for the configured container.
    ///
    /// # Errors
    ///
    /// Returns [`FlipbookError::NoFrames`] if the store is empty, or the
    /// sink's error if encoding fails. Either way an error notification is
    /// posted and the previous artifact is kept.
    pub async fn export(&mut self, options: &ExportOptions) -> Result<&Artifact, FlipbookError> {
        if self.store.is_empty() {
            return Err(self.reject_empty());
        }
        let mut sink = sink_for(options.container());
        self.export_with(options, sink.as_mut()).await
    }

    /// Export the frames through a caller-provided sink.
    ///
    /// # Errors
    ///
    /// Same as [`export`](Self::export).
    pub async fn export_with(
        &mut self,
        options: &ExportOptions,
        sink: &mut dyn CaptureSink,
    ) -> Result<&Artifact, FlipbookError> {
        if self.store.is_empty() {
            return Err(self.reject_empty());
        }

        let job = ExportJob::new(self.store.snapshot(), options.clone())?;
        log::debug!("Starting export: {options:?}");
        self.notify(StatusMessage::info("Generating video..."));

        match job
            .run_with_reporter(sink, Arc::clone(&self.reporter))
            .await
        {
            Ok(artifact) => {
                self.notify(StatusMessage::success("Video generated"));
                Ok(self.artifact.insert(artifact))
            }
            Err(error) => {
                log::warn!("Export failed: {error}");
                self.notify(StatusMessage::error(format!("Export failed: {error}")));
                Err(error)
            }
        }
    }

    fn reject_empty(&self) -> FlipbookError {
        log::warn!("Export requested with no frames");
        self.notify(StatusMessage::error("Load at least one image"));
        FlipbookError::NoFrames
    }

    /// Write the current artifact into `directory` as
    /// `video_<epoch_millis>.<ext>`.
    ///
    /// Returns `Ok(None)` if nothing has been exported yet.
    ///
    /// # Errors
    ///
    /// Returns [`FlipbookError::IoError`] if the file cannot be written.
    pub fn download<P: AsRef<Path>>(&self, directory: P) -> Result<Option<PathBuf>, FlipbookError> {
        let Some(artifact) = &self.artifact else {
            return Ok(None);
        };
        let path = artifact.save_to_dir(directory)?;
        self.notify(StatusMessage::success("Download started"));
        Ok(Some(path))
    }

    fn notify(&self, status: StatusMessage) {
        log::debug!("[{}] {}", status.severity, status.message);
        self.reporter.on_status(&status);
    }
}

fn decode(file: UploadFile) -> Option<Frame> {
    let name = file.name.clone();
    match Frame::decode(file) {
        Ok(frame) => Some(frame),
        Err(error) => {
            log::warn!("Dropping {name}: {error}");
            None
        }
    }
}

fn task_failed(error: JoinError) -> FlipbookError {
    FlipbookError::DecodeTaskFailed(error.to_string())
}
