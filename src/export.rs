//! Export jobs: one render-and-capture run producing one artifact.
//!
//! An [`ExportJob`] owns an immutable snapshot of the frame store taken when
//! the job is created, so later edits to the store cannot affect a job in
//! flight. Running the job starts the sink, drives the [`RenderLoop`], and
//! finalises the sink only after the loop has completed.

use std::sync::Arc;

use crate::capture::{Artifact, CaptureSettings, CaptureSink};
use crate::configuration::{Container, ExportOptions};
use crate::encode::WebmSink;
use crate::error::FlipbookError;
use crate::frame::Frame;
#[cfg(feature = "gif")]
use crate::gif::GifSink;
use crate::progress::{NoOpReporter, OperationType, ProgressTracker, Reporter};
use crate::render::{RENDER_END_PERCENT, RENDER_START_PERCENT, RenderLoop};
use crate::surface::Surface;

/// Percentage reported when an export is accepted.
const EXPORT_ACCEPTED_PERCENT: f32 = 10.0;

/// The built-in sink for `container`.
pub fn sink_for(container: Container) -> Box<dyn CaptureSink> {
    match container {
        Container::WebM => Box::new(WebmSink::new()),
        #[cfg(feature = "gif")]
        Container::Gif => Box::new(GifSink::new()),
    }
}

/// A single export run.
#[derive(Debug, Clone)]
pub struct ExportJob {
    frames: Vec<Frame>,
    options: ExportOptions,
}

impl ExportJob {
    /// Create a job over a snapshot of frames.
    ///
    /// # Errors
    ///
    /// Returns [`FlipbookError::NoFrames`] if `frames` is empty.
    pub fn new(frames: Vec<Frame>, options: ExportOptions) -> Result<Self, FlipbookError> {
        if frames.is_empty() {
            return Err(FlipbookError::NoFrames);
        }
        Ok(Self { frames, options })
    }

    /// Frames this job renders, in order.
    pub fn frames(&self) -> &[Frame] {
        &self.frames
    }

    /// Options this job was created with.
    pub fn options(&self) -> &ExportOptions {
        &self.options
    }

    /// Output size: the first frame's dimensions, at least 1x1.
    pub fn dimensions(&self) -> (u32, u32) {
        // `new` guarantees at least one frame.
        self.frames
            .first()
            .map_or((1, 1), |frame| (frame.width().max(1), frame.height().max(1)))
    }

    /// Settings the sink is started with.
    pub fn capture_settings(&self) -> CaptureSettings {
        let (width, height) = self.dimensions();
        CaptureSettings {
            width,
            height,
            fps: self.options.fps,
            bitrate: self.options.bitrate,
            transparent: self.options.transparent,
        }
    }

    /// Run the job without progress reporting.
    pub async fn run(&self, sink: &mut dyn CaptureSink) -> Result<Artifact, FlipbookError> {
        self.run_with_reporter(sink, Arc::new(NoOpReporter)).await
    }

    /// Run the job, reporting progress to `reporter`.
    ///
    /// Progress goes 10 % (accepted) → 20 % (sink started) → 90 % (last
    /// frame painted) → 100 % (artifact finalised).
    pub async fn run_with_reporter(
        &self,
        sink: &mut dyn CaptureSink,
        reporter: Arc<dyn Reporter>,
    ) -> Result<Artifact, FlipbookError> {
        let settings = self.capture_settings();
        log::info!(
            "Exporting {} frames at {}x{}, {} fps ({:?})",
            self.frames.len(),
            settings.width,
            settings.height,
            settings.fps,
            sink.container(),
        );

        let mut tracker = ProgressTracker::new(
            reporter,
            OperationType::Export,
            self.frames.len() as u64,
            RENDER_START_PERCENT,
            RENDER_END_PERCENT,
        );
        tracker.set(EXPORT_ACCEPTED_PERCENT);

        sink.start(&settings)?;
        tracker.set(RENDER_START_PERCENT);

        let mut render = RenderLoop::new(&self.frames, Surface::new(settings.width, settings.height))
            .with_transparency(settings.transparent)
            .with_frame_delay(self.options.frame_delay())
            .with_flush_delay(self.options.flush_delay);
        render.run(sink, Some(&mut tracker)).await?;

        let artifact = sink.finish()?;
        tracker.set(100.0);
        log::info!(
            "Export finished: {} bytes, {} frames, {:?}",
            artifact.len(),
            artifact.frame_count(),
            artifact.duration(),
        );
        Ok(artifact)
    }
}
