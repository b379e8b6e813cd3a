//! The paint-and-yield render loop.
//!
//! [`RenderLoop`] paints each frame of a snapshot onto one reusable
//! [`Surface`], hands the result to a [`CaptureSink`], and then yields to the
//! runtime for one frame duration before painting the next. After the last
//! frame it waits a fixed flush delay so the sink has seen the final sample
//! before it is finalised.

use std::time::Duration;

use crate::capture::CaptureSink;
use crate::error::FlipbookError;
use crate::frame::Frame;
use crate::progress::ProgressTracker;
use crate::surface::Surface;

/// Percentage reported once the sink is started and painting begins.
pub(crate) const RENDER_START_PERCENT: f32 = 20.0;
/// Percentage reported after the last frame has been painted.
pub(crate) const RENDER_END_PERCENT: f32 = 90.0;

/// Drives painting of a frame sequence at a fixed cadence.
pub struct RenderLoop<'a> {
    frames: &'a [Frame],
    surface: Surface,
    transparent: bool,
    frame_delay: Duration,
    flush_delay: Duration,
    painted: usize,
}

impl<'a> RenderLoop<'a> {
    /// Create a loop over `frames`, painting onto `surface`.
    pub fn new(frames: &'a [Frame], surface: Surface) -> Self {
        Self {
            frames,
            surface,
            transparent: false,
            frame_delay: Duration::from_millis(100),
            flush_delay: Duration::ZERO,
            painted: 0,
        }
    }

    /// Clear to transparent instead of filling white before each paint.
    #[must_use]
    pub fn with_transparency(mut self, transparent: bool) -> Self {
        self.transparent = transparent;
        self
    }

    /// Pause between consecutive paints.
    #[must_use]
    pub fn with_frame_delay(mut self, delay: Duration) -> Self {
        self.frame_delay = delay;
        self
    }

    /// Pause after the last paint.
    #[must_use]
    pub fn with_flush_delay(mut self, delay: Duration) -> Self {
        self.flush_delay = delay;
        self
    }

    /// Number of frames painted so far.
    pub fn painted(&self) -> usize {
        self.painted
    }

    /// The surface in its current state.
    pub fn surface(&self) -> &Surface {
        &self.surface
    }

    /// Paint the next frame and hand it to `sink`.
    ///
    /// Returns `Ok(false)` once every frame has been painted.
    pub fn paint_next(&mut self, sink: &mut dyn CaptureSink) -> Result<bool, FlipbookError> {
        let Some(frame) = self.frames.get(self.painted) else {
            return Ok(false);
        };
        self.surface.paint(frame.image(), self.transparent);
        sink.capture(self.surface.pixels())?;
        self.painted += 1;
        Ok(true)
    }

    /// Paint every remaining frame, yielding `frame_delay` between paints,
    /// then wait `flush_delay`.
    pub(crate) async fn run(
        &mut self,
        sink: &mut dyn CaptureSink,
        mut progress: Option<&mut ProgressTracker>,
    ) -> Result<(), FlipbookError> {
        while self.paint_next(sink)? {
            if let Some(tracker) = progress.as_deref_mut() {
                tracker.advance();
            }
            log::debug!("Painted frame {}/{}", self.painted, self.frames.len());
            if self.painted < self.frames.len() {
                tokio::time::sleep(self.frame_delay).await;
            }
        }
        tokio::time::sleep(self.flush_delay).await;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use image::{DynamicImage, Rgba, RgbaImage};

    use super::*;
    use crate::capture::{Artifact, CaptureSettings};
    use crate::configuration::Container;

    #[derive(Default)]
    struct Corners(Vec<Rgba<u8>>);

    impl CaptureSink for Corners {
        fn container(&self) -> Container {
            Container::WebM
        }

        fn start(&mut self, _settings: &CaptureSettings) -> Result<(), FlipbookError> {
            Ok(())
        }

        fn capture(&mut self, surface: &RgbaImage) -> Result<(), FlipbookError> {
            self.0.push(*surface.get_pixel(0, 0));
            Ok(())
        }

        fn finish(&mut self) -> Result<Artifact, FlipbookError> {
            Ok(Artifact::new(Vec::new(), Container::WebM, self.0.len() as u64, 1))
        }
    }

    fn frame(color: [u8; 4]) -> Frame {
        let image = RgbaImage::from_pixel(2, 2, Rgba(color));
        Frame::new(DynamicImage::ImageRgba8(image), Vec::new(), "image/png")
    }

    #[test]
    fn paints_each_frame_once_in_order() {
        let frames = [frame([255, 0, 0, 255]), frame([0, 255, 0, 255])];
        let mut render = RenderLoop::new(&frames, Surface::new(2, 2));
        let mut sink = Corners::default();

        assert!(render.paint_next(&mut sink).unwrap());
        assert!(render.paint_next(&mut sink).unwrap());
        assert!(!render.paint_next(&mut sink).unwrap());
        assert_eq!(render.painted(), 2);
        assert_eq!(sink.0, [Rgba([255, 0, 0, 255]), Rgba([0, 255, 0, 255])]);
    }

    #[test]
    fn background_is_reset_between_paints() {
        let frames = [frame([0, 0, 255, 255]), frame([0, 0, 0, 0])];
        let mut sink = Corners::default();

        let mut opaque = RenderLoop::new(&frames, Surface::new(2, 2));
        while opaque.paint_next(&mut sink).unwrap() {}
        assert_eq!(sink.0[1], Rgba([255, 255, 255, 255]));

        sink.0.clear();
        let mut clear = RenderLoop::new(&frames, Surface::new(2, 2)).with_transparency(true);
        while clear.paint_next(&mut sink).unwrap() {}
        assert_eq!(sink.0[1][3], 0);
    }
}
