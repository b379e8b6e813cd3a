//! Animated GIF capture sink.
//!
//! [`GifSink`] writes every captured surface as one GIF frame, looping
//! forever. Each frame is quantized to a 256-colour palette by the `gif`
//! crate; fully transparent pixels stay transparent, so exports with
//! transparency enabled keep a see-through background.
//!
//! # Example
//!
//! ```no_run
//! use flipbook::{Container, ExportOptions, FlipbookError, Session};
//!
//! # async fn example(session: &mut Session) -> Result<(), FlipbookError> {
//! let options = ExportOptions::new().with_fps(8).with_container(Container::Gif);
//! let artifact = session.export(&options).await?;
//! assert_eq!(artifact.media_type(), "image/gif");
//! # Ok(())
//! # }
//! ```

use gif::{DisposalMethod, Encoder, Frame, Repeat};
use image::RgbaImage;

use crate::capture::{Artifact, CaptureSettings, CaptureSink, ChunkBuffer};
use crate::configuration::Container;
use crate::error::FlipbookError;

/// Quantizer speed handed to the `gif` crate (1 = best, 30 = fastest).
const QUANTIZER_SPEED: i32 = 10;

struct GifState {
    encoder: Encoder<ChunkBuffer>,
    width: u16,
    height: u16,
    delay: u16,
    fps: u32,
    frames: u64,
}

/// Animated GIF capture sink.
#[derive(Default)]
pub struct GifSink {
    repeat: Option<u16>,
    state: Option<GifState>,
}

impl GifSink {
    /// Create a sink that loops forever.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the repeat count. `None` means loop forever.
    #[must_use]
    pub fn with_repeat(mut self, repeat: Option<u16>) -> Self {
        self.repeat = repeat;
        self
    }
}

/// Frame delay in hundredths of a second for `fps`, at least 1.
pub(crate) fn frame_delay_centis(fps: u32) -> u16 {
    let fps = fps.max(1);
    ((100 + fps / 2) / fps).clamp(1, u32::from(u16::MAX)) as u16
}

impl CaptureSink for GifSink {
    fn container(&self) -> Container {
        Container::Gif
    }

    fn start(&mut self, settings: &CaptureSettings) -> Result<(), FlipbookError> {
        let width = u16::try_from(settings.width).map_err(|_| {
            FlipbookError::GifEncodeError(format!("width {} exceeds GIF limits", settings.width))
        })?;
        let height = u16::try_from(settings.height).map_err(|_| {
            FlipbookError::GifEncodeError(format!("height {} exceeds GIF limits", settings.height))
        })?;

        let mut encoder = Encoder::new(ChunkBuffer::new(), width, height, &[]).map_err(|e| {
            FlipbookError::GifEncodeError(format!("Failed to create GIF encoder: {e}"))
        })?;
        let repeat = match self.repeat {
            None => Repeat::Infinite,
            Some(n) => Repeat::Finite(n),
        };
        encoder
            .set_repeat(repeat)
            .map_err(|e| FlipbookError::GifEncodeError(format!("Failed to set GIF repeat: {e}")))?;

        log::debug!(
            "Capturing GIF {width}x{height} @ {} fps (transparent={})",
            settings.fps,
            settings.transparent,
        );
        self.state = Some(GifState {
            encoder,
            width,
            height,
            delay: frame_delay_centis(settings.fps),
            fps: settings.fps,
            frames: 0,
        });
        Ok(())
    }

    fn capture(&mut self, surface: &RgbaImage) -> Result<(), FlipbookError> {
        let state = self.state.as_mut().ok_or(FlipbookError::SinkNotStarted)?;
        if surface.width() != u32::from(state.width) || surface.height() != u32::from(state.height)
        {
            return Err(FlipbookError::GifEncodeError(format!(
                "surface is {}x{}, encoder expects {}x{}",
                surface.width(),
                surface.height(),
                state.width,
                state.height,
            )));
        }

        let mut pixels = surface.as_raw().clone();
        let mut frame = Frame::from_rgba_speed(state.width, state.height, &mut pixels, QUANTIZER_SPEED);
        frame.delay = state.delay;
        frame.dispose = DisposalMethod::Background;

        state
            .encoder
            .write_frame(&frame)
            .map_err(|e| FlipbookError::GifEncodeError(format!("Failed to write GIF frame: {e}")))?;
        state.frames += 1;
        Ok(())
    }

    fn finish(&mut self) -> Result<Artifact, FlipbookError> {
        let state = self.state.take().ok_or(FlipbookError::SinkNotStarted)?;
        let mut chunks = state.encoder.into_inner()?;
        Ok(Artifact::new(chunks.concat(), Container::Gif, state.frames, state.fps).with_codec("gif"))
    }
}
