//! # flipbook
//!
//! Turn a handful of still images into a short looping video.
//!
//! `flipbook` keeps an ordered set of decoded images, lets you rearrange
//! them with drag-and-drop semantics, and exports the sequence as a WebM
//! video (or an animated GIF with the `gif` feature) at a chosen frame
//! rate. Encoding is powered by FFmpeg via the
//! [`ffmpeg-next`](https://crates.io/crates/ffmpeg-next) crate.
//!
//! ## Quick Start
//!
//! ### Upload, Reorder, Export
//!
//! ```no_run
//! use flipbook::{ExportOptions, Session, UploadFile};
//!
//! # async fn example() -> Result<(), flipbook::FlipbookError> {
//! let mut session = Session::new();
//! session
//!     .upload(vec![
//!         UploadFile::from_path("one.png")?,
//!         UploadFile::from_path("two.png")?,
//!     ])
//!     .await?;
//!
//! session.drag_start(1);
//! session.drop_on(0);
//!
//! let artifact = session.export(&ExportOptions::new().with_fps(4)).await?;
//! println!("{} bytes, {:?}", artifact.len(), artifact.duration());
//! # Ok(())
//! # }
//! ```
//!
//! ### Keep Transparency
//!
//! ```no_run
//! use flipbook::{ExportOptions, Session};
//!
//! # async fn example(session: &mut Session) -> Result<(), flipbook::FlipbookError> {
//! let options = ExportOptions::new().with_fps(10).with_transparency(true);
//! session.export(&options).await?;
//! session.download("renders")?;
//! # Ok(())
//! # }
//! ```
//!
//! ### Custom Capture Sinks
//!
//! Anything implementing [`CaptureSink`] can receive the painted surfaces,
//! which is how the tests observe the render loop without an encoder:
//!
//! ```no_run
//! use flipbook::{Artifact, CaptureSettings, CaptureSink, Container, FlipbookError};
//! use image::RgbaImage;
//!
//! #[derive(Default)]
//! struct CountFrames(u64, u32);
//!
//! impl CaptureSink for CountFrames {
//!     fn container(&self) -> Container {
//!         Container::WebM
//!     }
//!     fn start(&mut self, settings: &CaptureSettings) -> Result<(), FlipbookError> {
//!         self.1 = settings.fps;
//!         Ok(())
//!     }
//!     fn capture(&mut self, _surface: &RgbaImage) -> Result<(), FlipbookError> {
//!         self.0 += 1;
//!         Ok(())
//!     }
//!     fn finish(&mut self) -> Result<Artifact, FlipbookError> {
//!         Ok(Artifact::new(Vec::new(), Container::WebM, self.0, self.1))
//!     }
//! }
//! ```
//!
//! ## Features
//!
//! - **Frame store**: ordered, index-addressed frames with append, remove,
//!   move, and clear
//! - **Drag-and-drop reordering**: a small state machine that commits a
//!   move only on a drop onto a different frame
//! - **Deterministic rendering**: every frame painted once, stretched to
//!   the first frame's size, on white or on a transparent background
//! - **WebM export**: VP9 with automatic VP8 fallback, alpha channel
//!   preserved when transparency is enabled
//! - **Progress & status**: percentage callbacks and auto-dismissing
//!   notifications through a [`Reporter`]
//!
//! ## Optional Features
//!
//! | Feature | Description |
//! |---------|-------------|
//! | `gif`   | Animated GIF export via the `gif` crate |
//! | `full`  | Everything above |

pub mod capture;
pub mod configuration;
pub mod encode;
pub mod error;
pub mod export;
pub mod ffmpeg;
pub mod frame;
#[cfg(feature = "gif")]
pub mod gif;
pub mod progress;
pub mod render;
pub mod reorder;
pub mod session;
pub mod status;
pub mod store;
pub mod surface;

pub use capture::{Artifact, CaptureSettings, CaptureSink, ChunkBuffer};
pub use configuration::{
    Container, DEFAULT_BITRATE, DEFAULT_FLUSH_DELAY, DEFAULT_FPS, ExportOptions, MAX_FPS, MIN_FPS,
    UploadOrder,
};
pub use encode::{VideoCodec, WebmSink};
pub use error::FlipbookError;
pub use export::{ExportJob, sink_for};
pub use ffmpeg::{FfmpegLogLevel, get_ffmpeg_log_level, set_ffmpeg_log_level};
pub use frame::{Frame, IMAGE_MIME_PREFIX, UploadFile, is_image_mime};
#[cfg(feature = "gif")]
pub use gif::GifSink;
pub use progress::{OperationType, ProgressInfo, Reporter};
pub use render::RenderLoop;
pub use reorder::{DragSession, DragState, DropOutcome};
pub use session::{Session, UploadSummary};
pub use status::{STATUS_DISPLAY_DURATION, Severity, StatusBoard, StatusMessage};
pub use store::FrameStore;
pub use surface::{Surface, TRANSPARENT, WHITE};
