//! Export and upload configuration.
//!
//! [`ExportOptions`] is a builder carrying everything an export needs besides
//! the frames themselves: frame rate, transparency, encoder bitrate, the
//! post-render flush delay, and the output container.
//!
//! # Example
//!
//! ```
//! use std::time::Duration;
//!
//! use flipbook::{Container, ExportOptions};
//!
//! let options = ExportOptions::new()
//!     .with_fps(25)
//!     .with_transparency(true)
//!     .with_container(Container::WebM)
//!     .with_flush_delay(Duration::from_millis(250));
//!
//! assert_eq!(options.frame_delay(), Duration::from_millis(40));
//! ```

use std::fmt::{Debug, Formatter, Result as FmtResult};
use std::time::Duration;

/// Lowest selectable frame rate.
pub const MIN_FPS: u32 = 1;
/// Highest selectable frame rate.
pub const MAX_FPS: u32 = 60;
/// Frame rate used when none is configured.
pub const DEFAULT_FPS: u32 = 10;
/// Target encoder bitrate in bits per second.
pub const DEFAULT_BITRATE: usize = 2_500_000;
/// Pause after the last paint before the sink is finalised.
pub const DEFAULT_FLUSH_DELAY: Duration = Duration::from_millis(500);

/// Output container of an export.
///
/// The container fixes the artifact's media type and file extension,
/// regardless of which codec variant ends up encoding it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[non_exhaustive]
pub enum Container {
    /// WebM (VP9, falling back to VP8). This is the default.
    #[default]
    WebM,
    /// Animated GIF.
    #[cfg(feature = "gif")]
    Gif,
}

impl Container {
    /// Media type declared on the artifact.
    pub fn media_type(self) -> &'static str {
        match self {
            Container::WebM => "video/webm",
            #[cfg(feature = "gif")]
            Container::Gif => "image/gif",
        }
    }

    /// File extension of the artifact, without the dot.
    pub fn extension(self) -> &'static str {
        match self {
            Container::WebM => "webm",
            #[cfg(feature = "gif")]
            Container::Gif => "gif",
        }
    }

    /// Parse a container name (`webm`, `gif`), case-insensitively.
    pub fn from_name(name: &str) -> Option<Self> {
        match name.trim_start_matches('.').to_ascii_lowercase().as_str() {
            "webm" => Some(Container::WebM),
            #[cfg(feature = "gif")]
            "gif" => Some(Container::Gif),
            _ => None,
        }
    }
}

/// Order in which decoded uploads are appended to the frame store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum UploadOrder {
    /// The order the files were submitted in. This is the default.
    #[default]
    Submission,
    /// The order decodes happen to finish in.
    Completion,
}

/// Configuration for an export.
#[derive(Clone)]
pub struct ExportOptions {
    pub(crate) fps: u32,
    pub(crate) transparent: bool,
    pub(crate) bitrate: usize,
    pub(crate) flush_delay: Duration,
    pub(crate) container: Container,
}

impl Debug for ExportOptions {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.debug_struct("ExportOptions")
            .field("fps", &self.fps)
            .field("transparent", &self.transparent)
            .field("bitrate", &self.bitrate)
            .field("flush_delay_ms", &self.flush_delay.as_millis())
            .field("container", &self.container)
            .finish()
    }
}

impl Default for ExportOptions {
    fn default() -> Self {
        Self::new()
    }
}

impl ExportOptions {
    /// Create options with default settings.
    ///
    /// Defaults: 10 fps, opaque white background, 2.5 Mbit/s, 500 ms flush
    /// delay, WebM container.
    pub fn new() -> Self {
        Self {
            fps: DEFAULT_FPS,
            transparent: false,
            bitrate: DEFAULT_BITRATE,
            flush_delay: DEFAULT_FLUSH_DELAY,
            container: Container::default(),
        }
    }

    /// Set the frame rate, clamped to `MIN_FPS..=MAX_FPS`.
    #[must_use]
    pub fn with_fps(mut self, fps: u32) -> Self {
        self.fps = fps.clamp(MIN_FPS, MAX_FPS);
        self
    }

    /// Keep transparent pixels transparent instead of painting them onto
    /// white.
    #[must_use]
    pub fn with_transparency(mut self, transparent: bool) -> Self {
        self.transparent = transparent;
        self
    }

    /// Set the target encoder bitrate in bits per second. Clamped to a
    /// minimum of 1.
    #[must_use]
    pub fn with_bitrate(mut self, bitrate: usize) -> Self {
        self.bitrate = bitrate.max(1);
        self
    }

    /// Set the pause between the last paint and finalising the sink.
    #[must_use]
    pub fn with_flush_delay(mut self, delay: Duration) -> Self {
        self.flush_delay = delay;
        self
    }

    /// Set the output container.
    #[must_use]
    pub fn with_container(mut self, container: Container) -> Self {
        self.container = container;
        self
    }

    /// Frame rate.
    pub fn fps(&self) -> u32 {
        self.fps
    }

    /// Whether transparency is preserved.
    pub fn transparent(&self) -> bool {
        self.transparent
    }

    /// Target bitrate in bits per second.
    pub fn bitrate(&self) -> usize {
        self.bitrate
    }

    /// Post-render flush delay.
    pub fn flush_delay(&self) -> Duration {
        self.flush_delay
    }

    /// Output container.
    pub fn container(&self) -> Container {
        self.container
    }

    /// Time each frame stays on screen: `1000 ms / fps`.
    pub fn frame_delay(&self) -> Duration {
        Duration::from_secs(1) / self.fps
    }
}
