//! Capture sinks and the exported artifact.
//!
//! A [`CaptureSink`] turns painted surfaces into encoded data. The export
//! pipeline calls [`start`](CaptureSink::start) once before the first paint,
//! [`capture`](CaptureSink::capture) once per painted frame, and
//! [`finish`](CaptureSink::finish) once after the render loop has completed.
//!
//! Streaming sinks accumulate their output in a [`ChunkBuffer`] and
//! concatenate it into a single [`Artifact`] when finished.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use image::RgbaImage;

use crate::configuration::{Container, MAX_FPS, MIN_FPS};
use crate::error::FlipbookError;

/// Parameters a sink is started with.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CaptureSettings {
    /// Frame width in pixels.
    pub width: u32,
    /// Frame height in pixels.
    pub height: u32,
    /// Frames per second.
    pub fps: u32,
    /// Target bitrate in bits per second.
    pub bitrate: usize,
    /// Whether the alpha channel should be preserved.
    pub transparent: bool,
}

impl CaptureSettings {
    /// These settings with a non-zero size and fps clamped to
    /// `MIN_FPS..=MAX_FPS`.
    pub fn normalized(&self) -> Self {
        Self {
            width: self.width.max(1),
            height: self.height.max(1),
            fps: self.fps.clamp(MIN_FPS, MAX_FPS),
            ..*self
        }
    }
}

/// Something that encodes painted surfaces into an [`Artifact`].
///
/// Sinks are stateful: calling [`capture`](CaptureSink::capture) before
/// [`start`](CaptureSink::start) returns [`FlipbookError::SinkNotStarted`].
pub trait CaptureSink {
    /// Container the artifact will be tagged with.
    fn container(&self) -> Container;

    /// Open the encoder for a new capture.
    fn start(&mut self, settings: &CaptureSettings) -> Result<(), FlipbookError>;

    /// Encode one painted surface.
    fn capture(&mut self, surface: &RgbaImage) -> Result<(), FlipbookError>;

    /// Stop the encoder and return everything captured since `start`.
    fn finish(&mut self) -> Result<Artifact, FlipbookError>;
}

/// Ordered list of encoded data chunks.
#[derive(Debug, Clone, Default)]
pub struct ChunkBuffer {
    chunks: Vec<Vec<u8>>,
}

impl ChunkBuffer {
    /// Create an empty buffer.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a chunk. Empty chunks are dropped.
    pub fn push(&mut self, chunk: Vec<u8>) {
        if !chunk.is_empty() {
            self.chunks.push(chunk);
        }
    }

    /// Number of non-empty chunks held.
    pub fn len(&self) -> usize {
        self.chunks.len()
    }

    /// Returns `true` if no data has been pushed.
    pub fn is_empty(&self) -> bool {
        self.chunks.is_empty()
    }

    /// Total size in bytes.
    pub fn byte_len(&self) -> usize {
        self.chunks.iter().map(Vec::len).sum()
    }

    /// Concatenate every chunk, leaving the buffer empty.
    pub fn concat(&mut self) -> Vec<u8> {
        let mut bytes = Vec::with_capacity(self.byte_len());
        for chunk in self.chunks.drain(..) {
            bytes.extend_from_slice(&chunk);
        }
        bytes
    }
}

impl std::io::Write for ChunkBuffer {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.push(buf.to_vec());
        Ok(buf.len())
    }

    fn flush(&mut self) -> std::io::Result<()> {
        Ok(())
    }
}

/// The finished output of an export.
#[derive(Debug, Clone)]
pub struct Artifact {
    bytes: Vec<u8>,
    container: Container,
    frame_count: u64,
    fps: u32,
    codec: Option<String>,
}

impl Artifact {
    /// Build an artifact from encoded bytes.
    pub fn new(bytes: Vec<u8>, container: Container, frame_count: u64, fps: u32) -> Self {
        Self {
            bytes,
            container,
            frame_count,
            fps: fps.max(1),
            codec: None,
        }
    }

    /// Record which encoder produced the data.
    #[must_use]
    pub fn with_codec(mut self, codec: impl Into<String>) -> Self {
        self.codec = Some(codec.into());
        self
    }

    /// Encoded bytes.
    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// Consume the artifact and return its bytes.
    pub fn into_bytes(self) -> Vec<u8> {
        self.bytes
    }

    /// Size in bytes.
    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    /// Returns `true` if the artifact carries no data.
    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// Container format.
    pub fn container(&self) -> Container {
        self.container
    }

    /// Declared media type. Fixed by the container, not by the codec.
    pub fn media_type(&self) -> &'static str {
        self.container.media_type()
    }

    /// File extension, without the dot.
    pub fn extension(&self) -> &'static str {
        self.container.extension()
    }

    /// Encoder that produced the data, if the sink reported one.
    pub fn codec(&self) -> Option<&str> {
        self.codec.as_deref()
    }

    /// Number of frames captured.
    pub fn frame_count(&self) -> u64 {
        self.frame_count
    }

    /// Frame rate the artifact was encoded at.
    pub fn fps(&self) -> u32 {
        self.fps
    }

    /// Nominal playback duration: `frame_count / fps`.
    pub fn duration(&self) -> Duration {
        Duration::from_nanos(self.frame_count.saturating_mul(1_000_000_000) / u64::from(self.fps))
    }

    /// Download file name for a given timestamp:
    /// `video_<epoch_millis>.<extension>`.
    pub fn file_name(&self, epoch_millis: u128) -> String {
        format!("video_{epoch_millis}.{}", self.extension())
    }

    /// Download file name stamped with the current time.
    pub fn default_file_name(&self) -> String {
        let millis = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|elapsed| elapsed.as_millis())
            .unwrap_or_default();
        self.file_name(millis)
    }

    /// Write the artifact into `directory` under its default file name.
    ///
    /// # Errors
    ///
    /// Returns [`FlipbookError::IoError`] if the directory cannot be created
    /// or the file cannot be written.
    pub fn save_to_dir<P: AsRef<Path>>(&self, directory: P) -> Result<PathBuf, FlipbookError> {
        let directory = directory.as_ref();
        fs::create_dir_all(directory)?;
        let path = directory.join(self.default_file_name());
        fs::write(&path, &self.bytes)?;
        log::info!("Saved {} ({} bytes)", path.display(), self.bytes.len());
        Ok(path)
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;

    #[test]
    fn chunk_buffer_drops_empty_chunks() {
        let mut buffer = ChunkBuffer::new();
        buffer.push(vec![1, 2]);
        buffer.push(Vec::new());
        buffer.write_all(&[3]).unwrap();
        assert_eq!(buffer.len(), 2);
        assert_eq!(buffer.byte_len(), 3);
        assert_eq!(buffer.concat(), vec![1, 2, 3]);
        assert!(buffer.is_empty());
    }

    #[test]
    fn artifact_duration_and_name() {
        let artifact = Artifact::new(vec![0; 16], Container::WebM, 2, 10);
        assert_eq!(artifact.duration(), Duration::from_millis(200));
        assert_eq!(artifact.media_type(), "video/webm");
        assert_eq!(artifact.file_name(1_700_000_000_000), "video_1700000000000.webm");
    }
}
