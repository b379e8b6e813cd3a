//! Error types for the `flipbook` crate.
//!
//! This module defines [`FlipbookError`], the unified error type returned by
//! all fallible operations in the crate. Most failures are recovered inside
//! a [`Session`](crate::Session) and reported through the status channel;
//! the error value still carries enough context to diagnose the problem.

use std::io::Error as IoError;

use ffmpeg_next::Error as FfmpegError;
use image::ImageError;
use thiserror::Error;

/// The unified error type for all `flipbook` operations.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum FlipbookError {
    /// An export was requested while the frame store is empty.
    #[error("No frames to export: load at least one image")]
    NoFrames,

    /// None of the codec variants in the preference list is available.
    #[error("No video encoder available (tried {tried})")]
    NoEncoderAvailable {
        /// Comma-separated encoder names that were tried.
        tried: String,
    },

    /// The encoder rejected its configuration or a frame.
    #[error("Video encoding error: {0}")]
    VideoEncodeError(String),

    /// The container could not be written.
    #[error("Video write error: {0}")]
    VideoWriteError(String),

    /// A sink was fed frames before [`start`](crate::CaptureSink::start)
    /// or after [`finish`](crate::CaptureSink::finish).
    #[error("Capture sink is not started")]
    SinkNotStarted,

    /// A background decode task panicked or was aborted.
    #[error("Decode task failed: {0}")]
    DecodeTaskFailed(String),

    /// GIF encoding failed.
    #[cfg(feature = "gif")]
    #[error("GIF encoding error: {0}")]
    GifEncodeError(String),

    /// An error originating from the FFmpeg libraries.
    #[error("FFmpeg error: {0}")]
    FfmpegError(String),

    /// An I/O error occurred while reading inputs or writing the artifact.
    #[error("I/O error: {0}")]
    IoError(#[from] IoError),

    /// An error from the `image` crate.
    #[error("Image processing error: {0}")]
    ImageError(#[from] ImageError),
}

impl From<FfmpegError> for FlipbookError {
    fn from(error: FfmpegError) -> Self {
        FlipbookError::FfmpegError(error.to_string())
    }
}
