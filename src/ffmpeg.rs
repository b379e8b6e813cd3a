//! FFmpeg initialisation and log-level control.
//!
//! FFmpeg prints its own warnings to stderr, independently of the Rust
//! [`log`](https://crates.io/crates/log) facade used by the rest of the
//! crate. [`set_ffmpeg_log_level`] tunes that output without callers having
//! to depend on `ffmpeg-next` themselves.
//!
//! # Example
//!
//! ```no_run
//! use flipbook::FfmpegLogLevel;
//!
//! // Only fatal encoder problems.
//! flipbook::set_ffmpeg_log_level(FfmpegLogLevel::Fatal);
//!
//! // Parsed from a CLI flag.
//! let level: FfmpegLogLevel = "warning".parse().unwrap();
//! flipbook::set_ffmpeg_log_level(level);
//! ```

use std::fmt::{Display, Formatter, Result as FmtResult};
use std::str::FromStr;

use ffmpeg_next::util::log::Level;

use crate::error::FlipbookError;

/// FFmpeg console verbosity, most quiet first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FfmpegLogLevel {
    /// No output at all.
    Quiet,
    /// Conditions that abort the process.
    Panic,
    /// Unrecoverable errors.
    Fatal,
    /// Recoverable errors.
    Error,
    /// Warnings (FFmpeg's default).
    Warning,
    /// Informational messages.
    Info,
    /// Verbose informational messages.
    Verbose,
    /// Debugging messages.
    Debug,
    /// Everything.
    Trace,
}

impl FfmpegLogLevel {
    const ALL: [(FfmpegLogLevel, &'static str, Level); 9] = [
        (FfmpegLogLevel::Quiet, "quiet", Level::Quiet),
        (FfmpegLogLevel::Panic, "panic", Level::Panic),
        (FfmpegLogLevel::Fatal, "fatal", Level::Fatal),
        (FfmpegLogLevel::Error, "error", Level::Error),
        (FfmpegLogLevel::Warning, "warning", Level::Warning),
        (FfmpegLogLevel::Info, "info", Level::Info),
        (FfmpegLogLevel::Verbose, "verbose", Level::Verbose),
        (FfmpegLogLevel::Debug, "debug", Level::Debug),
        (FfmpegLogLevel::Trace, "trace", Level::Trace),
    ];

    fn name(self) -> &'static str {
        Self::ALL
            .iter()
            .find(|(level, _, _)| *level == self)
            .map_or("warning", |(_, name, _)| name)
    }

    fn to_ffmpeg_level(self) -> Level {
        Self::ALL
            .iter()
            .find(|(level, _, _)| *level == self)
            .map_or(Level::Warning, |(_, _, ffmpeg)| *ffmpeg)
    }

    fn from_ffmpeg_level(ffmpeg: Level) -> Option<Self> {
        Self::ALL
            .iter()
            .find(|(_, _, candidate)| *candidate == ffmpeg)
            .map(|(level, _, _)| *level)
    }
}

impl Display for FfmpegLogLevel {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.write_str(self.name())
    }
}

impl FromStr for FfmpegLogLevel {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let lowered = value.trim().to_ascii_lowercase();
        let lowered = if lowered == "warn" { "warning".to_string() } else { lowered };
        Self::ALL
            .iter()
            .find(|(_, name, _)| *name == lowered)
            .map(|(level, _, _)| *level)
            .ok_or_else(|| format!("unknown FFmpeg log level: {value}"))
    }
}

/// Set FFmpeg's console verbosity. Does not affect `log` output.
pub fn set_ffmpeg_log_level(level: FfmpegLogLevel) {
    ffmpeg_next::util::log::set_level(level.to_ffmpeg_level());
}

/// Current FFmpeg console verbosity, if it maps to a known level.
pub fn get_ffmpeg_log_level() -> Option<FfmpegLogLevel> {
    ffmpeg_next::util::log::get_level()
        .ok()
        .and_then(FfmpegLogLevel::from_ffmpeg_level)
}

/// Initialise the FFmpeg libraries. Safe to call more than once.
pub(crate) fn initialize() -> Result<(), FlipbookError> {
    ffmpeg_next::init()
        .map_err(|error| FlipbookError::FfmpegError(format!("initialisation failed: {error}")))
}
