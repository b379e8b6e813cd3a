//! User-facing status notifications.
//!
//! [`StatusMessage`] is a transient, severity-tagged line of text. The
//! [`StatusBoard`] reporter keeps the latest message and progress value and
//! hides the message once its display time has passed.

use std::fmt::{Display, Formatter, Result as FmtResult};
use std::sync::Mutex;
use std::time::{Duration, Instant};

use crate::progress::{ProgressInfo, Reporter};

/// How long a notification stays visible.
pub const STATUS_DISPLAY_DURATION: Duration = Duration::from_millis(4000);

/// Severity class of a notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Severity {
    /// Neutral information ("Generating video...").
    Info,
    /// A user action succeeded ("Frames reordered").
    Success,
    /// An operation was refused or failed.
    Error,
}

impl Display for Severity {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        match self {
            Severity::Info => write!(f, "info"),
            Severity::Success => write!(f, "success"),
            Severity::Error => write!(f, "error"),
        }
    }
}

/// A transient notification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusMessage {
    /// Text shown to the user.
    pub message: String,
    /// Severity class.
    pub severity: Severity,
    /// How long the message stays visible after it is posted.
    pub display_for: Duration,
}

impl StatusMessage {
    /// Create a notification with the default display time.
    pub fn new(message: impl Into<String>, severity: Severity) -> Self {
        Self {
            message: message.into(),
            severity,
            display_for: STATUS_DISPLAY_DURATION,
        }
    }

    /// Shorthand for an [`Severity::Info`] message.
    pub fn info(message: impl Into<String>) -> Self {
        Self::new(message, Severity::Info)
    }

    /// Shorthand for a [`Severity::Success`] message.
    pub fn success(message: impl Into<String>) -> Self {
        Self::new(message, Severity::Success)
    }

    /// Shorthand for an [`Severity::Error`] message.
    pub fn error(message: impl Into<String>) -> Self {
        Self::new(message, Severity::Error)
    }
}

#[derive(Debug, Default)]
struct BoardState {
    percent: Option<f32>,
    current: Option<(StatusMessage, Instant)>,
    history: Vec<StatusMessage>,
}

/// A reporter that remembers what a status bar would show.
///
/// Posting a new message replaces the visible one. A message is visible
/// until `display_for` has elapsed since it was posted.
#[derive(Debug, Default)]
pub struct StatusBoard {
    state: Mutex<BoardState>,
}

impl StatusBoard {
    /// Create an empty board.
    pub fn new() -> Self {
        Self::default()
    }

    /// Post a message as if it arrived at `posted_at`.
    pub fn post_at(&self, status: StatusMessage, posted_at: Instant) {
        let mut state = self.lock();
        state.history.push(status.clone());
        state.current = Some((status, posted_at));
    }

    /// Message visible at `now`, or `None` once it has been auto-dismissed.
    pub fn visible_at(&self, now: Instant) -> Option<StatusMessage> {
        let state = self.lock();
        state.current.as_ref().and_then(|(status, posted_at)| {
            (now.saturating_duration_since(*posted_at) < status.display_for)
                .then(|| status.clone())
        })
    }

    /// Message visible right now.
    pub fn visible(&self) -> Option<StatusMessage> {
        self.visible_at(Instant::now())
    }

    /// Every message posted so far, oldest first.
    pub fn history(&self) -> Vec<StatusMessage> {
        self.lock().history.clone()
    }

    /// Last reported progress percentage.
    pub fn percent(&self) -> Option<f32> {
        self.lock().percent
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, BoardState> {
        self.state
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl Reporter for StatusBoard {
    fn on_progress(&self, info: &ProgressInfo) {
        self.lock().percent = Some(info.percent);
    }

    fn on_status(&self, status: &StatusMessage) {
        self.post_at(status.clone(), Instant::now());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn message_hides_after_display_duration() {
        let board = StatusBoard::new();
        let posted = Instant::now();
        board.post_at(StatusMessage::success("Frames reordered"), posted);

        let visible = board.visible_at(posted + Duration::from_millis(3999));
        assert_eq!(visible.map(|s| s.severity), Some(Severity::Success));
        assert!(board.visible_at(posted + STATUS_DISPLAY_DURATION).is_none());
    }

    #[test]
    fn newer_message_replaces_older() {
        let board = StatusBoard::new();
        let posted = Instant::now();
        board.post_at(StatusMessage::info("Generating video..."), posted);
        board.post_at(StatusMessage::error("boom"), posted + Duration::from_secs(1));

        let visible = board.visible_at(posted + Duration::from_secs(4)).unwrap();
        assert_eq!(visible.message, "boom");
        assert_eq!(board.history().len(), 2);
    }

    #[test]
    fn severity_display() {
        assert_eq!(Severity::Info.to_string(), "info");
        assert_eq!(Severity::Success.to_string(), "success");
        assert_eq!(Severity::Error.to_string(), "error");
    }
}
