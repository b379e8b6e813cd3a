//! Status notification tests.

use std::time::{Duration, Instant};

use flipbook::{Reporter, STATUS_DISPLAY_DURATION, Severity, StatusBoard, StatusMessage};

#[test]
fn messages_auto_dismiss_after_four_seconds() {
    assert_eq!(STATUS_DISPLAY_DURATION, Duration::from_secs(4));

    let board = StatusBoard::new();
    let posted = Instant::now();
    board.post_at(StatusMessage::error("Load at least one image"), posted);

    assert!(board.visible_at(posted).is_some());
    assert!(board.visible_at(posted + Duration::from_millis(3_999)).is_some());
    assert!(board.visible_at(posted + Duration::from_secs(4)).is_none());
    assert_eq!(board.history().len(), 1);
}

#[test]
fn newest_message_wins() {
    let board = StatusBoard::new();
    let start = Instant::now();
    board.post_at(StatusMessage::info("Generating video..."), start);
    board.post_at(
        StatusMessage::success("Video generated"),
        start + Duration::from_secs(3),
    );

    // The newer message gets its own four seconds.
    let visible = board.visible_at(start + Duration::from_secs(6)).unwrap();
    assert_eq!(visible.message, "Video generated");
    assert_eq!(visible.severity, Severity::Success);
}

#[test]
fn reporter_posts_with_current_time() {
    let board = StatusBoard::new();
    board.on_status(&StatusMessage::success("Frames reordered"));
    assert_eq!(
        board.visible().map(|status| status.message),
        Some("Frames reordered".to_string())
    );
}

#[test]
fn severity_display() {
    assert_eq!(Severity::Info.to_string(), "info");
    assert_eq!(Severity::Success.to_string(), "success");
    assert_eq!(Severity::Error.to_string(), "error");
}

#[test]
fn custom_display_duration() {
    let mut status = StatusMessage::info("short");
    status.display_for = Duration::from_millis(10);
    let board = StatusBoard::new();
    let posted = Instant::now();
    board.post_at(status, posted);
    assert!(board.visible_at(posted + Duration::from_millis(10)).is_none());
}
