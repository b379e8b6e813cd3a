//! Export pipeline integration tests.
//!
//! These tests drive the render loop into an in-memory sink, so they run
//! without any FFmpeg encoder.

use std::io::Cursor;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use flipbook::{
    Artifact, CaptureSettings, CaptureSink, Container, ExportJob, ExportOptions, FlipbookError,
    Frame, OperationType, ProgressInfo, Reporter, Session, Severity, StatusBoard, StatusMessage,
    UploadFile,
};
use image::{DynamicImage, ImageFormat, Rgba, RgbaImage};

/// Records every captured surface and the order of sink calls.
#[derive(Default)]
struct RecordingSink {
    settings: Option<CaptureSettings>,
    surfaces: Vec<RgbaImage>,
    calls: Vec<&'static str>,
}

impl CaptureSink for RecordingSink {
    fn container(&self) -> Container {
        Container::WebM
    }

    fn start(&mut self, settings: &CaptureSettings) -> Result<(), FlipbookError> {
        self.calls.push("start");
        self.settings = Some(*settings);
        self.surfaces.clear();
        Ok(())
    }

    fn capture(&mut self, surface: &RgbaImage) -> Result<(), FlipbookError> {
        let settings = self.settings.ok_or(FlipbookError::SinkNotStarted)?;
        if surface.dimensions() != (settings.width, settings.height) {
            return Err(FlipbookError::VideoEncodeError("surface size mismatch".into()));
        }
        self.calls.push("capture");
        self.surfaces.push(surface.clone());
        Ok(())
    }

    fn finish(&mut self) -> Result<Artifact, FlipbookError> {
        let settings = self.settings.take().ok_or(FlipbookError::SinkNotStarted)?;
        self.calls.push("finish");
        let bytes = vec![0xAB; self.surfaces.len()];
        Ok(Artifact::new(
            bytes,
            Container::WebM,
            self.surfaces.len() as u64,
            settings.fps,
        ))
    }
}

/// A sink whose encoder refuses to start.
struct BrokenSink;

impl CaptureSink for BrokenSink {
    fn container(&self) -> Container {
        Container::WebM
    }

    fn start(&mut self, _settings: &CaptureSettings) -> Result<(), FlipbookError> {
        Err(FlipbookError::VideoEncodeError("refused".into()))
    }

    fn capture(&mut self, _surface: &RgbaImage) -> Result<(), FlipbookError> {
        Err(FlipbookError::SinkNotStarted)
    }

    fn finish(&mut self) -> Result<Artifact, FlipbookError> {
        Err(FlipbookError::SinkNotStarted)
    }
}

#[derive(Default)]
struct PercentRecorder(Mutex<Vec<(OperationType, f32)>>);

impl Reporter for PercentRecorder {
    fn on_progress(&self, info: &ProgressInfo) {
        self.0.lock().unwrap().push((info.operation, info.percent));
    }
}

fn png_bytes(image: RgbaImage) -> Vec<u8> {
    let mut bytes = Cursor::new(Vec::new());
    DynamicImage::ImageRgba8(image)
        .write_to(&mut bytes, ImageFormat::Png)
        .unwrap();
    bytes.into_inner()
}

fn solid(name: &str, color: [u8; 4], width: u32, height: u32) -> UploadFile {
    let bytes = png_bytes(RgbaImage::from_pixel(width, height, Rgba(color)));
    UploadFile::new(name, "image/png", bytes)
}

/// Left half transparent, right half opaque blue.
fn half_transparent(name: &str) -> UploadFile {
    let image = RgbaImage::from_fn(8, 8, |x, _| {
        if x < 4 {
            Rgba([0, 0, 0, 0])
        } else {
            Rgba([0, 0, 255, 255])
        }
    });
    UploadFile::new(name, "image/png", png_bytes(image))
}

fn fast(fps: u32) -> ExportOptions {
    ExportOptions::new()
        .with_fps(fps)
        .with_flush_delay(Duration::ZERO)
}

#[tokio::test]
async fn reorder_remove_export_scenario() {
    let mut session = Session::new();
    session
        .upload(vec![
            solid("a", [255, 0, 0, 255], 6, 4),
            solid("b", [0, 255, 0, 255], 6, 4),
            solid("c", [0, 0, 255, 255], 6, 4),
        ])
        .await
        .unwrap();

    session.drag_start(0);
    session.drop_on(2);
    session.remove_frame(1);
    let order: Vec<_> = session.frames().iter().map(|f| f.name()).collect();
    assert_eq!(order, ["b", "a"]);

    let mut sink = RecordingSink::default();
    let artifact = session.export_with(&fast(10), &mut sink).await.unwrap();
    assert_eq!(artifact.frame_count(), 2);
    assert_eq!(artifact.duration(), Duration::from_millis(200));
    assert_eq!(artifact.media_type(), "video/webm");

    // b is green, a is red.
    assert_eq!(sink.surfaces[0].get_pixel(0, 0), &Rgba([0, 255, 0, 255]));
    assert_eq!(sink.surfaces[1].get_pixel(0, 0), &Rgba([255, 0, 0, 255]));
    assert_eq!(sink.calls, ["start", "capture", "capture", "finish"]);
}

#[tokio::test]
async fn zero_sized_frame_exports_at_one_pixel() {
    let empty = Frame::new(DynamicImage::new_rgba8(0, 0), Vec::new(), "image/png");
    let job = ExportJob::new(vec![empty], fast(10)).unwrap();

    let mut sink = RecordingSink::default();
    let artifact = job.run(&mut sink).await.unwrap();
    assert_eq!(artifact.frame_count(), 1);
    assert_eq!(sink.surfaces[0].dimensions(), (1, 1));
    assert_eq!(sink.surfaces[0].get_pixel(0, 0), &Rgba([255, 255, 255, 255]));
}

#[tokio::test]
async fn empty_export_fails_with_error_status() {
    let board = Arc::new(StatusBoard::new());
    let mut session = Session::new().with_reporter(board.clone());
    let mut sink = RecordingSink::default();

    let result = session.export_with(&fast(10), &mut sink).await;
    assert!(matches!(result, Err(FlipbookError::NoFrames)));
    assert!(sink.calls.is_empty(), "sink must not be touched");
    assert!(session.artifact().is_none());

    let status = board.visible().expect("error status posted");
    assert_eq!(status.severity, Severity::Error);
    assert_eq!(status.message, "Load at least one image");
}

#[tokio::test]
async fn export_posts_generating_then_generated() {
    let board = Arc::new(StatusBoard::new());
    let mut session = Session::new().with_reporter(board.clone());
    session
        .upload(vec![solid("a", [1, 2, 3, 255], 2, 2)])
        .await
        .unwrap();

    let mut sink = RecordingSink::default();
    session.export_with(&fast(30), &mut sink).await.unwrap();

    let messages: Vec<StatusMessage> = board.history();
    let texts: Vec<_> = messages.iter().map(|m| m.message.as_str()).collect();
    assert_eq!(texts, ["Generating video...", "Video generated"]);
    assert_eq!(messages[0].severity, Severity::Info);
    assert_eq!(messages[1].severity, Severity::Success);
    assert_eq!(board.percent(), Some(100.0));
}

#[tokio::test]
async fn transparency_disabled_paints_opaque_white() {
    let mut session = Session::new();
    session
        .upload(vec![half_transparent("half")])
        .await
        .unwrap();

    let mut sink = RecordingSink::default();
    session.export_with(&fast(60), &mut sink).await.unwrap();

    let surface = &sink.surfaces[0];
    assert!(surface.pixels().all(|p| p[3] == 255));
    assert_eq!(surface.get_pixel(0, 0), &Rgba([255, 255, 255, 255]));
    assert_eq!(surface.get_pixel(7, 0), &Rgba([0, 0, 255, 255]));
}

#[tokio::test]
async fn transparency_enabled_keeps_alpha() {
    let mut session = Session::new();
    session
        .upload(vec![half_transparent("half")])
        .await
        .unwrap();

    let mut sink = RecordingSink::default();
    let options = fast(60).with_transparency(true);
    session.export_with(&options, &mut sink).await.unwrap();

    let surface = &sink.surfaces[0];
    assert!(!surface.pixels().all(|p| p[3] == 255));
    assert_eq!(surface.get_pixel(0, 0)[3], 0);
    assert_eq!(surface.get_pixel(7, 7), &Rgba([0, 0, 255, 255]));
    assert!(sink.settings.is_none(), "sink finished");
}

#[tokio::test]
async fn frames_are_stretched_to_first_frame_size() {
    let mut session = Session::new();
    session
        .upload(vec![
            solid("big", [9, 9, 9, 255], 10, 6),
            solid("small", [255, 0, 0, 255], 2, 2),
        ])
        .await
        .unwrap();

    let mut sink = RecordingSink::default();
    session.export_with(&fast(60), &mut sink).await.unwrap();

    assert_eq!(sink.surfaces.len(), 2);
    for surface in &sink.surfaces {
        assert_eq!(surface.dimensions(), (10, 6));
    }
    assert_eq!(sink.surfaces[1].get_pixel(9, 5), &Rgba([255, 0, 0, 255]));
}

#[tokio::test]
async fn progress_runs_from_ten_to_hundred() {
    let recorder = Arc::new(PercentRecorder::default());
    let frames: Vec<Frame> = (0..4)
        .map(|i| {
            let image = RgbaImage::from_pixel(2, 2, Rgba([i * 50, 0, 0, 255]));
            Frame::new(DynamicImage::ImageRgba8(image), Vec::new(), "image/png")
        })
        .collect();

    let job = ExportJob::new(frames, fast(60)).unwrap();
    let mut sink = RecordingSink::default();
    job.run_with_reporter(&mut sink, recorder.clone())
        .await
        .unwrap();

    let seen = recorder.0.lock().unwrap();
    let percents: Vec<f32> = seen.iter().map(|(_, p)| *p).collect();
    assert_eq!(percents, [10.0, 20.0, 37.5, 55.0, 72.5, 90.0, 100.0]);
    assert!(seen.iter().all(|(op, _)| *op == OperationType::Export));
}

#[tokio::test]
async fn failed_export_keeps_previous_artifact() {
    let board = Arc::new(StatusBoard::new());
    let mut session = Session::new().with_reporter(board.clone());
    session
        .upload(vec![solid("a", [0, 0, 0, 255], 2, 2)])
        .await
        .unwrap();

    let mut sink = RecordingSink::default();
    session.export_with(&fast(20), &mut sink).await.unwrap();

    let result = session.export_with(&fast(20), &mut BrokenSink).await;
    assert!(matches!(result, Err(FlipbookError::VideoEncodeError(_))));
    assert_eq!(session.artifact().map(Artifact::frame_count), Some(1));
    assert_eq!(board.visible().map(|s| s.severity), Some(Severity::Error));
}

#[tokio::test]
async fn new_export_replaces_artifact_and_clear_releases_it() {
    let mut session = Session::new();
    session
        .upload(vec![
            solid("a", [0, 0, 0, 255], 2, 2),
            solid("b", [0, 0, 0, 255], 2, 2),
        ])
        .await
        .unwrap();

    let mut sink = RecordingSink::default();
    session.export_with(&fast(20), &mut sink).await.unwrap();
    assert_eq!(session.artifact().map(Artifact::frame_count), Some(2));

    session.remove_frame(0);
    session.export_with(&fast(20), &mut sink).await.unwrap();
    assert_eq!(session.artifact().map(Artifact::frame_count), Some(1));

    session.remove_frame(0);
    assert!(session.artifact().is_none());

    session
        .upload(vec![solid("c", [0, 0, 0, 255], 2, 2)])
        .await
        .unwrap();
    session.export_with(&fast(20), &mut sink).await.unwrap();
    session.clear();
    assert!(session.artifact().is_none());
    assert_eq!(session.frame_count(), 0);
}

#[tokio::test]
async fn frame_delay_paces_the_render_loop() {
    let mut session = Session::new();
    session
        .upload(vec![
            solid("a", [0, 0, 0, 255], 2, 2),
            solid("b", [0, 0, 0, 255], 2, 2),
            solid("c", [0, 0, 0, 255], 2, 2),
        ])
        .await
        .unwrap();

    let started = std::time::Instant::now();
    let mut sink = RecordingSink::default();
    let options = ExportOptions::new()
        .with_fps(20)
        .with_flush_delay(Duration::from_millis(30));
    session.export_with(&options, &mut sink).await.unwrap();

    // Two 50 ms gaps between three paints, then the flush delay.
    assert!(started.elapsed() >= Duration::from_millis(130));
}

#[tokio::test]
async fn download_writes_timestamped_file() {
    let board = Arc::new(StatusBoard::new());
    let mut session = Session::new().with_reporter(board.clone());
    let dir = tempfile::tempdir().unwrap();

    assert!(session.download(dir.path()).unwrap().is_none());

    session
        .upload(vec![solid("a", [0, 0, 0, 255], 2, 2)])
        .await
        .unwrap();
    let mut sink = RecordingSink::default();
    session.export_with(&fast(10), &mut sink).await.unwrap();

    let path = session.download(dir.path()).unwrap().expect("artifact saved");
    let file_name = path.file_name().unwrap().to_string_lossy().into_owned();
    assert!(file_name.starts_with("video_"));
    assert!(file_name.ends_with(".webm"));
    assert_eq!(std::fs::read(&path).unwrap(), vec![0xAB]);
    assert_eq!(board.visible().map(|s| s.message), Some("Download started".into()));
}
