//! GIF export integration tests.
//!
//! Requires the `gif` feature.

#![cfg(feature = "gif")]

use std::io::Cursor;
use std::time::Duration;

use flipbook::{Container, ExportOptions, Session, UploadFile, sink_for};
use image::codecs::gif::GifDecoder;
use image::{AnimationDecoder, DynamicImage, ImageFormat, Rgba, RgbaImage};

fn png(name: &str, color: [u8; 4]) -> UploadFile {
    let mut bytes = Cursor::new(Vec::new());
    DynamicImage::ImageRgba8(RgbaImage::from_pixel(12, 8, Rgba(color)))
        .write_to(&mut bytes, ImageFormat::Png)
        .unwrap();
    UploadFile::new(name, "image/png", bytes.into_inner())
}

#[tokio::test]
async fn exports_animated_gif() {
    let mut session = Session::new();
    session
        .upload(vec![png("red", [255, 0, 0, 255]), png("blue", [0, 0, 255, 255])])
        .await
        .unwrap();

    let options = ExportOptions::new()
        .with_fps(5)
        .with_container(Container::Gif)
        .with_flush_delay(Duration::ZERO);
    let artifact = session.export(&options).await.unwrap();
    assert_eq!(artifact.media_type(), "image/gif");
    assert_eq!(artifact.extension(), "gif");
    assert_eq!(artifact.duration(), Duration::from_millis(400));

    let decoder = GifDecoder::new(Cursor::new(artifact.bytes())).unwrap();
    let frames = decoder.into_frames().collect_frames().unwrap();
    assert_eq!(frames.len(), 2);
    let (numerator, denominator) = frames[0].delay().numer_denom_ms();
    assert_eq!(numerator / denominator, 200);
    assert_eq!(frames[0].buffer().dimensions(), (12, 8));
}

#[tokio::test]
async fn transparent_gif_keeps_clear_pixels() {
    let mut session = Session::new();
    session
        .upload(vec![png("clear", [0, 0, 0, 0])])
        .await
        .unwrap();

    let options = ExportOptions::new()
        .with_container(Container::Gif)
        .with_transparency(true)
        .with_flush_delay(Duration::ZERO);
    let artifact = session.export(&options).await.unwrap();

    let decoder = GifDecoder::new(Cursor::new(artifact.bytes())).unwrap();
    let frames = decoder.into_frames().collect_frames().unwrap();
    assert_eq!(frames[0].buffer().get_pixel(0, 0)[3], 0);
}

#[test]
fn sink_for_matches_container() {
    assert_eq!(sink_for(Container::Gif).container(), Container::Gif);
    assert_eq!(sink_for(Container::WebM).container(), Container::WebM);
}
