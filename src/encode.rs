//! WebM capture sink backed by FFmpeg.
//!
//! [`WebmSink`] encodes painted surfaces with libvpx into a WebM container.
//! The codec is negotiated from an ordered preference list: VP9 when the
//! FFmpeg build ships `libvpx-vp9`, VP8 (`libvpx`) otherwise. Whatever codec
//! is used, the artifact is tagged `video/webm`.
//!
//! # Example
//!
//! ```no_run
//! use flipbook::{CaptureSettings, CaptureSink, FlipbookError, WebmSink};
//! use image::{Rgba, RgbaImage};
//!
//! let mut sink = WebmSink::new();
//! sink.start(&CaptureSettings {
//!     width: 320,
//!     height: 240,
//!     fps: 10,
//!     bitrate: 2_500_000,
//!     transparent: false,
//! })?;
//! let red = RgbaImage::from_pixel(320, 240, Rgba([255, 0, 0, 255]));
//! for _ in 0..10 {
//!     sink.capture(&red)?;
//! }
//! let artifact = sink.finish()?;
//! println!("{} bytes of {}", artifact.len(), artifact.media_type());
//! # Ok::<(), FlipbookError>(())
//! ```

use std::fs;
use std::path::PathBuf;
use std::time::{SystemTime, UNIX_EPOCH};

use ffmpeg_next::codec::context::Context as CodecContext;
use ffmpeg_next::encoder::video::Encoder as VideoEncoder;
use ffmpeg_next::format::context::Output;
use ffmpeg_next::format::{Flags as FormatFlags, Pixel};
use ffmpeg_next::frame::Video as VideoFrame;
use ffmpeg_next::software::scaling::{Context as ScalingContext, Flags as ScalingFlags};
use ffmpeg_next::{Codec, Dictionary, Packet, Rational};
use image::RgbaImage;

use crate::capture::{Artifact, CaptureSettings, CaptureSink};
use crate::configuration::Container;
use crate::error::FlipbookError;

/// WebM video codecs, in the order they are preferred.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum VideoCodec {
    /// VP9 via `libvpx-vp9`.
    Vp9,
    /// VP8 via `libvpx`. The baseline every WebM-capable build has.
    Vp8,
}

impl VideoCodec {
    /// Default preference list: VP9 first, VP8 as fallback.
    pub const PREFERENCE: [VideoCodec; 2] = [VideoCodec::Vp9, VideoCodec::Vp8];

    /// FFmpeg encoder name.
    pub fn encoder_name(self) -> &'static str {
        match self {
            VideoCodec::Vp9 => "libvpx-vp9",
            VideoCodec::Vp8 => "libvpx",
        }
    }

    /// Returns `true` if this FFmpeg build can encode the codec.
    pub fn is_available(self) -> bool {
        crate::ffmpeg::initialize().is_ok()
            && ffmpeg_next::encoder::find_by_name(self.encoder_name()).is_some()
    }

    /// First available codec of `preferences`.
    pub fn negotiate(preferences: &[VideoCodec]) -> Option<VideoCodec> {
        preferences.iter().copied().find(|codec| codec.is_available())
    }

    fn find(self) -> Option<Codec> {
        ffmpeg_next::encoder::find_by_name(self.encoder_name())
    }
}

struct ActiveEncode {
    output: Output,
    encoder: VideoEncoder,
    scaler: ScalingContext,
    stream_index: usize,
    encoder_time_base: Rational,
    stream_time_base: Rational,
    settings: CaptureSettings,
    codec: VideoCodec,
    frame_index: i64,
    path: PathBuf,
}

/// FFmpeg-backed WebM capture sink.
///
/// The container is written to a scratch file while capturing and read
/// back into memory by [`finish`](CaptureSink::finish); the scratch file is
/// removed afterwards, and also when the sink is dropped mid-capture.
pub struct WebmSink {
    preferences: Vec<VideoCodec>,
    scratch_dir: PathBuf,
    active: Option<ActiveEncode>,
}

impl Default for WebmSink {
    fn default() -> Self {
        Self::new()
    }
}

impl WebmSink {
    /// Create a sink using the default codec preference list and the system
    /// temporary directory.
    pub fn new() -> Self {
        Self {
            preferences: VideoCodec::PREFERENCE.to_vec(),
            scratch_dir: std::env::temp_dir(),
            active: None,
        }
    }

    /// Replace the codec preference list.
    #[must_use]
    pub fn with_preferences(mut self, preferences: &[VideoCodec]) -> Self {
        self.preferences = preferences.to_vec();
        self
    }

    /// Directory the in-progress container is written to.
    #[must_use]
    pub fn with_scratch_dir(mut self, directory: impl Into<PathBuf>) -> Self {
        self.scratch_dir = directory.into();
        self
    }

    /// Codec of the capture in progress.
    pub fn active_codec(&self) -> Option<VideoCodec> {
        self.active.as_ref().map(|active| active.codec)
    }

    fn scratch_path(&self) -> PathBuf {
        let nanos = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|elapsed| elapsed.as_nanos())
            .unwrap_or_default();
        self.scratch_dir
            .join(format!("flipbook-{}-{nanos}.webm", std::process::id()))
    }

    fn open(&self, settings: &CaptureSettings) -> Result<ActiveEncode, FlipbookError> {
        crate::ffmpeg::initialize()?;

        let (codec, encoder_codec) = self
            .preferences
            .iter()
            .find_map(|codec| codec.find().map(|found| (*codec, found)))
            .ok_or_else(|| FlipbookError::NoEncoderAvailable {
                tried: self
                    .preferences
                    .iter()
                    .map(|codec| codec.encoder_name())
                    .collect::<Vec<_>>()
                    .join(", "),
            })?;
        if Some(&codec) != self.preferences.first() {
            log::info!("Preferred codec unavailable, falling back to {codec:?}");
        }

        let path = self.scratch_path();
        // The muxer creates the scratch file before most of the setup runs.
        open_at(path.clone(), codec, encoder_codec, settings).inspect_err(|_| {
            let _ = fs::remove_file(&path);
        })
    }
}

fn open_at(
    path: PathBuf,
    codec: VideoCodec,
    encoder_codec: Codec,
    settings: &CaptureSettings,
) -> Result<ActiveEncode, FlipbookError> {
    let target_pixel = if settings.transparent {
        Pixel::YUVA420P
    } else {
        Pixel::YUV420P
    };
    let fps = settings.fps as i32;
    let encoder_time_base = Rational::new(1, fps);

    let mut output = ffmpeg_next::format::output_as(&path, "webm")
        .map_err(|e| FlipbookError::VideoWriteError(format!("cannot open output: {e}")))?;
    let needs_global_header = output.format().flags().contains(FormatFlags::GLOBAL_HEADER);

    let mut stream = output
        .add_stream(encoder_codec)
        .map_err(|e| FlipbookError::VideoWriteError(format!("cannot add stream: {e}")))?;
    let stream_index = stream.index();

    let mut encoder = CodecContext::from_parameters(stream.parameters())
        .map_err(|e| {
            FlipbookError::VideoEncodeError(format!("cannot create codec context: {e}"))
        })?
        .encoder()
        .video()
        .map_err(|e| FlipbookError::VideoEncodeError(format!("cannot open video encoder: {e}")))?;

    encoder.set_width(settings.width);
    encoder.set_height(settings.height);
    encoder.set_format(target_pixel);
    encoder.set_time_base(encoder_time_base);
    encoder.set_frame_rate(Some(Rational::new(fps, 1)));
    encoder.set_bit_rate(settings.bitrate);

    if needs_global_header {
        unsafe {
            (*encoder.as_mut_ptr()).flags |=
                ffmpeg_sys_next::AV_CODEC_FLAG_GLOBAL_HEADER as i32;
        }
    }

    let mut options = Dictionary::new();
    options.set("deadline", "good");
    options.set("cpu-used", "4");
    // One packet per captured frame. libvpx also drops the alpha plane when
    // alt-ref frames are on.
    options.set("auto-alt-ref", "0");

    let encoder = encoder
        .open_as_with(encoder_codec, options)
        .map_err(|e| FlipbookError::VideoEncodeError(format!("cannot open encoder: {e}")))?;
    stream.set_parameters(&encoder);

    output
        .write_header()
        .map_err(|e| FlipbookError::VideoWriteError(format!("cannot write header: {e}")))?;
    let stream_time_base = output
        .stream(stream_index)
        .map(|stream| stream.time_base())
        .unwrap_or(encoder_time_base);

    let scaler = ScalingContext::get(
        Pixel::RGBA,
        settings.width,
        settings.height,
        target_pixel,
        settings.width,
        settings.height,
        ScalingFlags::BILINEAR,
    )
    .map_err(|e| FlipbookError::VideoWriteError(format!("cannot create scaler: {e}")))?;

    log::info!(
        "Capturing {}x{} @ {} fps with {} ({:?})",
        settings.width,
        settings.height,
        settings.fps,
        codec.encoder_name(),
        target_pixel,
    );

    Ok(ActiveEncode {
        output,
        encoder,
        scaler,
        stream_index,
        encoder_time_base,
        stream_time_base,
        settings: *settings,
        codec,
        frame_index: 0,
        path,
    })
}


impl ActiveEncode {
    fn encode(&mut self, surface: &RgbaImage) -> Result<(), FlipbookError> {
        let CaptureSettings { width, height, .. } = self.settings;
        if surface.width() != width || surface.height() != height {
            return Err(FlipbookError::VideoEncodeError(format!(
                "surface is {}x{}, encoder expects {width}x{height}",
                surface.width(),
                surface.height(),
            )));
        }

        let mut source = VideoFrame::new(Pixel::RGBA, width, height);
        let stride = source.stride(0);
        let row_len = width as usize * 4;
        let pixels = surface.as_raw();
        let plane = source.data_mut(0);
        for y in 0..height as usize {
            plane[y * stride..y * stride + row_len]
                .copy_from_slice(&pixels[y * row_len..(y + 1) * row_len]);
        }

        let mut converted = VideoFrame::empty();
        self.scaler
            .run(&source, &mut converted)
            .map_err(|e| FlipbookError::VideoWriteError(format!("scaling failed: {e}")))?;
        converted.set_pts(Some(self.frame_index));
        self.frame_index += 1;

        self.encoder
            .send_frame(&converted)
            .map_err(|e| FlipbookError::VideoEncodeError(format!("send_frame failed: {e}")))?;
        self.drain_packets()
    }

    fn drain_packets(&mut self) -> Result<(), FlipbookError> {
        let mut packet = Packet::empty();
        while self.encoder.receive_packet(&mut packet).is_ok() {
            packet.set_stream(self.stream_index);
            if packet.duration() <= 0 {
                packet.set_duration(1);
            }
            packet.rescale_ts(self.encoder_time_base, self.stream_time_base);
            packet
                .write_interleaved(&mut self.output)
                .map_err(|e| FlipbookError::VideoWriteError(format!("write packet failed: {e}")))?;
        }
        Ok(())
    }

    fn close(mut self) -> Result<Artifact, FlipbookError> {
        self.encoder
            .send_eof()
            .map_err(|e| FlipbookError::VideoEncodeError(format!("send_eof failed: {e}")))?;
        self.drain_packets()?;
        self.output
            .write_trailer()
            .map_err(|e| FlipbookError::VideoWriteError(format!("cannot write trailer: {e}")))?;

        let ActiveEncode {
            output,
            path,
            codec,
            frame_index,
            settings,
            ..
        } = self;
        // Closes the scratch file before it is read back.
        drop(output);

        let bytes = fs::read(&path);
        let _ = fs::remove_file(&path);

        Ok(Artifact::new(
            bytes?,
            Container::WebM,
            frame_index as u64,
            settings.fps,
        )
        .with_codec(codec.encoder_name()))
    }
}

impl CaptureSink for WebmSink {
    fn container(&self) -> Container {
        Container::WebM
    }

    fn start(&mut self, settings: &CaptureSettings) -> Result<(), FlipbookError> {
        if let Some(previous) = self.active.take() {
            log::warn!("Restarting sink with an unfinished capture; discarding it");
            discard(previous);
        }
        let normalized = settings.normalized();
        if normalized.fps != settings.fps {
            log::warn!("Capture fps {} clamped to {}", settings.fps, normalized.fps);
        }
        self.active = Some(self.open(&normalized)?);
        Ok(())
    }

    fn capture(&mut self, surface: &RgbaImage) -> Result<(), FlipbookError> {
        self.active
            .as_mut()
            .ok_or(FlipbookError::SinkNotStarted)?
            .encode(surface)
    }

    fn finish(&mut self) -> Result<Artifact, FlipbookError> {
        let active = self.active.take().ok_or(FlipbookError::SinkNotStarted)?;
        let path = active.path.clone();
        let result = active.close();
        if result.is_err() {
            let _ = fs::remove_file(&path);
        }
        result
    }
}

impl Drop for WebmSink {
    fn drop(&mut self) {
        if let Some(active) = self.active.take() {
            discard(active);
        }
    }
}

fn discard(active: ActiveEncode) {
    let path = active.path.clone();
    drop(active);
    let _ = fs::remove_file(path);
}
