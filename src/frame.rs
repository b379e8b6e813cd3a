//! Frames and upload inputs.
//!
//! A [`Frame`] is one decoded still image together with the encoded bytes
//! it was decoded from. An [`UploadFile`] is the raw input handed to
//! [`Session::upload`](crate::Session::upload): a name, a declared MIME type,
//! and the file contents.

use std::fs;
use std::path::Path;
use std::sync::Arc;

use image::{DynamicImage, ImageFormat};

use crate::error::FlipbookError;

/// MIME prefix every accepted upload must carry.
pub const IMAGE_MIME_PREFIX: &str = "image/";

/// Returns `true` if the declared MIME type is an image type.
///
/// Only the prefix is checked; the actual bytes are validated by decoding.
pub fn is_image_mime(mime: &str) -> bool {
    mime.starts_with(IMAGE_MIME_PREFIX)
}

/// A file submitted for upload.
#[derive(Debug, Clone)]
pub struct UploadFile {
    /// Display name (usually the file name).
    pub name: String,
    /// Declared media type, e.g. `image/png`.
    pub mime: String,
    /// Encoded file contents.
    pub bytes: Vec<u8>,
}

impl UploadFile {
    /// Create an upload from in-memory bytes.
    pub fn new(name: impl Into<String>, mime: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            name: name.into(),
            mime: mime.into(),
            bytes,
        }
    }

    /// Read a file from disk, deriving its MIME type from the extension.
    ///
    /// Unknown extensions are declared as `application/octet-stream`, which
    /// the upload filter will then skip.
    ///
    /// # Errors
    ///
    /// Returns [`FlipbookError::IoError`] if the file cannot be read.
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self, FlipbookError> {
        let path = path.as_ref();
        let bytes = fs::read(path)?;
        let mime = ImageFormat::from_path(path)
            .map(|format| format.to_mime_type())
            .unwrap_or("application/octet-stream");
        let name = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());

        log::debug!("Read {} ({mime}, {} bytes)", path.display(), bytes.len());
        Ok(Self::new(name, mime, bytes))
    }

    /// Returns `true` if this upload passes the MIME-type filter.
    pub fn is_image(&self) -> bool {
        is_image_mime(&self.mime)
    }
}

/// One decoded still image in the frame store.
///
/// Frames have no identity beyond their position in the store. Both the
/// decoded image and the source bytes are reference counted, so cloning a
/// frame (for example when an export snapshots the store) does not copy
/// pixel data.
#[derive(Debug, Clone)]
pub struct Frame {
    image: Arc<DynamicImage>,
    source: Arc<[u8]>,
    mime: String,
    name: String,
}

impl Frame {
    /// Wrap an already decoded image.
    pub fn new(image: DynamicImage, source: Vec<u8>, mime: impl Into<String>) -> Self {
        Self {
            image: Arc::new(image),
            source: Arc::from(source),
            mime: mime.into(),
            name: String::new(),
        }
    }

    /// Decode an upload into a frame.
    ///
    /// # Errors
    ///
    /// Returns [`FlipbookError::ImageError`] if the bytes are not a
    /// decodable image.
    pub fn decode(file: UploadFile) -> Result<Self, FlipbookError> {
        let image = image::load_from_memory(&file.bytes)?;
        log::debug!(
            "Decoded {} ({}x{})",
            file.name,
            image.width(),
            image.height()
        );
        Ok(Self {
            image: Arc::new(image),
            source: Arc::from(file.bytes),
            mime: file.mime,
            name: file.name,
        })
    }

    /// Attach a display name.
    #[must_use]
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// The decoded image.
    pub fn image(&self) -> &DynamicImage {
        &self.image
    }

    /// The encoded bytes the image was decoded from.
    pub fn source(&self) -> &[u8] {
        &self.source
    }

    /// Declared MIME type of the source bytes.
    pub fn mime(&self) -> &str {
        &self.mime
    }

    /// Display name, empty if none was given.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Pixel width of the decoded image.
    pub fn width(&self) -> u32 {
        self.image.width()
    }

    /// Pixel height of the decoded image.
    pub fn height(&self) -> u32 {
        self.image.height()
    }

    /// Preview image scaled to fit within `max_dimension` on its longest
    /// edge, preserving aspect ratio. Images already small enough are
    /// returned unscaled.
    pub fn thumbnail(&self, max_dimension: u32) -> DynamicImage {
        let max_dimension = max_dimension.max(1);
        if self.width() <= max_dimension && self.height() <= max_dimension {
            return (*self.image).clone();
        }
        self.image.thumbnail(max_dimension, max_dimension)
    }
}
