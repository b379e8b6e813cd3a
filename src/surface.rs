//! The drawing surface frames are painted onto before capture.

use image::imageops::{self, FilterType};
use image::{DynamicImage, Rgba, RgbaImage};

/// Opaque white, the background used when transparency is disabled.
pub const WHITE: Rgba<u8> = Rgba([255, 255, 255, 255]);

/// Fully transparent black.
pub const TRANSPARENT: Rgba<u8> = Rgba([0, 0, 0, 0]);

/// A fixed-size RGBA canvas reused for every paint of an export.
#[derive(Debug, Clone)]
pub struct Surface {
    pixels: RgbaImage,
    filter: FilterType,
}

impl Surface {
    /// Create a transparent surface. Zero dimensions are raised to 1.
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            pixels: RgbaImage::from_pixel(width.max(1), height.max(1), TRANSPARENT),
            filter: FilterType::Triangle,
        }
    }

    /// Resampling filter used when a frame does not match the surface size.
    #[must_use]
    pub fn with_filter(mut self, filter: FilterType) -> Self {
        self.filter = filter;
        self
    }

    /// Surface width in pixels.
    pub fn width(&self) -> u32 {
        self.pixels.width()
    }

    /// Surface height in pixels.
    pub fn height(&self) -> u32 {
        self.pixels.height()
    }

    /// Fill every pixel with `color`.
    pub fn fill(&mut self, color: Rgba<u8>) {
        for pixel in self.pixels.pixels_mut() {
            *pixel = color;
        }
    }

    /// Reset every pixel to fully transparent.
    pub fn clear(&mut self) {
        self.fill(TRANSPARENT);
    }

    /// Draw `image` stretched over the whole surface, alpha-blended onto the
    /// current contents. Aspect ratio is not preserved.
    pub fn draw_stretched(&mut self, image: &DynamicImage) {
        let (width, height) = (self.width(), self.height());
        if image.width() == 0 || image.height() == 0 {
            return;
        }
        if image.width() == width && image.height() == height {
            imageops::overlay(&mut self.pixels, &image.to_rgba8(), 0, 0);
        } else {
            let scaled = imageops::resize(&image.to_rgba8(), width, height, self.filter);
            imageops::overlay(&mut self.pixels, &scaled, 0, 0);
        }
    }

    /// Prepare the background and draw one frame.
    ///
    /// With `transparent` set the surface is cleared, otherwise it is filled
    /// with opaque white first.
    pub fn paint(&mut self, image: &DynamicImage, transparent: bool) {
        if transparent {
            self.clear();
        } else {
            self.fill(WHITE);
        }
        self.draw_stretched(image);
    }

    /// Current pixels.
    pub fn pixels(&self) -> &RgbaImage {
        &self.pixels
    }

    /// Returns `true` if every pixel has full alpha.
    pub fn is_opaque(&self) -> bool {
        self.pixels.pixels().all(|pixel| pixel[3] == u8::MAX)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn half_transparent(width: u32, height: u32) -> DynamicImage {
        let mut image = RgbaImage::from_pixel(width, height, Rgba([255, 0, 0, 255]));
        for x in 0..width / 2 {
            for y in 0..height {
                image.put_pixel(x, y, TRANSPARENT);
            }
        }
        DynamicImage::ImageRgba8(image)
    }

    #[test]
    fn opaque_paint_fills_white_behind_transparency() {
        let mut surface = Surface::new(4, 4);
        surface.paint(&half_transparent(4, 4), false);
        assert!(surface.is_opaque());
        assert_eq!(*surface.pixels().get_pixel(0, 0), WHITE);
        assert_eq!(*surface.pixels().get_pixel(3, 0), Rgba([255, 0, 0, 255]));
    }

    #[test]
    fn transparent_paint_keeps_alpha() {
        let mut surface = Surface::new(4, 4);
        surface.fill(WHITE);
        surface.paint(&half_transparent(4, 4), true);
        assert!(!surface.is_opaque());
        assert_eq!(surface.pixels().get_pixel(0, 0)[3], 0);
    }

    #[test]
    fn stretches_to_surface_size() {
        let mut surface = Surface::new(8, 2);
        let red = DynamicImage::ImageRgba8(RgbaImage::from_pixel(2, 2, Rgba([255, 0, 0, 255])));
        surface.paint(&red, true);
        assert!(surface.pixels().pixels().all(|p| *p == Rgba([255, 0, 0, 255])));
    }

    #[test]
    fn zero_size_is_clamped() {
        let surface = Surface::new(0, 0);
        assert_eq!((surface.width(), surface.height()), (1, 1));
    }
}
