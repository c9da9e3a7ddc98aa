//! In-memory RGBA drawing surface.
//!
//! Stands in for a 2D canvas: it can be resized (which blanks it), cleared,
//! drawn onto, and read back. Surfaces are owned by the embedding page and
//! lent to the controller through [`SharedCanvas`].

use std::cell::RefCell;
use std::io::Cursor;
use std::rc::Rc;

use image::imageops::{self, FilterType};
use image::{ImageFormat, Rgba, RgbaImage};

use crate::data_uri;
use crate::error::CropError;
use crate::geometry::{PixelRegion, Size};

pub type SharedCanvas = Rc<RefCell<Canvas>>;

pub const TRANSPARENT: Rgba<u8> = Rgba([0, 0, 0, 0]);

#[derive(Debug, Clone)]
pub struct Canvas {
    pixels: RgbaImage,
    revision: u64,
}

impl Default for Canvas {
    fn default() -> Self {
        Self::new(Size::new(0, 0))
    }
}

impl Canvas {
    pub fn new(size: Size) -> Self {
        Self {
            pixels: RgbaImage::new(size.width, size.height),
            revision: 0,
        }
    }

    pub fn shared(size: Size) -> SharedCanvas {
        Rc::new(RefCell::new(Self::new(size)))
    }

    pub fn size(&self) -> Size {
        Size::new(self.pixels.width(), self.pixels.height())
    }

    pub fn pixels(&self) -> &RgbaImage {
        &self.pixels
    }

    /// Bumped on every mutation; lets embedders skip re-uploading unchanged
    /// pixels.
    pub fn revision(&self) -> u64 {
        self.revision
    }

    /// Reallocates the surface. Like a canvas dimension change, the content
    /// is discarded even when the size is unchanged.
    pub fn set_size(&mut self, size: Size) {
        self.pixels = RgbaImage::new(size.width, size.height);
        self.touch();
    }

    pub fn clear(&mut self) {
        for pixel in self.pixels.pixels_mut() {
            *pixel = TRANSPARENT;
        }
        self.touch();
    }

    /// Draws `image` with its top-left corner at `(x, y)`, alpha blended.
    pub fn draw_image(&mut self, image: &RgbaImage, x: i64, y: i64) {
        imageops::overlay(&mut self.pixels, image, x, y);
        self.touch();
    }

    /// Replaces the whole surface with `source` rescaled to `size`.
    pub fn draw_scaled(&mut self, source: &RgbaImage, size: Size) {
        self.pixels = if source.dimensions() == (size.width, size.height) {
            source.clone()
        } else {
            imageops::resize(source, size.width, size.height, FilterType::Triangle)
        };
        self.touch();
    }

    /// Copies out a region of the surface.
    pub fn region(&self, region: PixelRegion) -> RgbaImage {
        imageops::crop_imm(
            &self.pixels,
            region.x,
            region.y,
            region.width,
            region.height,
        )
        .to_image()
    }

    pub fn fill_rect(&mut self, x: i64, y: i64, width: u32, height: u32, color: Rgba<u8>) {
        let (surface_w, surface_h) = self.pixels.dimensions();
        let x0 = x.clamp(0, surface_w as i64) as u32;
        let y0 = y.clamp(0, surface_h as i64) as u32;
        let x1 = (x + width as i64).clamp(0, surface_w as i64) as u32;
        let y1 = (y + height as i64).clamp(0, surface_h as i64) as u32;
        for py in y0..y1 {
            for px in x0..x1 {
                self.pixels.put_pixel(px, py, color);
            }
        }
        self.touch();
    }

    /// One-pixel outline along the inside edge of `region`.
    pub fn stroke_rect(&mut self, region: PixelRegion, color: Rgba<u8>) {
        let PixelRegion {
            x,
            y,
            width,
            height,
        } = region;
        if width == 0 || height == 0 {
            return;
        }
        let (x, y) = (x as i64, y as i64);
        self.fill_rect(x, y, width, 1, color);
        self.fill_rect(x, y + height as i64 - 1, width, 1, color);
        self.fill_rect(x, y, 1, height, color);
        self.fill_rect(x + width as i64 - 1, y, 1, height, color);
    }

    pub fn to_png(&self) -> Result<Vec<u8>, CropError> {
        if self.size().is_empty() {
            return Err(CropError::NoImage);
        }
        let mut bytes = Vec::new();
        self.pixels
            .write_to(&mut Cursor::new(&mut bytes), ImageFormat::Png)
            .map_err(|e| CropError::Encode(e.to_string()))?;
        Ok(bytes)
    }

    pub fn to_data_uri(&self) -> Result<String, CropError> {
        Ok(data_uri::encode("image/png", &self.to_png()?))
    }

    fn touch(&mut self) {
        self.revision = self.revision.wrapping_add(1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const RED: Rgba<u8> = Rgba([255, 0, 0, 255]);

    #[test]
    fn set_size_blanks_content() {
        let mut canvas = Canvas::new(Size::new(4, 4));
        canvas.fill_rect(0, 0, 4, 4, RED);
        canvas.set_size(Size::new(4, 4));
        assert!(canvas.pixels().pixels().all(|p| *p == TRANSPARENT));
    }

    #[test]
    fn fill_rect_clips_to_surface() {
        let mut canvas = Canvas::new(Size::new(4, 4));
        canvas.fill_rect(-2, 2, 10, 10, RED);
        assert_eq!(*canvas.pixels().get_pixel(0, 1), TRANSPARENT);
        assert_eq!(*canvas.pixels().get_pixel(3, 3), RED);
        assert_eq!(*canvas.pixels().get_pixel(0, 2), RED);
    }

    #[test]
    fn stroke_leaves_interior_untouched() {
        let mut canvas = Canvas::new(Size::new(5, 5));
        canvas.stroke_rect(
            PixelRegion {
                x: 0,
                y: 0,
                width: 5,
                height: 5,
            },
            RED,
        );
        assert_eq!(*canvas.pixels().get_pixel(0, 0), RED);
        assert_eq!(*canvas.pixels().get_pixel(4, 4), RED);
        assert_eq!(*canvas.pixels().get_pixel(2, 2), TRANSPARENT);
    }

    #[test]
    fn revision_advances_on_mutation() {
        let mut canvas = Canvas::new(Size::new(2, 2));
        let start = canvas.revision();
        canvas.clear();
        assert!(canvas.revision() > start);
    }

    #[test]
    fn empty_canvas_does_not_encode() {
        let canvas = Canvas::default();
        assert!(matches!(canvas.to_png(), Err(CropError::NoImage)));
    }

    #[test]
    fn png_data_uri_prefix() {
        let canvas = Canvas::new(Size::new(3, 2));
        let uri = canvas.to_data_uri().unwrap();
        assert!(uri.starts_with("data:image/png;base64,"));
    }
}
