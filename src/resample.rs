//! Source-image downscaling for display.

use image::RgbaImage;
use image::imageops::{self, FilterType};

use crate::geometry::Size;

/// Dimensions after bounding the longest side by `limit`.
///
/// The longer side lands exactly on `limit` and the shorter one scales by the
/// same factor. Images already within the limit are left alone; nothing is
/// ever upscaled.
pub fn fit_within_limit(size: Size, limit: u32) -> Size {
    let longest = size.width.max(size.height);
    if longest <= limit || longest == 0 {
        return size;
    }
    let scale = limit as f64 / longest as f64;
    let scaled = |side: u32| {
        if side == longest {
            limit
        } else {
            ((side as f64 * scale).round() as u32).max(1)
        }
    };
    Size::new(scaled(size.width), scaled(size.height))
}

/// Returns `image` downscaled per [`fit_within_limit`], or a copy when it
/// already fits.
pub fn downscale(image: &RgbaImage, limit: u32) -> RgbaImage {
    let original = Size::new(image.width(), image.height());
    let target = fit_within_limit(original, limit);
    if target == original {
        return image.clone();
    }
    log::debug!(
        "downscaling {}x{} to {}x{}",
        original.width,
        original.height,
        target.width,
        target.height
    );
    imageops::resize(image, target.width, target.height, FilterType::CatmullRom)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wide_image_is_bounded_by_width() {
        assert_eq!(fit_within_limit(Size::new(1200, 600), 600), Size::new(600, 300));
    }

    #[test]
    fn tall_image_is_bounded_by_height() {
        assert_eq!(fit_within_limit(Size::new(500, 1000), 600), Size::new(300, 600));
    }

    #[test]
    fn small_image_is_not_upscaled() {
        assert_eq!(fit_within_limit(Size::new(400, 300), 600), Size::new(400, 300));
        assert_eq!(fit_within_limit(Size::new(600, 600), 600), Size::new(600, 600));
    }

    #[test]
    fn square_image_hits_limit_on_both_sides() {
        assert_eq!(fit_within_limit(Size::new(1000, 1000), 600), Size::new(600, 600));
    }

    #[test]
    fn downscale_produces_bounded_pixels() {
        let image = RgbaImage::new(1200, 600);
        let scaled = downscale(&image, 600);
        assert_eq!(scaled.dimensions(), (600, 300));
    }
}
