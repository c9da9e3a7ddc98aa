//! Crop rectangle geometry: bounds checks, hit tests and the move/resize steps.
//!
//! Coordinates are display-surface pixels with the origin at the top-left
//! corner. Every mutation is all-or-nothing: a candidate that would leave the
//! surface is discarded whole, never clamped.

/// Smallest width or height a resize may leave behind.
pub const MIN_EXTENT: f32 = 1.0;

#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Point {
    pub x: f32,
    pub y: f32,
}

impl Point {
    pub const ZERO: Self = Self { x: 0.0, y: 0.0 };

    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    /// Offset of `self` relative to `origin`.
    pub fn delta_from(self, origin: Point) -> (f32, f32) {
        (self.x - origin.x, self.y - origin.y)
    }

    pub fn translated(self, dx: f32, dy: f32) -> Self {
        Self::new(self.x + dx, self.y + dy)
    }
}

/// Integer pixel dimensions of a surface or of the export target.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Size {
    pub width: u32,
    pub height: u32,
}

impl Size {
    pub const fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }
}

/// Width and height of the crop rectangle on the display surface.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Extent {
    pub width: f32,
    pub height: f32,
}

impl Extent {
    pub const fn new(width: f32, height: f32) -> Self {
        Self { width, height }
    }
}

impl From<Size> for Extent {
    fn from(size: Size) -> Self {
        Self::new(size.width as f32, size.height as f32)
    }
}

/// Pixel-aligned region of a surface, as handed to the resampler.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PixelRegion {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

/// The user-adjustable selection together with its fixed output size and
/// handle zone.
#[derive(Clone, Debug, PartialEq)]
pub struct CropRectangle {
    position: Point,
    size: Extent,
    target_size: Size,
    handle_size: f32,
}

impl CropRectangle {
    /// Starts at the surface origin with the target size as its footprint.
    pub fn new(target_size: Size, handle_size: f32) -> Self {
        Self {
            position: Point::ZERO,
            size: target_size.into(),
            target_size,
            handle_size,
        }
    }

    pub fn position(&self) -> Point {
        self.position
    }

    pub fn size(&self) -> Extent {
        self.size
    }

    pub fn target_size(&self) -> Size {
        self.target_size
    }

    pub fn handle_size(&self) -> f32 {
        self.handle_size
    }

    pub fn bottom_right(&self) -> Point {
        self.position.translated(self.size.width, self.size.height)
    }

    /// True when the whole rectangle lies inside a surface of `bounds`.
    pub fn fits_within(&self, bounds: Size) -> bool {
        span_fits(self.position, self.size, bounds)
    }

    /// True iff `point` lies in the square of side `handle_size` centred on
    /// the bottom-right corner.
    pub fn is_over_resize_handle(&self, point: Point) -> bool {
        let corner = self.bottom_right();
        let half = self.handle_size / 2.0;
        (point.x - corner.x).abs() <= half && (point.y - corner.y).abs() <= half
    }

    /// True iff `point` lies inside the rectangle, edges included.
    pub fn is_over_body(&self, point: Point) -> bool {
        let corner = self.bottom_right();
        point.x >= self.position.x
            && point.x <= corner.x
            && point.y >= self.position.y
            && point.y <= corner.y
    }

    /// Translates by `(dx, dy)` if all four corners stay inside `bounds`.
    ///
    /// Returns whether the move was applied.
    pub fn try_move(&mut self, dx: f32, dy: f32, bounds: Size) -> bool {
        let candidate = self.position.translated(dx, dy);
        if !span_fits(candidate, self.size, bounds) {
            return false;
        }
        self.position = candidate;
        true
    }

    /// Grows (or shrinks) width and height by the same amount, taken from
    /// whichever axis moved further.
    ///
    /// The top-left corner stays put. Returns whether the resize was applied.
    pub fn try_resize(&mut self, dx: f32, dy: f32, bounds: Size) -> bool {
        let amount = resize_amount(dx, dy);
        let candidate = Extent::new(self.size.width + amount, self.size.height + amount);
        if candidate.width < MIN_EXTENT || candidate.height < MIN_EXTENT {
            return false;
        }
        if !span_fits(self.position, candidate, bounds) {
            return false;
        }
        self.size = candidate;
        true
    }

    /// Resets to the origin and shrinks to fit `bounds` when the current
    /// footprint no longer fits, keeping the target aspect ratio.
    ///
    /// Returns whether anything changed.
    pub fn fit_to(&mut self, bounds: Size) -> bool {
        if self.fits_within(bounds) || bounds.is_empty() {
            return false;
        }

        let target = Extent::from(self.target_size);
        let scale = (bounds.width as f32 / target.width)
            .min(bounds.height as f32 / target.height)
            .min(1.0);
        let width = (target.width * scale).floor().max(MIN_EXTENT);
        let height = (target.height * scale).floor().max(MIN_EXTENT);

        self.position = Point::ZERO;
        self.size = Extent::new(
            width.min(bounds.width as f32),
            height.min(bounds.height as f32),
        );
        true
    }

    /// Rounds the rectangle to whole pixels inside `bounds`.
    pub fn pixel_region(&self, bounds: Size) -> PixelRegion {
        let x = (self.position.x.round().max(0.0) as u32).min(bounds.width.saturating_sub(1));
        let y = (self.position.y.round().max(0.0) as u32).min(bounds.height.saturating_sub(1));
        let width = (self.size.width.round() as u32)
            .max(1)
            .min(bounds.width.saturating_sub(x).max(1));
        let height = (self.size.height.round() as u32)
            .max(1)
            .min(bounds.height.saturating_sub(y).max(1));
        PixelRegion {
            x,
            y,
            width,
            height,
        }
    }
}

/// The resize step: `dx` when the pointer moved further horizontally,
/// otherwise `dy`.
pub fn resize_amount(dx: f32, dy: f32) -> f32 {
    if dx.abs() > dy.abs() { dx } else { dy }
}

fn span_fits(position: Point, size: Extent, bounds: Size) -> bool {
    position.x >= 0.0
        && position.y >= 0.0
        && position.x + size.width <= bounds.width as f32
        && position.y + size.height <= bounds.height as f32
}

#[cfg(test)]
mod tests {
    use super::*;

    const SURFACE: Size = Size::new(400, 300);

    fn rect() -> CropRectangle {
        CropRectangle::new(Size::new(100, 100), 10.0)
    }

    #[test]
    fn starts_at_origin_with_target_footprint() {
        let r = rect();
        assert_eq!(r.position(), Point::ZERO);
        assert_eq!(r.size(), Extent::new(100.0, 100.0));
        assert_eq!(r.bottom_right(), Point::new(100.0, 100.0));
    }

    #[test]
    fn resize_amount_follows_dominant_axis() {
        assert_eq!(resize_amount(5.0, 2.0), 5.0);
        assert_eq!(resize_amount(-7.0, 3.0), -7.0);
        assert_eq!(resize_amount(2.0, -6.0), -6.0);
        // ties go to dy
        assert_eq!(resize_amount(4.0, -4.0), -4.0);
    }

    #[test]
    fn resize_changes_width_and_height_equally() {
        let mut r = rect();
        assert!(r.try_resize(12.0, 3.0, SURFACE));
        assert_eq!(r.size(), Extent::new(112.0, 112.0));
        assert!(r.try_resize(1.0, -20.0, SURFACE));
        assert_eq!(r.size(), Extent::new(92.0, 92.0));
        assert_eq!(r.position(), Point::ZERO);
    }

    #[test]
    fn resize_past_bottom_edge_is_rejected_whole() {
        let mut r = rect();
        assert!(r.try_move(0.0, 150.0, SURFACE));
        let before = r.clone();
        assert!(!r.try_resize(60.0, 0.0, SURFACE));
        assert_eq!(r, before);
    }

    #[test]
    fn resize_below_minimum_extent_is_rejected() {
        let mut r = rect();
        let before = r.clone();
        assert!(!r.try_resize(-100.0, 0.0, SURFACE));
        assert_eq!(r, before);
        assert!(r.try_resize(-99.0, 0.0, SURFACE));
        assert_eq!(r.size(), Extent::new(1.0, 1.0));
    }

    #[test]
    fn move_inside_bounds_is_applied() {
        let mut r = rect();
        assert!(r.try_move(25.5, 40.0, SURFACE));
        assert_eq!(r.position(), Point::new(25.5, 40.0));
        assert_eq!(r.size(), Extent::new(100.0, 100.0));
    }

    #[test]
    fn move_is_not_clamped_at_edges() {
        let mut r = rect();
        assert!(r.try_move(290.0, 0.0, SURFACE));
        let before = r.clone();
        // 11px to the right would overshoot by one; the whole delta is dropped
        assert!(!r.try_move(11.0, 5.0, SURFACE));
        assert_eq!(r, before);
        assert!(!rect().try_move(-1.0, 0.0, SURFACE));
    }

    #[test]
    fn hit_tests() {
        let r = rect();
        assert!(r.is_over_resize_handle(Point::new(100.0, 100.0)));
        assert!(r.is_over_resize_handle(Point::new(105.0, 95.0)));
        assert!(!r.is_over_resize_handle(Point::new(106.0, 100.0)));
        assert!(r.is_over_body(Point::new(0.0, 0.0)));
        assert!(r.is_over_body(Point::new(100.0, 100.0)));
        assert!(!r.is_over_body(Point::new(100.5, 50.0)));
    }

    #[test]
    fn random_walk_never_leaves_surface() {
        let mut r = rect();
        let mut seed: u32 = 0x2545_f491;
        let mut next = || {
            seed = seed.wrapping_mul(1_103_515_245).wrapping_add(12_345);
            ((seed >> 16) % 81) as f32 - 40.0
        };
        for step in 0..2_000 {
            let (dx, dy) = (next(), next());
            let before = r.clone();
            let applied = if step % 3 == 0 {
                r.try_resize(dx, dy, SURFACE)
            } else {
                r.try_move(dx, dy, SURFACE)
            };
            assert!(r.fits_within(SURFACE), "step {step} left bounds: {r:?}");
            if !applied {
                assert_eq!(r, before);
            }
        }
    }

    #[test]
    fn fit_to_shrinks_oversized_rect_preserving_ratio() {
        let mut r = CropRectangle::new(Size::new(200, 100), 10.0);
        assert!(r.fit_to(Size::new(100, 80)));
        assert_eq!(r.position(), Point::ZERO);
        assert_eq!(r.size(), Extent::new(100.0, 50.0));
        assert!(!r.fit_to(Size::new(100, 80)));
    }

    #[test]
    fn pixel_region_rounds_and_stays_inside() {
        let mut r = rect();
        r.try_move(10.4, 20.6, SURFACE);
        assert_eq!(
            r.pixel_region(SURFACE),
            PixelRegion {
                x: 10,
                y: 21,
                width: 100,
                height: 100
            }
        );
    }
}
