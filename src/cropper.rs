//! The crop controller.
//!
//! Owns the crop rectangle, interprets pointer gestures as move or resize
//! steps, and keeps the display and preview surfaces in sync with it.

use std::rc::Rc;

use image::{Rgba, RgbaImage};

use crate::canvas::SharedCanvas;
use crate::config::CropperOptions;
use crate::decode::{DecodeResult, PendingDecode};
use crate::error::{ConfigError, CropError};
use crate::geometry::{CropRectangle, PixelRegion, Point, Size};
use crate::gesture::{GestureTracker, PointerEvent};
use crate::resample;

const OUTLINE_COLOR: Rgba<u8> = Rgba([255, 255, 255, 255]);
const HANDLE_FILL: Rgba<u8> = Rgba([255, 255, 255, 255]);
const HANDLE_STROKE: Rgba<u8> = Rgba([0, 0, 0, 255]);

/// Receives an exported image as a data URI.
pub trait ImageSink {
    fn set_source(&mut self, data_uri: String);
}

impl ImageSink for String {
    fn set_source(&mut self, data_uri: String) {
        *self = data_uri;
    }
}

/// An `<img>`-like sink holding the last assigned source.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ImageElement {
    pub src: Option<String>,
}

impl ImageSink for ImageElement {
    fn set_source(&mut self, data_uri: String) {
        self.src = Some(data_uri);
    }
}

pub struct CropController {
    rect: CropRectangle,
    resize_limit: u32,
    display: SharedCanvas,
    preview: SharedCanvas,
    /// Source image already bounded by `resize_limit`.
    image: Option<RgbaImage>,
    pending: Option<PendingDecode>,
    gesture: GestureTracker,
    listening: bool,
}

impl CropController {
    pub fn new(options: CropperOptions) -> Result<Self, ConfigError> {
        let target_size = options.target_size.ok_or(ConfigError::MissingTargetSize)?;
        if target_size.is_empty() {
            return Err(ConfigError::InvalidTargetSize {
                width: target_size.width,
                height: target_size.height,
            });
        }
        if options.resize_limit == 0 {
            return Err(ConfigError::InvalidResizeLimit);
        }
        if !(options.handle_size.is_finite() && options.handle_size > 0.0) {
            return Err(ConfigError::InvalidHandleSize(options.handle_size));
        }
        let display = options.display.ok_or(ConfigError::MissingDisplaySurface)?;
        let preview = options.preview.ok_or(ConfigError::MissingPreviewSurface)?;
        if Rc::ptr_eq(&display, &preview) {
            return Err(ConfigError::SharedSurfaces);
        }

        Ok(Self {
            rect: CropRectangle::new(target_size, options.handle_size),
            resize_limit: options.resize_limit,
            display,
            preview,
            image: None,
            pending: None,
            gesture: GestureTracker::default(),
            listening: false,
        })
    }

    pub fn crop_rect(&self) -> &CropRectangle {
        &self.rect
    }

    pub fn target_size(&self) -> Size {
        self.rect.target_size()
    }

    pub fn resize_limit(&self) -> u32 {
        self.resize_limit
    }

    pub fn display_size(&self) -> Size {
        self.display.borrow().size()
    }

    /// True once an image has been decoded and pointer gestures are handled.
    pub fn is_listening(&self) -> bool {
        self.listening
    }

    pub fn is_dragging(&self) -> bool {
        self.gesture.is_dragging()
    }

    pub fn has_pending_decode(&self) -> bool {
        self.pending.is_some()
    }

    /// Starts decoding `source` (data URI, `file://` URL or path) in the
    /// background, superseding any decode still in flight.
    ///
    /// The result is delivered by [`poll_decoded`](Self::poll_decoded) or
    /// [`decoded`](Self::decoded).
    pub fn set_image_source(&mut self, source: impl Into<String>) {
        let source = source.into();
        log::debug!("decoding image source ({} bytes)", source.len());
        self.pending = Some(PendingDecode::spawn(source));
    }

    /// Completes a finished decode without blocking. `None` while nothing
    /// is ready.
    pub fn poll_decoded(&mut self) -> Option<Result<(), CropError>> {
        let result = self.pending.as_mut()?.try_take()?;
        self.pending = None;
        Some(self.finish_decode(result))
    }

    /// Waits for the decode started by the last `set_image_source`.
    pub async fn decoded(&mut self) -> Result<(), CropError> {
        let pending = self.pending.take().ok_or(CropError::NoImage)?;
        let result = pending.wait().await;
        self.finish_decode(result)
    }

    fn finish_decode(&mut self, result: DecodeResult) -> Result<(), CropError> {
        match result {
            Ok(image) => {
                self.set_image(image);
                Ok(())
            }
            Err(e) => {
                log::warn!("image source failed to decode: {e}");
                Err(e)
            }
        }
    }

    /// Installs an already decoded image, renders, and starts handling
    /// pointer gestures.
    pub fn set_image(&mut self, image: RgbaImage) {
        let image = resample::downscale(&image, self.resize_limit);
        let bounds = Size::new(image.width(), image.height());
        log::info!("image loaded, display surface {}x{}", bounds.width, bounds.height);

        if self.rect.fit_to(bounds) {
            log::debug!("crop rectangle shrunk to fit {:?}", self.rect.size());
        }
        self.image = Some(image);
        self.gesture.end();
        self.listening = true;
        self.render();
    }

    /// Redraws both surfaces from the current state.
    ///
    /// Display: the image, the crop outline and the resize handle. Preview:
    /// the covered display region rescaled to the target size. A no-op
    /// before an image is loaded.
    pub fn render(&mut self) {
        let Some(image) = &self.image else {
            return;
        };
        let mut display = self.display.borrow_mut();
        let image_size = Size::new(image.width(), image.height());
        if display.size() == image_size {
            display.clear();
        } else {
            display.set_size(image_size);
        }
        display.draw_image(image, 0, 0);

        let region = self.rect.pixel_region(display.size());
        let selection = display.region(region);
        self.preview
            .borrow_mut()
            .draw_scaled(&selection, self.rect.target_size());

        display.stroke_rect(region, OUTLINE_COLOR);
        let corner = self.rect.bottom_right();
        let side = self.rect.handle_size().round().max(1.0) as u32;
        let hx = (corner.x - side as f32 / 2.0).round() as i64;
        let hy = (corner.y - side as f32 / 2.0).round() as i64;
        display.fill_rect(hx, hy, side, side, HANDLE_FILL);
        if hx >= 0 && hy >= 0 {
            let handle = PixelRegion {
                x: hx as u32,
                y: hy as u32,
                width: side,
                height: side,
            };
            display.stroke_rect(handle, HANDLE_STROKE);
        }
    }

    /// Feeds one pointer event into the gesture state machine.
    ///
    /// Returns whether the crop rectangle changed. Events are ignored until
    /// an image has been loaded.
    pub fn handle_pointer(&mut self, event: PointerEvent) -> bool {
        if !self.listening {
            return false;
        }
        match event {
            PointerEvent::Down(point) => {
                self.gesture.begin(&self.rect, point);
                false
            }
            PointerEvent::Move(point) => {
                let Some(step) = self.gesture.advance(point) else {
                    return false;
                };
                let bounds = self.display_size();
                let changed = step.apply_to(&mut self.rect, bounds);
                if !changed {
                    log::trace!("{:?} step ({}, {}) dropped", step.mode, step.dx, step.dy);
                }
                self.render();
                changed
            }
            PointerEvent::Up => {
                self.gesture.end();
                false
            }
        }
    }

    pub fn pointer_down(&mut self, point: Point) -> bool {
        self.handle_pointer(PointerEvent::Down(point))
    }

    pub fn pointer_move(&mut self, point: Point) -> bool {
        self.handle_pointer(PointerEvent::Move(point))
    }

    pub fn pointer_up(&mut self) -> bool {
        self.handle_pointer(PointerEvent::Up)
    }

    /// PNG encoding of the current preview surface.
    pub fn export_png(&self) -> Result<Vec<u8>, CropError> {
        if self.image.is_none() {
            return Err(CropError::NoImage);
        }
        self.preview.borrow().to_png()
    }

    /// Assigns the current preview as a PNG data URI to `sink`.
    pub fn export_to(&self, sink: &mut impl ImageSink) -> Result<(), CropError> {
        if self.image.is_none() {
            return Err(CropError::NoImage);
        }
        let uri = self.preview.borrow().to_data_uri()?;
        log::info!("exported preview ({} bytes as data URI)", uri.len());
        sink.set_source(uri);
        Ok(())
    }
}
