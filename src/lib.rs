//! An image uploader and a fixed-output crop-and-resize editor.
//!
//! The [`Uploader`] turns a file selection into a data URI; the
//! [`CropController`] decodes such a source, lets pointer gestures move and
//! resize a crop rectangle over it, and keeps a preview of the selection
//! rescaled to a fixed target size.

pub mod canvas;
pub mod config;
pub mod cropper;
pub mod data_uri;
pub mod decode;
pub mod error;
pub mod geometry;
pub mod gesture;
pub mod resample;
pub mod uploader;

pub use canvas::{Canvas, SharedCanvas};
pub use config::{AppConfig, CropperOptions, UploaderOptions};
pub use cropper::{CropController, ImageElement, ImageSink};
pub use error::{ConfigError, CropError, UploadError};
pub use geometry::{CropRectangle, Point, Size};
pub use gesture::{DragMode, PointerEvent};
pub use uploader::{FileInputHandle, SelectedFile, Uploader, file_input};
