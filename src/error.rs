//! Error types for the uploader, the crop controller and their configuration.

use std::path::PathBuf;

/// A required construction parameter was missing or invalid.
///
/// Construction never yields a partially initialised component: any of these
/// is returned before the instance exists.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("uploader requires an input element")]
    MissingInputElement,

    #[error("cropper requires a target size")]
    MissingTargetSize,

    #[error("cropper requires a display surface")]
    MissingDisplaySurface,

    #[error("cropper requires a preview surface")]
    MissingPreviewSurface,

    #[error("display and preview must be distinct surfaces")]
    SharedSurfaces,

    #[error("target size must be positive, got {width}x{height}")]
    InvalidTargetSize { width: u32, height: u32 },

    #[error("resize limit must be positive")]
    InvalidResizeLimit,

    #[error("handle size must be a positive finite number, got {0}")]
    InvalidHandleSize(f32),

    #[error("failed to read config file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config file {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
}

/// A single upload attempt was rejected.
///
/// The caller listens again by calling `await_upload` once more.
#[derive(Debug, thiserror::Error)]
pub enum UploadError {
    #[error("no file was selected")]
    NoFileSelected,

    #[error("exactly one file must be selected, got {0}")]
    MultipleFilesSelected(usize),

    #[error("file type {mime_type:?} is not allowed")]
    DisallowedType { mime_type: String },

    #[error("failed to read selected file: {0}")]
    Read(#[from] std::io::Error),

    #[error("file input was closed")]
    InputClosed,
}

#[derive(Debug, thiserror::Error)]
pub enum CropError {
    #[error("image decoding failed: {0}")]
    Decode(#[from] image::ImageError),

    #[error("malformed data URI: {0}")]
    InvalidDataUri(String),

    #[error("failed to read image source: {0}")]
    Io(#[from] std::io::Error),

    #[error("unsupported image source {0:?}")]
    UnsupportedSource(String),

    #[error("image decoding task ended without a result")]
    DecodeAborted,

    #[error("no image has been loaded")]
    NoImage,

    #[error("PNG encoding failed: {0}")]
    Encode(String),
}
