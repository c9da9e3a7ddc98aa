//! Construction options for the uploader and the cropper, and the on-disk
//! configuration of the desktop app.

use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::canvas::SharedCanvas;
use crate::error::ConfigError;
use crate::geometry::Size;
use crate::uploader::FileInput;

pub const DEFAULT_ALLOWED_EXTENSIONS: [&str; 4] = ["gif", "jpg", "jpeg", "png"];
pub const DEFAULT_RESIZE_LIMIT: u32 = 600;
pub const DEFAULT_HANDLE_SIZE: f32 = 10.0;
pub const DEFAULT_TARGET_SIZE: Size = Size::new(200, 200);

pub fn default_allowed_extensions() -> Vec<String> {
    DEFAULT_ALLOWED_EXTENSIONS
        .iter()
        .map(|ext| (*ext).to_owned())
        .collect()
}

pub struct UploaderOptions {
    /// Required; construction fails without it.
    pub input: Option<FileInput>,
    /// Lowercase MIME subtypes accepted, e.g. `png`.
    pub allowed_extensions: Vec<String>,
}

impl Default for UploaderOptions {
    fn default() -> Self {
        Self {
            input: None,
            allowed_extensions: default_allowed_extensions(),
        }
    }
}

impl UploaderOptions {
    pub fn with_input(input: FileInput) -> Self {
        Self {
            input: Some(input),
            ..Default::default()
        }
    }
}

pub struct CropperOptions {
    /// Output size of the preview; fixes the crop footprint at construction.
    pub target_size: Option<Size>,
    /// Longest side a source image may have on the display surface.
    pub resize_limit: u32,
    /// Side of the square resize hit zone around the bottom-right corner.
    pub handle_size: f32,
    pub display: Option<SharedCanvas>,
    pub preview: Option<SharedCanvas>,
}

impl Default for CropperOptions {
    fn default() -> Self {
        Self {
            target_size: None,
            resize_limit: DEFAULT_RESIZE_LIMIT,
            handle_size: DEFAULT_HANDLE_SIZE,
            display: None,
            preview: None,
        }
    }
}

/// `image-crop-widget.toml`.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub cropper: CropperSection,
    pub uploader: UploaderSection,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct CropperSection {
    pub target_width: u32,
    pub target_height: u32,
    pub resize_limit: u32,
    pub handle_size: f32,
}

impl Default for CropperSection {
    fn default() -> Self {
        Self {
            target_width: DEFAULT_TARGET_SIZE.width,
            target_height: DEFAULT_TARGET_SIZE.height,
            resize_limit: DEFAULT_RESIZE_LIMIT,
            handle_size: DEFAULT_HANDLE_SIZE,
        }
    }
}

impl CropperSection {
    pub fn target_size(&self) -> Size {
        Size::new(self.target_width, self.target_height)
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct UploaderSection {
    pub allowed_extensions: Vec<String>,
}

impl Default for UploaderSection {
    fn default() -> Self {
        Self {
            allowed_extensions: default_allowed_extensions(),
        }
    }
}

impl AppConfig {
    pub fn from_toml(text: &str, origin: &Path) -> Result<Self, ConfigError> {
        let mut config: AppConfig = toml::from_str(text).map_err(|source| ConfigError::Parse {
            path: origin.to_path_buf(),
            source,
        })?;
        for ext in &mut config.uploader.allowed_extensions {
            *ext = ext.to_ascii_lowercase();
        }
        Ok(config)
    }

    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml(&text, path)
    }

    /// Loads `path` when it exists, defaults otherwise.
    pub fn load_or_default(path: Option<&Path>) -> Result<Self, ConfigError> {
        match path {
            Some(path) if path.exists() => Self::load(path),
            Some(path) => {
                log::info!("config file {} not found, using defaults", path.display());
                Ok(Self::default())
            }
            None => Ok(Self::default()),
        }
    }
}

pub fn default_config_path() -> PathBuf {
    PathBuf::from("image-crop-widget.toml")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_file_yields_defaults() {
        let config = AppConfig::from_toml("", Path::new("x.toml")).unwrap();
        assert_eq!(config, AppConfig::default());
        assert_eq!(config.cropper.resize_limit, 600);
        assert_eq!(config.uploader.allowed_extensions, ["gif", "jpg", "jpeg", "png"]);
    }

    #[test]
    fn partial_sections_keep_other_defaults() {
        let text = r#"
            [cropper]
            target_width = 320
            target_height = 180

            [uploader]
            allowed_extensions = ["PNG", "webp"]
        "#;
        let config = AppConfig::from_toml(text, Path::new("x.toml")).unwrap();
        assert_eq!(config.cropper.target_size(), Size::new(320, 180));
        assert_eq!(config.cropper.handle_size, DEFAULT_HANDLE_SIZE);
        assert_eq!(config.uploader.allowed_extensions, ["png", "webp"]);
    }

    #[test]
    fn bad_toml_reports_path() {
        let err = AppConfig::from_toml("[cropper", Path::new("bad.toml")).unwrap_err();
        assert!(matches!(err, ConfigError::Parse { ref path, .. } if path == Path::new("bad.toml")));
    }

    #[test]
    fn missing_file_falls_back_to_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = AppConfig::load_or_default(Some(&dir.path().join("none.toml"))).unwrap();
        assert_eq!(config, AppConfig::default());
    }
}
