//! Bridges a file-selection event into a one-shot upload result.
//!
//! The embedding page owns a [`FileInputHandle`] and dispatches a change
//! event whenever the user picks files. The [`Uploader`] owns the matching
//! [`FileInput`] and turns the next event into a data URI, or a rejection.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use tokio::sync::mpsc;

use crate::config::UploaderOptions;
use crate::data_uri;
use crate::error::{ConfigError, UploadError};

#[derive(Debug, Clone)]
pub enum FileContent {
    Path(PathBuf),
    Bytes(Vec<u8>),
}

/// One entry of a file selection, as reported by the platform.
#[derive(Debug, Clone)]
pub struct SelectedFile {
    pub name: String,
    /// Declared media type, e.g. `image/png`. `None` when the platform could
    /// not tell.
    pub mime_type: Option<String>,
    pub content: FileContent,
}

impl SelectedFile {
    /// Declares the media type from the file extension.
    pub fn from_path(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let name = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_default();
        Self {
            name,
            mime_type: mime_type_for(&path),
            content: FileContent::Path(path),
        }
    }

    pub fn from_bytes(name: impl Into<String>, mime_type: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            name: name.into(),
            mime_type: Some(mime_type.into()),
            content: FileContent::Bytes(bytes),
        }
    }

    async fn read(self) -> std::io::Result<Vec<u8>> {
        match self.content {
            FileContent::Path(path) => tokio::fs::read(path).await,
            FileContent::Bytes(bytes) => Ok(bytes),
        }
    }
}

fn mime_type_for(path: &Path) -> Option<String> {
    image::ImageFormat::from_path(path)
        .ok()
        .map(|format| format.to_mime_type().to_owned())
}

/// The subtype after the `/` of a media type, lowercased and without
/// parameters.
pub fn mime_subtype(mime_type: &str) -> Option<String> {
    let (_, subtype) = mime_type.split_once('/')?;
    let subtype = subtype.split(';').next().unwrap_or(subtype).trim();
    (!subtype.is_empty()).then(|| subtype.to_ascii_lowercase())
}

#[derive(Debug)]
pub struct ChangeEvent {
    files: Vec<SelectedFile>,
    default_prevented: Arc<AtomicBool>,
}

impl ChangeEvent {
    pub fn prevent_default(&self) {
        self.default_prevented.store(true, Ordering::Release);
    }
}

/// What the dispatcher keeps of an event after handing it over.
#[derive(Debug, Clone)]
pub struct DispatchedEvent {
    default_prevented: Arc<AtomicBool>,
}

impl DispatchedEvent {
    /// Whether the listener suppressed the default form submission.
    pub fn is_default_prevented(&self) -> bool {
        self.default_prevented.load(Ordering::Acquire)
    }
}

/// Listening end of a file input, owned by the [`Uploader`].
#[derive(Debug)]
pub struct FileInput {
    rx: mpsc::UnboundedReceiver<ChangeEvent>,
}

/// Dispatching end of a file input, owned by the embedding page.
#[derive(Debug, Clone)]
pub struct FileInputHandle {
    tx: mpsc::UnboundedSender<ChangeEvent>,
}

pub fn file_input() -> (FileInputHandle, FileInput) {
    let (tx, rx) = mpsc::unbounded_channel();
    (FileInputHandle { tx }, FileInput { rx })
}

impl FileInputHandle {
    /// Fires a change event carrying `files`.
    pub fn dispatch(&self, files: Vec<SelectedFile>) -> Result<DispatchedEvent, UploadError> {
        let default_prevented = Arc::new(AtomicBool::new(false));
        let event = ChangeEvent {
            files,
            default_prevented: Arc::clone(&default_prevented),
        };
        self.tx.send(event).map_err(|_| UploadError::InputClosed)?;
        Ok(DispatchedEvent { default_prevented })
    }
}

#[derive(Debug)]
pub struct Uploader {
    input: FileInput,
    allowed_extensions: Vec<String>,
}

impl Uploader {
    pub fn new(options: UploaderOptions) -> Result<Self, ConfigError> {
        let input = options.input.ok_or(ConfigError::MissingInputElement)?;
        let allowed_extensions = options
            .allowed_extensions
            .iter()
            .map(|ext| ext.to_ascii_lowercase())
            .collect();
        Ok(Self {
            input,
            allowed_extensions,
        })
    }

    pub fn is_allowed(&self, mime_type: &str) -> bool {
        mime_subtype(mime_type).is_some_and(|subtype| self.allowed_extensions.contains(&subtype))
    }

    /// Waits for the next change event and settles exactly once for it.
    ///
    /// Resolves with a `data:<mime>;base64,...` URI of the whole file. Call
    /// again to listen for another selection after either outcome.
    pub async fn await_upload(&mut self) -> Result<String, UploadError> {
        let event = self.input.rx.recv().await.ok_or(UploadError::InputClosed)?;
        event.prevent_default();

        let result = self.accept(event.files).await;
        if let Err(e) = &result {
            log::warn!("upload rejected: {e}");
        }
        result
    }

    async fn accept(&self, mut files: Vec<SelectedFile>) -> Result<String, UploadError> {
        let file = match files.len() {
            0 => return Err(UploadError::NoFileSelected),
            1 => files.remove(0),
            n => return Err(UploadError::MultipleFilesSelected(n)),
        };

        let mime_type = file.mime_type.clone().unwrap_or_default();
        if !self.is_allowed(&mime_type) {
            return Err(UploadError::DisallowedType { mime_type });
        }

        let name = file.name.clone();
        let bytes = file.read().await?;
        log::info!("uploaded {name} ({mime_type}, {} bytes)", bytes.len());
        Ok(data_uri::encode(&mime_type, &bytes))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn uploader(allowed: &[&str]) -> (FileInputHandle, Uploader) {
        let (handle, input) = file_input();
        let uploader = Uploader::new(UploaderOptions {
            input: Some(input),
            allowed_extensions: allowed.iter().map(|s| s.to_string()).collect(),
        })
        .unwrap();
        (handle, uploader)
    }

    fn file(mime: &str) -> SelectedFile {
        SelectedFile::from_bytes("pic", mime, vec![1, 2, 3])
    }

    #[test]
    fn construction_requires_input() {
        let err = Uploader::new(UploaderOptions::default()).unwrap_err();
        assert!(matches!(err, ConfigError::MissingInputElement));
    }

    #[test]
    fn subtype_matching_is_case_insensitive() {
        let (_, up) = uploader(&["png", "JPG"]);
        assert!(up.is_allowed("image/PNG"));
        assert!(up.is_allowed("image/jpg"));
        assert!(!up.is_allowed("image/gif"));
        assert!(!up.is_allowed("png"));
        assert_eq!(mime_subtype("image/png; charset=x"), Some("png".into()));
    }

    #[tokio::test]
    async fn disallowed_type_is_rejected() {
        let (handle, mut up) = uploader(&["png", "jpg"]);
        handle.dispatch(vec![file("image/gif")]).unwrap();
        let err = up.await_upload().await.unwrap_err();
        assert!(matches!(err, UploadError::DisallowedType { ref mime_type } if mime_type == "image/gif"));
    }

    #[tokio::test]
    async fn allowed_type_resolves_to_data_uri() {
        let (handle, mut up) = uploader(&["png", "jpg"]);
        let dispatched = handle.dispatch(vec![file("image/png")]).unwrap();
        let uri = up.await_upload().await.unwrap();
        assert!(uri.starts_with("data:image/png"));
        assert_eq!(uri, "data:image/png;base64,AQID");
        assert!(dispatched.is_default_prevented());
    }

    #[tokio::test]
    async fn zero_or_many_files_always_reject() {
        let (handle, mut up) = uploader(&["png"]);
        handle.dispatch(vec![]).unwrap();
        assert!(matches!(up.await_upload().await, Err(UploadError::NoFileSelected)));

        handle.dispatch(vec![file("image/png"), file("image/png")]).unwrap();
        assert!(matches!(
            up.await_upload().await,
            Err(UploadError::MultipleFilesSelected(2))
        ));

        // a rejection does not stop the caller from listening again
        handle.dispatch(vec![file("image/png")]).unwrap();
        assert!(up.await_upload().await.is_ok());
    }

    #[tokio::test]
    async fn reads_file_from_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("photo.JPG");
        std::fs::write(&path, b"jpeg-ish").unwrap();

        let selected = SelectedFile::from_path(&path);
        assert_eq!(selected.name, "photo.JPG");
        assert_eq!(selected.mime_type.as_deref(), Some("image/jpeg"));

        let (handle, mut up) = uploader(&["jpeg"]);
        handle.dispatch(vec![selected]).unwrap();
        let uri = up.await_upload().await.unwrap();
        assert_eq!(uri, data_uri::encode("image/jpeg", b"jpeg-ish"));
    }

    #[tokio::test]
    async fn closed_input_rejects() {
        let (handle, mut up) = uploader(&["png"]);
        drop(handle);
        assert!(matches!(up.await_upload().await, Err(UploadError::InputClosed)));
    }
}
