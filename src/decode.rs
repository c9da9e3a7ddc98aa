//! Asynchronous decoding of image sources.
//!
//! A source is a base64 data URI, a `file://` URL or a plain filesystem
//! path. Decoding runs off the UI thread; the result is parked in a one-shot
//! channel until the owner collects it.

use std::path::{Path, PathBuf};

use image::RgbaImage;
use percent_encoding::percent_decode_str;
use tokio::sync::oneshot;
use tokio::sync::oneshot::error::TryRecvError;

use crate::data_uri;
use crate::error::CropError;

const FILE_SCHEME: &str = "file://";

pub type DecodeResult = Result<RgbaImage, CropError>;

/// Decodes `source` on the calling thread.
pub fn decode_source(source: &str) -> DecodeResult {
    let image = if data_uri::is_data_uri(source) {
        let (_, bytes) = data_uri::decode(source)?;
        image::load_from_memory(&bytes)?
    } else if let Some(rest) = source.strip_prefix(FILE_SCHEME) {
        image::open(file_url_path(rest, source)?)?
    } else if source.contains("://") {
        return Err(CropError::UnsupportedSource(source.to_owned()));
    } else {
        image::open(Path::new(source))?
    };
    Ok(image.to_rgba8())
}

/// Path of a `file://` URL, given the part after the scheme. Only an empty
/// or `localhost` authority is accepted; the path is percent-decoded.
fn file_url_path(rest: &str, source: &str) -> Result<PathBuf, CropError> {
    let path = match rest.find('/') {
        Some(0) => rest,
        Some(slash) if rest[..slash].eq_ignore_ascii_case("localhost") => &rest[slash..],
        _ => return Err(CropError::UnsupportedSource(source.to_owned())),
    };
    let path = path.split(['?', '#']).next().unwrap_or(path);
    let decoded = percent_decode_str(path)
        .decode_utf8()
        .map_err(|_| CropError::UnsupportedSource(source.to_owned()))?;
    Ok(PathBuf::from(decoded.into_owned()))
}

/// A decode in flight. Dropping it discards the eventual result; the
/// decode itself still runs to completion.
#[derive(Debug)]
pub struct PendingDecode {
    rx: oneshot::Receiver<DecodeResult>,
}

impl PendingDecode {
    /// Starts decoding `source` on the blocking pool of the current tokio
    /// runtime, or on a plain thread when there is none.
    pub fn spawn(source: String) -> Self {
        let (tx, rx) = oneshot::channel();
        let job = move || {
            let result = decode_source(&source);
            // receiver gone means the decode was superseded
            let _ = tx.send(result);
        };
        match tokio::runtime::Handle::try_current() {
            Ok(handle) => {
                handle.spawn_blocking(job);
            }
            Err(_) => {
                std::thread::spawn(job);
            }
        }
        Self { rx }
    }

    /// Non-blocking check; `None` while still decoding.
    pub fn try_take(&mut self) -> Option<DecodeResult> {
        match self.rx.try_recv() {
            Ok(result) => Some(result),
            Err(TryRecvError::Empty) => None,
            Err(TryRecvError::Closed) => Some(Err(CropError::DecodeAborted)),
        }
    }

    pub async fn wait(self) -> DecodeResult {
        self.rx.await.unwrap_or(Err(CropError::DecodeAborted))
    }
}
