//! Where source photos come from.
//!
//! The journal's storage layer owns the photos; this crate only needs to turn
//! a filename into decoded pixels. [`ImageSource`] is that seam and
//! [`FileImageSource`] is the production implementation: a flat directory of
//! photos named by the storage layer (typically `<uuid>.jpg`).

use super::operations::RetargetError;
use crate::types::Image;
use async_trait::async_trait;
use image::{ImageFormat, ImageReader};
use std::io::Cursor;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum SourceError {
    #[error("No stored photo named {0}")]
    NotFound(String),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Failed to decode {name}: {reason}")]
    Decode { name: String, reason: String },
}

impl From<SourceError> for RetargetError {
    fn from(err: SourceError) -> Self {
        match err {
            SourceError::NotFound(name) => RetargetError::SourceNotFound(name),
            other => RetargetError::InvalidSource(other.to_string()),
        }
    }
}

/// Resolves a photo identifier to decoded pixels.
#[async_trait]
pub trait ImageSource: Send + Sync {
    async fn load(&self, file_name: &str) -> Result<Image, SourceError>;
}

/// Extensions whose decoders are compiled in.
const PHOTO_EXTENSIONS: &[(&str, ImageFormat)] = &[
    ("jpg", ImageFormat::Jpeg),
    ("jpeg", ImageFormat::Jpeg),
    ("png", ImageFormat::Png),
    ("tif", ImageFormat::Tiff),
    ("tiff", ImageFormat::Tiff),
    ("webp", ImageFormat::WebP),
];

/// True if `path` has an extension this crate can decode.
pub fn is_supported_photo(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|ext| {
            PHOTO_EXTENSIONS
                .iter()
                .any(|(known, fmt)| ext.eq_ignore_ascii_case(known) && fmt.reading_enabled())
        })
}

/// Loads photos from a single directory.
#[derive(Debug, Clone)]
pub struct FileImageSource {
    root: PathBuf,
}

impl FileImageSource {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Map a filename onto the photo directory.
    ///
    /// Names are opaque identifiers, not paths: anything that could escape
    /// the directory resolves to nothing.
    fn resolve(&self, file_name: &str) -> Option<PathBuf> {
        let is_plain = !file_name.is_empty()
            && file_name != "."
            && file_name != ".."
            && !file_name.contains(['/', '\\']);
        is_plain.then(|| self.root.join(file_name))
    }
}

#[async_trait]
impl ImageSource for FileImageSource {
    async fn load(&self, file_name: &str) -> Result<Image, SourceError> {
        let path = self
            .resolve(file_name)
            .ok_or_else(|| SourceError::NotFound(file_name.to_string()))?;

        let bytes = match tokio::fs::read(&path).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(SourceError::NotFound(file_name.to_string()));
            }
            Err(e) => return Err(SourceError::Io(e)),
        };

        let name = file_name.to_string();
        tokio::task::spawn_blocking(move || decode(&name, bytes))
            .await
            .map_err(|e| SourceError::Decode {
                name: file_name.to_string(),
                reason: format!("decode task failed: {}", e),
            })?
    }
}

fn decode(name: &str, bytes: Vec<u8>) -> Result<Image, SourceError> {
    let decode_err = |reason: String| SourceError::Decode {
        name: name.to_string(),
        reason,
    };
    let pixels = ImageReader::new(Cursor::new(bytes))
        .with_guessed_format()
        .map_err(|e| decode_err(e.to_string()))?
        .decode()
        .map_err(|e| decode_err(e.to_string()))?;

    if pixels.width() == 0 || pixels.height() == 0 {
        return Err(decode_err("image has zero dimension".to_string()));
    }
    Ok(Image::new(pixels))
}
