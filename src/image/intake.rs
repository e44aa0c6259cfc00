//! Upload validation and encoding.
//!
//! Intake never touches the network: a file is rejected on its declared
//! content type or size before anything is sent anywhere.

use crate::error::{LensError, Result};
use crate::image::types::{is_image_mime, EncodedImage, ImageFormat};
use std::path::Path;

/// Largest accepted upload, in bytes (10 MiB).
pub const MAX_UPLOAD_BYTES: u64 = 10 * 1024 * 1024;

/// Content types offered by the file picker.
pub const ACCEPTED_TYPES: &[&str] = &["image/png", "image/jpeg", "image/webp"];

const OCTET_STREAM: &str = "application/octet-stream";

/// A file selected by the user, with its declared content type.
#[derive(Debug, Clone)]
pub struct UploadedFile {
    /// File name as shown to the user.
    pub name: String,
    /// Declared content type (not sniffed).
    pub content_type: String,
    /// File contents.
    pub data: Vec<u8>,
}

impl UploadedFile {
    /// Creates an upload from in-memory bytes.
    pub fn new(name: impl Into<String>, content_type: impl Into<String>, data: Vec<u8>) -> Self {
        Self {
            name: name.into(),
            content_type: content_type.into(),
            data,
        }
    }

    /// Size of the file in bytes.
    pub fn size(&self) -> u64 {
        self.data.len() as u64
    }
}

/// Checks declared type and size. Type is checked first.
pub fn validate(content_type: &str, size: u64) -> Result<()> {
    if !is_image_mime(content_type) {
        return Err(LensError::InvalidType(content_type.to_string()));
    }
    if size > MAX_UPLOAD_BYTES {
        return Err(LensError::TooLarge {
            size,
            limit: MAX_UPLOAD_BYTES,
        });
    }
    Ok(())
}

/// Validates an upload and encodes it for transmission.
pub fn validate_and_decode(file: &UploadedFile) -> Result<EncodedImage> {
    validate(&file.content_type, file.size())?;

    if let Some(sniffed) = ImageFormat::from_magic_bytes(&file.data) {
        if sniffed.mime_type() != file.content_type {
            tracing::debug!(
                name = %file.name,
                declared = %file.content_type,
                sniffed = sniffed.mime_type(),
                "declared content type differs from file contents"
            );
        }
    }

    EncodedImage::from_bytes(&file.data, file.content_type.as_str())
}

/// Declared content type for a path, derived from its extension.
pub fn content_type_for_path(path: &Path) -> &'static str {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase);
    match ext.as_deref() {
        Some("png") => "image/png",
        Some("jpg" | "jpeg") => "image/jpeg",
        Some("webp") => "image/webp",
        Some("gif") => "image/gif",
        Some("bmp") => "image/bmp",
        Some("heic") => "image/heic",
        Some("avif") => "image/avif",
        Some("tif" | "tiff") => "image/tiff",
        _ => OCTET_STREAM,
    }
}

/// Runs intake for a file on disk.
///
/// Type and size are checked from the path and metadata before any bytes are
/// read; the read itself either yields the whole file or fails.
pub async fn load_path(path: impl AsRef<Path>) -> Result<EncodedImage> {
    let path = path.as_ref();
    let content_type = content_type_for_path(path);
    let size = tokio::fs::metadata(path).await?.len();
    validate(content_type, size)?;

    let data = tokio::fs::read(path).await?;
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    let file = UploadedFile::new(name, content_type, data);
    let image = validate_and_decode(&file)?;

    tracing::debug!(
        path = %path.display(),
        mime_type = image.mime_type(),
        size_bytes = file.size(),
        "image loaded"
    );
    Ok(image)
}
