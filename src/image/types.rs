//! Core types shared by intake, the editors and the session.

use crate::error::{LensError, Result};
use base64::Engine;
use serde::Serialize;
use std::path::Path;

/// Image formats with first-class handling (extension, magic bytes).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ImageFormat {
    /// PNG format (lossless).
    #[default]
    Png,
    /// JPEG format (lossy).
    Jpeg,
    /// WebP format (modern, efficient).
    WebP,
}

impl ImageFormat {
    /// Returns the file extension for this format.
    pub fn extension(&self) -> &'static str {
        match self {
            Self::Png => "png",
            Self::Jpeg => "jpg",
            Self::WebP => "webp",
        }
    }

    /// Returns the MIME type for this format.
    pub fn mime_type(&self) -> &'static str {
        match self {
            Self::Png => "image/png",
            Self::Jpeg => "image/jpeg",
            Self::WebP => "image/webp",
        }
    }

    /// Maps a MIME type back to a known format.
    pub fn from_mime_type(mime: &str) -> Option<Self> {
        match mime.to_ascii_lowercase().as_str() {
            "image/png" => Some(Self::Png),
            "image/jpeg" | "image/jpg" => Some(Self::Jpeg),
            "image/webp" => Some(Self::WebP),
            _ => None,
        }
    }

    /// Detects image format from magic bytes.
    pub fn from_magic_bytes(data: &[u8]) -> Option<Self> {
        if data.len() < 12 {
            return None;
        }

        // PNG: 89 50 4E 47 0D 0A 1A 0A
        if data.starts_with(&[0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A]) {
            return Some(Self::Png);
        }

        // JPEG: FF D8 FF
        if data.starts_with(&[0xFF, 0xD8, 0xFF]) {
            return Some(Self::Jpeg);
        }

        // WebP: RIFF....WEBP
        if data.starts_with(b"RIFF") && &data[8..12] == b"WEBP" {
            return Some(Self::WebP);
        }

        None
    }
}

/// An image ready for transmission: base64 payload plus encoding metadata.
///
/// The MIME type always starts with `image/` and the payload is valid
/// standard base64 without a data-URI prefix. Values are immutable once built.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncodedImage {
    data_base64: String,
    mime_type: String,
    preview_uri: String,
}

impl EncodedImage {
    /// Encodes raw bytes under the given MIME type.
    pub fn from_bytes(bytes: &[u8], mime_type: impl Into<String>) -> Result<Self> {
        let mime_type = mime_type.into();
        if !is_image_mime(&mime_type) {
            return Err(LensError::InvalidType(mime_type));
        }
        let data_base64 = base64::engine::general_purpose::STANDARD.encode(bytes);
        Ok(Self::assemble(data_base64, mime_type))
    }

    /// Wraps an already encoded payload, validating both invariants.
    pub fn from_base64(data_base64: impl Into<String>, mime_type: impl Into<String>) -> Result<Self> {
        let data_base64 = data_base64.into();
        let mime_type = mime_type.into();
        if !is_image_mime(&mime_type) {
            return Err(LensError::InvalidType(mime_type));
        }
        base64::engine::general_purpose::STANDARD
            .decode(&data_base64)
            .map_err(|e| LensError::MalformedImage(e.to_string()))?;
        Ok(Self::assemble(data_base64, mime_type))
    }

    fn assemble(data_base64: String, mime_type: String) -> Self {
        let preview_uri = format!("data:{mime_type};base64,{data_base64}");
        Self {
            data_base64,
            mime_type,
            preview_uri,
        }
    }

    /// Base64 payload, no data-URI prefix.
    pub fn data_base64(&self) -> &str {
        &self.data_base64
    }

    /// MIME type, e.g. `image/png`.
    pub fn mime_type(&self) -> &str {
        &self.mime_type
    }

    /// Renderable `data:` URI for immediate preview.
    pub fn preview_uri(&self) -> &str {
        &self.preview_uri
    }

    /// Known format for this image's MIME type, if any.
    pub fn format(&self) -> Option<ImageFormat> {
        ImageFormat::from_mime_type(&self.mime_type)
    }

    /// File extension matching the MIME type, falling back to the subtype.
    pub fn extension(&self) -> String {
        match self.format() {
            Some(format) => format.extension().to_string(),
            None => self
                .mime_type
                .split_once('/')
                .map(|(_, sub)| sub.split(['+', ';']).next().unwrap_or(sub))
                .filter(|sub| !sub.is_empty())
                .unwrap_or("png")
                .to_ascii_lowercase(),
        }
    }

    /// Decodes the payload back to raw bytes.
    pub fn decode(&self) -> Result<Vec<u8>> {
        base64::engine::general_purpose::STANDARD
            .decode(&self.data_base64)
            .map_err(|e| LensError::MalformedImage(e.to_string()))
    }

    /// Size of the decoded payload in bytes.
    pub fn size(&self) -> usize {
        // Each 4-char group decodes to 3 bytes, minus padding.
        let padding = self.data_base64.bytes().rev().take_while(|b| *b == b'=').count();
        ((self.data_base64.len() / 4) * 3).saturating_sub(padding)
    }

    /// Writes the decoded image to `path`.
    pub async fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let bytes = self.decode()?;
        tokio::fs::write(path, bytes).await?;
        Ok(())
    }
}

/// Returns true if `mime` names an image type.
pub fn is_image_mime(mime: &str) -> bool {
    mime.starts_with("image/")
}

/// A single edit: an image plus a non-blank instruction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EditRequest {
    image: EncodedImage,
    instruction: String,
}

impl EditRequest {
    /// Builds a request, rejecting instructions that are blank after trimming.
    pub fn new(image: EncodedImage, instruction: impl Into<String>) -> Result<Self> {
        let instruction = instruction.into();
        if instruction.trim().is_empty() {
            return Err(LensError::EmptyInstruction);
        }
        Ok(Self { image, instruction })
    }

    /// The image to edit.
    pub fn image(&self) -> &EncodedImage {
        &self.image
    }

    /// The instruction, as typed.
    pub fn instruction(&self) -> &str {
        &self.instruction
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const PNG_MAGIC: [u8; 12] = [0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A, 0, 0, 0, 0];
    const JPEG_MAGIC: [u8; 12] = [0xFF, 0xD8, 0xFF, 0xE0, 0, 0, 0, 0, 0, 0, 0, 0];
    const WEBP_MAGIC: [u8; 12] = *b"RIFF\x00\x00\x00\x00WEBP";

    #[test]
    fn test_format_from_magic_bytes() {
        assert_eq!(
            ImageFormat::from_magic_bytes(&PNG_MAGIC),
            Some(ImageFormat::Png)
        );
        assert_eq!(
            ImageFormat::from_magic_bytes(&JPEG_MAGIC),
            Some(ImageFormat::Jpeg)
        );
        assert_eq!(
            ImageFormat::from_magic_bytes(&WEBP_MAGIC),
            Some(ImageFormat::WebP)
        );
        assert_eq!(ImageFormat::from_magic_bytes(b"short"), None);
    }

    #[test]
    fn test_format_from_mime_type() {
        assert_eq!(ImageFormat::from_mime_type("image/png"), Some(ImageFormat::Png));
        assert_eq!(ImageFormat::from_mime_type("IMAGE/JPEG"), Some(ImageFormat::Jpeg));
        assert_eq!(ImageFormat::from_mime_type("image/gif"), None);
    }

    #[test]
    fn test_format_serializes_lowercase() {
        let webp = EncodedImage::from_base64("AAA=", "image/webp").unwrap();
        assert_eq!(serde_json::to_value(webp.format()).unwrap(), "webp");

        let gif = EncodedImage::from_base64("AAA=", "image/gif").unwrap();
        assert!(serde_json::to_value(gif.format()).unwrap().is_null());
    }

    #[test]
    fn test_encoded_image_preview_and_round_trip() {
        let image = EncodedImage::from_bytes(&PNG_MAGIC, "image/png").unwrap();
        assert_eq!(image.mime_type(), "image/png");
        assert!(image
            .preview_uri()
            .starts_with("data:image/png;base64,"));
        assert!(!image.data_base64().starts_with("data:"));
        assert_eq!(image.decode().unwrap(), PNG_MAGIC.to_vec());
        assert_eq!(image.size(), PNG_MAGIC.len());
    }

    #[test]
    fn test_size_accounts_for_padding() {
        let image = EncodedImage::from_bytes(b"ab", "image/png").unwrap();
        assert_eq!(image.data_base64(), "YWI=");
        assert_eq!(image.size(), 2);
    }

    #[test]
    fn test_encoded_image_rejects_non_image_mime() {
        let err = EncodedImage::from_bytes(b"hello", "text/plain").unwrap_err();
        assert!(matches!(err, LensError::InvalidType(ref m) if m == "text/plain"));
    }

    #[test]
    fn test_from_base64_rejects_garbage() {
        let err = EncodedImage::from_base64("not base64!!", "image/png").unwrap_err();
        assert!(matches!(err, LensError::MalformedImage(_)));
    }

    #[test]
    fn test_extension_falls_back_to_subtype() {
        let png = EncodedImage::from_base64("AAA=", "image/png").unwrap();
        assert_eq!(png.extension(), "png");
        let jpeg = EncodedImage::from_base64("AAA=", "image/jpeg").unwrap();
        assert_eq!(jpeg.extension(), "jpg");
        let svg = EncodedImage::from_base64("AAA=", "image/svg+xml").unwrap();
        assert_eq!(svg.extension(), "svg");
    }

    #[test]
    fn test_edit_request_rejects_blank_instruction() {
        let image = EncodedImage::from_bytes(&PNG_MAGIC, "image/png").unwrap();
        let err = EditRequest::new(image.clone(), "   \n\t").unwrap_err();
        assert!(matches!(err, LensError::EmptyInstruction));

        let req = EditRequest::new(image, " Remove the background ").unwrap();
        assert_eq!(req.instruction(), " Remove the background ");
    }

    #[tokio::test]
    async fn test_save_writes_decoded_bytes() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.png");
        let image = EncodedImage::from_bytes(&PNG_MAGIC, "image/png").unwrap();
        image.save(&path).await.unwrap();
        assert_eq!(std::fs::read(&path).unwrap(), PNG_MAGIC.to_vec());
    }
}
