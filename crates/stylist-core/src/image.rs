//! Uploaded photo handling.
//!
//! An upload is accepted only when its extension is one the form offers
//! (jpg, jpeg, png) and its leading bytes carry the matching JPEG or PNG
//! signature. Anything else is rejected before a remote call is made.

use std::path::Path;
use std::sync::Arc;

use base64::Engine;

use crate::error::{StylistError, StylistResult};

/// Extensions offered by the upload control.
pub const ACCEPTED_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png"];

const PNG_SIGNATURE: &[u8] = &[0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A];
const JPEG_SIGNATURE: &[u8] = &[0xFF, 0xD8, 0xFF];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageFormat {
    Jpeg,
    Png,
}

impl ImageFormat {
    pub fn mime_type(&self) -> &'static str {
        match self {
            Self::Jpeg => "image/jpeg",
            Self::Png => "image/png",
        }
    }

    /// Detect the format from the file signature.
    pub fn sniff(bytes: &[u8]) -> Option<Self> {
        if bytes.starts_with(PNG_SIGNATURE) {
            Some(Self::Png)
        } else if bytes.starts_with(JPEG_SIGNATURE) {
            Some(Self::Jpeg)
        } else {
            None
        }
    }
}

/// A photo received from the preference form.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadedImage {
    file_name: String,
    format: ImageFormat,
    bytes: Arc<[u8]>,
}

impl UploadedImage {
    /// Validate an upload and wrap it.
    pub fn new(file_name: impl Into<String>, bytes: impl Into<Arc<[u8]>>) -> StylistResult<Self> {
        let file_name = file_name.into();
        let bytes = bytes.into();

        let extension = Path::new(&file_name)
            .extension()
            .and_then(|ext| ext.to_str())
            .map(|ext| ext.to_ascii_lowercase())
            .unwrap_or_default();
        if !ACCEPTED_EXTENSIONS.contains(&extension.as_str()) {
            return Err(StylistError::InvalidImage(format!(
                "'{}' is not a jpg, jpeg or png file",
                file_name
            )));
        }

        let format = ImageFormat::sniff(&bytes).ok_or_else(|| {
            StylistError::InvalidImage(format!("'{}' is not a readable JPEG or PNG image", file_name))
        })?;

        Ok(Self {
            file_name,
            format,
            bytes,
        })
    }

    pub fn file_name(&self) -> &str {
        &self.file_name
    }

    pub fn format(&self) -> ImageFormat {
        self.format
    }

    pub fn mime_type(&self) -> &'static str {
        self.format.mime_type()
    }

    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// `data:` URL used to inline the photo in a chat request.
    pub fn to_data_url(&self) -> String {
        let b64 = base64::engine::general_purpose::STANDARD.encode(&self.bytes);
        format!("data:{};base64,{}", self.mime_type(), b64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn png_bytes() -> Vec<u8> {
        let mut bytes = PNG_SIGNATURE.to_vec();
        bytes.extend_from_slice(b"rest-of-file");
        bytes
    }

    #[test]
    fn test_accepts_png_and_jpeg() {
        let png = UploadedImage::new("me.PNG", png_bytes()).unwrap();
        assert_eq!(png.format(), ImageFormat::Png);

        let jpeg = UploadedImage::new("me.jpeg", vec![0xFF, 0xD8, 0xFF, 0xE0, 0x00]).unwrap();
        assert_eq!(jpeg.mime_type(), "image/jpeg");
    }

    #[test]
    fn test_rejects_other_extensions() {
        let err = UploadedImage::new("me.gif", png_bytes()).unwrap_err();
        assert!(matches!(err, StylistError::InvalidImage(_)));
    }

    #[test]
    fn test_rejects_bytes_without_image_signature() {
        let err = UploadedImage::new("me.jpg", b"not really a photo".to_vec()).unwrap_err();
        assert!(err.to_string().contains("not a readable"));
    }

    #[test]
    fn test_data_url_carries_mime_type() {
        let image = UploadedImage::new("me.png", png_bytes()).unwrap();
        let url = image.to_data_url();
        assert!(url.starts_with("data:image/png;base64,iVBORw0K"));
    }
}
