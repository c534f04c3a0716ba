//! Photo inputs for the image-diagnosis mode.

use std::path::Path;

use base64::engine::general_purpose::STANDARD;
use base64::Engine;

use crate::error::{ImageError, TutorError};

const PNG_MAGIC: &[u8] = &[0x89, b'P', b'N', b'G', b'\r', b'\n', 0x1a, b'\n'];
const JPEG_MAGIC: &[u8] = &[0xff, 0xd8, 0xff];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageFormat {
    Png,
    Jpeg,
}

impl ImageFormat {
    /// Sniff the format from the leading bytes; file extensions are not trusted.
    pub fn detect(bytes: &[u8]) -> Option<Self> {
        if bytes.starts_with(PNG_MAGIC) {
            Some(Self::Png)
        } else if bytes.starts_with(JPEG_MAGIC) {
            Some(Self::Jpeg)
        } else {
            None
        }
    }

    pub fn mime_type(&self) -> &'static str {
        match self {
            Self::Png => "image/png",
            Self::Jpeg => "image/jpeg",
        }
    }
}

/// An uploaded photo of an exam question.
#[derive(Clone, PartialEq, Eq)]
pub struct ImageInput {
    bytes: Vec<u8>,
    format: ImageFormat,
}

impl ImageInput {
    pub fn from_bytes(bytes: Vec<u8>) -> Result<Self, ImageError> {
        if bytes.is_empty() {
            return Err(ImageError::Empty);
        }
        let format = ImageFormat::detect(&bytes).ok_or(ImageError::UnsupportedFormat)?;
        Ok(Self { bytes, format })
    }

    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, TutorError> {
        let bytes = std::fs::read(path)?;
        Ok(Self::from_bytes(bytes)?)
    }

    pub fn format(&self) -> ImageFormat {
        self.format
    }

    /// `data:<mime>;base64,<payload>` for inlining into a chat request.
    pub fn data_uri(&self) -> String {
        format!(
            "data:{};base64,{}",
            self.format.mime_type(),
            STANDARD.encode(&self.bytes)
        )
    }
}

// Keep multi-megabyte photos out of debug logs.
impl std::fmt::Debug for ImageInput {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ImageInput")
            .field("format", &self.format)
            .field("len", &self.bytes.len())
            .finish()
    }
}
