//! Input image validation
//!
//! Images are checked before any backend is contacted: non-empty, within the size
//! limits, and sniffed as an image format by magic bytes. Base64 input from browsers
//! may carry a `data:image/<fmt>;base64,` prefix, which is stripped first.

use crate::error::{ConfigError, ImageError};
use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use pawid_common::config::ImageConfig;

/// Accepted image size range in bytes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ImageLimits {
    pub min_bytes: usize,
    pub max_bytes: usize,
}

impl Default for ImageLimits {
    fn default() -> Self {
        Self {
            min_bytes: 1024,
            max_bytes: 10 * 1024 * 1024,
        }
    }
}

impl TryFrom<&ImageConfig> for ImageLimits {
    type Error = ConfigError;

    fn try_from(config: &ImageConfig) -> Result<Self, Self::Error> {
        if config.min_bytes > config.max_bytes {
            return Err(ConfigError::InvalidImageLimits {
                min: config.min_bytes,
                max: config.max_bytes,
            });
        }
        Ok(Self {
            min_bytes: config.min_bytes,
            max_bytes: config.max_bytes,
        })
    }
}

/// Validated image bytes with their sniffed MIME type
#[derive(Debug, Clone)]
pub struct ImageInput {
    bytes: Vec<u8>,
    mime_type: &'static str,
}

impl ImageInput {
    /// Validate raw image bytes
    pub fn from_bytes(bytes: Vec<u8>, limits: &ImageLimits) -> Result<Self, ImageError> {
        let size = bytes.len();
        if size == 0 {
            return Err(ImageError::Empty);
        }
        if size < limits.min_bytes {
            return Err(ImageError::TooSmall {
                size,
                min: limits.min_bytes,
            });
        }
        if size > limits.max_bytes {
            return Err(ImageError::TooLarge {
                size,
                max: limits.max_bytes,
            });
        }

        let kind = infer::get(&bytes)
            .filter(|t| t.matcher_type() == infer::MatcherType::Image)
            .ok_or(ImageError::UnrecognizedFormat)?;

        Ok(Self {
            bytes,
            mime_type: kind.mime_type(),
        })
    }

    /// Decode and validate a base64 image, with or without a data-URL prefix
    pub fn from_base64(encoded: &str, limits: &ImageLimits) -> Result<Self, ImageError> {
        let payload = strip_data_url_prefix(encoded.trim());
        if payload.is_empty() {
            return Err(ImageError::Empty);
        }

        let bytes = STANDARD
            .decode(payload)
            .map_err(|e| ImageError::InvalidBase64(e.to_string()))?;

        Self::from_bytes(bytes, limits)
    }

    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// Sniffed MIME type, e.g. `image/jpeg`
    pub fn mime_type(&self) -> &'static str {
        self.mime_type
    }

    /// Standard base64 encoding of the image (the Roboflow upload body)
    pub fn to_base64(&self) -> String {
        STANDARD.encode(&self.bytes)
    }
}

/// Remove a leading `data:image/<word>;base64,`; other input is returned unchanged
pub fn strip_data_url_prefix(input: &str) -> &str {
    let Some(rest) = input.strip_prefix("data:image/") else {
        return input;
    };
    let Some((format, payload)) = rest.split_once(";base64,") else {
        return input;
    };

    let is_word = !format.is_empty()
        && format.chars().all(|c| c.is_ascii_alphanumeric() || c == '_');
    if is_word {
        payload
    } else {
        input
    }
}
