//! # Image Codec Module
//!
//! Conversions between Base64 text (optionally carrying a
//! `data:image/<fmt>;base64,` prefix) and in-memory raster images.
//!
//! Only PNG and JPEG are exchanged with clients. The format tag of a payload
//! is taken from the decoded bytes' magic numbers, so a JPEG sent under a PNG
//! prefix is still handled as JPEG and re-encoded as JPEG.

use std::borrow::Cow;
use std::io::Cursor;

use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use image::codecs::jpeg::JpegEncoder;
use image::codecs::png::PngEncoder;
use image::{DynamicImage, ImageFormat};

use crate::ocr_errors::OcrError;

/// Generic prefix shared by every image data URI
pub const DATA_URI_IMAGE_PREFIX: &str = "data:image/";
pub const PNG_DATA_URI_PREFIX: &str = "data:image/png;base64,";
pub const JPEG_DATA_URI_PREFIX: &str = "data:image/jpeg;base64,";

/// Prefixes tried, in order, when decoding a preprocessing payload
pub const PREPROCESS_PREFIXES: [&str; 2] = [PNG_DATA_URI_PREFIX, JPEG_DATA_URI_PREFIX];

/// JPEG quality used when re-encoding a JPEG upload
pub const JPEG_QUALITY: u8 = 90;

/// Raster encodings accepted from and returned to clients
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageFormatTag {
    Png,
    Jpeg,
}

impl ImageFormatTag {
    /// Name used in the `data:image/<name>;base64,` prefix
    pub fn as_str(&self) -> &'static str {
        match self {
            ImageFormatTag::Png => "png",
            ImageFormatTag::Jpeg => "jpeg",
        }
    }

    pub fn image_format(&self) -> ImageFormat {
        match self {
            ImageFormatTag::Png => ImageFormat::Png,
            ImageFormatTag::Jpeg => ImageFormat::Jpeg,
        }
    }

    pub fn data_uri_prefix(&self) -> &'static str {
        match self {
            ImageFormatTag::Png => PNG_DATA_URI_PREFIX,
            ImageFormatTag::Jpeg => JPEG_DATA_URI_PREFIX,
        }
    }

    /// Identify the encoding from magic bytes
    ///
    /// Fails with `OcrError::Decode` for empty buffers, unknown signatures and
    /// formats outside the PNG/JPEG pair.
    pub fn sniff(bytes: &[u8]) -> Result<Self, OcrError> {
        if bytes.is_empty() {
            return Err(OcrError::Decode("image payload is empty".to_string()));
        }
        match image::guess_format(bytes) {
            Ok(ImageFormat::Png) => Ok(ImageFormatTag::Png),
            Ok(ImageFormat::Jpeg) => Ok(ImageFormatTag::Jpeg),
            Ok(other) => Err(OcrError::Decode(format!(
                "unsupported image format {:?}, only PNG and JPEG are accepted",
                other
            ))),
            Err(e) => Err(OcrError::Decode(format!("unrecognized image data: {}", e))),
        }
    }
}

impl std::fmt::Display for ImageFormatTag {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Encoded raster bytes together with their detected format
#[derive(Debug, Clone, PartialEq)]
pub struct ImagePayload {
    bytes: Vec<u8>,
    format: ImageFormatTag,
}

impl ImagePayload {
    /// Wrap raw bytes, detecting the format from their signature
    pub fn from_bytes(bytes: Vec<u8>) -> Result<Self, OcrError> {
        let format = ImageFormatTag::sniff(&bytes)?;
        Ok(Self { bytes, format })
    }

    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn format(&self) -> ImageFormatTag {
        self.format
    }
}

/// Decode standard (padded) Base64
///
/// Embedded `\r` and `\n` are skipped, so MIME-style line-wrapped text
/// decodes the same as the unwrapped form.
pub fn decode_base64(text: &str) -> Result<Vec<u8>, OcrError> {
    let text = text.trim();
    let body: Cow<'_, str> = if text.contains(['\r', '\n']) {
        Cow::Owned(text.chars().filter(|c| !matches!(c, '\r' | '\n')).collect())
    } else {
        Cow::Borrowed(text)
    };
    Ok(STANDARD.decode(body.as_bytes())?)
}

/// Strip any `data:image/...;base64,` prefix and return the Base64 body
///
/// Text without the `data:image/` marker is returned unchanged and treated as
/// raw Base64. A marker with no comma separator is a decode error.
pub fn strip_data_uri_prefix(text: &str) -> Result<&str, OcrError> {
    let text = text.trim();
    if !text.starts_with(DATA_URI_IMAGE_PREFIX) {
        return Ok(text);
    }
    match text.split_once(',') {
        Some((_, body)) => Ok(body),
        None => Err(OcrError::Decode(
            "malformed data URI: missing ',' after the data:image/ prefix".to_string(),
        )),
    }
}

/// Decode Base64 text into an image payload, trying each known prefix in turn
///
/// For every prefix the text is trimmed of that prefix (if present) and
/// Base64-decoded; the first successful decode wins. This means raw Base64
/// without any prefix is accepted too.
pub fn decode_image_payload(text: &str, known_prefixes: &[&str]) -> Result<ImagePayload, OcrError> {
    let text = text.trim();
    let mut last_error = OcrError::Decode("no data URI prefixes to try".to_string());

    for prefix in known_prefixes {
        let body = text.strip_prefix(prefix).unwrap_or(text);
        match decode_base64(body) {
            Ok(bytes) => return ImagePayload::from_bytes(bytes),
            Err(e) => {
                tracing::debug!(prefix = %prefix, error = %e, "Base64 decode failed, trying next prefix");
                last_error = e;
            }
        }
    }

    Err(last_error)
}

/// Parse the payload bytes into pixels
pub fn decode_pixels(payload: &ImagePayload) -> Result<DynamicImage, OcrError> {
    image::load_from_memory_with_format(payload.bytes(), payload.format().image_format())
        .map_err(|e| OcrError::Decode(format!("failed to parse {} image: {}", payload.format(), e)))
}

/// Serialize pixels in the given format (JPEG at quality 90)
pub fn encode_image(image: &DynamicImage, format: ImageFormatTag) -> Result<Vec<u8>, OcrError> {
    let mut buffer = Cursor::new(Vec::new());
    let result = match format {
        ImageFormatTag::Png => image.write_with_encoder(PngEncoder::new(&mut buffer)),
        ImageFormatTag::Jpeg => {
            image.write_with_encoder(JpegEncoder::new_with_quality(&mut buffer, JPEG_QUALITY))
        }
    };
    result.map_err(|e| OcrError::Encode(format!("failed to write {} image: {}", format, e)))?;
    Ok(buffer.into_inner())
}

/// Serialize pixels and wrap them as a `data:image/<fmt>;base64,` string
pub fn encode_data_uri(image: &DynamicImage, format: ImageFormatTag) -> Result<String, OcrError> {
    let bytes = encode_image(image, format)?;
    Ok(format!("{}{}", format.data_uri_prefix(), STANDARD.encode(bytes)))
}
