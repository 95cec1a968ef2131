//! # Image Preprocessing Module
//!
//! Turns a client-supplied image into a black-and-white version of itself:
//! decode → grayscale → threshold → re-encode in the original format.
//!
//! The module is organized into focused sub-modules:
//! - `thresholding`: grayscale conversion and fixed-threshold binarization
//! - `types`: shared types (threshold, binary image, pipeline result)

pub mod thresholding;
pub mod types;

pub use thresholding::{binarize, to_grayscale};
pub use types::{BinaryImage, PreprocessedImage, Threshold, DEFAULT_THRESHOLD};

use std::time::Instant;

use tracing::info;

use crate::codec;
use crate::errors::error_logging;
use crate::observability;
use crate::ocr_errors::OcrError;

/// Binarizes a Base64 image and returns it re-encoded as a data URI.
///
/// The payload may carry a `data:image/png;base64,` or
/// `data:image/jpeg;base64,` prefix, or none at all. The output keeps the
/// format detected from the decoded bytes: PNG stays PNG, JPEG stays JPEG.
///
/// # Errors
///
/// - `OcrError::Decode` - Base64 or raster bytes could not be decoded
/// - `OcrError::Encode` - the binary image could not be serialized
///
/// # Examples
///
/// ```
/// use base64::Engine as _;
/// use image::{DynamicImage, GrayImage, ImageFormat, Luma};
/// use ocr_binarizer::preprocessing::{preprocess_image, Threshold};
///
/// let mut png = std::io::Cursor::new(Vec::new());
/// DynamicImage::ImageLuma8(GrayImage::from_pixel(2, 2, Luma([255])))
///     .write_to(&mut png, ImageFormat::Png)
///     .unwrap();
/// let input = format!(
///     "data:image/png;base64,{}",
///     base64::engine::general_purpose::STANDARD.encode(png.into_inner())
/// );
///
/// let result = preprocess_image(&input, Threshold::default()).unwrap();
/// assert!(result.data_uri.starts_with("data:image/png;base64,"));
/// assert_eq!(result.dimensions, (2, 2));
/// ```
pub fn preprocess_image(
    base64_image: &str,
    threshold: Threshold,
) -> Result<PreprocessedImage, OcrError> {
    let span = observability::preprocess_span("preprocess_image");
    let _enter = span.enter();

    let start_time = Instant::now();
    let result = run_pipeline(base64_image, threshold);
    let duration = start_time.elapsed();

    observability::record_preprocess_metrics(result.is_ok(), duration);

    match &result {
        Ok(processed) => info!(
            format = %processed.format,
            width = processed.dimensions.0,
            height = processed.dimensions.1,
            threshold = threshold.value(),
            duration_ms = duration.as_millis() as u64,
            "Image preprocessing completed"
        ),
        Err(e) => error_logging::log_preprocessing_error(
            e,
            "preprocess_image",
            threshold.value(),
            base64_image.len(),
        ),
    }

    result
}

fn run_pipeline(base64_image: &str, threshold: Threshold) -> Result<PreprocessedImage, OcrError> {
    let payload = codec::decode_image_payload(base64_image, &codec::PREPROCESS_PREFIXES)?;
    let format = payload.format();
    let image = codec::decode_pixels(&payload)?;

    let gray = to_grayscale(&image);
    let binary = binarize(&gray, threshold);
    let dimensions = (binary.width(), binary.height());

    let data_uri = codec::encode_data_uri(&binary.into_dynamic(), format)?;

    Ok(PreprocessedImage {
        data_uri,
        format,
        dimensions,
        threshold,
    })
}
