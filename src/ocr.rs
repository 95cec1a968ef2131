//! # OCR Processing Module
//!
//! The recognition pipeline: normalize a Base64 payload to raw bytes and have
//! the shared engine read the text in it.
//!
//! ## Processing Steps
//!
//! ```text
//! 1. Strip a data:image/...;base64, prefix (any format) or take raw Base64
//! 2. Base64-decode to raw bytes, in memory
//! 3. Load + extract on the engine under its lock (blocking pool)
//! 4. Race the engine call against the deadline and the cancellation token
//! ```
//!
//! Failures are reported once; nothing is retried.

use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio_util::sync::CancellationToken;
use tracing::{info, warn, Instrument};

use crate::codec;
use crate::errors::error_logging;
use crate::instance_manager::OcrInstanceManager;
use crate::observability;
use crate::ocr_config::OcrConfig;
use crate::ocr_errors::OcrError;

/// Normalize a recognition payload to raw image bytes
///
/// The raster format is not inspected; the engine decides whether it can
/// read the bytes.
///
/// # Errors
///
/// `OcrError::Decode` for a `data:image/` prefix without a comma, malformed
/// Base64, or an empty payload.
///
/// # Examples
///
/// ```rust
/// use ocr_binarizer::ocr::decode_recognition_payload;
///
/// assert_eq!(decode_recognition_payload("aGk=").unwrap(), b"hi");
/// assert_eq!(decode_recognition_payload("data:image/png;base64,aGk=").unwrap(), b"hi");
/// assert!(decode_recognition_payload("data:image/png;base64").is_err());
/// ```
pub fn decode_recognition_payload(base64_image: &str) -> Result<Vec<u8>, OcrError> {
    let body = codec::strip_data_uri_prefix(base64_image)?;
    let bytes = codec::decode_base64(body)?;
    if bytes.is_empty() {
        return Err(OcrError::Decode("image payload is empty".to_string()));
    }
    Ok(bytes)
}

/// Recognize the text in a Base64-encoded image
///
/// The engine call runs on the blocking pool while holding the engine lock.
/// It is bounded by `config.operation_timeout_secs` and abandoned when
/// `cancel` fires. An abandoned call that already holds the engine finishes
/// in the background and only then frees it; one still waiting for the
/// engine gives up at the same deadline.
///
/// # Arguments
///
/// * `base64_image` - image as raw Base64 or a `data:image/...;base64,` URI
/// * `instance_manager` - the service's shared engine
/// * `config` - OCR configuration (deadline)
/// * `cancel` - token fired at service shutdown
///
/// # Errors
///
/// - `OcrError::Decode` - payload could not be decoded
/// - `OcrError::Recognition` - the engine rejected the image or failed to read it
/// - `OcrError::Timeout` - deadline elapsed
/// - `OcrError::Cancelled` - service is shutting down
/// - `OcrError::Unavailable` - engine already released
pub async fn recognize_text(
    base64_image: &str,
    instance_manager: &Arc<OcrInstanceManager>,
    config: &OcrConfig,
    cancel: &CancellationToken,
) -> Result<String, OcrError> {
    let span = observability::ocr_span("recognize_text");
    recognize_in_span(base64_image, instance_manager, config, cancel)
        .instrument(span)
        .await
}

async fn recognize_in_span(
    base64_image: &str,
    instance_manager: &Arc<OcrInstanceManager>,
    config: &OcrConfig,
    cancel: &CancellationToken,
) -> Result<String, OcrError> {
    let start_time = Instant::now();

    let bytes = match decode_recognition_payload(base64_image) {
        Ok(bytes) => bytes,
        Err(e) => {
            observability::record_ocr_metrics(false, start_time.elapsed(), 0);
            error_logging::log_ocr_error(&e, "decode_recognition_payload", None, None);
            return Err(e);
        }
    };
    let image_size = bytes.len() as u64;

    let result = run_engine(bytes, instance_manager, config, cancel).await;
    let duration = start_time.elapsed();
    observability::record_ocr_metrics(result.is_ok(), duration, image_size);

    match &result {
        Ok(text) => info!(
            "OCR extraction completed in {}ms. Extracted {} characters of text",
            duration.as_millis(),
            text.chars().count()
        ),
        Err(e) => {
            error_logging::log_ocr_error(e, "recognize_text", Some(image_size), Some(duration))
        }
    }

    result
}

async fn run_engine(
    bytes: Vec<u8>,
    instance_manager: &Arc<OcrInstanceManager>,
    config: &OcrConfig,
    cancel: &CancellationToken,
) -> Result<String, OcrError> {
    if cancel.is_cancelled() {
        return Err(OcrError::Cancelled("service is shutting down".to_string()));
    }

    let timeout_duration = Duration::from_secs(config.operation_timeout_secs);
    let deadline = Instant::now() + timeout_duration;

    let manager = Arc::clone(instance_manager);
    let task = tokio::task::spawn_blocking(move || {
        manager.recognize_bytes(&bytes, deadline.saturating_duration_since(Instant::now()))
    });

    tokio::select! {
        _ = cancel.cancelled() => {
            warn!("OCR processing abandoned: service is shutting down");
            Err(OcrError::Cancelled("service is shutting down".to_string()))
        }
        outcome = tokio::time::timeout(timeout_duration, task) => match outcome {
            Ok(Ok(result)) => result,
            Ok(Err(join_error)) => Err(OcrError::Recognition(format!(
                "OCR task failed: {}",
                join_error
            ))),
            Err(_) => {
                warn!(
                    "OCR processing timed out (limit: {}s)",
                    config.operation_timeout_secs
                );
                Err(OcrError::Timeout(format!(
                    "OCR operation timed out after {} seconds",
                    config.operation_timeout_secs
                )))
            }
        },
    }
}
