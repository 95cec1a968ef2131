//! # OCR Error Types Module
//!
//! This module defines the error taxonomy shared by the preprocessing and
//! recognition pipelines. Every failure a caller can observe is one of these
//! variants, so the HTTP layer can classify it without inspecting messages.

/// Custom error types for image and OCR operations
#[derive(Debug, Clone, PartialEq)]
pub enum OcrError {
    /// Malformed Base64, malformed data-URI prefix, or unparseable raster bytes
    Decode(String),
    /// Serialization of the processed image failed
    Encode(String),
    /// Engine-reported failure (unset languages, unreadable bytes, extraction)
    Recognition(String),
    /// Engine or language setup failure at startup
    Configuration(String),
    /// Recognition exceeded its deadline
    Timeout(String),
    /// Recognition was abandoned because the service is shutting down
    Cancelled(String),
    /// The engine handle has already been released
    Unavailable(String),
}

impl std::fmt::Display for OcrError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OcrError::Decode(msg) => write!(f, "[DECODE] Failed to decode image payload: {}", msg),
            OcrError::Encode(msg) => write!(f, "[ENCODE] Failed to encode processed image: {}", msg),
            OcrError::Recognition(msg) => write!(f, "[OCR_EXTRACT] Text recognition failed: {}", msg),
            OcrError::Configuration(msg) => write!(f, "[OCR_CONFIG] OCR engine configuration failed: {}", msg),
            OcrError::Timeout(msg) => write!(f, "[OCR_TIMEOUT] OCR processing timed out: {}", msg),
            OcrError::Cancelled(msg) => write!(f, "[OCR_CANCELLED] OCR processing was cancelled: {}", msg),
            OcrError::Unavailable(msg) => write!(f, "[OCR_UNAVAILABLE] OCR engine is unavailable: {}", msg),
        }
    }
}

impl std::error::Error for OcrError {}

impl From<base64::DecodeError> for OcrError {
    fn from(err: base64::DecodeError) -> Self {
        OcrError::Decode(format!("invalid Base64 data: {}", err))
    }
}

impl OcrError {
    /// Short machine-readable label, used for metrics and log fields
    pub fn kind(&self) -> &'static str {
        match self {
            OcrError::Decode(_) => "decode",
            OcrError::Encode(_) => "encode",
            OcrError::Recognition(_) => "recognition",
            OcrError::Configuration(_) => "configuration",
            OcrError::Timeout(_) => "timeout",
            OcrError::Cancelled(_) => "cancelled",
            OcrError::Unavailable(_) => "unavailable",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_carries_tag() {
        let err = OcrError::Decode("missing comma".to_string());
        assert_eq!(
            err.to_string(),
            "[DECODE] Failed to decode image payload: missing comma"
        );

        let err = OcrError::Timeout("30s".to_string());
        assert!(err.to_string().starts_with("[OCR_TIMEOUT]"));
    }

    #[test]
    fn test_base64_error_is_decode() {
        use base64::Engine as _;
        let err = base64::engine::general_purpose::STANDARD
            .decode("not base64!")
            .unwrap_err();
        let ocr_err: OcrError = err.into();
        assert_eq!(ocr_err.kind(), "decode");
    }
}
