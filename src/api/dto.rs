//! Request and response bodies of the JSON API.

use serde::{Deserialize, Serialize};

/// Body of `POST /api/preprocess`
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProcessRequest {
    /// Raw Base64 or a PNG/JPEG data URI
    pub image_data: String,
    /// Binarization cut value; defaults to 128
    #[serde(default)]
    pub threshold: Option<i64>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProcessResponse {
    /// Data URI in the input's format
    pub processed_image: String,
}

/// Body of `POST /api/recognize`
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RecognizeRequest {
    pub image_data: String,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RecognizeResponse {
    pub text: String,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}
