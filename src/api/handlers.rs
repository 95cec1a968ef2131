//! Handlers for the two JSON endpoints.
//!
//! Bodies are read as raw bytes and parsed here so that every malformed body
//! gets the same `{"error": "Invalid request: ..."}` shape, whatever the
//! Content-Type header says. Bodies over the size limit keep their 413 status
//! but get the same shape.

use std::time::Instant;

use axum::body::Bytes;
use axum::extract::rejection::BytesRejection;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::de::DeserializeOwned;

use super::dto::{ErrorResponse, ProcessRequest, ProcessResponse, RecognizeRequest, RecognizeResponse};
use super::state::AppState;
use crate::errors::error_logging;
use crate::observability;
use crate::ocr;
use crate::ocr_errors::OcrError;
use crate::preprocessing::{self, Threshold};

/// An error rendered as `{"error": message}` with a status code
#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    message: String,
}

impl ApiError {
    pub fn invalid_request(detail: impl std::fmt::Display) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            message: format!("Invalid request: {}", detail),
        }
    }

    pub fn processing(error: &OcrError) -> Self {
        Self::from_ocr("Processing error", error)
    }

    pub fn recognition(error: &OcrError) -> Self {
        Self::from_ocr("Recognition error", error)
    }

    fn from_ocr(label: &str, error: &OcrError) -> Self {
        let status = status_for(error);
        tracing::warn!(
            error_kind = error.kind(),
            status = status.as_u16(),
            "{} returned to client",
            label
        );
        Self {
            status,
            message: format!("{}: {}", label, error),
        }
    }

    fn internal(detail: impl std::fmt::Display) -> Self {
        Self {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            message: format!("Processing error: {}", detail),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status, Json(ErrorResponse { error: self.message })).into_response()
    }
}

/// HTTP status for a pipeline failure
pub fn status_for(error: &OcrError) -> StatusCode {
    match error {
        OcrError::Timeout(_) => StatusCode::GATEWAY_TIMEOUT,
        OcrError::Cancelled(_) | OcrError::Unavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
        OcrError::Decode(_)
        | OcrError::Encode(_)
        | OcrError::Recognition(_)
        | OcrError::Configuration(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

fn read_body(body: Result<Bytes, BytesRejection>, operation: &str) -> Result<Bytes, ApiError> {
    body.map_err(|rejection| {
        let detail = rejection.body_text();
        error_logging::log_validation_error(&detail, operation, "body", None);
        ApiError {
            status: rejection.status(),
            message: format!("Invalid request: {}", detail),
        }
    })
}

fn parse_body<T: DeserializeOwned>(body: &Bytes, operation: &str) -> Result<T, ApiError> {
    serde_json::from_slice(body).map_err(|e| {
        error_logging::log_validation_error(
            &e,
            operation,
            "json_body",
            std::str::from_utf8(body).ok(),
        );
        ApiError::invalid_request(e)
    })
}

fn finish<T: serde::Serialize>(
    endpoint: &'static str,
    start: Instant,
    result: Result<T, ApiError>,
) -> Response {
    let response = match result {
        Ok(body) => (StatusCode::OK, Json(body)).into_response(),
        Err(e) => e.into_response(),
    };
    observability::record_request_metrics(endpoint, response.status().as_u16(), start.elapsed());
    response
}

/// `POST /api/preprocess`
pub async fn preprocess(body: Result<Bytes, BytesRejection>) -> Response {
    let start = Instant::now();
    finish("preprocess", start, run_preprocess(body).await)
}

async fn run_preprocess(body: Result<Bytes, BytesRejection>) -> Result<ProcessResponse, ApiError> {
    let body = read_body(body, "preprocess")?;
    let request: ProcessRequest = parse_body(&body, "preprocess")?;
    let threshold = match request.threshold {
        Some(value) => Threshold::try_from(value).map_err(|e| {
            error_logging::log_validation_error(&e, "preprocess", "threshold", Some(&value.to_string()));
            ApiError::invalid_request(e)
        })?,
        None => Threshold::default(),
    };

    let image_data = request.image_data;
    let processed = tokio::task::spawn_blocking(move || {
        preprocessing::preprocess_image(&image_data, threshold)
    })
    .await
    .map_err(ApiError::internal)?
    .map_err(|e| ApiError::processing(&e))?;

    Ok(ProcessResponse {
        processed_image: processed.data_uri,
    })
}

/// `POST /api/recognize`
pub async fn recognize(
    State(state): State<AppState>,
    body: Result<Bytes, BytesRejection>,
) -> Response {
    let start = Instant::now();
    finish("recognize", start, run_recognize(&state, body).await)
}

async fn run_recognize(
    state: &AppState,
    body: Result<Bytes, BytesRejection>,
) -> Result<RecognizeResponse, ApiError> {
    let body = read_body(body, "recognize")?;
    let request: RecognizeRequest = parse_body(&body, "recognize")?;

    let text = ocr::recognize_text(
        &request.image_data,
        &state.manager,
        &state.ocr_config,
        &state.shutdown,
    )
    .await
    .map_err(|e| ApiError::recognition(&e))?;

    Ok(RecognizeResponse { text })
}

/// Any method other than POST on an API path
pub async fn method_not_allowed() -> ApiError {
    ApiError {
        status: StatusCode::METHOD_NOT_ALLOWED,
        message: "Method not allowed".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        assert_eq!(
            status_for(&OcrError::Decode("x".into())),
            StatusCode::INTERNAL_SERVER_ERROR
        );
        assert_eq!(
            status_for(&OcrError::Recognition("x".into())),
            StatusCode::INTERNAL_SERVER_ERROR
        );
        assert_eq!(
            status_for(&OcrError::Timeout("x".into())),
            StatusCode::GATEWAY_TIMEOUT
        );
        assert_eq!(
            status_for(&OcrError::Cancelled("x".into())),
            StatusCode::SERVICE_UNAVAILABLE
        );
        assert_eq!(
            status_for(&OcrError::Unavailable("x".into())),
            StatusCode::SERVICE_UNAVAILABLE
        );
    }

    #[test]
    fn test_error_messages_carry_prefixes() {
        let err = OcrError::Decode("bad".into());
        assert!(ApiError::processing(&err).message.starts_with("Processing error: "));
        assert!(ApiError::recognition(&err).message.starts_with("Recognition error: "));
        assert!(ApiError::invalid_request("eof").message.starts_with("Invalid request: "));
    }
}
