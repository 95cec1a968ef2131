//! Observability module for centralized metrics, tracing, and logging setup.
//!
//! This module provides:
//! - Structured logging with configurable levels and formats
//! - Metrics collection and Prometheus export
//! - Liveness and readiness probes next to the metrics endpoint
//! - Span and metric helpers used by the pipelines and HTTP handlers

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use hyper::server::conn::http1;
use hyper_util::rt::TokioIo;
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::prelude::*;

use crate::instance_manager::OcrInstanceManager;
use crate::observability_config::ObservabilityConfig;

/// Initialize logging and, when enabled, the Prometheus recorder
///
/// Returns the handle used to render metrics, or `None` when metrics export
/// is disabled.
pub fn init_observability_with_config(
    config: &ObservabilityConfig,
) -> Result<Option<PrometheusHandle>> {
    config
        .validate()
        .map_err(|e| anyhow::anyhow!("Invalid observability configuration: {}", e))?;

    init_tracing_with_config(config)?;

    let handle = if config.enable_metrics_export {
        Some(init_metrics_with_config(config)?)
    } else {
        tracing::info!("Metrics export disabled");
        None
    };

    tracing::info!(
        environment = %config.environment,
        metrics_port = %config.metrics_port,
        metrics_enabled = %config.enable_metrics_export,
        "Observability stack initialized successfully"
    );
    Ok(handle)
}

/// Initialize structured logging with tracing and configuration
pub fn init_tracing_with_config(config: &ObservabilityConfig) -> Result<()> {
    let filter = tracing_subscriber::EnvFilter::from_default_env()
        .add_directive(format!("ocr_binarizer={}", config.log_level).parse()?)
        .add_directive("tower_http=info".parse()?)
        .add_directive("leptess=warn".parse()?);

    if config.use_pretty_logs() {
        tracing_subscriber::registry()
            .with(filter)
            .with(
                tracing_subscriber::fmt::layer()
                    .pretty()
                    .with_target(true)
                    .with_thread_ids(false)
                    .with_thread_names(false),
            )
            .try_init()?;
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(
                tracing_subscriber::fmt::layer()
                    .json()
                    .with_target(true)
                    .with_thread_ids(true)
                    .with_thread_names(true),
            )
            .try_init()?;
    }

    tracing::info!(
        environment = %config.environment,
        log_level = %config.log_level,
        "Tracing initialized with structured logging"
    );
    Ok(())
}

/// Initialize metrics collection with Prometheus exporter and configuration
fn init_metrics_with_config(config: &ObservabilityConfig) -> Result<PrometheusHandle> {
    let handle = PrometheusBuilder::new().install_recorder()?;

    tracing::info!(
        metrics_port = %config.metrics_port,
        "Metrics collection initialized"
    );
    Ok(handle)
}

/// Serve `/metrics`, `/health/live` and `/health/ready` until `shutdown` fires
///
/// Readiness follows the OCR engine: once it has been released the probe
/// answers 503. Returns the bound address.
pub async fn start_metrics_server(
    metrics_handle: PrometheusHandle,
    port: u16,
    manager: Arc<OcrInstanceManager>,
    shutdown: CancellationToken,
) -> Result<SocketAddr> {
    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    let listener = TcpListener::bind(addr).await?;
    let local_addr = listener.local_addr()?;
    tracing::info!("Metrics server listening on {}", local_addr);

    tokio::spawn(async move {
        loop {
            let accepted = tokio::select! {
                _ = shutdown.cancelled() => break,
                accepted = listener.accept() => accepted,
            };

            match accepted {
                Ok((stream, _)) => {
                    let metrics_handle = metrics_handle.clone();
                    let manager = Arc::clone(&manager);

                    tokio::spawn(async move {
                        let io = TokioIo::new(stream);

                        let service = hyper::service::service_fn(
                            move |req: hyper::Request<hyper::body::Incoming>| {
                                let response =
                                    probe_response(req.method(), req.uri().path(), &metrics_handle, &manager);
                                async move { Ok::<_, std::convert::Infallible>(response) }
                            },
                        );

                        if let Err(err) = http1::Builder::new().serve_connection(io, service).await {
                            tracing::error!("Error serving connection: {:?}", err);
                        }
                    });
                }
                Err(e) => {
                    tracing::error!("Error accepting connection: {}", e);
                }
            }
        }
        tracing::info!("Metrics server stopped");
    });

    Ok(local_addr)
}

fn probe_response(
    method: &hyper::Method,
    path: &str,
    metrics_handle: &PrometheusHandle,
    manager: &OcrInstanceManager,
) -> hyper::Response<String> {
    match (method, path) {
        (&hyper::Method::GET, "/metrics") => {
            let mut response = hyper::Response::new(metrics_handle.render());
            response.headers_mut().insert(
                "content-type",
                hyper::header::HeaderValue::from_static("text/plain; version=0.0.4; charset=utf-8"),
            );
            response
        }
        (&hyper::Method::GET, "/health/live") => hyper::Response::new("OK".to_string()),
        (&hyper::Method::GET, "/health/ready") => match check_ocr_health(manager) {
            Ok(()) => hyper::Response::new("OK".to_string()),
            Err(e) => {
                let mut response = hyper::Response::new(format!("NOT READY: {}", e));
                *response.status_mut() = hyper::StatusCode::SERVICE_UNAVAILABLE;
                response
            }
        },
        _ => {
            let mut response = hyper::Response::new("Not Found".to_string());
            *response.status_mut() = hyper::StatusCode::NOT_FOUND;
            response
        }
    }
}

/// Check that the shared OCR engine still accepts work
pub fn check_ocr_health(manager: &OcrInstanceManager) -> Result<()> {
    if manager.is_available() {
        tracing::debug!(engine = manager.engine_name(), "OCR health check passed");
        Ok(())
    } else {
        Err(anyhow::anyhow!("OCR engine has been released"))
    }
}

/// Create a span for OCR operations
pub fn ocr_span(operation: &str) -> tracing::Span {
    tracing::info_span!("ocr_operation", operation = operation, component = "ocr")
}

/// Create a span for preprocessing operations
pub fn preprocess_span(operation: &str) -> tracing::Span {
    tracing::info_span!(
        "preprocess_operation",
        operation = operation,
        component = "preprocessing"
    )
}

fn result_label(success: bool) -> &'static str {
    if success {
        "success"
    } else {
        "failure"
    }
}

/// Record OCR operation metrics
pub fn record_ocr_metrics(success: bool, duration: Duration, image_size: u64) {
    metrics::counter!("ocr_operations_total", "result" => result_label(success)).increment(1);
    metrics::histogram!("ocr_duration_seconds").record(duration.as_secs_f64());
    metrics::histogram!("ocr_image_size_bytes").record(image_size as f64);
}

/// Record preprocessing pipeline metrics
pub fn record_preprocess_metrics(success: bool, duration: Duration) {
    metrics::counter!("preprocess_operations_total", "result" => result_label(success))
        .increment(1);
    metrics::histogram!("preprocess_duration_seconds").record(duration.as_secs_f64());
}

/// Record request metrics
pub fn record_request_metrics(endpoint: &'static str, status: u16, duration: Duration) {
    let status = status.to_string();
    metrics::counter!("requests_total", "endpoint" => endpoint, "status" => status).increment(1);
    metrics::histogram!("request_duration_seconds", "endpoint" => endpoint)
        .record(duration.as_secs_f64());
}
