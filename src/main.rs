use anyhow::Result;
use ocr_binarizer::api::{self, AppState};
use ocr_binarizer::config::AppConfig;
use ocr_binarizer::errors::error_logging;
use ocr_binarizer::instance_manager::OcrInstanceManager;
use ocr_binarizer::observability;
use std::path::Path;
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

#[tokio::main]
async fn main() -> Result<()> {
    // Load environment variables from .env file first
    dotenvy::dotenv().ok();

    let config = AppConfig::from_env()?;
    config.validate()?;

    let metrics_handle = observability::init_observability_with_config(&config.observability)?;
    info!("{}", config.summary());

    // A missing language model is fatal: the service must not start without OCR
    let manager = match OcrInstanceManager::from_config(&config.ocr) {
        Ok(manager) => Arc::new(manager),
        Err(e) => {
            error_logging::log_config_error(&e, "OCR_LANGUAGES", "ocr_engine_init");
            return Err(e.into());
        }
    };

    let shutdown = CancellationToken::new();

    if let Some(handle) = metrics_handle {
        observability::start_metrics_server(
            handle,
            config.observability.metrics_port,
            Arc::clone(&manager),
            shutdown.clone(),
        )
        .await?;
    }

    if !Path::new(&config.server.static_dir).is_dir() {
        warn!(
            static_dir = %config.server.static_dir,
            "Static directory does not exist; only the API will be served"
        );
    }

    let state = AppState::new(Arc::clone(&manager), config.ocr.clone(), shutdown.clone());
    let app = api::create_router(state, &config.server.static_dir, config.server.max_request_bytes);

    let addr = config.server.socket_addr()?;
    let listener = TcpListener::bind(addr).await?;
    info!("Server listening on http://{}", addr);
    info!("  Preprocess: POST http://{}/api/preprocess", addr);
    info!("  Recognize:  POST http://{}/api/recognize", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal(shutdown.clone()))
        .await?;

    info!("HTTP server stopped, releasing OCR engine");
    match manager.drain_and_release(config.server.shutdown_drain()).await {
        Ok(true) => info!("OCR engine closed"),
        Ok(false) => warn!("OCR engine was not released cleanly"),
        Err(e) => error!(error = %e, "Failed to release OCR engine"),
    }

    Ok(())
}

async fn shutdown_signal(shutdown: CancellationToken) {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!(error = %e, "Failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    info!("Shutdown signal received, cancelling in-flight work");
    shutdown.cancel();
}
