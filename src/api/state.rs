use std::sync::Arc;

use tokio_util::sync::CancellationToken;

use crate::instance_manager::OcrInstanceManager;
use crate::ocr_config::OcrConfig;

/// Shared handler state; cheap to clone
#[derive(Clone)]
pub struct AppState {
    /// The service's only OCR engine
    pub manager: Arc<OcrInstanceManager>,
    pub ocr_config: Arc<OcrConfig>,
    /// Fired when the service begins shutting down
    pub shutdown: CancellationToken,
}

impl AppState {
    pub fn new(
        manager: Arc<OcrInstanceManager>,
        ocr_config: OcrConfig,
        shutdown: CancellationToken,
    ) -> Self {
        Self {
            manager,
            ocr_config: Arc::new(ocr_config),
            shutdown,
        }
    }
}
